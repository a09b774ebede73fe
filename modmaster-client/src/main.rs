//! Command-line Modbus master

use std::fmt::Formatter;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use modmaster::stream::SerialSettings;
use modmaster::*;

#[derive(Debug)]
enum Error {
    BadRange(InvalidRange),
    BadInt(ParseIntError),
    BadCharInBitString(char),
    NoConnection,
    Open(OpenError),
    Request(RequestError),
}

#[derive(Parser)]
#[command(name = "modmaster-client")]
#[command(
    about = "A command line program for making Modbus master requests using the modmaster crate"
)]
#[command(version)]
struct Cli {
    #[arg(
        long,
        help = "socket address of a Modbus TCP slave",
        conflicts_with_all = ["udp", "serial"]
    )]
    tcp: Option<SocketAddr>,

    #[arg(long, help = "socket address of a Modbus UDP slave", conflicts_with = "serial")]
    udp: Option<SocketAddr>,

    #[arg(long, help = "path of a serial port, e.g. /dev/ttyUSB0")]
    serial: Option<String>,

    #[arg(long, default_value = "9600", help = "baud rate of the serial port")]
    baud: u32,

    #[arg(long, help = "use ASCII instead of RTU framing on the serial port")]
    ascii: bool,

    #[arg(short = 'i', long, default_value = "1", help = "the unit id of the Modbus slave")]
    id: u8,

    #[arg(
        short = 'r',
        long,
        default_value = "3",
        help = "number of times a failed request is re-sent"
    )]
    retries: usize,

    #[arg(long, default_value = "250", help = "delay in milliseconds before a retry")]
    wait_ms: u64,

    #[arg(
        short = 't',
        long,
        default_value = "1000",
        help = "read and write timeout in milliseconds"
    )]
    timeout_ms: u64,

    #[arg(short = 'p', long, help = "Optional polling period in milliseconds")]
    period: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "rc", about = "read coils")]
    ReadCoils(ReadArgs),

    #[command(name = "rdi", about = "read discrete inputs")]
    ReadDiscreteInputs(ReadArgs),

    #[command(name = "rhr", about = "read holding registers")]
    ReadHoldingRegisters(ReadArgs),

    #[command(name = "rir", about = "read input registers")]
    ReadInputRegisters(ReadArgs),

    #[command(name = "wsc", about = "write single coil")]
    WriteSingleCoil(WriteSingleCoilArgs),

    #[command(name = "wsr", about = "write single register")]
    WriteSingleRegister(WriteSingleRegisterArgs),

    #[command(name = "wmc", about = "write multiple coils")]
    WriteMultipleCoils(WriteMultipleArgs),

    #[command(name = "wmr", about = "write multiple registers")]
    WriteMultipleRegisters(WriteMultipleArgs),

    #[command(name = "diag", about = "diagnostics return query data")]
    Diagnostics(DiagnosticsArgs),
}

#[derive(Args)]
struct ReadArgs {
    #[arg(short = 's', long, help = "the starting address")]
    start: u16,

    #[arg(short = 'q', long, help = "quantity of values")]
    quantity: u16,
}

#[derive(Args)]
struct WriteSingleCoilArgs {
    #[arg(short = 'a', long, help = "the address of the coil")]
    index: u16,

    #[arg(short = 'v', long, help = "the value of the coil (true or false)")]
    value: bool,
}

#[derive(Args)]
struct WriteSingleRegisterArgs {
    #[arg(short = 'a', long, help = "the address of the register")]
    index: u16,

    #[arg(short = 'v', long, help = "the value of the register")]
    value: u16,
}

#[derive(Args)]
struct WriteMultipleArgs {
    #[arg(short = 's', long, help = "the starting address")]
    start: u16,

    #[arg(
        short = 'v',
        long,
        help = "coils as a string of 1 and 0 (e.g. 10100011), registers as a comma delimited list (e.g. 1,4,7)"
    )]
    values: String,
}

#[derive(Args)]
struct DiagnosticsArgs {
    #[arg(short = 'd', long, default_value = "0", help = "data word echoed by the slave")]
    data: u16,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    if let Err(ref e) = run() {
        println!("error: {e}");
    }
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let timeout = Some(Duration::from_millis(cli.timeout_ms));
    let config = MasterConfig::default()
        .with_retries(cli.retries)
        .with_wait_to_retry(Duration::from_millis(cli.wait_ms))
        .with_read_timeout(timeout)
        .with_write_timeout(timeout)
        .with_decode(DecodeLevel::from(PduDecodeLevel::DataValues));

    let master = open(&cli, config)?;
    let unit_id = UnitId::new(cli.id);
    if cli.serial.is_some() && unit_id.is_rtu_reserved() {
        tracing::warn!("unit id {} is reserved on serial lines", unit_id);
    }

    match cli.period {
        None => run_command(&cli.command, &master, unit_id),
        Some(period_ms) => {
            let period = Duration::from_millis(period_ms);
            loop {
                if let Err(err) = run_command(&cli.command, &master, unit_id) {
                    tracing::warn!("{err}");
                }
                std::thread::sleep(period);
            }
        }
    }
}

fn open(cli: &Cli, config: MasterConfig) -> Result<Master, Error> {
    if let Some(addr) = cli.tcp {
        return Ok(Master::tcp(addr, config)?);
    }
    if let Some(addr) = cli.udp {
        return Ok(Master::udp(addr, config)?);
    }
    if let Some(path) = &cli.serial {
        let settings = SerialSettings::with_baud_rate(cli.baud);
        return if cli.ascii {
            Ok(Master::ascii(path, settings, config)?)
        } else {
            Ok(Master::rtu(path, settings, config)?)
        };
    }
    Err(Error::NoConnection)
}

fn run_command(command: &Command, master: &Master, unit_id: UnitId) -> Result<(), Error> {
    match command {
        Command::ReadCoils(args) => print_values(&master.read_coils(unit_id, args.range()?)?),
        Command::ReadDiscreteInputs(args) => {
            print_values(&master.read_discrete_inputs(unit_id, args.range()?)?)
        }
        Command::ReadHoldingRegisters(args) => {
            print_values(&master.read_holding_registers(unit_id, args.range()?)?)
        }
        Command::ReadInputRegisters(args) => {
            print_values(&master.read_input_registers(unit_id, args.range()?)?)
        }
        Command::WriteSingleCoil(args) => {
            let echo = master.write_single_coil(unit_id, Indexed::new(args.index, args.value))?;
            print_values(&[echo]);
        }
        Command::WriteSingleRegister(args) => {
            let echo =
                master.write_single_register(unit_id, Indexed::new(args.index, args.value))?;
            print_values(&[echo]);
        }
        Command::WriteMultipleCoils(args) => {
            let values = parse_bit_values(&args.values)?;
            let values = WriteMultiple::from(args.start, values)?;
            let range = master.write_multiple_coils(unit_id, values)?;
            println!("wrote {range}");
        }
        Command::WriteMultipleRegisters(args) => {
            let values = parse_register_values(&args.values)?;
            let values = WriteMultiple::from(args.start, values)?;
            let range = master.write_multiple_registers(unit_id, values)?;
            println!("wrote {range}");
        }
        Command::Diagnostics(args) => {
            let data = master.return_query_data(unit_id, args.data)?;
            println!("echo: {data:#06X}");
        }
    }
    Ok(())
}

impl ReadArgs {
    fn range(&self) -> Result<AddressRange, InvalidRange> {
        AddressRange::try_from(self.start, self.quantity)
    }
}

fn print_values<T: std::fmt::Display>(values: &[Indexed<T>]) {
    for x in values {
        println!("{:>5}: {}", x.index, x.value);
    }
}

// the rightmost character is the first coil
fn parse_bit_values(values_str: &str) -> Result<Vec<bool>, Error> {
    let mut values: Vec<bool> = Vec::new();
    for c in values_str.chars().rev() {
        match c {
            '0' => values.push(false),
            '1' => values.push(true),
            _ => return Err(Error::BadCharInBitString(c)),
        }
    }
    Ok(values)
}

fn parse_register_values(values_str: &str) -> Result<Vec<u16>, ParseIntError> {
    let mut values: Vec<u16> = Vec::new();
    for value in values_str.split(',') {
        values.push(u16::from_str(value.trim())?);
    }
    Ok(values)
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Error::BadRange(err) => write!(f, "{err}"),
            Error::BadInt(err) => err.fmt(f),
            Error::BadCharInBitString(char) => write!(f, "Bad character in bit string: {char}"),
            Error::NoConnection => f.write_str("one of --tcp, --udp or --serial is required"),
            Error::Open(err) => write!(f, "unable to open master: {err}"),
            Error::Request(err) => err.fmt(f),
        }
    }
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Error::Request(err)
    }
}

impl From<OpenError> for Error {
    fn from(err: OpenError) -> Self {
        Error::Open(err)
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Self {
        Error::BadInt(err)
    }
}

impl From<InvalidRange> for Error {
    fn from(err: InvalidRange) -> Self {
        Error::BadRange(err)
    }
}

impl From<InvalidRequest> for Error {
    fn from(err: InvalidRequest) -> Self {
        Error::Request(err.into())
    }
}
