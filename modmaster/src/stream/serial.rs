use std::time::Duration;

use crate::stream::ByteStream;

pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

/// serialport needs a finite timeout, this stands in for "block forever"
const BLOCKING_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24);

/// Serial port line settings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SerialSettings {
    /// baud rate of the port
    pub baud_rate: u32,
    /// number of data bits
    pub data_bits: DataBits,
    /// number of stop bits
    pub stop_bits: StopBits,
    /// parity setting
    pub parity: Parity,
    /// flow control setting
    pub flow_control: FlowControl,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialSettings {
    /// default settings at a particular baud rate
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

/// A serial port opened for blocking I/O
pub struct SerialStream {
    port: Box<dyn tokio_serial::SerialPort>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("SerialStream(")?;
        match self.port.name() {
            Some(name) => f.write_str(&name)?,
            None => f.write_str("unnamed")?,
        }
        f.write_str(")")
    }
}

impl SerialStream {
    /// Open the port at `path`
    pub fn open(path: &str, settings: SerialSettings) -> std::io::Result<Self> {
        let port = tokio_serial::new(path, settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(settings.flow_control)
            .timeout(BLOCKING_TIMEOUT)
            .open()?;
        tracing::info!("opened serial port: {}", path);
        Ok(Self {
            port,
            read_timeout: None,
            write_timeout: None,
        })
    }
}

// serialport has a single timeout that covers both directions
fn effective(timeout: Option<Duration>) -> Duration {
    timeout.unwrap_or(BLOCKING_TIMEOUT)
}

impl ByteStream for SerialStream {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        self.port.set_timeout(effective(self.read_timeout))?;
        std::io::Read::read(&mut self.port, buffer)
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.port.set_timeout(effective(self.write_timeout))?;
        std::io::Write::write_all(&mut self.port, data)?;
        std::io::Write::flush(&mut self.port)
    }

    fn read_timeout(&self) -> std::io::Result<Option<Duration>> {
        Ok(self.read_timeout)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn write_timeout(&self) -> std::io::Result<Option<Duration>> {
        Ok(self.write_timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.write_timeout = timeout;
        Ok(())
    }

    fn discard_in_buffer(&mut self) -> std::io::Result<()> {
        self.port.clear(tokio_serial::ClearBuffer::Input)?;
        Ok(())
    }
}
