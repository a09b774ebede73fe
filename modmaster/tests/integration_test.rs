use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use modmaster::*;

/// A minimal slave with ten holding registers
struct Handler {
    holding_registers: [u16; 10],
    requests: usize,
    /// requests that are read but never answered
    unanswered: usize,
}

impl Handler {
    fn new(unanswered: usize) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            holding_registers: [0; 10],
            requests: 0,
            unanswered,
        }))
    }

    fn process(&mut self, pdu: &[u8]) -> Vec<u8> {
        let word = |offset: usize| u16::from_be_bytes([pdu[offset], pdu[offset + 1]]) as usize;
        match pdu[0] {
            0x03 => {
                let (start, count) = (word(1), word(3));
                match self.holding_registers.get(start..start + count) {
                    Some(values) => {
                        let mut response = vec![0x03, (2 * count) as u8];
                        for value in values {
                            response.extend_from_slice(&value.to_be_bytes());
                        }
                        response
                    }
                    None => vec![0x83, 0x02],
                }
            }
            0x06 => {
                let (index, value) = (word(1), word(3));
                match self.holding_registers.get_mut(index) {
                    Some(register) => {
                        *register = value as u16;
                        pdu.to_vec()
                    }
                    None => vec![0x86, 0x02],
                }
            }
            function => vec![function | 0x80, 0x01],
        }
    }
}

fn serve(mut stream: TcpStream, handler: Arc<Mutex<Handler>>) {
    loop {
        let mut header = [0u8; 7];
        if stream.read_exact(&mut header).is_err() {
            return;
        }
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        let mut pdu = vec![0u8; length - 1];
        if stream.read_exact(&mut pdu).is_err() {
            return;
        }

        let response = {
            let mut handler = handler.lock().unwrap();
            handler.requests += 1;
            if handler.requests <= handler.unanswered {
                continue;
            }
            handler.process(&pdu)
        };

        let mut frame = header[..4].to_vec();
        frame.extend_from_slice(&((response.len() + 1) as u16).to_be_bytes());
        frame.push(header[6]);
        frame.extend_from_slice(&response);
        if stream.write_all(&frame).is_err() {
            return;
        }
    }
}

fn spawn_slave(handler: Arc<Mutex<Handler>>) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let thread = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream, handler);
    });
    (addr, thread)
}

fn config() -> MasterConfig {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();

    MasterConfig::default()
        .with_wait_to_retry(Duration::from_millis(10))
        .with_read_timeout(Some(Duration::from_millis(200)))
        .with_decode(DecodeLevel::new(
            PduDecodeLevel::DataValues,
            AduDecodeLevel::Header,
            PhysDecodeLevel::Nothing,
        ))
}

#[test]
fn can_write_and_read_registers() {
    let handler = Handler::new(0);
    let (addr, thread) = spawn_slave(handler.clone());
    let master = Master::tcp(addr, config()).unwrap();
    let unit = UnitId::new(1);

    assert_eq!(
        master.write_single_register(unit, Indexed::new(5, 0xCAFE)),
        Ok(Indexed::new(5, 0xCAFE))
    );
    assert_eq!(
        master.read_holding_registers(unit, AddressRange::try_from(4, 3).unwrap()),
        Ok(vec![
            Indexed::new(4, 0x0000),
            Indexed::new(5, 0xCAFE),
            Indexed::new(6, 0x0000)
        ])
    );
    assert_eq!(handler.lock().unwrap().holding_registers[5], 0xCAFE);

    master.close().unwrap();
    thread.join().unwrap();
}

#[test]
fn slave_exceptions_are_reported() {
    let handler = Handler::new(0);
    let (addr, thread) = spawn_slave(handler.clone());
    let master = Master::tcp(addr, config()).unwrap();

    assert_eq!(
        master.read_holding_registers(UnitId::new(1), AddressRange::try_from(8, 5).unwrap()),
        Err(RequestError::Exception(ExceptionCode::IllegalDataAddress))
    );
    assert_eq!(
        master.read_coils(UnitId::new(1), AddressRange::try_from(0, 1).unwrap()),
        Err(RequestError::Exception(ExceptionCode::IllegalFunction))
    );
    assert_eq!(handler.lock().unwrap().requests, 2);

    master.close().unwrap();
    thread.join().unwrap();
}

#[test]
fn unanswered_request_is_re_sent_after_timeout() {
    let handler = Handler::new(1);
    let (addr, thread) = spawn_slave(handler.clone());
    let master = Master::tcp(addr, config().with_retries(1)).unwrap();

    assert_eq!(
        master.read_holding_registers(UnitId::new(1), AddressRange::try_from(0, 2).unwrap()),
        Ok(vec![Indexed::new(0, 0), Indexed::new(1, 0)])
    );
    assert_eq!(handler.lock().unwrap().requests, 2);

    master.close().unwrap();
    thread.join().unwrap();
}

#[test]
fn gives_up_once_retries_are_exhausted() {
    let handler = Handler::new(usize::MAX);
    let (addr, thread) = spawn_slave(handler.clone());
    let master = Master::tcp(addr, config().with_retries(2)).unwrap();

    assert!(matches!(
        master.read_holding_registers(UnitId::new(1), AddressRange::try_from(0, 1).unwrap()),
        Err(RequestError::Io(_))
    ));
    assert_eq!(handler.lock().unwrap().requests, 3);

    master.close().unwrap();
    thread.join().unwrap();
}

#[tokio::test]
async fn async_master_runs_requests_on_the_blocking_pool() {
    let handler = Handler::new(0);
    let (addr, thread) = spawn_slave(handler.clone());
    let master = AsyncMaster::new(Master::tcp(addr, config()).unwrap());

    master
        .write_single_register(UnitId::new(1), Indexed::new(0, 42))
        .await
        .unwrap();
    assert_eq!(
        master
            .read_holding_registers(UnitId::new(1), AddressRange::try_from(0, 1).unwrap())
            .await,
        Ok(vec![Indexed::new(0, 42)])
    );

    master.master().close().unwrap();
    thread.join().unwrap();
}
