use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::stream::{normalize_timeout, ByteStream};

const DISCARD_BUFFER_SIZE: usize = 256;

impl ByteStream for TcpStream {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        Read::read(self, buffer).map_err(normalize_timeout)
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.write_all(data).map_err(normalize_timeout)
    }

    fn read_timeout(&self) -> std::io::Result<Option<Duration>> {
        TcpStream::read_timeout(self)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn write_timeout(&self) -> std::io::Result<Option<Duration>> {
        TcpStream::write_timeout(self)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn discard_in_buffer(&mut self) -> std::io::Result<()> {
        self.set_nonblocking(true)?;
        let mut buffer = [0u8; DISCARD_BUFFER_SIZE];
        let result = loop {
            match Read::read(self, &mut buffer) {
                // peer closed, the next read reports it
                Ok(0) => break Ok(()),
                Ok(count) => tracing::debug!("discarded {} pending bytes", count),
                Err(err) if err.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => break Err(err),
            }
        };
        self.set_nonblocking(false)?;
        result
    }

    fn close(&mut self) -> std::io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
