//! Blocking byte streams the master exchanges frames over
//!
//! The master depends only on the [`ByteStream`] trait. Implementations are provided for
//! [`std::net::TcpStream`], connected UDP sockets and, with the `serial` feature, serial ports.

use std::io::ErrorKind;
use std::time::Duration;

mod tcp;
mod udp;

#[cfg(feature = "serial")]
mod serial;

pub use udp::UdpStream;

#[cfg(feature = "serial")]
pub use serial::*;

/// A duplex, blocking byte channel with timeouts
pub trait ByteStream: Send {
    /// Read at most `buffer.len()` bytes, blocking until at least one is available
    ///
    /// Returns zero when the stream has been closed. A read that exceeds the read timeout
    /// fails with [`ErrorKind::TimedOut`] or [`ErrorKind::WouldBlock`].
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize>;

    /// Write all of `data`
    fn write(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// current read timeout
    fn read_timeout(&self) -> std::io::Result<Option<Duration>>;

    /// change the read timeout, `None` blocks forever
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;

    /// current write timeout
    fn write_timeout(&self) -> std::io::Result<Option<Duration>>;

    /// change the write timeout, `None` blocks forever
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;

    /// Drop any bytes received but not yet read
    ///
    /// Best effort. Called before every request is written.
    fn discard_in_buffer(&mut self) -> std::io::Result<()>;

    /// Close the stream, further reads and writes fail
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Socket timeouts are reported as `WouldBlock` on some platforms
pub(crate) fn normalize_timeout(err: std::io::Error) -> std::io::Error {
    match err.kind() {
        ErrorKind::WouldBlock => std::io::Error::from(ErrorKind::TimedOut),
        _ => err,
    }
}
