use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use crate::stream::{normalize_timeout, ByteStream};

/// largest payload of a single datagram
const MAX_DATAGRAM_SIZE: usize = 65507;

/// A connected UDP socket presented as a byte stream
///
/// Each write is sent as one datagram. Received datagrams are buffered so that the
/// master can read them piecewise like a stream.
#[derive(Debug)]
pub struct UdpStream {
    socket: UdpSocket,
    pending: Vec<u8>,
    position: usize,
}

impl UdpStream {
    /// Bind an ephemeral local port and connect it to `remote`
    pub fn connect<A: ToSocketAddrs>(remote: A) -> std::io::Result<Self> {
        let remote = resolve(remote)?;
        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(remote)?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap a socket that is already connected to its peer
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            pending: Vec::new(),
            position: 0,
        }
    }

    fn buffered(&self) -> &[u8] {
        &self.pending[self.position..]
    }
}

fn resolve<A: ToSocketAddrs>(remote: A) -> std::io::Result<SocketAddr> {
    remote
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "no address to connect to"))
}

impl ByteStream for UdpStream {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        if self.buffered().is_empty() {
            self.pending.resize(MAX_DATAGRAM_SIZE, 0);
            let count = match self.socket.recv(&mut self.pending) {
                Ok(count) => count,
                Err(err) => {
                    self.pending.clear();
                    self.position = 0;
                    return Err(normalize_timeout(err));
                }
            };
            self.pending.truncate(count);
            self.position = 0;
        }
        let available = self.buffered();
        let count = available.len().min(buffer.len());
        buffer[..count].copy_from_slice(&available[..count]);
        self.position += count;
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        let sent = self.socket.send(data).map_err(normalize_timeout)?;
        if sent != data.len() {
            return Err(std::io::Error::from(ErrorKind::WriteZero));
        }
        Ok(())
    }

    fn read_timeout(&self) -> std::io::Result<Option<Duration>> {
        self.socket.read_timeout()
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    fn write_timeout(&self) -> std::io::Result<Option<Duration>> {
        self.socket.write_timeout()
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.socket.set_write_timeout(timeout)
    }

    fn discard_in_buffer(&mut self) -> std::io::Result<()> {
        self.pending.clear();
        self.position = 0;
        self.socket.set_nonblocking(true)?;
        let mut scratch = [0u8; 512];
        let result = loop {
            match self.socket.recv(&mut scratch) {
                Ok(count) => tracing::debug!("discarded datagram of {} bytes", count),
                Err(err) if err.kind() == ErrorKind::WouldBlock => break Ok(()),
                // ICMP port unreachable from an earlier send
                Err(err) if err.kind() == ErrorKind::ConnectionRefused => break Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => break Err(err),
            }
        };
        self.socket.set_nonblocking(false)?;
        result
    }
}
