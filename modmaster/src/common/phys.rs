use crate::decode::PhysDecodeLevel;
use crate::error::{FrameParseError, RequestError};
use crate::stream::ByteStream;
use std::fmt::Write;

/// Byte stream with physical layer logging
pub(crate) struct PhysLayer {
    stream: Box<dyn ByteStream>,
    level: PhysDecodeLevel,
}

impl std::fmt::Debug for PhysLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("PhysLayer")
    }
}

impl PhysLayer {
    pub(crate) fn new(stream: Box<dyn ByteStream>, level: PhysDecodeLevel) -> Self {
        Self { stream, level }
    }

    pub(crate) fn stream_mut(&mut self) -> &mut dyn ByteStream {
        self.stream.as_mut()
    }

    /// fill `buffer` completely, a closed stream is reported as `UnexpectedEof`
    pub(crate) fn read_exact(&mut self, buffer: &mut [u8]) -> Result<(), RequestError> {
        let mut position = 0;
        while position < buffer.len() {
            let count = self.read_some(&mut buffer[position..])?;
            position += count;
        }
        self.log_rx(buffer);
        Ok(())
    }

    /// read up to and including the next line feed, at most `max` bytes
    pub(crate) fn read_line(&mut self, max: usize) -> Result<Vec<u8>, RequestError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            if line.len() == max {
                self.log_rx(&line);
                return Err(FrameParseError::FrameLengthTooBig(line.len() + 1, max).into());
            }
            self.read_some(&mut byte)?;
            line.push(byte[0]);
            if byte[0] == b'\n' {
                self.log_rx(&line);
                return Ok(line);
            }
        }
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> Result<(), RequestError> {
        if self.level.enabled() {
            tracing::info!("PHYS TX - {}", PhysDisplay::new(self.level, data));
        }
        self.stream.write(data)?;
        Ok(())
    }

    pub(crate) fn discard_in_buffer(&mut self) -> Result<(), RequestError> {
        self.stream.discard_in_buffer()?;
        Ok(())
    }

    fn read_some(&mut self, buffer: &mut [u8]) -> Result<usize, RequestError> {
        loop {
            match self.stream.read(buffer) {
                Ok(0) => return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()),
                Ok(count) => return Ok(count),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn log_rx(&self, data: &[u8]) {
        if self.level.enabled() {
            tracing::info!("PHYS RX - {}", PhysDisplay::new(self.level, data));
        }
    }
}

pub(crate) struct PhysDisplay<'a> {
    level: PhysDecodeLevel,
    data: &'a [u8],
}

impl<'a> PhysDisplay<'a> {
    pub(crate) fn new(level: PhysDecodeLevel, data: &'a [u8]) -> Self {
        PhysDisplay { level, data }
    }
}

impl std::fmt::Display for PhysDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} bytes", self.data.len())?;
        if self.level.data_enabled() {
            format_bytes(f, self.data)?;
        }
        Ok(())
    }
}

const BYTES_PER_DECODE_LINE: usize = 18;

pub(crate) fn format_bytes(f: &mut std::fmt::Formatter, bytes: &[u8]) -> std::fmt::Result {
    for chunk in bytes.chunks(BYTES_PER_DECODE_LINE) {
        writeln!(f)?;
        let mut first = true;
        for byte in chunk {
            if !first {
                f.write_char(' ')?;
            }
            first = false;
            write!(f, "{byte:02X?}")?;
        }
    }
    Ok(())
}
