use crate::common::frame::constants::MAX_PDU_LENGTH;
use crate::common::function::FunctionCode;
use crate::constants::exceptions::EXCEPTION_OFFSET;
use crate::error::{FrameParseError, RequestError};

/// How the body of a frame (the bytes after the function code) is delimited
///
/// Serial framings have no length field, so the reader needs one of these rules per
/// function code to know when a frame is complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthMode {
    /// The body always has this many bytes
    Fixed(usize),
    /// The body starts with this many bytes, the last of which counts the bytes that follow it
    Offset(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Request,
    Response,
}

fn table(direction: Direction, function: FunctionCode) -> LengthMode {
    match direction {
        Direction::Request => match function {
            FunctionCode::ReadCoils => LengthMode::Fixed(4),
            FunctionCode::ReadDiscreteInputs => LengthMode::Fixed(4),
            FunctionCode::ReadHoldingRegisters => LengthMode::Fixed(4),
            FunctionCode::ReadInputRegisters => LengthMode::Fixed(4),
            FunctionCode::WriteSingleCoil => LengthMode::Fixed(4),
            FunctionCode::WriteSingleRegister => LengthMode::Fixed(4),
            FunctionCode::Diagnostics => LengthMode::Fixed(4),
            FunctionCode::WriteMultipleCoils => LengthMode::Offset(5),
            FunctionCode::WriteMultipleRegisters => LengthMode::Offset(5),
            FunctionCode::WriteFileRecord => LengthMode::Offset(1),
            FunctionCode::ReadWriteMultipleRegisters => LengthMode::Offset(9),
        },
        Direction::Response => match function {
            FunctionCode::ReadCoils => LengthMode::Offset(1),
            FunctionCode::ReadDiscreteInputs => LengthMode::Offset(1),
            FunctionCode::ReadHoldingRegisters => LengthMode::Offset(1),
            FunctionCode::ReadInputRegisters => LengthMode::Offset(1),
            FunctionCode::WriteSingleCoil => LengthMode::Fixed(4),
            FunctionCode::WriteSingleRegister => LengthMode::Fixed(4),
            FunctionCode::Diagnostics => LengthMode::Fixed(4),
            FunctionCode::WriteMultipleCoils => LengthMode::Fixed(4),
            FunctionCode::WriteMultipleRegisters => LengthMode::Fixed(4),
            FunctionCode::WriteFileRecord => LengthMode::Offset(1),
            FunctionCode::ReadWriteMultipleRegisters => LengthMode::Offset(1),
        },
    }
}

/// the length rule for a known function code
pub(crate) fn length_mode(direction: Direction, function: u8) -> Option<LengthMode> {
    FunctionCode::get(function).map(|code| table(direction, code))
}

/// Whether a slave can find the end of `pdu` sent as a serial request
///
/// Function codes without a request rule are delimited by line silence and always pass.
pub(crate) fn is_delimited_request(pdu: &[u8]) -> bool {
    let known = pdu
        .first()
        .and_then(|function| length_mode(Direction::Request, *function))
        .is_some();
    if !known {
        return true;
    }
    // unit id in front, no trailer
    let mut frame = Vec::with_capacity(1 + pdu.len());
    frame.push(0);
    frame.extend_from_slice(pdu);
    FrameLength::request(0).check_complete(&frame).is_ok()
}

/// Resolves how many more bytes complete a serial frame `[unit][function][body][trailer]`
#[derive(Copy, Clone, Debug)]
pub(crate) struct FrameLength {
    direction: Direction,
    /// rule for a function code that may not be in the table
    custom: Option<(u8, LengthMode)>,
    /// checksum bytes following the body
    trailer: usize,
}

impl FrameLength {
    pub(crate) fn request(trailer: usize) -> Self {
        Self {
            direction: Direction::Request,
            custom: None,
            trailer,
        }
    }

    pub(crate) fn response(custom: Option<(u8, LengthMode)>, trailer: usize) -> Self {
        Self {
            direction: Direction::Response,
            custom,
            trailer,
        }
    }

    fn mode(&self, function: u8) -> Result<LengthMode, RequestError> {
        if self.direction == Direction::Response && function & EXCEPTION_OFFSET != 0 {
            return Ok(LengthMode::Fixed(1));
        }
        if let Some((code, mode)) = self.custom {
            if code == function {
                return Ok(mode);
            }
        }
        length_mode(self.direction, function).ok_or(RequestError::UnsupportedFunction(function))
    }

    /// Number of bytes still missing from `frame`, zero once it is complete
    ///
    /// When the length can't be known yet, this is the count needed to reach the
    /// next byte that determines it.
    pub(crate) fn additional_bytes(&self, frame: &[u8]) -> Result<usize, RequestError> {
        match self.resolve(frame)? {
            Resolved::Partial(needed) | Resolved::Total(needed) => {
                Ok(needed.saturating_sub(frame.len()))
            }
        }
    }

    /// Check that `frame` is exactly as long as its header says
    pub(crate) fn check_complete(&self, frame: &[u8]) -> Result<(), RequestError> {
        match self.resolve(frame)? {
            Resolved::Partial(needed) => {
                Err(FrameParseError::FrameTooShort(frame.len(), needed).into())
            }
            Resolved::Total(total) if frame.len() < total => {
                Err(FrameParseError::FrameTooShort(frame.len(), total).into())
            }
            Resolved::Total(total) if frame.len() > total => {
                Err(FrameParseError::FrameLengthTooBig(frame.len(), total).into())
            }
            Resolved::Total(_) => Ok(()),
        }
    }

    fn resolve(&self, frame: &[u8]) -> Result<Resolved, RequestError> {
        // unit id and function code
        let function = match frame.get(1) {
            Some(x) => *x,
            None => return Ok(Resolved::Partial(2)),
        };
        let body = match self.mode(function)? {
            LengthMode::Fixed(length) => length,
            LengthMode::Offset(offset) => match frame.get(1 + offset) {
                Some(count) => offset + *count as usize,
                None => return Ok(Resolved::Partial(2 + offset)),
            },
        };
        let pdu_length = 1 + body;
        if pdu_length > MAX_PDU_LENGTH {
            return Err(FrameParseError::FrameLengthTooBig(pdu_length, MAX_PDU_LENGTH).into());
        }
        Ok(Resolved::Total(2 + body + self.trailer))
    }
}

enum Resolved {
    /// at least this many bytes are needed before the length is known
    Partial(usize),
    /// the total frame length
    Total(usize),
}
