//! Encoding and decoding of the PDU for each function code

use std::fmt::{Display, Formatter};

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::frame::constants::MAX_PDU_LENGTH;
use crate::common::function::FunctionDisplay;
use crate::decode::PduDecodeLevel;
use crate::error::RequestError;
use crate::transport::length::{length_mode, Direction};
use crate::transport::LengthMode;

pub(crate) mod custom;
pub(crate) mod diagnostics;
pub(crate) mod file_record;
pub(crate) mod read_bits;
pub(crate) mod read_registers;
pub(crate) mod read_write_multiple;
pub(crate) mod write_multiple;
pub(crate) mod write_single;

pub use custom::{CustomRequest, CustomResponse};

/// A request the master can send and the response it decodes
pub(crate) trait ModbusRequest {
    type Response;

    fn function(&self) -> u8;

    /// write everything after the function code
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError>;

    /// decode everything after the function code, validating it against the request
    ///
    /// Bytes left in the cursor afterwards are rejected by the caller.
    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError>;

    /// how a serial reader delimits the response body
    fn response_length(&self) -> Option<LengthMode> {
        length_mode(Direction::Response, self.function())
    }

    /// the result of a broadcast, `None` if the request can't be broadcast
    fn broadcast_response(&self) -> Option<Self::Response> {
        None
    }

    fn fmt_request(&self, f: &mut Formatter, level: PduDecodeLevel) -> std::fmt::Result;

    fn fmt_response(
        &self,
        response: &Self::Response,
        f: &mut Formatter,
        level: PduDecodeLevel,
    ) -> std::fmt::Result;
}

/// function code followed by the serialized request
pub(crate) fn encode_pdu<R: ModbusRequest>(request: &R) -> Result<Vec<u8>, RequestError> {
    let mut buffer = [0u8; MAX_PDU_LENGTH];
    let mut cursor = WriteCursor::new(&mut buffer);
    cursor.write_u8(request.function())?;
    request.serialize(&mut cursor)?;
    Ok(cursor.written().to_vec())
}

/// parse a response body, rejecting leftover bytes
pub(crate) fn decode_response<R: ModbusRequest>(
    request: &R,
    body: &[u8],
) -> Result<R::Response, RequestError> {
    let mut cursor = ReadCursor::new(body);
    let response = request.parse_response(&mut cursor)?;
    cursor.expect_empty()?;
    Ok(response)
}

pub(crate) struct RequestDisplay<'a, R> {
    request: &'a R,
    level: PduDecodeLevel,
}

impl<'a, R: ModbusRequest> RequestDisplay<'a, R> {
    pub(crate) fn new(level: PduDecodeLevel, request: &'a R) -> Self {
        Self { request, level }
    }
}

impl<R: ModbusRequest> Display for RequestDisplay<'_, R> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", FunctionDisplay(self.request.function()))?;
        if self.level.data_headers() {
            f.write_str(" ")?;
            self.request.fmt_request(f, self.level)?;
        }
        Ok(())
    }
}

pub(crate) struct ResponseDisplay<'a, R: ModbusRequest> {
    request: &'a R,
    response: &'a R::Response,
    level: PduDecodeLevel,
}

impl<'a, R: ModbusRequest> ResponseDisplay<'a, R> {
    pub(crate) fn new(level: PduDecodeLevel, request: &'a R, response: &'a R::Response) -> Self {
        Self {
            request,
            response,
            level,
        }
    }
}

impl<R: ModbusRequest> Display for ResponseDisplay<'_, R> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", FunctionDisplay(self.request.function()))?;
        if self.level.data_headers() {
            f.write_str(" ")?;
            self.request.fmt_response(self.response, f, self.level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    pub(crate) fn request_pdu<R: ModbusRequest>(request: &R) -> Vec<u8> {
        encode_pdu(request).unwrap()
    }

    pub(crate) fn parse_body<R: ModbusRequest>(
        request: &R,
        body: &[u8],
    ) -> Result<R::Response, RequestError> {
        decode_response(request, body)
    }
}
