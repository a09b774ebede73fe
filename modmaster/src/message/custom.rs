use std::fmt::Formatter;

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::frame::constants::MAX_PDU_LENGTH;
use crate::constants::exceptions::EXCEPTION_OFFSET;
use crate::decode::PduDecodeLevel;
use crate::error::{InvalidRequest, RequestError};
use crate::message::ModbusRequest;
use crate::transport::length::{length_mode, Direction};
use crate::transport::LengthMode;

/// A request with an arbitrary function code and payload
///
/// On serial transports the master must know how to delimit the response. Function codes the
/// library knows carry their own rule, any other code needs
/// [`CustomRequest::with_response_length`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomRequest {
    function: u8,
    data: Vec<u8>,
    response_length: Option<LengthMode>,
}

/// The payload of the response to a [`CustomRequest`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomResponse {
    /// function code of the response
    pub function: u8,
    /// bytes following the function code
    pub data: Vec<u8>,
}

impl CustomRequest {
    /// Create a request from a function code and the bytes that follow it
    pub fn new(function: u8, data: Vec<u8>) -> Result<Self, InvalidRequest> {
        if function == 0 || function >= EXCEPTION_OFFSET {
            return Err(InvalidRequest::BadFunctionCode(function));
        }
        let max = MAX_PDU_LENGTH - 1;
        if data.len() > max {
            return Err(InvalidRequest::PayloadTooLong(data.len(), max));
        }
        Ok(Self {
            function,
            data,
            response_length: None,
        })
    }

    /// Tell serial readers how the response body is delimited
    pub fn with_response_length(mut self, mode: LengthMode) -> Self {
        self.response_length = Some(mode);
        self
    }

    /// function code of the request
    pub fn function(&self) -> u8 {
        self.function
    }

    /// bytes following the function code
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ModbusRequest for CustomRequest {
    type Response = CustomResponse;

    fn function(&self) -> u8 {
        self.function
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_bytes(&self.data)?;
        Ok(())
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let data = cursor.read_bytes(cursor.remaining())?;
        Ok(CustomResponse {
            function: self.function,
            data: data.to_vec(),
        })
    }

    fn response_length(&self) -> Option<LengthMode> {
        self.response_length
            .or_else(|| length_mode(Direction::Response, self.function))
    }

    // nothing comes back from a broadcast
    fn broadcast_response(&self) -> Option<Self::Response> {
        Some(CustomResponse {
            function: self.function,
            data: Vec::new(),
        })
    }

    fn fmt_request(&self, f: &mut Formatter, level: PduDecodeLevel) -> std::fmt::Result {
        write!(f, "length: {}", self.data.len())?;
        if level.data_values() {
            write!(f, "\n{}", hex::encode_upper(&self.data))?;
        }
        Ok(())
    }

    fn fmt_response(
        &self,
        response: &Self::Response,
        f: &mut Formatter,
        level: PduDecodeLevel,
    ) -> std::fmt::Result {
        write!(f, "length: {}", response.data.len())?;
        if level.data_values() {
            write!(f, "\n{}", hex::encode_upper(&response.data))?;
        }
        Ok(())
    }
}
