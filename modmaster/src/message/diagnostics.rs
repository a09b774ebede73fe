use std::fmt::Formatter;

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::{Parse, Serialize};
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::Diagnostics;

pub(crate) struct DiagnosticsRequest {
    request: Diagnostics,
    /// the data word must come back unchanged as well
    echo_data: bool,
}

impl DiagnosticsRequest {
    pub(crate) fn new(request: Diagnostics) -> Self {
        Self {
            request,
            echo_data: false,
        }
    }

    /// sub-function 0x0000, the slave returns `data` as sent
    pub(crate) fn return_query_data(data: u16) -> Self {
        Self {
            request: Diagnostics {
                sub_function: 0x0000,
                data,
            },
            echo_data: true,
        }
    }
}

impl ModbusRequest for DiagnosticsRequest {
    type Response = Diagnostics;

    fn function(&self) -> u8 {
        FunctionCode::Diagnostics.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.request.serialize(cursor)
    }

    // only the sub-function is echoed by every slave, the data word depends on it
    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let response = Diagnostics::parse(cursor)?;
        if response.sub_function != self.request.sub_function
            || (self.echo_data && response.data != self.request.data)
        {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }
        Ok(response)
    }

    fn fmt_request(&self, f: &mut Formatter, _level: PduDecodeLevel) -> std::fmt::Result {
        write!(f, "{}", self.request)
    }

    fn fmt_response(
        &self,
        response: &Self::Response,
        f: &mut Formatter,
        _level: PduDecodeLevel,
    ) -> std::fmt::Result {
        write!(f, "{response}")
    }
}
