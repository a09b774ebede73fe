use std::fmt::{Display, Formatter};

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::{Parse, Serialize};
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::Indexed;

/// write single coil (0x05) or write single register (0x06), answered by an echo
pub(crate) struct WriteSingle<T> {
    function: FunctionCode,
    request: Indexed<T>,
}

impl WriteSingle<bool> {
    pub(crate) fn coil(request: Indexed<bool>) -> Self {
        Self {
            function: FunctionCode::WriteSingleCoil,
            request,
        }
    }
}

impl WriteSingle<u16> {
    pub(crate) fn register(request: Indexed<u16>) -> Self {
        Self {
            function: FunctionCode::WriteSingleRegister,
            request,
        }
    }
}

impl<T> ModbusRequest for WriteSingle<T>
where
    T: Copy + PartialEq,
    Indexed<T>: Serialize + Parse + Display,
{
    type Response = Indexed<T>;

    fn function(&self) -> u8 {
        self.function.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.request.serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let response = Indexed::<T>::parse(cursor)?;
        if response != self.request {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }
        Ok(response)
    }

    fn broadcast_response(&self) -> Option<Self::Response> {
        Some(self.request)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::test_util::{parse_body, request_pdu};

    #[test]
    fn coil_state_is_encoded_as_ff00() {
        let request = WriteSingle::coil(Indexed::new(0x00AC, true));
        assert_eq!(request_pdu(&request), vec![0x05, 0x00, 0xAC, 0xFF, 0x00]);
    }

    #[test]
    fn echo_is_returned() {
        let request = WriteSingle::register(Indexed::new(0x0001, 0x0003));
        assert_eq!(
            parse_body(&request, &[0x00, 0x01, 0x00, 0x03]),
            Ok(Indexed::new(0x0001, 0x0003))
        );
    }

    #[test]
    fn different_echo_is_rejected() {
        let request = WriteSingle::register(Indexed::new(0x0001, 0x0003));
        assert_eq!(
            parse_body(&request, &[0x00, 0x01, 0x00, 0x04]),
            Err(AduParseError::ReplyEchoMismatch.into())
        );
    }

    #[test]
    fn unknown_coil_state_in_echo_is_rejected() {
        let request = WriteSingle::coil(Indexed::new(0x0001, false));
        assert_eq!(
            parse_body(&request, &[0x00, 0x01, 0x12, 0x34]),
            Err(AduParseError::UnknownCoilState(0x1234).into())
        );
    }
}
