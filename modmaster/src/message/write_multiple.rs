use std::fmt::Formatter;

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::Serialize;
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::{AddressRange, Indexed, WriteMultiple};

/// write multiple coils (0x0F) or write multiple registers (0x10)
///
/// The slave answers with the start address and count it wrote.
pub(crate) struct WriteMultipleRequest<T> {
    function: FunctionCode,
    request: WriteMultiple<T>,
}

impl WriteMultipleRequest<bool> {
    pub(crate) fn coils(request: WriteMultiple<bool>) -> Self {
        Self {
            function: FunctionCode::WriteMultipleCoils,
            request,
        }
    }
}

impl WriteMultipleRequest<u16> {
    pub(crate) fn registers(request: WriteMultiple<u16>) -> Self {
        Self {
            function: FunctionCode::WriteMultipleRegisters,
            request,
        }
    }
}

impl<T> ModbusRequest for WriteMultipleRequest<T>
where
    T: Copy,
    WriteMultiple<T>: Serialize,
    Indexed<T>: std::fmt::Display,
{
    type Response = AddressRange;

    fn function(&self) -> u8 {
        self.function.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.request.serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let start = cursor.read_u16_be()?;
        let count = cursor.read_u16_be()?;
        let range = self.request.range;
        if start != range.start || count != range.count {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }
        Ok(range)
    }

    fn broadcast_response(&self) -> Option<Self::Response> {
        Some(self.request.range)
    }

    fn fmt_request(&self, f: &mut Formatter, level: PduDecodeLevel) -> std::fmt::Result {
        write!(f, "{}", self.request.range)?;
        if level.data_values() {
            for value in self.request.indexed() {
                write!(f, "\n{value}")?;
            }
        }
        Ok(())
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
    fn serializes_registers_with_byte_count() {
        let values = WriteMultiple::from(0x0001, vec![0x000A, 0x0102]).unwrap();
        let request = WriteMultipleRequest::registers(values);
        assert_eq!(
            request_pdu(&request),
            vec![0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
    }

    #[test]
    fn serializes_packed_coils() {
        let values = vec![true, false, true, true, false, false, true, true, true, false];
        let request = WriteMultipleRequest::coils(WriteMultiple::from(0x0013, values).unwrap());
        assert_eq!(
            request_pdu(&request),
            vec![0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01]
        );
    }

    #[test]
    fn encodes_one_and_the_maximum_number_of_coils() {
        let one = WriteMultipleRequest::coils(WriteMultiple::from(5, vec![true]).unwrap());
        assert_eq!(
            request_pdu(&one),
            vec![0x0F, 0x00, 0x05, 0x00, 0x01, 0x01, 0x01]
        );
        assert_eq!(
            parse_body(&one, &[0x00, 0x05, 0x00, 0x01]),
            Ok(AddressRange::try_from(5, 1).unwrap())
        );

        let max = WriteMultipleRequest::coils(WriteMultiple::from(0, vec![true; 1968]).unwrap());
        let pdu = request_pdu(&max);
        assert_eq!(pdu.len(), 252);
        assert_eq!(&pdu[..6], &[0x0F, 0x00, 0x00, 0x07, 0xB0, 0xF6]);
        assert!(pdu[6..].iter().all(|x| *x == 0xFF));
        assert_eq!(
            parse_body(&max, &[0x00, 0x00, 0x07, 0xB0]),
            Ok(AddressRange::try_from(0, 1968).unwrap())
        );
    }

    #[test]
    fn encodes_the_maximum_number_of_registers() {
        let values: Vec<u16> = (0..123).collect();
        let max = WriteMultipleRequest::registers(WriteMultiple::from(0, values).unwrap());
        let pdu = request_pdu(&max);
        assert_eq!(pdu.len(), 252);
        assert_eq!(&pdu[..6], &[0x10, 0x00, 0x00, 0x00, 0x7B, 0xF6]);
        assert_eq!(&pdu[250..], &[0x00, 0x7A]);
        assert_eq!(
            parse_body(&max, &[0x00, 0x00, 0x00, 0x7B]),
            Ok(AddressRange::try_from(0, 123).unwrap())
        );
    }

    #[test]
    fn response_must_echo_the_range() {
        let request =
            WriteMultipleRequest::registers(WriteMultiple::from(0x0010, vec![0u16; 10]).unwrap());
        assert_eq!(
            parse_body(&request, &[0x00, 0x10, 0x00, 0x0A]),
            Ok(AddressRange::try_from(0x0010, 10).unwrap())
        );
        assert_eq!(
            parse_body(&request, &[0x00, 0x10, 0x00, 0x09]),
            Err(AduParseError::ReplyEchoMismatch.into())
        );
    }
}
