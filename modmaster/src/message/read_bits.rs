use std::fmt::Formatter;

use crate::common::bits::{num_bytes_for_bits, unpack_bits};
use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::Serialize;
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::{AddressRange, Indexed, ReadBitsRange, ValuesDisplay};

/// read coils (0x01) or read discrete inputs (0x02)
pub(crate) struct ReadBits {
    function: FunctionCode,
    range: ReadBitsRange,
}

impl ReadBits {
    pub(crate) fn coils(range: ReadBitsRange) -> Self {
        Self {
            function: FunctionCode::ReadCoils,
            range,
        }
    }

    pub(crate) fn discrete_inputs(range: ReadBitsRange) -> Self {
        Self {
            function: FunctionCode::ReadDiscreteInputs,
            range,
        }
    }

    fn range(&self) -> AddressRange {
        self.range.get()
    }
}

impl ModbusRequest for ReadBits {
    type Response = Vec<Indexed<bool>>;

    fn function(&self) -> u8 {
        self.function.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.range().serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let range = self.range();
        let bytes = cursor.read_counted_bytes()?;
        let expected = num_bytes_for_bits(range.count);
        if bytes.len() != expected {
            return Err(AduParseError::RequestByteCountMismatch(expected, bytes.len()).into());
        }
        Ok(range
            .iter()
            .zip(unpack_bits(bytes, range.count))
            .map(|(index, value)| Indexed::new(index, value))
            .collect())
    }

    fn fmt_request(&self, f: &mut Formatter, _level: PduDecodeLevel) -> std::fmt::Result {
        write!(f, "{}", self.range())
    }

    fn fmt_response(
        &self,
        response: &Self::Response,
        f: &mut Formatter,
        level: PduDecodeLevel,
    ) -> std::fmt::Result {
        write!(f, "{}", ValuesDisplay::new(level, self.range(), response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::test_util::{parse_body, request_pdu};

    fn request(start: u16, count: u16) -> ReadBits {
        ReadBits::coils(
            AddressRange::try_from(start, count)
                .unwrap()
                .of_read_bits()
                .unwrap(),
        )
    }

    #[test]
    fn serializes_read_coils() {
        assert_eq!(
            request_pdu(&request(0x0013, 0x0013)),
            vec![0x01, 0x00, 0x13, 0x00, 0x13]
        );
        let inputs = ReadBits::discrete_inputs(
            AddressRange::try_from(0x00C4, 0x0016)
                .unwrap()
                .of_read_bits()
                .unwrap(),
        );
        assert_eq!(request_pdu(&inputs), vec![0x02, 0x00, 0xC4, 0x00, 0x16]);
    }

    #[test]
    fn unpacks_only_the_requested_bits() {
        let values = parse_body(&request(10, 3), &[0x01, 0xFD]).unwrap();
        assert_eq!(
            values,
            vec![
                Indexed::new(10, true),
                Indexed::new(11, false),
                Indexed::new(12, true)
            ]
        );
    }

    #[test]
    fn decodes_one_and_the_maximum_number_of_bits() {
        assert_eq!(
            parse_body(&request(0xFFFF, 1), &[0x01, 0x01]),
            Ok(vec![Indexed::new(0xFFFF, true)])
        );

        let max = request(0, 2000);
        assert_eq!(request_pdu(&max), vec![0x01, 0x00, 0x00, 0x07, 0xD0]);
        let mut body = vec![0xFA];
        body.extend_from_slice(&[0xAA; 250]);
        let values = parse_body(&max, &body).unwrap();
        assert_eq!(values.len(), 2000);
        assert!(values.iter().all(|x| x.value == (x.index % 2 == 1)));
        assert_eq!(values[1999], Indexed::new(1999, true));
    }

    #[test]
    fn byte_count_must_match_the_requested_bits() {
        assert_eq!(
            parse_body(&request(0, 9), &[0x01, 0xFF]),
            Err(AduParseError::RequestByteCountMismatch(2, 1).into())
        );
    }

    #[test]
    fn byte_count_beyond_the_frame_fails() {
        assert_eq!(
            parse_body(&request(0, 9), &[0x02, 0xFF]),
            Err(AduParseError::InsufficientBytesForByteCount(2, 1).into())
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_eq!(
            parse_body(&request(0, 8), &[0x01, 0xFF, 0x00]),
            Err(AduParseError::TrailingBytes(1).into())
        );
    }
}
