use std::fmt::Formatter;

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::Serialize;
use crate::decode::PduDecodeLevel;
use crate::error::RequestError;
use crate::message::read_registers::parse_registers;
use crate::message::ModbusRequest;
use crate::types::{Indexed, ReadWriteMultiple, ValuesDisplay};

/// read/write multiple registers (0x17)
///
/// The slave performs the write before the read.
pub(crate) struct ReadWriteMultipleRequest {
    request: ReadWriteMultiple,
}

impl ReadWriteMultipleRequest {
    pub(crate) fn new(request: ReadWriteMultiple) -> Self {
        Self { request }
    }
}

impl ModbusRequest for ReadWriteMultipleRequest {
    type Response = Vec<Indexed<u16>>;

    fn function(&self) -> u8 {
        FunctionCode::ReadWriteMultipleRegisters.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.request.serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        parse_registers(self.request.read_range, cursor)
    }

    fn fmt_request(&self, f: &mut Formatter, level: PduDecodeLevel) -> std::fmt::Result {
        write!(
            f,
            "read: {} write: {}",
            self.request.read_range, self.request.write.range
        )?;
        if level.data_values() {
            for value in self.request.write.indexed() {
                write!(f, "\n{value}")?;
            }
        }
        Ok(())
    }

    fn fmt_response(
        &self,
        response: &Self::Response,
        f: &mut Formatter,
        level: PduDecodeLevel,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            ValuesDisplay::new(level, self.request.read_range, response)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AduParseError;
    use crate::message::test_util::{parse_body, request_pdu};
    use crate::types::{AddressRange, WriteMultiple};

    fn request() -> ReadWriteMultipleRequest {
        ReadWriteMultipleRequest::new(
            ReadWriteMultiple::new(
                AddressRange::try_from(0x0003, 2).unwrap(),
                WriteMultiple::from(0x000E, vec![0x00FF, 0x00FE, 0x00FD]).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn serializes_read_range_before_write_block() {
        assert_eq!(
            request_pdu(&request()),
            vec![
                0x17, 0x00, 0x03, 0x00, 0x02, 0x00, 0x0E, 0x00, 0x03, 0x06, 0x00, 0xFF, 0x00,
                0xFE, 0x00, 0xFD
            ]
        );
    }

    #[test]
    fn parses_the_read_registers() {
        assert_eq!(
            parse_body(&request(), &[0x04, 0x00, 0xFE, 0x0A, 0xCD]),
            Ok(vec![Indexed::new(3, 0x00FE), Indexed::new(4, 0x0ACD)])
        );
    }

    #[test]
    fn encodes_and_decodes_the_maximum_counts() {
        let request = ReadWriteMultipleRequest::new(
            ReadWriteMultiple::new(
                AddressRange::try_from(0, 125).unwrap(),
                WriteMultiple::from(0x0100, vec![0xBEEF; 121]).unwrap(),
            )
            .unwrap(),
        );
        let pdu = request_pdu(&request);
        assert_eq!(pdu.len(), 252);
        assert_eq!(
            &pdu[..10],
            &[0x17, 0x00, 0x00, 0x00, 0x7D, 0x01, 0x00, 0x00, 0x79, 0xF2]
        );

        let mut body = vec![0xFA];
        for value in 0..125u16 {
            body.extend_from_slice(&(0x1000 + value).to_be_bytes());
        }
        let values = parse_body(&request, &body).unwrap();
        assert_eq!(values.len(), 125);
        assert!(values.iter().all(|x| x.value == 0x1000 + x.index));
    }

    #[test]
    fn register_count_must_match_the_read_range() {
        assert_eq!(
            parse_body(&request(), &[0x02, 0x00, 0xFE]),
            Err(AduParseError::RequestByteCountMismatch(4, 2).into())
        );
    }
}
