use std::fmt::Formatter;

use crate::common::bits::num_bytes_for_registers;
use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::Serialize;
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::{AddressRange, Indexed, ReadRegistersRange, ValuesDisplay};

/// read holding registers (0x03) or read input registers (0x04)
pub(crate) struct ReadRegisters {
    function: FunctionCode,
    range: ReadRegistersRange,
}

impl ReadRegisters {
    pub(crate) fn holding(range: ReadRegistersRange) -> Self {
        Self {
            function: FunctionCode::ReadHoldingRegisters,
            range,
        }
    }

    pub(crate) fn input(range: ReadRegistersRange) -> Self {
        Self {
            function: FunctionCode::ReadInputRegisters,
            range,
        }
    }

    fn range(&self) -> AddressRange {
        self.range.get()
    }
}

/// decode `[byte count][registers]` for exactly the registers in `range`
pub(crate) fn parse_registers(
    range: AddressRange,
    cursor: &mut ReadCursor,
) -> Result<Vec<Indexed<u16>>, RequestError> {
    let bytes = cursor.read_counted_bytes()?;
    let expected = num_bytes_for_registers(range.count);
    if bytes.len() != expected {
        return Err(AduParseError::RequestByteCountMismatch(expected, bytes.len()).into());
    }
    let mut registers = ReadCursor::new(bytes);
    let mut values = Vec::with_capacity(range.count as usize);
    for index in range.iter() {
        values.push(Indexed::new(index, registers.read_u16_be()?));
    }
    Ok(values)
}

impl ModbusRequest for ReadRegisters {
    type Response = Vec<Indexed<u16>>;

    fn function(&self) -> u8 {
        self.function.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.range().serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        parse_registers(self.range(), cursor)
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
