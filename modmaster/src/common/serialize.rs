use crate::common::bits::{num_bytes_for_registers, pack_bits};
use crate::common::cursor::WriteCursor;
use crate::common::traits::Serialize;
use crate::constants::file_record;
use crate::error::*;
use crate::types::{
    coil_to_u16, AddressRange, Diagnostics, FileRecord, Indexed, ReadWriteMultiple, WriteMultiple,
};

pub(crate) fn calc_bytes_for_bits(num_bits: usize) -> Result<u8, InternalError> {
    let count = (num_bits + 7) / 8;
    u8::try_from(count).map_err(|_| InternalError::BadByteCount(count))
}

pub(crate) fn calc_bytes_for_registers(num_registers: usize) -> Result<u8, InternalError> {
    let count = 2 * num_registers;
    u8::try_from(count).map_err(|_| InternalError::BadByteCount(count))
}

impl Serialize for AddressRange {
    fn serialize(&self, cur: &mut WriteCursor) -> Result<(), RequestError> {
        cur.write_u16_be(self.start)?;
        cur.write_u16_be(self.count)?;
        Ok(())
    }
}

impl Serialize for Indexed<bool> {
    fn serialize(&self, cur: &mut WriteCursor) -> Result<(), RequestError> {
        cur.write_u16_be(self.index)?;
        cur.write_u16_be(coil_to_u16(self.value))?;
        Ok(())
    }
}

impl Serialize for Indexed<u16> {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u16_be(self.index)?;
        cursor.write_u16_be(self.value)?;
        Ok(())
    }
}

impl Serialize for [bool] {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u8(calc_bytes_for_bits(self.len())?)?;
        for byte in pack_bits(self) {
            cursor.write_u8(byte)?;
        }
        Ok(())
    }
}

impl Serialize for [u16] {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u8(calc_bytes_for_registers(self.len())?)?;
        for value in self {
            cursor.write_u16_be(*value)?
        }
        Ok(())
    }
}

impl Serialize for WriteMultiple<bool> {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.range.serialize(cursor)?;
        self.values.as_slice().serialize(cursor)
    }
}

impl Serialize for WriteMultiple<u16> {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.range.serialize(cursor)?;
        self.values.as_slice().serialize(cursor)
    }
}

impl Serialize for Diagnostics {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u16_be(self.sub_function)?;
        cursor.write_u16_be(self.data)?;
        Ok(())
    }
}

impl Serialize for FileRecord {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        let data_length = num_bytes_for_registers(self.data.len() as u16);
        let byte_count = file_record::SUB_REQUEST_HEADER_LENGTH + data_length;
        let byte_count =
            u8::try_from(byte_count).map_err(|_| InternalError::BadByteCount(byte_count))?;
        cursor.write_u8(byte_count)?;
        cursor.write_u8(file_record::REFERENCE_TYPE)?;
        cursor.write_u16_be(self.file_number)?;
        cursor.write_u16_be(self.record_number)?;
        cursor.write_u16_be(self.data.len() as u16)?;
        for value in &self.data {
            cursor.write_u16_be(*value)?;
        }
        Ok(())
    }
}

impl Serialize for ReadWriteMultiple {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.read_range.serialize(cursor)?;
        self.write.serialize(cursor)
    }
}
