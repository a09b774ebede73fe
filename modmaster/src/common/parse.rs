use crate::common::cursor::ReadCursor;
use crate::common::traits::Parse;
use crate::constants::file_record;
use crate::error::*;
use crate::types::{coil_from_u16, Diagnostics, FileRecord, Indexed};

impl Parse for Indexed<bool> {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, RequestError> {
        Ok(Indexed::new(
            cursor.read_u16_be()?,
            coil_from_u16(cursor.read_u16_be()?)?,
        ))
    }
}

impl Parse for Indexed<u16> {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, RequestError> {
        Ok(Indexed::new(cursor.read_u16_be()?, cursor.read_u16_be()?))
    }
}

impl Parse for Diagnostics {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, RequestError> {
        Ok(Diagnostics {
            sub_function: cursor.read_u16_be()?,
            data: cursor.read_u16_be()?,
        })
    }
}

impl Parse for FileRecord {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, RequestError> {
        let mut sub_request = ReadCursor::new(cursor.read_counted_bytes()?);
        let reference_type = sub_request.read_u8()?;
        if reference_type != file_record::REFERENCE_TYPE {
            return Err(AduParseError::UnknownReferenceType(reference_type).into());
        }
        let file_number = sub_request.read_u16_be()?;
        let record_number = sub_request.read_u16_be()?;
        let length = sub_request.read_u16_be()? as usize;
        if sub_request.remaining() != 2 * length {
            return Err(
                AduParseError::RequestByteCountMismatch(2 * length, sub_request.remaining()).into(),
            );
        }
        let mut data = Vec::with_capacity(length);
        for _ in 0..length {
            data.push(sub_request.read_u16_be()?);
        }
        Ok(FileRecord {
            file_number,
            record_number,
            data,
        })
    }
}
