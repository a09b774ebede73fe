use std::fmt::Formatter;

use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::function::FunctionCode;
use crate::common::traits::{Parse, Serialize};
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::message::ModbusRequest;
use crate::types::FileRecord;

/// write file record (0x15) with a single sub-request, answered by an echo
pub(crate) struct WriteFileRecord {
    record: FileRecord,
}

impl WriteFileRecord {
    pub(crate) fn new(record: FileRecord) -> Self {
        Self { record }
    }
}

impl ModbusRequest for WriteFileRecord {
    type Response = FileRecord;

    fn function(&self) -> u8 {
        FunctionCode::WriteFileRecord.get_value()
    }

    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.record.serialize(cursor)
    }

    fn parse_response(&self, cursor: &mut ReadCursor) -> Result<Self::Response, RequestError> {
        let response = FileRecord::parse(cursor)?;
        if response != self.record {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }
        Ok(response)
    }

    fn broadcast_response(&self) -> Option<Self::Response> {
        Some(self.record.clone())
    }

    fn fmt_request(&self, f: &mut Formatter, level: PduDecodeLevel) -> std::fmt::Result {
        write!(f, "{}", self.record)?;
        if level.data_values() {
            for (offset, value) in self.record.data.iter().enumerate() {
                write!(f, "\nrecord: +{offset} value: {value:#06X}")?;
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
