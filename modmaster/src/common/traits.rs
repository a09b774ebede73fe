use crate::common::cursor::*;
use crate::error::*;

/// Writes a value into a request body
pub(crate) trait Serialize {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError>;
}

/// Reads a value out of a response body
pub(crate) trait Parse: Sized {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, RequestError>;
}
