use crate::constants::exceptions::EXCEPTION_OFFSET;
use crate::error::{AduParseError, RequestError};
use crate::exception::ExceptionCode;
use crate::types::UnitId;

pub(crate) mod constants {
    /// function code + data
    pub(crate) const MAX_PDU_LENGTH: usize = 253;
}

/// Modbus TCP transaction identifier
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
pub(crate) struct TxId {
    value: u16,
}

impl TxId {
    pub(crate) fn new(value: u16) -> Self {
        TxId { value }
    }

    pub(crate) fn to_u16(self) -> u16 {
        self.value
    }

    /// how many calls to `next` lead from `earlier` to this id
    ///
    /// Ids live on the ring 1..=65535, so 1 trails 65535 by one. Zero is never issued and
    /// has no distance.
    pub(crate) fn steps_after(self, earlier: TxId) -> Option<u16> {
        if self.value == 0 || earlier.value == 0 {
            return None;
        }
        let ring = u16::MAX as u32;
        let steps = (self.value as u32 + ring - earlier.value as u32) % ring;
        Some(steps as u16)
    }

    /// advance the counter and return the new value, skipping zero on wrap
    pub(crate) fn next(&mut self) -> TxId {
        self.value = if self.value == u16::MAX {
            1
        } else {
            self.value + 1
        };
        *self
    }
}

impl Default for TxId {
    fn default() -> Self {
        TxId::new(0)
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X}", self.value)
    }
}

/// identifies the exchange a frame belongs to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub(crate) unit_id: UnitId,
    /// only present in TCP MBAP frames
    pub(crate) tx_id: Option<TxId>,
}

impl FrameHeader {
    pub(crate) fn new_serial_header(unit_id: UnitId) -> Self {
        FrameHeader {
            unit_id,
            tx_id: None,
        }
    }

    pub(crate) fn new_tcp_header(unit_id: UnitId, tx_id: TxId) -> Self {
        FrameHeader {
            unit_id,
            tx_id: Some(tx_id),
        }
    }
}

/// a received frame stripped of its variant framing
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) header: FrameHeader,
    /// function code followed by the data
    pdu: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(header: FrameHeader, pdu: &[u8]) -> Self {
        Frame {
            header,
            pdu: pdu.to_vec(),
        }
    }

    pub(crate) fn function(&self) -> u8 {
        self.pdu.first().copied().unwrap_or(0)
    }

    /// everything after the function code
    pub(crate) fn data(&self) -> &[u8] {
        self.pdu.get(1..).unwrap_or(&[])
    }

    #[cfg(test)]
    pub(crate) fn payload(&self) -> &[u8] {
        &self.pdu
    }

    /// returns the exception code if this frame is an exception response
    pub(crate) fn exception(&self) -> Result<Option<ExceptionCode>, RequestError> {
        if self.function() & EXCEPTION_OFFSET == 0 {
            return Ok(None);
        }
        match self.data() {
            [code] => Ok(Some(ExceptionCode::from(*code))),
            [] => Err(AduParseError::InsufficientBytes.into()),
            [_, rest @ ..] => Err(AduParseError::TrailingBytes(rest.len()).into()),
        }
    }
}
