use crate::common::frame::{Frame, FrameHeader, TxId};
use crate::common::phys::{format_bytes, PhysLayer};
use crate::decode::AduDecodeLevel;
use crate::error::{FrameParseError, InternalError, RequestError};
use crate::types::UnitId;

pub(crate) mod constants {
    pub(crate) const HEADER_LENGTH: usize = 7;
    /// header and a function code
    pub(crate) const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + 1;
    /// header bytes preceding the length field's coverage
    pub(crate) const PREFIX_LENGTH: usize = 6;
    pub(crate) const MAX_LENGTH_FIELD: usize = crate::common::frame::constants::MAX_PDU_LENGTH + 1;
    pub(crate) const PROTOCOL_ID: u16 = 0;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MbapHeader {
    tx_id: TxId,
    length: usize,
}

pub(crate) fn format(
    tx_id: TxId,
    unit_id: UnitId,
    pdu: &[u8],
    level: AduDecodeLevel,
) -> Result<Vec<u8>, RequestError> {
    let length = pdu.len() + 1;
    if length > constants::MAX_LENGTH_FIELD {
        return Err(InternalError::FrameTooBig(length, constants::MAX_LENGTH_FIELD).into());
    }
    let mut frame = Vec::with_capacity(constants::HEADER_LENGTH + pdu.len());
    frame.extend_from_slice(&tx_id.to_u16().to_be_bytes());
    frame.extend_from_slice(&constants::PROTOCOL_ID.to_be_bytes());
    frame.extend_from_slice(&(length as u16).to_be_bytes());
    frame.push(unit_id.value);
    frame.extend_from_slice(pdu);

    if level.enabled() {
        tracing::info!("MBAP TX - {}", MbapDisplay::new(level, tx_id, unit_id, pdu));
    }

    Ok(frame)
}

fn parse_header(prefix: &[u8]) -> Result<MbapHeader, FrameParseError> {
    let field = |index: usize| u16::from_be_bytes([prefix[index], prefix[index + 1]]);
    let tx_id = TxId::new(field(0));
    let protocol_id = field(2);
    let length = field(4) as usize;

    if protocol_id != constants::PROTOCOL_ID {
        return Err(FrameParseError::UnknownProtocolId(protocol_id));
    }

    if length > constants::MAX_LENGTH_FIELD {
        return Err(FrameParseError::MbapLengthTooBig(
            length,
            constants::MAX_LENGTH_FIELD,
        ));
    }

    // must be > 0 b/c the 1-byte unit identifier counts towards length
    if length == 0 {
        return Err(FrameParseError::MbapLengthZero);
    }

    Ok(MbapHeader { tx_id, length })
}

/// read the header and the number of bytes its length field declares
pub(crate) fn read(phys: &mut PhysLayer) -> Result<Vec<u8>, RequestError> {
    let mut frame = vec![0u8; constants::PREFIX_LENGTH];
    phys.read_exact(&mut frame)?;
    let header = parse_header(&frame)?;
    frame.resize(constants::PREFIX_LENGTH + header.length, 0);
    phys.read_exact(&mut frame[constants::PREFIX_LENGTH..])?;
    Ok(frame)
}

/// strip the MBAP header of a raw frame
pub(crate) fn parse(raw: &[u8], level: AduDecodeLevel) -> Result<Frame, RequestError> {
    if raw.len() < constants::HEADER_LENGTH {
        return Err(FrameParseError::FrameTooShort(raw.len(), constants::HEADER_LENGTH).into());
    }
    let header = parse_header(raw)?;
    let expected = constants::PREFIX_LENGTH + header.length;
    if raw.len() < expected {
        return Err(FrameParseError::FrameTooShort(raw.len(), expected).into());
    }
    if raw.len() > expected {
        return Err(FrameParseError::FrameLengthTooBig(raw.len(), expected).into());
    }
    // a length field of one carries the unit id but no function code
    if raw.len() < constants::MIN_FRAME_LENGTH {
        return Err(FrameParseError::FrameTooShort(raw.len(), constants::MIN_FRAME_LENGTH).into());
    }
    let unit_id = UnitId::new(raw[constants::PREFIX_LENGTH]);
    let pdu = &raw[constants::HEADER_LENGTH..];

    if level.enabled() {
        tracing::info!(
            "MBAP RX - {}",
            MbapDisplay::new(level, header.tx_id, unit_id, pdu)
        );
    }

    Ok(Frame::new(FrameHeader::new_tcp_header(unit_id, header.tx_id), pdu))
}

pub(crate) struct MbapDisplay<'a> {
    level: AduDecodeLevel,
    tx_id: TxId,
    unit_id: UnitId,
    payload: &'a [u8],
}

impl<'a> MbapDisplay<'a> {
    pub(crate) fn new(
        level: AduDecodeLevel,
        tx_id: TxId,
        unit_id: UnitId,
        payload: &'a [u8],
    ) -> Self {
        MbapDisplay {
            level,
            tx_id,
            unit_id,
            payload,
        }
    }
}

impl std::fmt::Display for MbapDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "tx_id: {} unit: {} len: {}",
            self.tx_id,
            self.unit_id,
            self.payload.len() + 1,
        )?;
        if self.level.payload_enabled() {
            format_bytes(f, self.payload)?;
        }
        Ok(())
    }
}
