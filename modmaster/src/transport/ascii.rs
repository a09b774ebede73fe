use crate::checksum;
use crate::common::frame::{Frame, FrameHeader};
use crate::common::phys::{format_bytes, PhysLayer};
use crate::decode::AduDecodeLevel;
use crate::error::{FrameParseError, RequestError};
use crate::transport::length::FrameLength;
use crate::types::UnitId;

pub(crate) mod constants {
    pub(crate) const START: u8 = b':';
    pub(crate) const END: &[u8] = b"\r\n";
    pub(crate) const HEADER_LENGTH: usize = 1;
    pub(crate) const LRC_LENGTH: usize = 1;
    /// unit id, function code and LRC
    pub(crate) const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + 1 + LRC_LENGTH;
    /// delimiters plus two hex digits for every binary byte
    pub(crate) const MAX_LINE_LENGTH: usize = 1
        + 2 * (HEADER_LENGTH + crate::common::frame::constants::MAX_PDU_LENGTH + LRC_LENGTH)
        + 2;
}

pub(crate) fn format(unit_id: UnitId, pdu: &[u8], level: AduDecodeLevel) -> Vec<u8> {
    let mut binary =
        Vec::with_capacity(constants::HEADER_LENGTH + pdu.len() + constants::LRC_LENGTH);
    binary.push(unit_id.value);
    binary.extend_from_slice(pdu);
    let lrc = checksum::lrc(&binary);
    binary.push(lrc);

    if level.enabled() {
        tracing::info!("ASCII TX - {}", AsciiDisplay::new(level, unit_id, pdu, lrc));
    }

    let mut line = Vec::with_capacity(2 * binary.len() + 3);
    line.push(constants::START);
    line.extend_from_slice(hex::encode_upper(&binary).as_bytes());
    line.extend_from_slice(constants::END);
    line
}

/// read one line and decode it to binary without checking the LRC
pub(crate) fn read(phys: &mut PhysLayer) -> Result<Vec<u8>, RequestError> {
    let line = phys.read_line(constants::MAX_LINE_LENGTH)?;
    decode_line(&line)
}

pub(crate) fn decode_line(line: &[u8]) -> Result<Vec<u8>, RequestError> {
    match line.first() {
        Some(&constants::START) => {}
        Some(other) => return Err(FrameParseError::MissingStartDelimiter(*other).into()),
        None => return Err(FrameParseError::FrameTooShort(0, constants::MIN_FRAME_LENGTH).into()),
    }
    let digits = match line.strip_suffix(constants::END) {
        Some(x) => &x[1..],
        None => return Err(FrameParseError::MissingEndDelimiter.into()),
    };
    hex::decode(digits).map_err(|_| FrameParseError::BadHexEncoding.into())
}

/// verify the LRC and the length of a decoded frame and strip the framing
pub(crate) fn parse(
    binary: &[u8],
    length: FrameLength,
    level: AduDecodeLevel,
) -> Result<Frame, RequestError> {
    if binary.len() < constants::MIN_FRAME_LENGTH {
        return Err(
            FrameParseError::FrameTooShort(binary.len(), constants::MIN_FRAME_LENGTH).into(),
        );
    }
    checksum::verify_lrc(binary)?;
    length.check_complete(binary)?;

    let unit_id = UnitId::new(binary[0]);
    let pdu = &binary[constants::HEADER_LENGTH..binary.len() - constants::LRC_LENGTH];
    let lrc = binary[binary.len() - 1];

    if level.enabled() {
        tracing::info!("ASCII RX - {}", AsciiDisplay::new(level, unit_id, pdu, lrc));
    }

    Ok(Frame::new(FrameHeader::new_serial_header(unit_id), pdu))
}

pub(crate) struct AsciiDisplay<'a> {
    level: AduDecodeLevel,
    unit_id: UnitId,
    payload: &'a [u8],
    lrc: u8,
}

impl<'a> AsciiDisplay<'a> {
    pub(crate) fn new(level: AduDecodeLevel, unit_id: UnitId, payload: &'a [u8], lrc: u8) -> Self {
        AsciiDisplay {
            level,
            unit_id,
            payload,
            lrc,
        }
    }
}

impl std::fmt::Display for AsciiDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "unit: {} lrc: {:#04X} (payload len = {})",
            self.unit_id,
            self.lrc,
            self.payload.len(),
        )?;
        if self.level.payload_enabled() {
            format_bytes(f, self.payload)?;
        }
        Ok(())
    }
}
