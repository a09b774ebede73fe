//! CRC16 and LRC codecs used by the serial framings
//!
//! The CRC table for the Modbus polynomial is built at compile time by the `crc` crate.

use crate::error::FrameParseError;

const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

/// compute the Modbus CRC16 of `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC.checksum(data)
}

/// the CRC16 of `data` as it appears on the wire, low byte first
pub fn crc16_bytes(data: &[u8]) -> [u8; 2] {
    crc16(data).to_le_bytes()
}

/// check that the trailing two bytes of `frame` are the CRC16 of everything before them
pub fn verify_crc16(frame: &[u8]) -> Result<(), FrameParseError> {
    let split = match frame.len().checked_sub(2) {
        Some(x) => x,
        None => return Err(FrameParseError::FrameTooShort(frame.len(), 2)),
    };
    let (data, trailer) = frame.split_at(split);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    let expected = crc16(data);
    if received != expected {
        return Err(FrameParseError::CrcValidationFailure(received, expected));
    }
    Ok(())
}

/// compute the Modbus LRC of `data`: the two's complement of the 8-bit sum
pub fn lrc(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
        .wrapping_neg()
}

/// check that the final byte of `frame` is the LRC of everything before it
pub fn verify_lrc(frame: &[u8]) -> Result<(), FrameParseError> {
    match frame.split_last() {
        Some((received, data)) => {
            let expected = lrc(data);
            if *received != expected {
                return Err(FrameParseError::LrcValidationFailure(*received, expected));
            }
            Ok(())
        }
        None => Err(FrameParseError::FrameTooShort(0, 1)),
    }
}
