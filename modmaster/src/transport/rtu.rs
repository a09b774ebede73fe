use crate::checksum;
use crate::common::frame::{Frame, FrameHeader};
use crate::common::phys::{format_bytes, PhysLayer};
use crate::decode::AduDecodeLevel;
use crate::error::{FrameParseError, RequestError};
use crate::transport::length::FrameLength;
use crate::types::UnitId;

pub(crate) mod constants {
    pub(crate) const HEADER_LENGTH: usize = 1;
    pub(crate) const CRC_LENGTH: usize = 2;
    /// unit id, function code and CRC
    pub(crate) const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + 1 + CRC_LENGTH;
    /// bytes read before the length of a response can be resolved
    pub(crate) const RESPONSE_FRAME_START_LENGTH: usize = 4;
}

pub(crate) fn format(unit_id: UnitId, pdu: &[u8], level: AduDecodeLevel) -> Vec<u8> {
    let mut frame =
        Vec::with_capacity(constants::HEADER_LENGTH + pdu.len() + constants::CRC_LENGTH);
    frame.push(unit_id.value);
    frame.extend_from_slice(pdu);
    let crc = checksum::crc16(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());

    if level.enabled() {
        tracing::info!("RTU TX - {}", RtuDisplay::new(level, unit_id, pdu, crc));
    }

    frame
}

/// read a complete frame without checking its CRC
pub(crate) fn read(
    phys: &mut PhysLayer,
    length: FrameLength,
    start: usize,
) -> Result<Vec<u8>, RequestError> {
    let mut frame = vec![0u8; start];
    phys.read_exact(&mut frame)?;
    loop {
        let more = length.additional_bytes(&frame)?;
        if more == 0 {
            return Ok(frame);
        }
        let position = frame.len();
        frame.resize(position + more, 0);
        phys.read_exact(&mut frame[position..])?;
    }
}

/// verify the CRC of a raw frame and strip the framing
pub(crate) fn parse(raw: &[u8], level: AduDecodeLevel) -> Result<Frame, RequestError> {
    if raw.len() < constants::MIN_FRAME_LENGTH {
        return Err(FrameParseError::FrameTooShort(raw.len(), constants::MIN_FRAME_LENGTH).into());
    }
    checksum::verify_crc16(raw)?;
    let unit_id = UnitId::new(raw[0]);
    let pdu = &raw[constants::HEADER_LENGTH..raw.len() - constants::CRC_LENGTH];
    let crc = u16::from_le_bytes([raw[raw.len() - 2], raw[raw.len() - 1]]);

    if level.enabled() {
        tracing::info!("RTU RX - {}", RtuDisplay::new(level, unit_id, pdu, crc));
    }

    Ok(Frame::new(FrameHeader::new_serial_header(unit_id), pdu))
}

pub(crate) struct RtuDisplay<'a> {
    level: AduDecodeLevel,
    unit_id: UnitId,
    payload: &'a [u8],
    crc: u16,
}

impl<'a> RtuDisplay<'a> {
    pub(crate) fn new(level: AduDecodeLevel, unit_id: UnitId, payload: &'a [u8], crc: u16) -> Self {
        RtuDisplay {
            level,
            unit_id,
            payload,
            crc,
        }
    }
}

impl std::fmt::Display for RtuDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "unit: {} crc: {:#06X} (payload len = {})",
            self.unit_id,
            self.crc,
            self.payload.len(),
        )?;
        if self.level.payload_enabled() {
            format_bytes(f, self.payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::function::FunctionCode;
    use crate::mock::{Action, MockStream};
    use crate::decode::PhysDecodeLevel;

    /// bytes read before the length of a request can be resolved
    const REQUEST_FRAME_START_LENGTH: usize = 7;

    const UNIT_ID: u8 = 0x2A;

    const READ_COILS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x01,    // function code
        0x00, 0x10, // starting address
        0x00, 0x13, // qty of outputs
        0x7A, 0x19, // crc
    ];

    const READ_COILS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x01,    // function code
        0x03,    // byte count
        0xCD, 0x6B, 0x05, // output status
        0x44, 0x99, // crc
    ];

    const READ_DISCRETE_INPUTS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x02,    // function code
        0x00, 0x10, // starting address
        0x00, 0x13, // qty of outputs
        0x3E, 0x19, // crc
    ];

    const READ_DISCRETE_INPUTS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x02,    // function code
        0x03,    // byte count
        0xCD, 0x6B, 0x05, // output status
        0x00, 0x99, // crc
    ];

    const READ_HOLDING_REGISTERS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x03,    // function code
        0x00, 0x10, // starting address
        0x00, 0x03, // qty of registers
        0x02, 0x15, // crc
    ];

    const READ_HOLDING_REGISTERS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x03,    // function code
        0x06,    // byte count
        0x12, 0x34, 0x56, 0x78, 0x23, 0x45, // register values
        0x30, 0x60, // crc
    ];

    const READ_INPUT_REGISTERS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x04,    // function code
        0x00, 0x10, // starting address
        0x00, 0x03, // qty of registers
        0xB7, 0xD5, // crc
    ];

    const READ_INPUT_REGISTERS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x04,    // function code
        0x06,    // byte count
        0x12, 0x34, 0x56, 0x78, 0x23, 0x45, // register values
        0x71, 0x86, // crc
    ];

    const WRITE_SINGLE_COIL_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x05,    // function code
        0x00, 0x10, // output address
        0xFF, 0x00, // output value
        0x8B, 0xE4, // crc
    ];

    const WRITE_SINGLE_REGISTER_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x06,    // function code
        0x00, 0x10, // output address
        0x12, 0x34, // output value
        0x83, 0x63, // crc
    ];

    const WRITE_MULTIPLE_COILS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x0F,    // function code
        0x00, 0x10, // starting address
        0x00, 0x0A, // qty of outputs
        0x02, // byte count
        0x12, 0x34, // output values
        0x00, 0x2E, // crc
    ];

    const WRITE_MULTIPLE_COILS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x0F,    // function code
        0x00, 0x10, // starting address
        0x00, 0x0A, // qty of outputs
        0xD2, 0x12, // crc
    ];

    const WRITE_MULTIPLE_REGISTERS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x10,    // function code
        0x00, 0x10, // starting address
        0x00, 0x02, // qty of outputs
        0x04, // byte count
        0x12, 0x34, 0x56, 0x78, // output values
        0x07, 0x73, // crc
    ];

    const WRITE_MULTIPLE_REGISTERS_RESPONSE: &[u8] = &[
        UNIT_ID, // unit id
        0x10,    // function code
        0x00, 0x10, // starting address
        0x00, 0x02, // qty of outputs
        0x46, 0x16, // crc
    ];

    const ALL_REQUESTS: &[(FunctionCode, &[u8])] = &[
        (FunctionCode::ReadCoils, READ_COILS_REQUEST),
        (FunctionCode::ReadDiscreteInputs, READ_DISCRETE_INPUTS_REQUEST),
        (FunctionCode::ReadHoldingRegisters, READ_HOLDING_REGISTERS_REQUEST),
        (FunctionCode::ReadInputRegisters, READ_INPUT_REGISTERS_REQUEST),
        (FunctionCode::WriteSingleCoil, WRITE_SINGLE_COIL_REQUEST),
        (FunctionCode::WriteSingleRegister, WRITE_SINGLE_REGISTER_REQUEST),
        (FunctionCode::WriteMultipleCoils, WRITE_MULTIPLE_COILS_REQUEST),
        (FunctionCode::WriteMultipleRegisters, WRITE_MULTIPLE_REGISTERS_REQUEST),
    ];

    const ALL_RESPONSES: &[(FunctionCode, &[u8])] = &[
        (FunctionCode::ReadCoils, READ_COILS_RESPONSE),
        (FunctionCode::ReadDiscreteInputs, READ_DISCRETE_INPUTS_RESPONSE),
        (FunctionCode::ReadHoldingRegisters, READ_HOLDING_REGISTERS_RESPONSE),
        (FunctionCode::ReadInputRegisters, READ_INPUT_REGISTERS_RESPONSE),
        // single writes are echoed
        (FunctionCode::WriteSingleCoil, WRITE_SINGLE_COIL_REQUEST),
        (FunctionCode::WriteSingleRegister, WRITE_SINGLE_REGISTER_REQUEST),
        (FunctionCode::WriteMultipleCoils, WRITE_MULTIPLE_COILS_RESPONSE),
        (FunctionCode::WriteMultipleRegisters, WRITE_MULTIPLE_REGISTERS_RESPONSE),
    ];

    fn phys_reading(chunks: &[&[u8]]) -> PhysLayer {
        let (stream, _) = MockStream::new(chunks.iter().map(|x| Action::Read(x.to_vec())));
        PhysLayer::new(Box::new(stream), PhysDecodeLevel::Nothing)
    }

    fn read_and_parse(frame: &[u8], length: FrameLength, start: usize) -> Frame {
        let mut phys = phys_reading(&[frame]);
        let raw = read(&mut phys, length, start).unwrap();
        assert_eq!(raw, frame);
        parse(&raw, AduDecodeLevel::Nothing).unwrap()
    }

    #[test]
    fn formats_frames_with_crc() {
        for (function, frame) in ALL_REQUESTS {
            let pdu = &frame[1..frame.len() - 2];
            assert_eq!(pdu[0], function.get_value());
            assert_eq!(
                format(UnitId::new(UNIT_ID), pdu, AduDecodeLevel::Nothing),
                frame.to_vec()
            );
        }
    }

    #[test]
    fn reads_exactly_each_request() {
        for (function, frame) in ALL_REQUESTS {
            let parsed = read_and_parse(
                frame,
                FrameLength::request(constants::CRC_LENGTH),
                REQUEST_FRAME_START_LENGTH,
            );
            assert_eq!(parsed.function(), function.get_value());
            assert_eq!(parsed.header.unit_id, UnitId::new(UNIT_ID));
        }
    }

    #[test]
    fn reads_exactly_each_response() {
        for (function, frame) in ALL_RESPONSES {
            let parsed = read_and_parse(
                frame,
                FrameLength::response(None, constants::CRC_LENGTH),
                constants::RESPONSE_FRAME_START_LENGTH,
            );
            assert_eq!(parsed.function(), function.get_value());
            assert_eq!(parsed.payload(), &frame[1..frame.len() - 2]);
        }
    }

    fn pdu(header: &[u8], fill: u8, length: usize) -> Vec<u8> {
        let mut pdu = header.to_vec();
        pdu.resize(length, fill);
        pdu
    }

    #[test]
    fn reads_maximum_size_requests() {
        let requests = [
            pdu(&[0x0F, 0x00, 0x00, 0x07, 0xB0, 0xF6], 0x55, 252),
            pdu(&[0x10, 0x00, 0x00, 0x00, 0x7B, 0xF6], 0xA5, 252),
            pdu(
                &[0x17, 0x00, 0x00, 0x00, 0x7D, 0x00, 0x10, 0x00, 0x79, 0xF2],
                0x3C,
                252,
            ),
        ];
        for request in requests {
            let frame = format(UnitId::new(UNIT_ID), &request, AduDecodeLevel::Nothing);
            let parsed = read_and_parse(
                &frame,
                FrameLength::request(constants::CRC_LENGTH),
                REQUEST_FRAME_START_LENGTH,
            );
            assert_eq!(parsed.payload(), request.as_slice());
        }
    }

    #[test]
    fn reads_maximum_size_responses() {
        let responses = [
            pdu(&[0x01, 0xFA], 0xAA, 252),
            pdu(&[0x03, 0xFA], 0x12, 252),
            pdu(&[0x17, 0xFA], 0x34, 252),
        ];
        for response in responses {
            let frame = format(UnitId::new(UNIT_ID), &response, AduDecodeLevel::Nothing);
            let parsed = read_and_parse(
                &frame,
                FrameLength::response(None, constants::CRC_LENGTH),
                constants::RESPONSE_FRAME_START_LENGTH,
            );
            assert_eq!(parsed.payload(), response.as_slice());
        }
    }

    #[test]
    fn reads_response_split_across_many_reads() {
        let (first, rest) = READ_HOLDING_REGISTERS_RESPONSE.split_at(3);
        let (second, third) = rest.split_at(5);
        let mut phys = phys_reading(&[first, second, third]);
        let raw = read(
            &mut phys,
            FrameLength::response(None, constants::CRC_LENGTH),
            constants::RESPONSE_FRAME_START_LENGTH,
        )
        .unwrap();
        assert_eq!(raw, READ_HOLDING_REGISTERS_RESPONSE);
    }

    #[test]
    fn reads_exception_response() {
        let frame = [0x01, 0x83, 0x02, 0xC0, 0xF1];
        let parsed = read_and_parse(
            &frame,
            FrameLength::response(None, constants::CRC_LENGTH),
            constants::RESPONSE_FRAME_START_LENGTH,
        );
        assert_eq!(parsed.payload(), &[0x83, 0x02]);
    }

    #[test]
    fn bad_crc_is_a_frame_error() {
        let mut frame = READ_COILS_RESPONSE.to_vec();
        frame[3] ^= 0x01;
        assert!(matches!(
            parse(&frame, AduDecodeLevel::Nothing),
            Err(RequestError::BadFrame(FrameParseError::CrcValidationFailure(0x9944, _)))
        ));
    }
}
