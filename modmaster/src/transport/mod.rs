//! Variant framing: RTU, ASCII and TCP (MBAP)
//!
//! The master drives every exchange through [`Transport`], which hides the framing
//! differences behind write/read/validate operations.

use crate::common::frame::{Frame, FrameHeader, TxId};
use crate::common::phys::PhysLayer;
use crate::config::IgnoreList;
use crate::decode::DecodeLevel;
use crate::error::{RequestError, ValidationError};
use crate::stream::ByteStream;
use crate::types::UnitId;

pub(crate) mod ascii;
pub(crate) mod length;
pub(crate) mod rtu;
pub(crate) mod tcp;

pub use length::LengthMode;

use length::FrameLength;

/// Framing used on the byte stream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportKind {
    /// binary frames delimited by length inference and protected by CRC16
    Rtu,
    /// hex encoded lines protected by LRC
    Ascii,
    /// MBAP header with transaction ids and no checksum, used for TCP and UDP
    Tcp,
}

impl TransportKind {
    /// true for the variants used on serial lines
    pub fn is_serial(self) -> bool {
        match self {
            TransportKind::Rtu | TransportKind::Ascii => true,
            TransportKind::Tcp => false,
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransportKind::Rtu => f.write_str("RTU"),
            TransportKind::Ascii => f.write_str("ASCII"),
            TransportKind::Tcp => f.write_str("TCP"),
        }
    }
}

enum Framing {
    Rtu,
    Ascii,
    Tcp { tx_id: TxId },
}

/// The function code and length rule of the response to an outstanding request
#[derive(Copy, Clone, Debug)]
pub(crate) struct ResponseRule {
    pub(crate) function: u8,
    pub(crate) length: Option<LengthMode>,
}

impl ResponseRule {
    fn frame_length(self, trailer: usize) -> FrameLength {
        FrameLength::response(self.length.map(|mode| (self.function, mode)), trailer)
    }
}

pub(crate) struct Transport {
    phys: PhysLayer,
    framing: Framing,
    ignore_list: IgnoreList,
    decode: DecodeLevel,
}

impl Transport {
    pub(crate) fn new(
        stream: Box<dyn ByteStream>,
        kind: TransportKind,
        ignore_list: IgnoreList,
        decode: DecodeLevel,
    ) -> Self {
        let framing = match kind {
            TransportKind::Rtu => Framing::Rtu,
            TransportKind::Ascii => Framing::Ascii,
            TransportKind::Tcp => Framing::Tcp {
                tx_id: TxId::default(),
            },
        };
        Self {
            phys: PhysLayer::new(stream, decode.physical),
            framing,
            ignore_list,
            decode,
        }
    }

    pub(crate) fn kind(&self) -> TransportKind {
        match self.framing {
            Framing::Rtu => TransportKind::Rtu,
            Framing::Ascii => TransportKind::Ascii,
            Framing::Tcp { .. } => TransportKind::Tcp,
        }
    }

    pub(crate) fn decode(&self) -> DecodeLevel {
        self.decode
    }

    pub(crate) fn stream_mut(&mut self) -> &mut dyn ByteStream {
        self.phys.stream_mut()
    }

    pub(crate) fn discard_in_buffer(&mut self) -> Result<(), RequestError> {
        self.phys.discard_in_buffer()
    }

    #[cfg(test)]
    pub(crate) fn set_last_tx_id(&mut self, value: u16) {
        if let Framing::Tcp { tx_id } = &mut self.framing {
            *tx_id = TxId::new(value);
        }
    }

    /// Frame and write a PDU, returning the header the response has to match
    ///
    /// Every TCP write takes a new transaction id.
    pub(crate) fn write(
        &mut self,
        unit_id: UnitId,
        pdu: &[u8],
    ) -> Result<FrameHeader, RequestError> {
        let level = self.decode.adu;
        let (header, frame) = match &mut self.framing {
            Framing::Rtu => (
                FrameHeader::new_serial_header(unit_id),
                rtu::format(unit_id, pdu, level),
            ),
            Framing::Ascii => (
                FrameHeader::new_serial_header(unit_id),
                ascii::format(unit_id, pdu, level),
            ),
            Framing::Tcp { tx_id } => {
                let tx_id = tx_id.next();
                (
                    FrameHeader::new_tcp_header(unit_id, tx_id),
                    tcp::format(tx_id, unit_id, pdu, level)?,
                )
            }
        };
        self.phys.write(&frame)?;
        Ok(header)
    }

    /// Read one complete frame
    ///
    /// Returns `None` when the frame is on the ignore list. The ignore list is consulted
    /// before the checksum or length is verified.
    pub(crate) fn read(&mut self, rule: ResponseRule) -> Result<Option<Frame>, RequestError> {
        let level = self.decode.adu;
        match self.framing {
            Framing::Rtu => {
                let length = rule.frame_length(rtu::constants::CRC_LENGTH);
                let raw = rtu::read(
                    &mut self.phys,
                    length,
                    rtu::constants::RESPONSE_FRAME_START_LENGTH,
                )?;
                if self.is_ignored(&raw) {
                    return Ok(None);
                }
                rtu::parse(&raw, level).map(Some)
            }
            Framing::Ascii => {
                let binary = ascii::read(&mut self.phys)?;
                if self.is_ignored(&binary) {
                    return Ok(None);
                }
                let length = rule.frame_length(ascii::constants::LRC_LENGTH);
                ascii::parse(&binary, length, level).map(Some)
            }
            Framing::Tcp { .. } => {
                let raw = tcp::read(&mut self.phys)?;
                if self.is_ignored(&raw) {
                    return Ok(None);
                }
                tcp::parse(&raw, level).map(Some)
            }
        }
    }

    fn is_ignored(&self, frame: &[u8]) -> bool {
        let ignored = self.ignore_list.contains(frame);
        if ignored {
            tracing::warn!("ignoring frame: {}", hex::encode_upper(frame));
        }
        ignored
    }

    /// true if the response answers an earlier attempt and another read should be made
    pub(crate) fn should_retry(
        &self,
        request: FrameHeader,
        response: &Frame,
        threshold: u16,
    ) -> bool {
        match (request.tx_id, response.header.tx_id) {
            (Some(request), Some(response)) => match request.steps_after(response) {
                Some(lag) => lag > 0 && lag < threshold,
                None => false,
            },
            _ => false,
        }
    }

    /// check that the response belongs to the request
    pub(crate) fn validate(
        &self,
        request: FrameHeader,
        function: u8,
        response: &Frame,
    ) -> Result<(), ValidationError> {
        if response.function() != function {
            return Err(ValidationError::UnexpectedFunctionCode(
                function,
                response.function(),
            ));
        }
        if response.header.unit_id != request.unit_id {
            return Err(ValidationError::UnexpectedUnitId(
                request.unit_id.value,
                response.header.unit_id.value,
            ));
        }
        if let (Some(expected), Some(received)) = (request.tx_id, response.header.tx_id) {
            if expected != received {
                return Err(ValidationError::UnexpectedTransactionId(
                    expected.to_u16(),
                    received.to_u16(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Action, MockStream};

    fn transport(kind: TransportKind, actions: Vec<Action>, ignore: &[&str]) -> Transport {
        let (stream, _) = MockStream::new(actions);
        Transport::new(
            Box::new(stream),
            kind,
            IgnoreList::from_hex(ignore).unwrap(),
            DecodeLevel::nothing(),
        )
    }

    const READ_ONE: ResponseRule = ResponseRule {
        function: 0x03,
        length: None,
    };

    #[test]
    fn ignored_rtu_frame_is_dropped_before_crc_check() {
        // deliberately bad CRC
        let mut transport = transport(
            TransportKind::Rtu,
            vec![Action::Read(vec![0x01, 0x83, 0x02, 0x00, 0x00])],
            &["01 83 02 00 00"],
        );
        assert_eq!(transport.read(READ_ONE), Ok(None));
    }

    #[test]
    fn ignored_ascii_frame_is_matched_after_decoding() {
        let mut transport = transport(
            TransportKind::Ascii,
            vec![Action::Read(b":0183027A\r\n".to_vec())],
            &["0183027A"],
        );
        assert_eq!(transport.read(READ_ONE), Ok(None));
    }

    #[test]
    fn tcp_writes_take_consecutive_transaction_ids() {
        let mut transport = transport(TransportKind::Tcp, Vec::new(), &[]);
        let first = transport.write(UnitId::new(1), &[0x03, 0x00, 0x00, 0x00, 0x01]).unwrap();
        let second = transport.write(UnitId::new(1), &[0x03, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(first.tx_id, Some(TxId::new(1)));
        assert_eq!(second.tx_id, Some(TxId::new(2)));
    }

    #[test]
    fn stale_responses_are_within_threshold() {
        let transport = transport(TransportKind::Tcp, Vec::new(), &[]);
        let request = FrameHeader::new_tcp_header(UnitId::new(1), TxId::new(5));
        let response = |tx_id: u16| {
            Frame::new(
                FrameHeader::new_tcp_header(UnitId::new(1), TxId::new(tx_id)),
                &[0x03, 0x00],
            )
        };
        assert!(transport.should_retry(request, &response(4), 3));
        assert!(transport.should_retry(request, &response(3), 3));
        assert!(!transport.should_retry(request, &response(2), 3));
        assert!(!transport.should_retry(request, &response(5), 3));
        assert!(!transport.should_retry(request, &response(6), 3));
        assert!(!transport.should_retry(request, &response(4), 0));
    }

    #[test]
    fn stale_responses_are_found_across_the_wrap() {
        let transport = transport(TransportKind::Tcp, Vec::new(), &[]);
        let request = FrameHeader::new_tcp_header(UnitId::new(1), TxId::new(1));
        let response = |tx_id: u16| {
            Frame::new(
                FrameHeader::new_tcp_header(UnitId::new(1), TxId::new(tx_id)),
                &[0x03, 0x00],
            )
        };
        assert!(transport.should_retry(request, &response(u16::MAX), 3));
        assert!(transport.should_retry(request, &response(u16::MAX - 1), 3));
        assert!(!transport.should_retry(request, &response(u16::MAX - 2), 3));
        assert!(!transport.should_retry(request, &response(0), 3));
        assert!(!transport.should_retry(request, &response(2), 3));
    }

    #[test]
    fn validation_checks_function_unit_and_transaction() {
        let transport = transport(TransportKind::Tcp, Vec::new(), &[]);
        let request = FrameHeader::new_tcp_header(UnitId::new(1), TxId::new(5));
        let frame = |unit: u8, tx_id: u16, function: u8| {
            Frame::new(
                FrameHeader::new_tcp_header(UnitId::new(unit), TxId::new(tx_id)),
                &[function, 0x00],
            )
        };
        assert_eq!(transport.validate(request, 0x03, &frame(1, 5, 0x03)), Ok(()));
        assert_eq!(
            transport.validate(request, 0x03, &frame(1, 5, 0x04)),
            Err(ValidationError::UnexpectedFunctionCode(0x03, 0x04))
        );
        assert_eq!(
            transport.validate(request, 0x03, &frame(2, 5, 0x03)),
            Err(ValidationError::UnexpectedUnitId(1, 2))
        );
        assert_eq!(
            transport.validate(request, 0x03, &frame(1, 6, 0x03)),
            Err(ValidationError::UnexpectedTransactionId(5, 6))
        );
    }
}
