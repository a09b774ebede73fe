/// How much of each exchange the master logs, layer by layer
///
/// All output is emitted with `tracing` at the INFO level. The levels of each layer are
/// ordered, so every level also includes what the levels below it log.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeLevel {
    /// the function code and body of requests and responses
    pub pdu: PduDecodeLevel,
    /// the framing added by the transport variant (RTU, ASCII or MBAP)
    pub adu: AduDecodeLevel,
    /// bytes as they are written to and read from the stream
    pub physical: PhysDecodeLevel,
}

/// Logging of requests and responses (`PDU TX` / `PDU RX`)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum PduDecodeLevel {
    /// Log nothing
    #[default]
    Nothing,
    /// Log the function code
    FunctionCode,
    /// Also log the addresses and counts
    DataHeaders,
    /// Also log every coil, register and data byte
    DataValues,
}

/// Logging of the variant framing (`RTU`, `ASCII` or `MBAP` followed by `TX` / `RX`)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum AduDecodeLevel {
    /// Log nothing
    #[default]
    Nothing,
    /// Log the unit id, checksum or MBAP fields
    Header,
    /// Also log the frame contents as hex
    Payload,
}

/// Logging of the byte stream (`PHYS TX` / `PHYS RX`)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum PhysDecodeLevel {
    /// Log nothing
    #[default]
    Nothing,
    /// Log how many bytes moved
    Length,
    /// Also log the bytes as hex
    Data,
}

impl DecodeLevel {
    /// Nothing is logged at any layer
    pub fn nothing() -> Self {
        Self::default()
    }

    /// Combine a level for each layer
    pub fn new(pdu: PduDecodeLevel, adu: AduDecodeLevel, physical: PhysDecodeLevel) -> Self {
        Self { pdu, adu, physical }
    }
}

impl From<PduDecodeLevel> for DecodeLevel {
    fn from(pdu: PduDecodeLevel) -> Self {
        Self {
            pdu,
            ..Self::default()
        }
    }
}

impl PduDecodeLevel {
    pub(crate) fn enabled(&self) -> bool {
        *self > Self::Nothing
    }

    pub(crate) fn data_headers(&self) -> bool {
        *self >= Self::DataHeaders
    }

    pub(crate) fn data_values(&self) -> bool {
        *self == Self::DataValues
    }
}

impl AduDecodeLevel {
    pub(crate) fn enabled(&self) -> bool {
        *self > Self::Nothing
    }

    pub(crate) fn payload_enabled(&self) -> bool {
        *self == Self::Payload
    }
}

impl PhysDecodeLevel {
    pub(crate) fn enabled(&self) -> bool {
        *self > Self::Nothing
    }

    pub(crate) fn data_enabled(&self) -> bool {
        *self == Self::Data
    }
}
