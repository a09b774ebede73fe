use crate::constants::limits;
use crate::decode::PduDecodeLevel;
use crate::error::{AduParseError, InvalidRange, InvalidRequest};

/// Address of a slave on the line (serial) or behind a gateway (TCP)
///
/// Unit 0 is the broadcast address on serial lines.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId {
    /// underlying raw value
    pub value: u8,
}

/// A contiguous block of coils or registers
///
/// `try_from` guarantees a non-zero count that does not run past 0xFFFF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressRange {
    /// first address
    pub start: u16,
    /// number of addresses
    pub count: u16,
}

/// A range checked against the bit read limit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReadBitsRange {
    pub(crate) inner: AddressRange,
}

impl ReadBitsRange {
    pub(crate) fn get(self) -> AddressRange {
        self.inner
    }
}

/// A range checked against the register read limit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReadRegistersRange {
    pub(crate) inner: AddressRange,
}

impl ReadRegistersRange {
    pub(crate) fn get(self) -> AddressRange {
        self.inner
    }
}

/// A coil or register value at an address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Indexed<T> {
    /// address of the value
    pub index: u16,
    /// the value
    pub value: T,
}

/// Consecutive values written by a write multiple request, starting at an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteMultiple<T> {
    /// derived from the start and the number of values
    pub(crate) range: AddressRange,
    pub(crate) values: Vec<T>,
}

/// Sub-function and data word of a diagnostics (0x08) request
///
/// The slave echoes both fields for the sub-functions a master normally issues,
/// e.g. sub-function 0x0000 (return query data).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// diagnostics sub-function code
    pub sub_function: u16,
    /// data word sent with the sub-function
    pub data: u16,
}

/// A single record written by a write file record (0x15) request
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct FileRecord {
    /// file to write
    pub file_number: u16,
    /// starting record within the file
    pub record_number: u16,
    /// register values written starting at the record
    pub data: Vec<u16>,
}

/// Read range and write values of a read/write multiple registers (0x17) request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteMultiple {
    pub(crate) read_range: AddressRange,
    pub(crate) write: WriteMultiple<u16>,
}

/// Logs a read range followed by the values when they are enabled
pub(crate) struct ValuesDisplay<'a, T> {
    range: AddressRange,
    values: &'a [Indexed<T>],
    level: PduDecodeLevel,
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04X}", self.value)
    }
}

impl<'a, T> ValuesDisplay<'a, T> {
    pub(crate) fn new(
        level: PduDecodeLevel,
        range: AddressRange,
        values: &'a [Indexed<T>],
    ) -> Self {
        Self {
            range,
            values,
            level,
        }
    }
}

impl<T> std::fmt::Display for ValuesDisplay<'_, T>
where
    Indexed<T>: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.range)?;
        if self.level.data_values() {
            for x in self.values {
                write!(f, "\n{x}")?;
            }
        }
        Ok(())
    }
}

pub(crate) fn coil_from_u16(value: u16) -> Result<bool, AduParseError> {
    match value {
        crate::constants::coil::ON => Ok(true),
        crate::constants::coil::OFF => Ok(false),
        _ => Err(AduParseError::UnknownCoilState(value)),
    }
}

pub(crate) fn coil_to_u16(value: bool) -> u16 {
    if value {
        crate::constants::coil::ON
    } else {
        crate::constants::coil::OFF
    }
}

impl AddressRange {
    /// Create a new address range
    pub fn try_from(start: u16, count: u16) -> Result<Self, InvalidRange> {
        if count == 0 {
            return Err(InvalidRange::CountOfZero);
        }

        let max_start = u16::MAX - (count - 1);

        if start > max_start {
            return Err(InvalidRange::AddressOverflow(start, count));
        }

        Ok(Self { start, count })
    }

    /// Iterate over the addresses in the range
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        let start = self.start;
        (0..self.count).map(move |offset| start.wrapping_add(offset))
    }

    pub(crate) fn of_read_bits(self) -> Result<ReadBitsRange, InvalidRange> {
        Ok(ReadBitsRange {
            inner: self.limited_count(limits::MAX_READ_COILS_COUNT)?,
        })
    }

    pub(crate) fn of_read_registers(self) -> Result<ReadRegistersRange, InvalidRange> {
        Ok(ReadRegistersRange {
            inner: self.limited_count(limits::MAX_READ_REGISTERS_COUNT)?,
        })
    }

    fn limited_count(self, limit: u16) -> Result<Self, InvalidRange> {
        if self.count > limit {
            return Err(InvalidRange::CountTooLargeForType(self.count, limit));
        }
        Ok(self)
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "start: {:#06X} qty: {}", self.start, self.count)
    }
}

impl<T> Indexed<T> {
    /// Create a new indexed value
    pub fn new(index: u16, value: T) -> Self {
        Indexed { index, value }
    }
}

impl std::fmt::Display for Indexed<bool> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx: {:#06X} value: {}", self.index, self.value as i32)
    }
}

impl std::fmt::Display for Indexed<u16> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx: {:#06X} value: {:#06X}", self.index, self.value)
    }
}

impl UnitId {
    /// Create a new UnitId
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Broadcast address (only on serial lines)
    pub fn broadcast() -> Self {
        Self { value: 0x00 }
    }

    /// Returns true if this is the serial broadcast address
    pub fn is_broadcast(&self) -> bool {
        self.value == 0x00
    }

    /// Returns true if the address is reserved in RTU mode
    ///
    /// Users should *not* use reserved addresses in RTU mode.
    pub fn is_rtu_reserved(&self) -> bool {
        self.value >= 248
    }
}

/// Create the default UnitId of `0xFF`
impl Default for UnitId {
    fn default() -> Self {
        Self { value: 0xFF }
    }
}

impl<T> WriteMultiple<T> {
    /// Create a new collection of values starting at `start`
    pub fn from(start: u16, values: Vec<T>) -> Result<Self, InvalidRequest> {
        let count = match u16::try_from(values.len()) {
            Ok(x) => x,
            Err(_) => return Err(InvalidRequest::CountTooBigForU16(values.len())),
        };
        let range = AddressRange::try_from(start, count)?;
        Ok(Self { range, values })
    }

    /// address range covered by the values
    pub fn range(&self) -> AddressRange {
        self.range
    }

    /// the values in address order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn limited_count(self, limit: u16) -> Result<Self, InvalidRequest> {
        if self.range.count > limit {
            return Err(InvalidRequest::CountTooBigForType(self.range.count, limit));
        }
        Ok(self)
    }

    pub(crate) fn indexed(&self) -> impl Iterator<Item = Indexed<T>> + '_
    where
        T: Copy,
    {
        self.range
            .iter()
            .zip(self.values.iter())
            .map(|(index, value)| Indexed::new(index, *value))
    }
}

impl FileRecord {
    /// Create a record write of `data` starting at `record_number` of `file_number`
    pub fn new(
        file_number: u16,
        record_number: u16,
        data: Vec<u16>,
    ) -> Result<Self, InvalidRequest> {
        if data.is_empty() {
            return Err(InvalidRange::CountOfZero.into());
        }
        if data.len() > limits::MAX_FILE_RECORD_REGISTERS {
            return Err(InvalidRequest::CountTooBigForType(
                data.len() as u16,
                limits::MAX_FILE_RECORD_REGISTERS as u16,
            ));
        }
        Ok(Self {
            file_number,
            record_number,
            data,
        })
    }
}

impl std::fmt::Display for FileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "file: {:#06X} record: {:#06X} length: {}",
            self.file_number,
            self.record_number,
            self.data.len()
        )
    }
}

impl ReadWriteMultiple {
    /// Create a request that writes `write` and then reads `read_range`
    pub fn new(
        read_range: AddressRange,
        write: WriteMultiple<u16>,
    ) -> Result<Self, InvalidRequest> {
        let read_range = read_range.of_read_registers()?.get();
        let write = write.limited_count(limits::MAX_READ_WRITE_WRITE_COUNT)?;
        Ok(Self { read_range, write })
    }

    /// range of registers that are read back
    pub fn read_range(&self) -> AddressRange {
        self.read_range
    }

    /// registers written before the read
    pub fn write(&self) -> &WriteMultiple<u16> {
        &self.write
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sub-function: {:#06X} data: {:#06X}",
            self.sub_function, self.data
        )
    }
}
