use crate::exception::ExceptionCode;

/// Top level error type returned by every master operation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestError {
    /// An I/O error occurred on the byte stream, including read/write timeouts
    Io(std::io::ErrorKind),
    /// The slave replied with an exception response
    Exception(ExceptionCode),
    /// Request was not sent because it contained invalid arguments
    BadRequest(InvalidRequest),
    /// A frame could not be read off the stream or failed its integrity check
    BadFrame(FrameParseError),
    /// The response frame was intact but its body could not be parsed
    BadResponse(AduParseError),
    /// The response did not belong to the request that was sent
    Validation(ValidationError),
    /// The function code has no known frame length and no rule was supplied
    UnsupportedFunction(u8),
    /// An internal logic error occurred
    Internal(InternalError),
    /// The worker executing the request went away before completing it
    Shutdown,
}

/// How the retry loop treats a particular error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RetryClass {
    /// counts against the retry budget and the request is sent again
    Retry,
    /// the connection is gone, retrying is pointless
    Disconnect,
    /// propagated immediately
    Fatal,
}

impl RequestError {
    pub(crate) fn retry_class(&self) -> RetryClass {
        match self {
            RequestError::Io(kind) => {
                if is_disconnect(*kind) {
                    RetryClass::Disconnect
                } else {
                    RetryClass::Retry
                }
            }
            RequestError::BadFrame(_) | RequestError::BadResponse(_) => RetryClass::Retry,
            RequestError::Exception(_)
            | RequestError::BadRequest(_)
            | RequestError::Validation(_)
            | RequestError::UnsupportedFunction(_)
            | RequestError::Internal(_)
            | RequestError::Shutdown => RetryClass::Fatal,
        }
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
    )
}

impl std::error::Error for RequestError {}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestError::Io(kind) => std::io::Error::from(*kind).fmt(f),
            RequestError::Exception(err) => write!(f, "slave exception: {err}"),
            RequestError::BadRequest(err) => err.fmt(f),
            RequestError::BadFrame(err) => err.fmt(f),
            RequestError::BadResponse(err) => err.fmt(f),
            RequestError::Validation(err) => err.fmt(f),
            RequestError::UnsupportedFunction(code) => write!(
                f,
                "function code {code:#04X} is not implemented for this transport"
            ),
            RequestError::Internal(err) => err.fmt(f),
            RequestError::Shutdown => f.write_str("the worker executing the request has shut down"),
        }
    }
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        RequestError::Io(err.kind())
    }
}

impl From<ExceptionCode> for RequestError {
    fn from(err: ExceptionCode) -> Self {
        RequestError::Exception(err)
    }
}

impl From<InvalidRequest> for RequestError {
    fn from(err: InvalidRequest) -> Self {
        RequestError::BadRequest(err)
    }
}

impl From<InvalidRange> for RequestError {
    fn from(err: InvalidRange) -> Self {
        RequestError::BadRequest(InvalidRequest::BadRange(err))
    }
}

impl From<FrameParseError> for RequestError {
    fn from(err: FrameParseError) -> Self {
        RequestError::BadFrame(err)
    }
}

impl From<AduParseError> for RequestError {
    fn from(err: AduParseError) -> Self {
        RequestError::BadResponse(err)
    }
}

impl From<ValidationError> for RequestError {
    fn from(err: ValidationError) -> Self {
        RequestError::Validation(err)
    }
}

impl From<InternalError> for RequestError {
    fn from(err: InternalError) -> Self {
        RequestError::Internal(err)
    }
}

/// errors that occur while reading a frame off a stream or checking its integrity
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameParseError {
    /// RTU frame failed its CRC check (received, expected)
    CrcValidationFailure(u16, u16),
    /// ASCII frame failed its LRC check (received, expected)
    LrcValidationFailure(u8, u8),
    /// ASCII frame did not begin with the ':' delimiter
    MissingStartDelimiter(u8),
    /// ASCII frame did not end with CR LF
    MissingEndDelimiter,
    /// ASCII frame contained characters that are not hexadecimal digit pairs
    BadHexEncoding,
    /// Received TCP frame with the length field set to zero
    MbapLengthZero,
    /// Received TCP frame with length that exceeds max allowed size (actual, max)
    MbapLengthTooBig(usize, usize),
    /// Received TCP frame within non-Modbus protocol id
    UnknownProtocolId(u16),
    /// Frame length would exceed the maximum allowed length (actual, max)
    FrameLengthTooBig(usize, usize),
    /// Frame is shorter than the minimum for its type (actual, minimum)
    FrameTooShort(usize, usize),
}

impl std::error::Error for FrameParseError {}

impl std::fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FrameParseError::CrcValidationFailure(received, expected) => write!(
                f,
                "received CRC value {received:#06X} doesn't match the expected value {expected:#06X}"
            ),
            FrameParseError::LrcValidationFailure(received, expected) => write!(
                f,
                "received LRC value {received:#04X} doesn't match the expected value {expected:#04X}"
            ),
            FrameParseError::MissingStartDelimiter(value) => write!(
                f,
                "received ASCII frame starting with {value:#04X} instead of the ':' delimiter"
            ),
            FrameParseError::MissingEndDelimiter => {
                f.write_str("received ASCII frame not terminated by CR LF")
            }
            FrameParseError::BadHexEncoding => {
                f.write_str("received ASCII frame with invalid hexadecimal encoding")
            }
            FrameParseError::MbapLengthZero => {
                f.write_str("received TCP frame with the length field set to zero")
            }
            FrameParseError::MbapLengthTooBig(size, max) => write!(
                f,
                "received TCP frame with length ({size}) that exceeds max allowed size ({max})"
            ),
            FrameParseError::UnknownProtocolId(id) => {
                write!(f, "received TCP frame with non-Modbus protocol id: {id}")
            }
            FrameParseError::FrameLengthTooBig(size, max) => write!(
                f,
                "frame length ({size}) exceeds the maximum allowed length ({max})"
            ),
            FrameParseError::FrameTooShort(size, min) => write!(
                f,
                "frame length ({size}) is less than the minimum length ({min})"
            ),
        }
    }
}

/// errors that occur while parsing requests and responses
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AduParseError {
    /// response is too short to be valid
    InsufficientBytes,
    /// byte count doesn't match what is expected based on request (expected, actual)
    RequestByteCountMismatch(usize, usize),
    /// byte count doesn't match the actual number of bytes present (count, remaining)
    InsufficientBytesForByteCount(usize, usize),
    /// response contains extra trailing bytes
    TrailingBytes(usize),
    /// a parameter expected to be echoed in the reply did not match
    ReplyEchoMismatch,
    /// bad value for the coil state
    UnknownCoilState(u16),
    /// file record reference type other than 6
    UnknownReferenceType(u8),
}

impl std::error::Error for AduParseError {}

impl std::fmt::Display for AduParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AduParseError::InsufficientBytes => f.write_str("response is too short to be valid"),
            AduParseError::RequestByteCountMismatch(request, response) => write!(
                f,
                "byte count ({response}) doesn't match what is expected based on request ({request})"
            ),
            AduParseError::InsufficientBytesForByteCount(count, remaining) => write!(
                f,
                "byte count ({count}) doesn't match the actual number of bytes remaining ({remaining})"
            ),
            AduParseError::TrailingBytes(remaining) => {
                write!(f, "response contains {remaining} extra trailing bytes")
            }
            AduParseError::ReplyEchoMismatch => {
                f.write_str("a parameter expected to be echoed in the reply did not match")
            }
            AduParseError::UnknownCoilState(value) => write!(
                f,
                "received coil state with unspecified value: {value:#06X}"
            ),
            AduParseError::UnknownReferenceType(value) => {
                write!(f, "received file record with unknown reference type: {value}")
            }
        }
    }
}

/// the response frame does not answer the request that was sent
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// response function code differs from the request (expected, received)
    UnexpectedFunctionCode(u8, u8),
    /// response unit id differs from the request (expected, received)
    UnexpectedUnitId(u8, u8),
    /// TCP response transaction id differs from the request (expected, received)
    UnexpectedTransactionId(u16, u16),
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ValidationError::UnexpectedFunctionCode(expected, received) => write!(
                f,
                "received response with function code {received:#04X}, expected {expected:#04X}"
            ),
            ValidationError::UnexpectedUnitId(expected, received) => write!(
                f,
                "received response from unit {received:#04X}, expected {expected:#04X}"
            ),
            ValidationError::UnexpectedTransactionId(expected, received) => write!(
                f,
                "received response with transaction id {received:#06X}, expected {expected:#06X}"
            ),
        }
    }
}

/// errors that result because of bad request parameter
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidRequest {
    /// Request contained an invalid range
    BadRange(InvalidRange),
    /// Count is too big to fit in a u16
    CountTooBigForU16(usize),
    /// Count too big for specific request (count, max)
    CountTooBigForType(u16, u16),
    /// Function code cannot be used for a custom request
    BadFunctionCode(u8),
    /// Custom request data does not fit in a single frame (length, max)
    PayloadTooLong(usize, usize),
    /// Requests that expect data in the reply cannot be broadcast
    BroadcastRead,
    /// Custom request data does not match the layout of its function code,
    /// so a serial slave could not delimit it
    MalformedPayload(u8),
}

impl std::error::Error for InvalidRequest {}

impl std::fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidRequest::BadRange(err) => write!(f, "{err}"),
            InvalidRequest::CountTooBigForU16(count) => write!(
                f,
                "the requested count of objects exceeds the maximum value of u16: {count}"
            ),
            InvalidRequest::CountTooBigForType(count, max) => write!(
                f,
                "the request count of {count} exceeds maximum allowed count of {max} for this type"
            ),
            InvalidRequest::BadFunctionCode(code) => write!(
                f,
                "function code {code:#04X} cannot be used in a custom request"
            ),
            InvalidRequest::PayloadTooLong(length, max) => write!(
                f,
                "request payload of {length} bytes exceeds the maximum of {max}"
            ),
            InvalidRequest::BroadcastRead => {
                f.write_str("requests that read data cannot be broadcast")
            }
            InvalidRequest::MalformedPayload(code) => write!(
                f,
                "request data does not match the layout of function code {code:#04X}"
            ),
        }
    }
}

impl From<InvalidRange> for InvalidRequest {
    fn from(x: InvalidRange) -> Self {
        InvalidRequest::BadRange(x)
    }
}

/// errors that occur when constructing an address range
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidRange {
    /// count of zero not allowed
    CountOfZero,
    /// address in range overflows u16 (start, count)
    AddressOverflow(u16, u16),
    /// count too large for type (count, max)
    CountTooLargeForType(u16, u16),
}

impl std::error::Error for InvalidRange {}

impl std::fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidRange::CountOfZero => f.write_str("range contains count == 0"),
            InvalidRange::AddressOverflow(start, count) => write!(
                f,
                "start == {start} and count = {count} would overflow u16 representation"
            ),
            InvalidRange::CountTooLargeForType(x, y) => write!(
                f,
                "count of {x} is too large for the specified type (max == {y})"
            ),
        }
    }
}

/// errors raised when a master configuration is rejected
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidConfig {
    /// the stale response threshold must be below 65535
    RetryOnOldResponseThreshold(u16),
    /// entry at this position of the ignore list is not a sequence of hex digit pairs
    BadIgnoreFrame(usize),
}

impl std::error::Error for InvalidConfig {}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidConfig::RetryOnOldResponseThreshold(value) => write!(
                f,
                "retry on old response threshold ({value}) must be less than {}",
                u16::MAX
            ),
            InvalidConfig::BadIgnoreFrame(index) => write!(
                f,
                "ignore list entry {index} is not a sequence of hexadecimal digit pairs"
            ),
        }
    }
}

/// errors that occur when opening a master
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenError {
    /// the configuration was rejected
    Config(InvalidConfig),
    /// the byte stream could not be opened or configured
    Io(std::io::ErrorKind),
}

impl std::error::Error for OpenError {}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OpenError::Config(err) => err.fmt(f),
            OpenError::Io(kind) => std::io::Error::from(*kind).fmt(f),
        }
    }
}

impl From<InvalidConfig> for OpenError {
    fn from(err: InvalidConfig) -> Self {
        OpenError::Config(err)
    }
}

impl From<std::io::Error> for OpenError {
    fn from(err: std::io::Error) -> Self {
        OpenError::Io(err.kind())
    }
}

/// errors that should only occur if there is a logic error in the library
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InternalError {
    /// Insufficient space for write operation (requested, remaining)
    InsufficientWriteSpace(usize, usize),
    /// The calculated frame size exceeds what the framing allows (size, max)
    FrameTooBig(usize, usize),
    /// Byte count would exceed maximum allowed size in the ADU of u8
    BadByteCount(usize),
}

impl std::error::Error for InternalError {}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternalError::InsufficientWriteSpace(written, remaining) => write!(
                f,
                "attempted to write {written} bytes with {remaining} bytes remaining"
            ),
            InternalError::FrameTooBig(size, max) => write!(
                f,
                "frame length of {size} exceeds the maximum allowed length of {max}"
            ),
            InternalError::BadByteCount(size) => write!(
                f,
                "byte count of {size} exceeds maximum size of u8"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_framing_errors_are_retried() {
        assert_eq!(
            RequestError::Io(std::io::ErrorKind::TimedOut).retry_class(),
            RetryClass::Retry
        );
        assert_eq!(
            RequestError::Io(std::io::ErrorKind::UnexpectedEof).retry_class(),
            RetryClass::Retry
        );
        assert_eq!(
            RequestError::BadFrame(FrameParseError::CrcValidationFailure(0, 1)).retry_class(),
            RetryClass::Retry
        );
        assert_eq!(
            RequestError::BadResponse(AduParseError::ReplyEchoMismatch).retry_class(),
            RetryClass::Retry
        );
    }

    #[test]
    fn disconnects_bypass_the_retry_loop() {
        assert_eq!(
            RequestError::Io(std::io::ErrorKind::ConnectionReset).retry_class(),
            RetryClass::Disconnect
        );
        assert_eq!(
            RequestError::Io(std::io::ErrorKind::BrokenPipe).retry_class(),
            RetryClass::Disconnect
        );
    }

    #[test]
    fn protocol_errors_are_fatal() {
        assert_eq!(
            RequestError::Validation(ValidationError::UnexpectedUnitId(1, 2)).retry_class(),
            RetryClass::Fatal
        );
        assert_eq!(
            RequestError::UnsupportedFunction(0x41).retry_class(),
            RetryClass::Fatal
        );
        assert_eq!(
            RequestError::Exception(ExceptionCode::IllegalDataAddress).retry_class(),
            RetryClass::Fatal
        );
    }
}
