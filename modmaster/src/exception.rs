/// Exception codes defined by the Modbus application protocol
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionCode {
    /// 0x01: the function code is not supported by the slave
    IllegalFunction,
    /// 0x02: the requested address range does not exist on the slave
    IllegalDataAddress,
    /// 0x03: a value in the request is not allowed
    IllegalDataValue,
    /// 0x04: the slave hit an unrecoverable error while performing the request
    SlaveDeviceFailure,
    /// 0x05: the request was accepted but needs a long time to complete
    ///
    /// The master keeps reading for the real response without re-sending.
    Acknowledge,
    /// 0x06: the slave is busy with a long-running command
    ///
    /// The master re-sends after `wait_to_retry`.
    SlaveDeviceBusy,
    /// 0x08: a file record failed its consistency check
    MemoryParityError,
    /// 0x0A: a gateway could not route the request
    GatewayPathUnavailable,
    /// 0x0B: the device behind a gateway did not answer
    GatewayTargetDeviceFailedToRespond,
    /// An exception code outside the defined set
    Unknown(u8),
}

const DEFINED: [(u8, ExceptionCode); 9] = [
    (0x01, ExceptionCode::IllegalFunction),
    (0x02, ExceptionCode::IllegalDataAddress),
    (0x03, ExceptionCode::IllegalDataValue),
    (0x04, ExceptionCode::SlaveDeviceFailure),
    (0x05, ExceptionCode::Acknowledge),
    (0x06, ExceptionCode::SlaveDeviceBusy),
    (0x08, ExceptionCode::MemoryParityError),
    (0x0A, ExceptionCode::GatewayPathUnavailable),
    (0x0B, ExceptionCode::GatewayTargetDeviceFailedToRespond),
];

impl From<u8> for ExceptionCode {
    fn from(value: u8) -> Self {
        DEFINED
            .iter()
            .find(|(code, _)| *code == value)
            .map(|(_, ex)| *ex)
            .unwrap_or(ExceptionCode::Unknown(value))
    }
}

impl From<ExceptionCode> for u8 {
    fn from(ex: ExceptionCode) -> Self {
        if let ExceptionCode::Unknown(value) = ex {
            return value;
        }
        DEFINED
            .iter()
            .find(|(_, defined)| *defined == ex)
            .map(|(code, _)| *code)
            .unwrap_or_default()
    }
}

impl std::error::Error for ExceptionCode {}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let text = match self {
            ExceptionCode::IllegalFunction => "slave does not support the function code",
            ExceptionCode::IllegalDataAddress => "address is not valid on the slave",
            ExceptionCode::IllegalDataValue => "slave rejected a value in the request",
            ExceptionCode::SlaveDeviceFailure => "slave failed while performing the request",
            ExceptionCode::Acknowledge => "slave accepted the request and is still processing it",
            ExceptionCode::SlaveDeviceBusy => "slave is busy with a long-running command",
            ExceptionCode::MemoryParityError => "slave detected a parity error in its file memory",
            ExceptionCode::GatewayPathUnavailable => "gateway has no path to the target device",
            ExceptionCode::GatewayTargetDeviceFailedToRespond => {
                "target device behind the gateway did not respond"
            }
            ExceptionCode::Unknown(code) => {
                return write!(f, "slave returned undefined exception code {code:#04X}")
            }
        };
        f.write_str(text)
    }
}
