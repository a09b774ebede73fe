use std::fmt::{Display, Formatter};

mod constants {
    pub(crate) const READ_COILS: u8 = 1;
    pub(crate) const READ_DISCRETE_INPUTS: u8 = 2;
    pub(crate) const READ_HOLDING_REGISTERS: u8 = 3;
    pub(crate) const READ_INPUT_REGISTERS: u8 = 4;
    pub(crate) const WRITE_SINGLE_COIL: u8 = 5;
    pub(crate) const WRITE_SINGLE_REGISTER: u8 = 6;
    pub(crate) const DIAGNOSTICS: u8 = 8;
    pub(crate) const WRITE_MULTIPLE_COILS: u8 = 15;
    pub(crate) const WRITE_MULTIPLE_REGISTERS: u8 = 16;
    pub(crate) const WRITE_FILE_RECORD: u8 = 21;
    pub(crate) const READ_WRITE_MULTIPLE_REGISTERS: u8 = 23;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum FunctionCode {
    ReadCoils = constants::READ_COILS,
    ReadDiscreteInputs = constants::READ_DISCRETE_INPUTS,
    ReadHoldingRegisters = constants::READ_HOLDING_REGISTERS,
    ReadInputRegisters = constants::READ_INPUT_REGISTERS,
    WriteSingleCoil = constants::WRITE_SINGLE_COIL,
    WriteSingleRegister = constants::WRITE_SINGLE_REGISTER,
    Diagnostics = constants::DIAGNOSTICS,
    WriteMultipleCoils = constants::WRITE_MULTIPLE_COILS,
    WriteMultipleRegisters = constants::WRITE_MULTIPLE_REGISTERS,
    WriteFileRecord = constants::WRITE_FILE_RECORD,
    ReadWriteMultipleRegisters = constants::READ_WRITE_MULTIPLE_REGISTERS,
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} ({:#04X})", self.name(), self.get_value())
    }
}

impl FunctionCode {
    pub(crate) const fn get_value(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            FunctionCode::ReadCoils => "READ COILS",
            FunctionCode::ReadDiscreteInputs => "READ DISCRETE INPUTS",
            FunctionCode::ReadHoldingRegisters => "READ HOLDING REGISTERS",
            FunctionCode::ReadInputRegisters => "READ INPUT REGISTERS",
            FunctionCode::WriteSingleCoil => "WRITE SINGLE COIL",
            FunctionCode::WriteSingleRegister => "WRITE SINGLE REGISTER",
            FunctionCode::Diagnostics => "DIAGNOSTICS",
            FunctionCode::WriteMultipleCoils => "WRITE MULTIPLE COILS",
            FunctionCode::WriteMultipleRegisters => "WRITE MULTIPLE REGISTERS",
            FunctionCode::WriteFileRecord => "WRITE FILE RECORD",
            FunctionCode::ReadWriteMultipleRegisters => "READ WRITE MULTIPLE REGISTERS",
        }
    }

    pub(crate) fn get(value: u8) -> Option<Self> {
        match value {
            constants::READ_COILS => Some(FunctionCode::ReadCoils),
            constants::READ_DISCRETE_INPUTS => Some(FunctionCode::ReadDiscreteInputs),
            constants::READ_HOLDING_REGISTERS => Some(FunctionCode::ReadHoldingRegisters),
            constants::READ_INPUT_REGISTERS => Some(FunctionCode::ReadInputRegisters),
            constants::WRITE_SINGLE_COIL => Some(FunctionCode::WriteSingleCoil),
            constants::WRITE_SINGLE_REGISTER => Some(FunctionCode::WriteSingleRegister),
            constants::DIAGNOSTICS => Some(FunctionCode::Diagnostics),
            constants::WRITE_MULTIPLE_COILS => Some(FunctionCode::WriteMultipleCoils),
            constants::WRITE_MULTIPLE_REGISTERS => Some(FunctionCode::WriteMultipleRegisters),
            constants::WRITE_FILE_RECORD => Some(FunctionCode::WriteFileRecord),
            constants::READ_WRITE_MULTIPLE_REGISTERS => {
                Some(FunctionCode::ReadWriteMultipleRegisters)
            }
            _ => None,
        }
    }
}

/// Display for a raw function code byte that may not be one of the known codes
#[derive(Copy, Clone)]
pub(crate) struct FunctionDisplay(pub(crate) u8);

impl Display for FunctionDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match FunctionCode::get(self.0) {
            Some(code) => code.fmt(f),
            None => write!(f, "CUSTOM FUNCTION CODE ({:#04X})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_every_known_code() {
        for value in 0..=u8::MAX {
            if let Some(code) = FunctionCode::get(value) {
                assert_eq!(code.get_value(), value);
            }
        }
        assert_eq!(FunctionCode::get(0x41), None);
    }

    #[test]
    fn displays_unknown_codes_as_custom() {
        assert_eq!(
            FunctionDisplay(0x41).to_string(),
            "CUSTOM FUNCTION CODE (0x41)"
        );
        assert_eq!(FunctionDisplay(0x03).to_string(), "READ HOLDING REGISTERS (0x03)");
    }
}
