pub(crate) mod coil {
    /// u16 representation of COIL == ON when performing write single coil
    pub(crate) const ON: u16 = 0xFF00;
    /// u16 representation of COIL == OFF when performing write single coil
    pub(crate) const OFF: u16 = 0x0000;
}

pub(crate) mod limits {
    /// Maximum count allowed in a read coils/discrete inputs request
    pub(crate) const MAX_READ_COILS_COUNT: u16 = 0x07D0;
    /// Maximum count allowed in a read holding/input registers request
    pub(crate) const MAX_READ_REGISTERS_COUNT: u16 = 0x007D;
    /// Maximum count allowed in a `write multiple coils` request
    pub(crate) const MAX_WRITE_COILS_COUNT: u16 = 0x07B0;
    /// Maximum count allowed in a `write multiple registers` request
    pub(crate) const MAX_WRITE_REGISTERS_COUNT: u16 = 0x007B;
    /// Maximum write count allowed in a `read/write multiple registers` request
    pub(crate) const MAX_READ_WRITE_WRITE_COUNT: u16 = 0x0079;
    /// Maximum number of registers in a single `write file record` sub-request
    pub(crate) const MAX_FILE_RECORD_REGISTERS: usize = 119;
}

pub(crate) mod exceptions {
    /// added to the request function code in an exception response
    pub(crate) const EXCEPTION_OFFSET: u8 = 0x80;
}

pub(crate) mod file_record {
    /// the only reference type defined for file records
    pub(crate) const REFERENCE_TYPE: u8 = 0x06;
    /// bytes preceding the record data in a sub-request
    pub(crate) const SUB_REQUEST_HEADER_LENGTH: usize = 7;
}
