//! A blocking [Modbus](http://modbus.org/) master supporting the RTU, ASCII and TCP/IP framings.
//!
//! # Features
//!
//! * Retry state machine with Modbus exception semantics: `Acknowledge` re-reads without
//!   re-sending, `Slave Device Busy` re-sends with or without consuming the retry budget
//! * Stale TCP transaction ids are skipped up to a configurable threshold
//! * Panic-free parsing with CRC16 and LRC verification
//! * Protocol decoding at the PDU, ADU and physical layers through [`tracing`]
//! * Optional async adapter running exchanges on tokio's blocking pool
//!
//! # Supported Functions
//!
//! * Read Coils
//! * Read Discrete Inputs
//! * Read Holding Registers
//! * Read Input Registers
//! * Write Single Coil
//! * Write Single Register
//! * Diagnostics
//! * Write Multiple Coils
//! * Write Multiple Registers
//! * Write File Record
//! * Read/Write Multiple Registers
//! * Custom function codes
//!
//! # Example
//!
//! ```no_run
//! use modmaster::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let master = Master::tcp("127.0.0.1:502", MasterConfig::default())?;
//!
//!     let values = master.read_holding_registers(
//!         UnitId::new(0x02),
//!         AddressRange::try_from(0, 5)?,
//!     )?;
//!
//!     for x in values {
//!         println!("index: {} value: {}", x.index, x.value)
//!     }
//!
//!     Ok(())
//! }
//! ```

pub use crate::config::*;
pub use crate::decode::*;
pub use crate::error::*;
pub use crate::exception::ExceptionCode;
pub use crate::master::Master;
pub use crate::message::{CustomRequest, CustomResponse};
pub use crate::transport::{LengthMode, TransportKind};
pub use crate::types::*;

#[cfg(feature = "async")]
pub use crate::async_master::AsyncMaster;

/// CRC16 and LRC checksums
pub mod checksum;
/// Byte streams the master runs over
pub mod stream;

// internal modules
#[cfg(feature = "async")]
mod async_master;
mod common;
mod config;
mod constants;
mod decode;
mod error;
mod exception;
mod master;
mod message;
mod transport;
mod types;

#[cfg(test)]
mod mock;
