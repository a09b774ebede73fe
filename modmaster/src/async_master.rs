use std::sync::Arc;
use std::time::Duration;

use crate::error::RequestError;
use crate::master::Master;
use crate::message::{CustomRequest, CustomResponse};
use crate::types::{
    AddressRange, Diagnostics, FileRecord, Indexed, ReadWriteMultiple, UnitId, WriteMultiple,
};

/// Async handle to a [`Master`]
///
/// Each request runs the blocking exchange on tokio's blocking thread pool. Handles are cheap
/// to clone and share the underlying master, so requests from different tasks are serialized.
#[derive(Clone)]
pub struct AsyncMaster {
    inner: Arc<Master>,
}

impl From<Master> for AsyncMaster {
    fn from(master: Master) -> Self {
        Self::new(master)
    }
}

impl AsyncMaster {
    /// Wrap a blocking master
    pub fn new(master: Master) -> Self {
        Self {
            inner: Arc::new(master),
        }
    }

    /// the wrapped master, for blocking use
    pub fn master(&self) -> &Master {
        &self.inner
    }

    async fn run<T, F>(&self, action: F) -> Result<T, RequestError>
    where
        T: Send + 'static,
        F: FnOnce(&Master) -> Result<T, RequestError> + Send + 'static,
    {
        let master = self.inner.clone();
        match tokio::task::spawn_blocking(move || action(&master)).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("blocking request task failed: {err}");
                Err(RequestError::Shutdown)
            }
        }
    }

    /// Read coils from the slave
    pub async fn read_coils(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<bool>>, RequestError> {
        self.run(move |master| master.read_coils(unit_id, range))
            .await
    }

    /// Read discrete inputs from the slave
    pub async fn read_discrete_inputs(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<bool>>, RequestError> {
        self.run(move |master| master.read_discrete_inputs(unit_id, range))
            .await
    }

    /// Read holding registers from the slave
    pub async fn read_holding_registers(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.run(move |master| master.read_holding_registers(unit_id, range))
            .await
    }

    /// Read input registers from the slave
    pub async fn read_input_registers(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.run(move |master| master.read_input_registers(unit_id, range))
            .await
    }

    /// Write a single coil on the slave
    pub async fn write_single_coil(
        &self,
        unit_id: UnitId,
        request: Indexed<bool>,
    ) -> Result<Indexed<bool>, RequestError> {
        self.run(move |master| master.write_single_coil(unit_id, request))
            .await
    }

    /// Write a single register on the slave
    pub async fn write_single_register(
        &self,
        unit_id: UnitId,
        request: Indexed<u16>,
    ) -> Result<Indexed<u16>, RequestError> {
        self.run(move |master| master.write_single_register(unit_id, request))
            .await
    }

    /// Write multiple contiguous coils on the slave
    pub async fn write_multiple_coils(
        &self,
        unit_id: UnitId,
        request: WriteMultiple<bool>,
    ) -> Result<AddressRange, RequestError> {
        self.run(move |master| master.write_multiple_coils(unit_id, request))
            .await
    }

    /// Write multiple contiguous registers on the slave
    pub async fn write_multiple_registers(
        &self,
        unit_id: UnitId,
        request: WriteMultiple<u16>,
    ) -> Result<AddressRange, RequestError> {
        self.run(move |master| master.write_multiple_registers(unit_id, request))
            .await
    }

    /// Send a diagnostics request
    pub async fn diagnostics(
        &self,
        unit_id: UnitId,
        request: Diagnostics,
    ) -> Result<Diagnostics, RequestError> {
        self.run(move |master| master.diagnostics(unit_id, request))
            .await
    }

    /// Diagnostics sub-function 0x0000
    pub async fn return_query_data(&self, unit_id: UnitId, data: u16) -> Result<u16, RequestError> {
        self.run(move |master| master.return_query_data(unit_id, data))
            .await
    }

    /// Write one record of a file on the slave
    pub async fn write_file_record(
        &self,
        unit_id: UnitId,
        record: FileRecord,
    ) -> Result<FileRecord, RequestError> {
        self.run(move |master| master.write_file_record(unit_id, record))
            .await
    }

    /// Write registers and then read registers in a single exchange
    pub async fn read_write_multiple_registers(
        &self,
        unit_id: UnitId,
        request: ReadWriteMultiple,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.run(move |master| master.read_write_multiple_registers(unit_id, request))
            .await
    }

    /// Send a request with an arbitrary function code
    pub async fn execute_custom(
        &self,
        unit_id: UnitId,
        request: CustomRequest,
    ) -> Result<CustomResponse, RequestError> {
        self.run(move |master| master.execute_custom(unit_id, &request))
            .await
    }

    /// Read one complete frame and drop it
    pub async fn discard_response(&self) -> Result<(), RequestError> {
        self.run(|master| master.discard_response()).await
    }

    /// change the read timeout of the byte stream
    pub async fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), RequestError> {
        self.run(move |master| master.set_read_timeout(timeout))
            .await
    }
}
