use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::MasterConfig;
use crate::constants::exceptions::EXCEPTION_OFFSET;
use crate::constants::limits;
use crate::error::{InvalidRequest, OpenError, RequestError, RetryClass};
use crate::exception::ExceptionCode;
use crate::message::custom::{CustomRequest, CustomResponse};
use crate::message::diagnostics::DiagnosticsRequest;
use crate::message::file_record::WriteFileRecord;
use crate::message::read_bits::ReadBits;
use crate::message::read_registers::ReadRegisters;
use crate::message::read_write_multiple::ReadWriteMultipleRequest;
use crate::message::write_multiple::WriteMultipleRequest;
use crate::message::write_single::WriteSingle;
use crate::message::{
    decode_response, encode_pdu, ModbusRequest, RequestDisplay, ResponseDisplay,
};
use crate::stream::{ByteStream, UdpStream};
use crate::transport::length::is_delimited_request;
use crate::transport::{ResponseRule, Transport, TransportKind};
use crate::types::{
    AddressRange, Diagnostics, FileRecord, Indexed, ReadWriteMultiple, UnitId, WriteMultiple,
};

#[cfg(feature = "serial")]
use crate::stream::{SerialSettings, SerialStream};

/// A Modbus master bound to a single byte stream
///
/// Every operation is a blocking request/response exchange. The transport is held
/// exclusively for the whole exchange, including retries, so a master can be shared
/// between threads and requests are serialized.
pub struct Master {
    transport: Mutex<Transport>,
    config: MasterConfig,
}

impl Master {
    /// Create a master over an arbitrary byte stream
    ///
    /// The configuration is validated and its timeouts are applied to the stream.
    pub fn new<S>(
        mut stream: S,
        kind: TransportKind,
        config: MasterConfig,
    ) -> Result<Self, OpenError>
    where
        S: ByteStream + 'static,
    {
        config.validate()?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        let transport = Transport::new(
            Box::new(stream),
            kind,
            config.ignore_list.clone(),
            config.decode,
        );
        tracing::debug!("opened {kind} master");
        Ok(Self {
            transport: Mutex::new(transport),
            config,
        })
    }

    /// Connect to a slave over TCP
    pub fn tcp<A: ToSocketAddrs>(addr: A, config: MasterConfig) -> Result<Self, OpenError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Self::new(stream, TransportKind::Tcp, config)
    }

    /// Exchange MBAP frames with a slave over UDP
    pub fn udp<A: ToSocketAddrs>(addr: A, config: MasterConfig) -> Result<Self, OpenError> {
        let stream = UdpStream::connect(addr)?;
        Self::new(stream, TransportKind::Tcp, config)
    }

    /// Open a serial port using RTU framing
    #[cfg(feature = "serial")]
    pub fn rtu(
        path: &str,
        settings: SerialSettings,
        config: MasterConfig,
    ) -> Result<Self, OpenError> {
        let stream = SerialStream::open(path, settings)?;
        Self::new(stream, TransportKind::Rtu, config)
    }

    /// Open a serial port using ASCII framing
    #[cfg(feature = "serial")]
    pub fn ascii(
        path: &str,
        settings: SerialSettings,
        config: MasterConfig,
    ) -> Result<Self, OpenError> {
        let stream = SerialStream::open(path, settings)?;
        Self::new(stream, TransportKind::Ascii, config)
    }

    /// configuration the master was created with
    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    /// framing used on the byte stream
    pub fn kind(&self) -> TransportKind {
        self.lock().kind()
    }

    /// current read timeout of the byte stream
    pub fn read_timeout(&self) -> Result<Option<Duration>, RequestError> {
        Ok(self.lock().stream_mut().read_timeout()?)
    }

    /// change the read timeout of the byte stream
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), RequestError> {
        self.lock().stream_mut().set_read_timeout(timeout)?;
        Ok(())
    }

    /// current write timeout of the byte stream
    pub fn write_timeout(&self) -> Result<Option<Duration>, RequestError> {
        Ok(self.lock().stream_mut().write_timeout()?)
    }

    /// change the write timeout of the byte stream
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<(), RequestError> {
        self.lock().stream_mut().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Close the byte stream, later requests fail
    pub fn close(&self) -> Result<(), RequestError> {
        self.lock().stream_mut().close()?;
        Ok(())
    }

    /// Read coils from the slave
    pub fn read_coils(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<bool>>, RequestError> {
        self.unicast_message(unit_id, &ReadBits::coils(range.of_read_bits()?))
    }

    /// Read discrete inputs from the slave
    pub fn read_discrete_inputs(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<bool>>, RequestError> {
        self.unicast_message(unit_id, &ReadBits::discrete_inputs(range.of_read_bits()?))
    }

    /// Read holding registers from the slave
    pub fn read_holding_registers(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.unicast_message(unit_id, &ReadRegisters::holding(range.of_read_registers()?))
    }

    /// Read input registers from the slave
    pub fn read_input_registers(
        &self,
        unit_id: UnitId,
        range: AddressRange,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.unicast_message(unit_id, &ReadRegisters::input(range.of_read_registers()?))
    }

    /// Write a single coil on the slave
    pub fn write_single_coil(
        &self,
        unit_id: UnitId,
        request: Indexed<bool>,
    ) -> Result<Indexed<bool>, RequestError> {
        self.unicast_message(unit_id, &WriteSingle::coil(request))
    }

    /// Write a single register on the slave
    pub fn write_single_register(
        &self,
        unit_id: UnitId,
        request: Indexed<u16>,
    ) -> Result<Indexed<u16>, RequestError> {
        self.unicast_message(unit_id, &WriteSingle::register(request))
    }

    /// Write multiple contiguous coils on the slave
    pub fn write_multiple_coils(
        &self,
        unit_id: UnitId,
        request: WriteMultiple<bool>,
    ) -> Result<AddressRange, RequestError> {
        let request = request.limited_count(limits::MAX_WRITE_COILS_COUNT)?;
        self.unicast_message(unit_id, &WriteMultipleRequest::coils(request))
    }

    /// Write multiple contiguous registers on the slave
    pub fn write_multiple_registers(
        &self,
        unit_id: UnitId,
        request: WriteMultiple<u16>,
    ) -> Result<AddressRange, RequestError> {
        let request = request.limited_count(limits::MAX_WRITE_REGISTERS_COUNT)?;
        self.unicast_message(unit_id, &WriteMultipleRequest::registers(request))
    }

    /// Send a diagnostics request and return the slave's answer
    pub fn diagnostics(
        &self,
        unit_id: UnitId,
        request: Diagnostics,
    ) -> Result<Diagnostics, RequestError> {
        self.unicast_message(unit_id, &DiagnosticsRequest::new(request))
    }

    /// Diagnostics sub-function 0x0000, the slave echoes `data`
    pub fn return_query_data(&self, unit_id: UnitId, data: u16) -> Result<u16, RequestError> {
        let response =
            self.unicast_message(unit_id, &DiagnosticsRequest::return_query_data(data))?;
        Ok(response.data)
    }

    /// Write one record of a file on the slave
    pub fn write_file_record(
        &self,
        unit_id: UnitId,
        record: FileRecord,
    ) -> Result<FileRecord, RequestError> {
        self.unicast_message(unit_id, &WriteFileRecord::new(record))
    }

    /// Write registers and then read registers in a single exchange
    pub fn read_write_multiple_registers(
        &self,
        unit_id: UnitId,
        request: ReadWriteMultiple,
    ) -> Result<Vec<Indexed<u16>>, RequestError> {
        self.unicast_message(unit_id, &ReadWriteMultipleRequest::new(request))
    }

    /// Send a request with an arbitrary function code
    pub fn execute_custom(
        &self,
        unit_id: UnitId,
        request: &CustomRequest,
    ) -> Result<CustomResponse, RequestError> {
        self.unicast_message(unit_id, request)
    }

    /// Read one complete frame and drop it without decoding its PDU
    ///
    /// The framing is still checked. On serial lines the frame is delimited using the length
    /// rule of the function code it carries, and its CRC or LRC is verified, so a corrupted
    /// frame or one with an unknown function code is reported as an error. Frames on the
    /// ignore list are dropped before any check.
    pub fn discard_response(&self) -> Result<(), RequestError> {
        let mut transport = self.lock();
        let rule = ResponseRule {
            function: 0,
            length: None,
        };
        transport.read(rule)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Transport> {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a request and wait for its validated response, retrying as configured
    ///
    /// Acknowledge exceptions and stale transaction ids are read past without re-sending and
    /// without consuming a retry. Busy exceptions re-send and only consume a retry when
    /// `slave_busy_uses_retry_count` is set.
    pub(crate) fn unicast_message<R: ModbusRequest>(
        &self,
        unit_id: UnitId,
        request: &R,
    ) -> Result<R::Response, RequestError> {
        let mut transport = self.lock();
        let pdu = encode_pdu(request)?;
        let level = transport.decode().pdu;
        let serial = transport.kind().is_serial();

        if serial && !is_delimited_request(&pdu) {
            return Err(InvalidRequest::MalformedPayload(request.function()).into());
        }

        if serial && unit_id.is_broadcast() {
            let response = request
                .broadcast_response()
                .ok_or(InvalidRequest::BroadcastRead)?;
            if level.enabled() {
                tracing::info!("PDU TX - {}", RequestDisplay::new(level, request));
            }
            transport.discard_in_buffer()?;
            transport.write(unit_id, &pdu)?;
            return Ok(response);
        }

        let rule = ResponseRule {
            function: request.function(),
            length: request.response_length(),
        };
        if serial && rule.length.is_none() {
            return Err(RequestError::UnsupportedFunction(rule.function));
        }

        if level.enabled() {
            tracing::info!("PDU TX - {}", RequestDisplay::new(level, request));
        }

        let retries = self.config.retries;
        let mut attempt: usize = 1;
        loop {
            let err = match self.exchange(&mut transport, unit_id, request, &pdu, rule) {
                Ok(response) => {
                    if level.enabled() {
                        tracing::info!(
                            "PDU RX - {}",
                            ResponseDisplay::new(level, request, &response)
                        );
                    }
                    return Ok(response);
                }
                Err(err) => err,
            };

            if err == RequestError::Exception(ExceptionCode::SlaveDeviceBusy) {
                if self.config.slave_busy_uses_retry_count {
                    if attempt > retries {
                        return Err(err);
                    }
                    attempt += 1;
                }
                tracing::warn!("slave busy, re-sending request");
            } else {
                match err.retry_class() {
                    RetryClass::Retry => {
                        if attempt > retries {
                            return Err(err);
                        }
                        tracing::warn!("{err}, retry {attempt} of {retries}");
                        attempt += 1;
                    }
                    RetryClass::Disconnect => {
                        tracing::warn!("{err}, stream disconnected");
                        return Err(err);
                    }
                    RetryClass::Fatal => return Err(err),
                }
            }

            std::thread::sleep(self.config.wait_to_retry);
        }
    }

    /// One send followed by reads until a response for this request arrives
    fn exchange<R: ModbusRequest>(
        &self,
        transport: &mut Transport,
        unit_id: UnitId,
        request: &R,
        pdu: &[u8],
        rule: ResponseRule,
    ) -> Result<R::Response, RequestError> {
        transport.discard_in_buffer()?;
        let header = transport.write(unit_id, pdu)?;

        loop {
            let frame = match transport.read(rule)? {
                Some(frame) => frame,
                None => continue,
            };

            if frame.function() == rule.function | EXCEPTION_OFFSET {
                match frame.exception()? {
                    Some(ExceptionCode::Acknowledge) => {
                        tracing::warn!("slave acknowledged the request, waiting for the response");
                        std::thread::sleep(self.config.wait_to_retry);
                        continue;
                    }
                    Some(code) => return Err(code.into()),
                    None => {}
                }
            }

            if transport.should_retry(header, &frame, self.config.retry_on_old_response_threshold) {
                if let Some(tx_id) = frame.header.tx_id {
                    tracing::warn!("discarding stale response with transaction id {tx_id}");
                }
                continue;
            }

            transport.validate(header, rule.function, &frame)?;

            return decode_response(request, frame.data());
        }
    }
}
