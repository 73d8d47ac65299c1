//! IPMI-rs: a pure-rust IPMI library.
//!
//! This library provides command serialization and deserialization (in the [`app`], [`storage`], [`sensor_event`] and [`dcmi`] modules),
//! and different ways of connecting to an IPMI device (in the [`connection`] module).

pub mod app;

pub mod connection;

mod error;
pub use error::IpmiError;

pub mod storage;
pub use storage::sdr::record::WithSensorRecordCommon;

pub mod sensor_event;

pub mod dcmi;

pub mod config;

pub mod collector;

#[macro_use]
mod fmt;

pub use fmt::{LogOutput, Loggable, Logger};

use connection::{CompletionCode, IpmiCommand, Request};
use storage::sdr::{self, record::Record as SdrRecord, GetSdrError, ReservationController};

pub struct Ipmi<CON> {
    inner: CON,
}

impl<CON> Ipmi<CON> {
    pub fn release(self) -> CON {
        self.inner
    }
}

impl<CON> From<CON> for Ipmi<CON>
where
    CON: connection::IpmiConnection,
{
    fn from(value: CON) -> Self {
        Self::new(value)
    }
}

impl<CON> Ipmi<CON>
where
    CON: connection::IpmiConnection,
{
    pub fn inner_mut(&mut self) -> &mut CON {
        &mut self.inner
    }

    pub fn new(inner: CON) -> Self {
        Self { inner }
    }

    pub fn sdrs(&mut self) -> SdrIter<CON> {
        SdrIter {
            ipmi: self,
            reservation: ReservationController::new(),
            next_id: Some(sdr::RecordId::FIRST),
        }
    }

    pub fn send_recv<CMD>(
        &mut self,
        request: CMD,
    ) -> Result<CMD::Output, IpmiError<CON::Error, CMD::Error>>
    where
        CMD: IpmiCommand,
    {
        let lun = request.lun();
        let message = request.into();
        let (message_netfn, message_cmd) = (message.netfn(), message.cmd());
        let mut request = Request::new(message, lun);

        let response = self.inner.send_recv(&mut request)?;

        if response.netfn() != message_netfn || response.cmd() != message_cmd {
            return Err(IpmiError::UnexpectedResponse {
                netfn_sent: message_netfn,
                netfn_recvd: response.netfn(),
                cmd_sent: message_cmd,
                cmd_recvd: response.cmd(),
            });
        }

        if response.cc() != 0 {
            let completion_code = CompletionCode::from(response.cc());

            let error = CMD::handle_completion_code(completion_code, response.data())
                .map(|error| IpmiError::Command {
                    error,
                    netfn: response.netfn(),
                    cmd: response.cmd(),
                    completion_code: Some(completion_code),
                    data: response.data().to_vec(),
                })
                .unwrap_or_else(|| IpmiError::Failed {
                    netfn: response.netfn(),
                    cmd: response.cmd(),
                    completion_code,
                    data: response.data().to_vec(),
                });

            return Err(error);
        }

        CMD::parse_success_response(response.data()).map_err(|error| IpmiError::ParsingFailed {
            error,
            netfn: response.netfn(),
            cmd: response.cmd(),
            data: response.data().to_vec(),
        })
    }
}

pub struct SdrIter<'ipmi, CON> {
    ipmi: &'ipmi mut Ipmi<CON>,
    reservation: ReservationController,
    next_id: Option<sdr::RecordId>,
}

impl<T> Iterator for SdrIter<'_, T>
where
    T: connection::IpmiConnection,
{
    type Item = SdrRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_id) = self.next_id.take() {
            if current_id.is_last() {
                return None;
            }

            let fetched = self.reservation.get_sdr(self.ipmi, current_id);

            match fetched {
                Ok(sdr::FetchedSdr { next_entry, data }) => {
                    if next_entry == current_id {
                        log::error!("Got duplicate SDR record IDs! Stopping iteration.");
                        return None;
                    }

                    self.next_id = Some(next_entry);

                    match SdrRecord::parse(&data) {
                        Some(record) => return Some(record),
                        None => {
                            log::warn!(
                                "Failed to parse SDR record 0x{:04X}. Skipping to next.",
                                current_id.value()
                            );
                            continue;
                        }
                    }
                }
                Err(IpmiError::Command {
                    error: GetSdrError::ReservationCanceled,
                    ..
                }) => {
                    log::warn!(
                        "Reservation repeatedly canceled while fetching SDR record 0x{:04X}. Stopping iteration.",
                        current_id.value()
                    );
                    return None;
                }
                Err(e) => {
                    log::error!(
                        "Unrecoverable error while fetching SDR record 0x{:04X}: {e:?}",
                        current_id.value()
                    );
                    return None;
                }
            }
        }
        None
    }
}
