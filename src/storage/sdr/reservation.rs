use std::{num::NonZeroU16, time::Duration};

use crate::{
    connection::{CompletionCode, IpmiConnection},
    storage::sdr::{
        get_sdr::{GetSdr, GetSdrError},
        reserve::{ReserveError, ReserveSdrRepository},
        RecordId,
    },
    Ipmi, IpmiError,
};

/// `ReserveSDRRepo`'s error type is distinct from `GetSDR`'s; translate it
/// into the shape this controller's callers expect, collapsing the
/// reserve-specific detail into a plain completion-code failure.
fn convert_reserve_err<CON: core::fmt::Debug>(
    e: IpmiError<CON, ReserveError>,
) -> IpmiError<CON, GetSdrError> {
    match e {
        IpmiError::NetFnIsResponse(v) => IpmiError::NetFnIsResponse(v),
        IpmiError::UnexpectedResponse {
            netfn_sent,
            netfn_recvd,
            cmd_sent,
            cmd_recvd,
        } => IpmiError::UnexpectedResponse {
            netfn_sent,
            netfn_recvd,
            cmd_sent,
            cmd_recvd,
        },
        IpmiError::Command {
            netfn,
            cmd,
            completion_code,
            data,
            ..
        } => IpmiError::Failed {
            netfn,
            cmd,
            completion_code: completion_code.unwrap_or(CompletionCode::Unspecified),
            data,
        },
        IpmiError::Failed {
            netfn,
            cmd,
            completion_code,
            data,
        } => IpmiError::Failed {
            netfn,
            cmd,
            completion_code,
            data,
        },
        IpmiError::ParsingFailed {
            netfn, cmd, data, ..
        } => IpmiError::Failed {
            netfn,
            cmd,
            completion_code: CompletionCode::Unspecified,
            data,
        },
        IpmiError::Connection(e) => IpmiError::Connection(e),
    }
}

/// Up to four total `GetSDR` attempts per call, each preceded by a fresh
/// reservation when the cached one is known to be stale (§4.4, §8
/// property #7).
const MAX_ATTEMPTS: usize = 4;

/// Drives the `GetSDR` reservation/retry ladder described in §4.4.
///
/// Owns the current reservation id so repeated `GetSDR` calls across a
/// full repository walk reuse it until the BMC reports
/// `ReservationCanceled`.
#[derive(Debug, Default)]
pub struct ReservationController {
    reservation_id: Option<NonZeroU16>,
}

/// A successfully fetched SDR entry: the link to the next record in the
/// repository's walk order, and the raw record bytes (header included).
#[derive(Debug, Clone)]
pub struct FetchedSdr {
    pub next_entry: RecordId,
    pub data: Vec<u8>,
}

impl ReservationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the SDR named `record_id` (`RecordId::FIRST` for the first
    /// record in the repository), refreshing the reservation and retrying
    /// as needed.
    pub fn get_sdr<CON>(
        &mut self,
        ipmi: &mut Ipmi<CON>,
        record_id: RecordId,
    ) -> Result<FetchedSdr, IpmiError<CON::Error, GetSdrError>>
    where
        CON: IpmiConnection,
    {
        let mut refreshes = 0usize;

        for _attempt in 0..MAX_ATTEMPTS {
            if self.reservation_id.is_none() {
                if refreshes > 0 {
                    std::thread::sleep(Duration::from_secs(1));
                }

                let id = ipmi
                    .send_recv(ReserveSdrRepository)
                    .map_err(convert_reserve_err)?;
                self.reservation_id = Some(id);
                refreshes += 1;
            }

            let result = ipmi.send_recv(GetSdr::new(self.reservation_id, record_id));

            match result {
                Ok(entry) => return Ok(Self::finalize(record_id, entry.next_entry, entry.data)),
                Err(IpmiError::Command {
                    error: GetSdrError::ReservationCanceled,
                    ..
                }) => {
                    self.reservation_id = None;
                    continue;
                }
                Err(IpmiError::Command {
                    error: GetSdrError::BufferTooSmall,
                    data,
                    ..
                }) => {
                    let entry = super::get_sdr::SdrEntry::parse(&data)
                        .ok_or_else(|| IpmiError::ParsingFailed {
                            error: GetSdrError::NotEnoughData,
                            netfn: crate::connection::NetFn::Storage,
                            cmd: 0x23,
                            data: data.clone(),
                        })?;
                    return Ok(Self::finalize(record_id, entry.next_entry, entry.data));
                }
                Err(e) => return Err(e),
            }
        }

        Err(IpmiError::Failed {
            netfn: crate::connection::NetFn::Storage,
            cmd: 0x23,
            completion_code: crate::connection::CompletionCode::ReservationCanceled,
            data: Vec::new(),
        })
    }

    /// If the payload's embedded record id differs from the id we asked
    /// for (and we did ask for a specific one), override it with the
    /// requested id and log a warning — tolerates a known BMC bug (§4.4).
    fn finalize(requested: RecordId, next_entry: RecordId, mut data: Vec<u8>) -> FetchedSdr {
        if !requested.is_first() && data.len() >= 2 {
            let embedded = u16::from_le_bytes([data[0], data[1]]);
            if embedded != requested.value() {
                log::warn!(
                    "SDR record 0x{:04X} came back with embedded id 0x{:04X}; overriding",
                    requested.value(),
                    embedded
                );
                data[0..2].copy_from_slice(&requested.value().to_le_bytes());
            }
        }

        FetchedSdr { next_entry, data }
    }
}
