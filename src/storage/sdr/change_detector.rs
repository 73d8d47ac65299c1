//! Cheap repository-changed check (§4.6), so a long-running collector can
//! avoid a full [`Scanner::scan`](super::Scanner::scan) on every poll.

use crate::{
    connection::{IpmiConnection, LogicalUnit},
    storage::{
        sdr::{
            get_info::GetSdrRepositoryInfo,
            get_sdr::GetSdr,
            record::{SensorKey, SensorNumber, SensorOwner},
            RecordId,
        },
        Timestamp,
    },
    Ipmi,
};

/// The identity of a single cached sensor, as observed during the last
/// successful scan, plus the record id it lives at (needed to re-probe it
/// cheaply without a full repository walk).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedSensor {
    pub record_id: RecordId,
    pub owner_id: SensorOwner,
    pub owner_lun: LogicalUnit,
    pub sensor_number: SensorNumber,
}

/// Tracks the repository's add/delete timestamps across polls and verifies
/// that the previously scanned sensor set is still valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    last_add: Option<Timestamp>,
    last_del: Option<Timestamp>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the caller should re-run [`Scanner::scan`](super::Scanner::scan).
    ///
    /// Conservative: a failure to read the repository info is treated as
    /// "assume unchanged" rather than forcing a rescan, since a rescan on a
    /// BMC that's already struggling tends to make things worse.
    pub fn changed<CON>(&mut self, ipmi: &mut Ipmi<CON>, cached: &[CachedSensor]) -> bool
    where
        CON: IpmiConnection,
    {
        let info = match ipmi.send_recv(GetSdrRepositoryInfo) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Failed to fetch SDR repository info, assuming unchanged: {e:?}");
                return false;
            }
        };

        if cached.is_empty() {
            return info.record_count > 0;
        }

        if self.last_add == Some(info.last_add) && self.last_del == Some(info.last_del) {
            return false;
        }

        for sensor in cached {
            match Self::verify(ipmi, sensor) {
                Some(true) => {}
                Some(false) | None => {
                    log::info!("SDR repository changed: sensor identity mismatch or fetch failure");
                    return true;
                }
            }
        }

        self.last_add = Some(info.last_add);
        self.last_del = Some(info.last_del);

        false
    }

    fn verify<CON>(ipmi: &mut Ipmi<CON>, sensor: &CachedSensor) -> Option<bool>
    where
        CON: IpmiConnection,
    {
        let entry = ipmi.send_recv(GetSdr::key_only(sensor.record_id)).ok()?;
        let key = SensorKey::parse(&entry.data)?;

        Some(
            key.owner_id == sensor.owner_id
                && key.owner_lun == sensor.owner_lun
                && key.sensor_number == sensor.sensor_number,
        )
    }
}
