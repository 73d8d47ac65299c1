//! The sensor list a scan produces: each entry pairs a [`FullSensorRecord`]
//! with the record id it lives at, since the record body alone doesn't
//! carry that (§4.5/§4.6 — the change detector needs the id to re-probe a
//! sensor's identity without a full repository walk).

use crate::connection::LogicalUnit;

use super::record::{Direction, FullSensorRecord, SensorCapabilities, SensorId, SensorKey,
    SensorNumber, SensorOwner, SensorRecord, SensorRecordCommon};
use super::RecordId;
use crate::storage::sdr::change_detector::CachedSensor;

/// A sensor as returned by [`super::Scanner::scan`]: its decoded SDR plus
/// the record id it was fetched from.
#[derive(Debug, Clone)]
pub struct MaterializedSensor {
    record_id: RecordId,
    record: FullSensorRecord,
    /// Cached fixed-width threshold row for the overview sink, filled in
    /// lazily on first render (mirrors the original ipmitool-style table's
    /// per-sensor threshold cache).
    pub(crate) overview_thresholds: Option<String>,
}

impl MaterializedSensor {
    pub fn new(record_id: RecordId, record: FullSensorRecord) -> Self {
        Self {
            record_id,
            record,
            overview_thresholds: None,
        }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn record(&self) -> &FullSensorRecord {
        &self.record
    }

    /// The `(owner id, owner LUN, sensor number)` triple the SDR repository
    /// invariant requires to be unique across the whole sensor list (§3).
    pub fn identity(&self) -> (SensorOwner, LogicalUnit, SensorNumber) {
        let key = self.record.key_data();
        (key.owner_id, key.owner_lun, key.sensor_number)
    }

    pub fn cached_key(&self) -> CachedSensor {
        let key = self.record.key_data();
        CachedSensor {
            record_id: self.record_id,
            owner_id: key.owner_id,
            owner_lun: key.owner_lun,
            sensor_number: key.sensor_number,
        }
    }
}

impl SensorRecord for MaterializedSensor {
    fn common(&self) -> &SensorRecordCommon {
        self.record.common()
    }

    fn capabilities(&self) -> &SensorCapabilities {
        self.record.capabilities()
    }

    fn id_string(&self) -> &SensorId {
        self.record.id_string()
    }

    fn direction(&self) -> Direction {
        self.record.direction()
    }

    fn sensor_number(&self) -> SensorNumber {
        self.record.sensor_number()
    }

    fn entity_id(&self) -> u8 {
        self.record.entity_id()
    }

    fn key_data(&self) -> &SensorKey {
        self.record.key_data()
    }
}

impl std::ops::Deref for MaterializedSensor {
    type Target = FullSensorRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Order a sensor list the way the collector presents it: by category,
/// then unit string, then display name (§3 "ordering").
pub fn sort_for_presentation(sensors: &mut [MaterializedSensor]) {
    sensors.sort_by(|a, b| {
        let cat_a: u8 = a.common().ty.into();
        let cat_b: u8 = b.common().ty.into();

        cat_a
            .cmp(&cat_b)
            .then_with(|| {
                a.common()
                    .sensor_units
                    .display_str()
                    .cmp(&b.common().sensor_units.display_str())
            })
            .then_with(|| a.id_string().as_str().cmp(b.id_string().as_str()))
    });
}

/// Build the cached-identity list [`super::ChangeDetector::changed`] needs
/// from the sensor list a scan produced.
pub fn cached_keys(sensors: &[MaterializedSensor]) -> Vec<CachedSensor> {
    sensors.iter().map(MaterializedSensor::cached_key).collect()
}
