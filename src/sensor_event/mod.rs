//! Sensor/Event netfn (`0x04`/`0x05`) commands: reading, thresholds, and the
//! non-linear reading-factors lookup (§4.7).

pub mod sensor_reading;
pub use sensor_reading::{
    FromSensorReading, GetSensorReading, GetSensorReadingError, RawSensorReading, ThresholdReading,
    ThresholdStatus,
};

mod sensor_thresholds;
pub use sensor_thresholds::{GetSensorThresholds, GetSensorThresholdsError, SensorThresholds};

mod sensor_factors;
pub use sensor_factors::{GetSensorFactors, GetSensorFactorsError, RawSensorFactors};
