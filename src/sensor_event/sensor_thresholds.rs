use crate::{
    connection::{CompletionCode, IpmiCommand, LogicalUnit, Message, NetFn},
    storage::sdr::record::{SensorKey, SensorNumber, ThresholdKind},
};

/// `Get Sensor Thresholds` (Sensor/Event / `0x27`). Returns the raw
/// threshold values the BMC currently has programmed, alongside a
/// per-threshold readable flag, so callers can cross-check readings
/// without re-deriving them from the SDR's own threshold bytes.
#[derive(Debug, Clone, Copy)]
pub struct GetSensorThresholds {
    sensor_number: SensorNumber,
    lun: LogicalUnit,
}

impl GetSensorThresholds {
    pub fn new(sensor_number: SensorNumber, lun: LogicalUnit) -> Self {
        Self { sensor_number, lun }
    }

    pub fn for_sensor_key(value: &SensorKey) -> Self {
        Self {
            sensor_number: value.sensor_number,
            lun: value.owner_lun,
        }
    }
}

impl From<GetSensorThresholds> for Message {
    fn from(value: GetSensorThresholds) -> Self {
        Message::new_request(NetFn::SensorEvent, 0x27, vec![value.sensor_number.get()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetSensorThresholdsError {
    NotEnoughData,
    /// `0xCB`/`0xC1` — quiet; some BMCs report either for an unsupported
    /// or unpopulated sensor.
    Unsupported,
}

/// The six threshold values, each `None` when the BMC's readable mask
/// (byte 0 of the response) says that threshold isn't programmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorThresholds {
    lower_non_critical: Option<u8>,
    lower_critical: Option<u8>,
    lower_non_recoverable: Option<u8>,
    upper_non_critical: Option<u8>,
    upper_critical: Option<u8>,
    upper_non_recoverable: Option<u8>,
}

impl SensorThresholds {
    pub fn value(&self, kind: ThresholdKind) -> Option<u8> {
        match kind {
            ThresholdKind::LowerNonCritical => self.lower_non_critical,
            ThresholdKind::LowerCritical => self.lower_critical,
            ThresholdKind::LowerNonRecoverable => self.lower_non_recoverable,
            ThresholdKind::UpperNonCritical => self.upper_non_critical,
            ThresholdKind::UpperCritical => self.upper_critical,
            ThresholdKind::UpperNonRecoverable => self.upper_non_recoverable,
        }
    }

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != 7 {
            return None;
        }

        let readable = data[0];
        let at = |bit: u8, raw: u8| (readable & (1 << bit) != 0).then_some(raw);

        Some(Self {
            lower_non_critical: at(0, data[1]),
            lower_critical: at(1, data[2]),
            lower_non_recoverable: at(2, data[3]),
            upper_non_critical: at(3, data[4]),
            upper_critical: at(4, data[5]),
            upper_non_recoverable: at(5, data[6]),
        })
    }
}

impl IpmiCommand for GetSensorThresholds {
    type Output = SensorThresholds;
    type Error = GetSensorThresholdsError;

    fn handle_completion_code(
        completion_code: CompletionCode,
        _data: &[u8],
    ) -> Option<Self::Error> {
        match completion_code {
            CompletionCode::SensorNotFound | CompletionCode::CommandIllegalForSensorOrRecord => {
                Some(GetSensorThresholdsError::Unsupported)
            }
            _ => None,
        }
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        Self::Output::parse(data).ok_or(GetSensorThresholdsError::NotEnoughData)
    }

    fn lun(&self) -> LogicalUnit {
        self.lun
    }
}
