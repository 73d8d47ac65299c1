use crate::{
    connection::{CompletionCode, IpmiCommand, LogicalUnit, Message, NetFn},
    storage::sdr::record::{SensorKey, SensorNumber},
};

use super::RawSensorReading;

impl RawSensorReading {
    pub(crate) fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let reading = data[0];

        // Bit indicates that all event messages are enabled => must negate result
        let all_event_messages_disabled = (data[1] & 0x80) != 0x80;

        // Bit indicates that sensor scanning is enabled => must negate result
        let scanning_disabled = (data[1] & 0x40) != 0x40;

        let reading_or_state_unavailable = (data[1] & 0x20) == 0x20;

        let offset_data_1 = data.get(2).copied();
        let offset_data_2 = data.get(3).copied();

        Some(Self {
            reading,
            all_event_messages_disabled,
            scanning_disabled,
            reading_or_state_unavailable,
            offset_data_1,
            offset_data_2,
        })
    }
}

/// `Get Sensor Reading` (Sensor/Event / `0x2D`). The sensor is addressed by
/// its number alone; the owning LUN comes from the SDR's [`SensorKey`] (no
/// satellite-MC bridging, so there is no address/channel to target, only
/// the local device's own LUNs).
#[derive(Debug, Clone, Copy)]
pub struct GetSensorReading {
    sensor_number: SensorNumber,
    lun: LogicalUnit,
}

impl GetSensorReading {
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

impl From<GetSensorReading> for Message {
    fn from(value: GetSensorReading) -> Self {
        Message::new_request(NetFn::SensorEvent, 0x2D, vec![value.sensor_number.get()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetSensorReadingError {
    NotEnoughData,
    /// `0xCB` — the sensor does not exist; callers typically drop it from
    /// the scan result rather than treat this as fatal (§4.5).
    SensorNotFound,
}

impl IpmiCommand for GetSensorReading {
    type Output = RawSensorReading;
    type Error = GetSensorReadingError;

    fn handle_completion_code(
        completion_code: CompletionCode,
        _data: &[u8],
    ) -> Option<Self::Error> {
        match completion_code {
            CompletionCode::SensorNotFound => Some(GetSensorReadingError::SensorNotFound),
            _ => None,
        }
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        RawSensorReading::parse(data).ok_or(GetSensorReadingError::NotEnoughData)
    }

    fn lun(&self) -> LogicalUnit {
        self.lun
    }
}
