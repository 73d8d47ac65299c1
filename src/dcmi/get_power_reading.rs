use crate::{
    connection::{CompletionCode, IpmiCommand, Message, NetFn},
    log_vec,
    storage::Timestamp,
    Loggable,
};

/// `Get Power Reading` (DCMI group extension / `0x02`). Requests "system
/// power statistics" mode (`0x01`); the per-domain mode (`0x02`) is rarely
/// implemented by BMCs and not requested here.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDcmiPowerReading;

/// The DCMI group extension identifier every DCMI request/response carries.
const DCMI_GROUP_EXTENSION: u8 = 0xDC;

impl From<GetDcmiPowerReading> for Message {
    fn from(_: GetDcmiPowerReading) -> Self {
        Message::new_request(
            NetFn::Group,
            0x02,
            vec![DCMI_GROUP_EXTENSION, 0x01, 0x00, 0x00],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetDcmiPowerReadingError {
    NotEnoughData,
    /// The response's group extension byte did not echo `0xDC`.
    WrongGroupExtension,
    /// `0xC1` — this BMC does not implement DCMI at all. Callers should
    /// stop asking for the rest of the session (§4.8).
    Unsupported,
}

/// A single DCMI power sample, covering the current reading plus the
/// min/max/average over the BMC's own rolling sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcmiPowerReading {
    pub current_watts: u16,
    pub minimum_watts: u16,
    pub maximum_watts: u16,
    pub average_watts: u16,
    pub timestamp: Timestamp,
    /// Length, in milliseconds, of the sampling window the min/max/average
    /// values were computed over.
    pub sample_period_ms: u32,
    /// `true` if the BMC is actively taking power measurements; when
    /// `false` the other fields may be stale.
    pub measurement_active: bool,
}

impl DcmiPowerReading {
    fn parse(data: &[u8]) -> Result<Self, GetDcmiPowerReadingError> {
        if data.len() < 18 {
            return Err(GetDcmiPowerReadingError::NotEnoughData);
        }

        if data[0] != DCMI_GROUP_EXTENSION {
            return Err(GetDcmiPowerReadingError::WrongGroupExtension);
        }

        Ok(Self {
            current_watts: u16::from_le_bytes([data[1], data[2]]),
            minimum_watts: u16::from_le_bytes([data[3], data[4]]),
            maximum_watts: u16::from_le_bytes([data[5], data[6]]),
            average_watts: u16::from_le_bytes([data[7], data[8]]),
            timestamp: Timestamp::from(u32::from_le_bytes([
                data[9], data[10], data[11], data[12],
            ])),
            sample_period_ms: u32::from_le_bytes([data[13], data[14], data[15], data[16]]),
            measurement_active: (data[17] & 0x40) == 0x40,
        })
    }
}

impl IpmiCommand for GetDcmiPowerReading {
    type Output = DcmiPowerReading;
    type Error = GetDcmiPowerReadingError;

    fn handle_completion_code(
        completion_code: CompletionCode,
        _data: &[u8],
    ) -> Option<Self::Error> {
        match completion_code {
            CompletionCode::InvalidCommand => Some(GetDcmiPowerReadingError::Unsupported),
            _ => None,
        }
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        DcmiPowerReading::parse(data)
    }
}

impl Loggable for DcmiPowerReading {
    fn as_log(&self) -> Vec<crate::fmt::LogItem> {
        log_vec![
            (0, "DCMI power reading"),
            (1, "Current", format!("{} W", self.current_watts)),
            (1, "Minimum", format!("{} W", self.minimum_watts)),
            (1, "Maximum", format!("{} W", self.maximum_watts)),
            (1, "Average", format!("{} W", self.average_watts)),
            (1, "Sample period", format!("{} ms", self.sample_period_ms)),
            (1, "Measurement active", self.measurement_active)
        ]
    }
}
