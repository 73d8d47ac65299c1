use crate::{
    connection::{CompletionCode, IpmiCommand, LogicalUnit, Message, NetFn},
    storage::sdr::{
        conversion::{self, Factors},
        record::{Direction, SensorKey, SensorNumber},
    },
};

/// `Get Sensor Reading Factors` (Sensor/Event / `0x23`). Non-linear sensors
/// (§4.7) carry no usable factors in their SDR; this is how the caller
/// fetches the factors that apply to a specific raw `reading` instead.
#[derive(Debug, Clone, Copy)]
pub struct GetSensorFactors {
    sensor_number: SensorNumber,
    reading: u8,
    lun: LogicalUnit,
}

impl GetSensorFactors {
    pub fn new(sensor_number: SensorNumber, reading: u8, lun: LogicalUnit) -> Self {
        Self {
            sensor_number,
            reading,
            lun,
        }
    }

    pub fn for_sensor_key(value: &SensorKey, reading: u8) -> Self {
        Self {
            sensor_number: value.sensor_number,
            reading,
            lun: value.owner_lun,
        }
    }
}

impl From<GetSensorFactors> for Message {
    fn from(value: GetSensorFactors) -> Self {
        Message::new_request(
            NetFn::SensorEvent,
            0x23,
            vec![value.sensor_number.get(), value.reading],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetSensorFactorsError {
    NotEnoughData,
    /// `0xCB` — the sensor does not exist.
    SensorNotFound,
}

/// Factors for the requested raw reading, plus the next raw value (in
/// ascending order) for which the BMC would return a different factors
/// set. The linearization code isn't part of this response — it comes
/// from the sensor's own SDR and is known to the caller already.
#[derive(Debug, Clone, Copy)]
pub struct RawSensorFactors {
    pub next_reading: u8,
    pub m: i16,
    pub b: i16,
    pub b_exponent: i8,
    pub result_exponent: i8,
    pub tolerance: u8,
    pub accuracy: u16,
    pub accuracy_exponent: u8,
    pub direction: Direction,
}

impl RawSensorFactors {
    /// Combine with the linearization code from the sensor's SDR to get a
    /// full [`Factors`] usable with [`conversion::convert`].
    pub fn with_linearization(&self, linearization: u8) -> Factors {
        Factors {
            m: self.m,
            b: self.b,
            b_exponent: self.b_exponent,
            result_exponent: self.result_exponent,
            accuracy: self.accuracy,
            accuracy_exponent: self.accuracy_exponent,
            linearization,
        }
    }

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != 7 {
            return None;
        }

        let next_reading = data[0];

        let m_lsb = data[1];
        let m_msb_tolerance = data[2];
        let m = conversion::decode_signed_10(m_lsb, m_msb_tolerance >> 6);
        let tolerance = m_msb_tolerance & 0x3F;

        let b_lsb = data[3];
        let b_msb_accuracy_lsb = data[4];
        let b = conversion::decode_signed_10(b_lsb, b_msb_accuracy_lsb >> 6);

        let accuracy_msb_accuracy_exp_sensor_dir = data[5];
        let accuracy = u16::from_le_bytes([
            (accuracy_msb_accuracy_exp_sensor_dir >> 4) & 0xF,
            b_msb_accuracy_lsb & 0x3F,
        ]);
        let accuracy_exponent = (accuracy_msb_accuracy_exp_sensor_dir >> 2) & 0x3;
        let direction = Direction::try_from(accuracy_msb_accuracy_exp_sensor_dir & 0b11)
            .unwrap_or(Direction::UnspecifiedNotApplicable);

        let r_exp_b_exp = data[6];
        let result_exponent = conversion::decode_signed_4(r_exp_b_exp >> 4);
        let b_exponent = conversion::decode_signed_4(r_exp_b_exp);

        Some(Self {
            next_reading,
            m,
            b,
            b_exponent,
            result_exponent,
            tolerance,
            accuracy,
            accuracy_exponent,
            direction,
        })
    }
}

impl IpmiCommand for GetSensorFactors {
    type Output = RawSensorFactors;
    type Error = GetSensorFactorsError;

    fn handle_completion_code(
        completion_code: CompletionCode,
        _data: &[u8],
    ) -> Option<Self::Error> {
        match completion_code {
            CompletionCode::SensorNotFound => Some(GetSensorFactorsError::SensorNotFound),
            _ => None,
        }
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        RawSensorFactors::parse(data).ok_or(GetSensorFactorsError::NotEnoughData)
    }

    fn lun(&self) -> LogicalUnit {
        self.lun
    }
}
