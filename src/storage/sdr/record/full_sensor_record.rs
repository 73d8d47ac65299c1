use std::num::NonZeroU8;

use super::*;
use crate::storage::sdr::conversion::{self, Factors};

#[derive(Debug, Clone)]
pub struct FullSensorRecord {
    common: SensorRecordCommon,
    pub analog_data_format: Option<DataFormat>,
    pub linearization: Linearization,
    /// `None` for non-linear sensors (§4.7) — factors must be fetched fresh
    /// per reading via `GetSensorFactors` instead of read from here.
    pub factors: Option<Factors>,
    pub direction: Direction,
    pub tolerance: u8,
    nominal_reading: Option<u8>,
    normal_maximum: Option<u8>,
    normal_minimum: Option<u8>,
    max_reading: u8,
    min_reading: u8,
    upper_non_recoverable_threshold: u8,
    upper_critical_threshold: u8,
    upper_non_critical_threshold: u8,
    lower_non_recoverable_threshold: u8,
    lower_critical_threshold: u8,
    lower_non_critical_threshold: u8,
    pub positive_going_threshold_hysteresis_value: Option<NonZeroU8>,
    pub negative_going_threshold_hysteresis_value: Option<NonZeroU8>,
    pub oem_data: u8,
}

#[derive(Debug, Clone, Copy)]
pub enum ParseFullSensorRecordError {
    NotEnoughData,
    CouldNotParseCommon,
    NotEnoughDataAfterCommon,
}

impl SensorRecord for FullSensorRecord {
    fn common(&self) -> &SensorRecordCommon {
        &self.common
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

impl FullSensorRecord {
    pub fn parse(record_data: &[u8]) -> Result<Self, ParseFullSensorRecordError> {
        use ParseFullSensorRecordError::*;

        if record_data.len() < 15 {
            return Err(NotEnoughData);
        }

        let sensor_units_1 = record_data[15];

        let analog_data_format = match (sensor_units_1 >> 6) & 0x03 {
            0b00 => Some(DataFormat::Unsigned),
            0b01 => Some(DataFormat::OnesComplement),
            0b10 => Some(DataFormat::TwosComplement),
            0b11 => None,
            _ => unreachable!(),
        };

        let (mut common, record_data) =
            SensorRecordCommon::parse_without_id(record_data).ok_or(CouldNotParseCommon)?;

        if record_data.len() < 24 {
            return Err(NotEnoughDataAfterCommon);
        }

        let linearization_raw = record_data[0] & 0x7F;
        let linearization = Linearization::from(linearization_raw);

        let m_lsb = record_data[1];
        let m_msb_tolerance = record_data[2];
        let m = conversion::decode_signed_10(m_lsb, m_msb_tolerance >> 6);
        let tolerance = m_msb_tolerance & 0x3F;

        let b_lsb = record_data[3];
        let b_msb_accuracy_lsb = record_data[4];
        let b = conversion::decode_signed_10(b_lsb, b_msb_accuracy_lsb >> 6);

        let accuracy_msb_accuracy_exp_sensor_dir = record_data[5];

        let accuracy = u16::from_le_bytes([
            (accuracy_msb_accuracy_exp_sensor_dir >> 4) & 0xF,
            (b_msb_accuracy_lsb & 0x3F),
        ]);

        let accuracy_exponent = (accuracy_msb_accuracy_exp_sensor_dir >> 2) & 0x3;

        let direction = Direction::try_from(accuracy_msb_accuracy_exp_sensor_dir & 0b11)
            .unwrap_or(Direction::UnspecifiedNotApplicable);

        let r_exp_b_exp = record_data[6];
        let result_exponent = conversion::decode_signed_4(r_exp_b_exp >> 4);
        let b_exponent = conversion::decode_signed_4(r_exp_b_exp);

        let analog_characteristics = record_data[7];

        let nominal_reading = record_data[8];
        let nominal_reading = if (analog_characteristics & 0x1) == 0x1 {
            Some(nominal_reading)
        } else {
            None
        };

        let normal_maximum = record_data[9];
        let normal_maximum = if (analog_characteristics & 0x2) == 0x2 {
            Some(normal_maximum)
        } else {
            None
        };

        let normal_minimum = record_data[10];
        let normal_minimum = if (analog_characteristics & 0x4) == 0x4 {
            Some(normal_minimum)
        } else {
            None
        };

        let max_reading = record_data[11];
        let min_reading = record_data[12];

        let upper_non_recoverable_threshold = record_data[13];
        let upper_critical_threshold = record_data[14];
        let upper_non_critical_threshold = record_data[15];
        let lower_non_recoverable_threshold = record_data[16];
        let lower_critical_threshold = record_data[17];
        let lower_non_critical_threshold = record_data[18];
        let positive_going_threshold_hysteresis_value = NonZeroU8::new(record_data[19]);
        let negative_going_threshold_hysteresis_value = NonZeroU8::new(record_data[20]);

        // Two reserved bytes in between

        let oem_data = record_data[23];

        let id_string_type_len = record_data[24];
        let id_string_bytes = &record_data[25..];

        let id_string = TypeLengthRaw::new(id_string_type_len, id_string_bytes).into();

        common.set_id(id_string);

        let factors = if Factors::is_non_linear(linearization_raw) {
            None
        } else {
            Some(Factors {
                m,
                b,
                b_exponent,
                result_exponent,
                accuracy,
                accuracy_exponent,
                linearization: linearization_raw,
            })
        };

        Ok(Self {
            common,
            analog_data_format,
            linearization,
            factors,
            direction,
            tolerance,
            nominal_reading,
            normal_maximum,
            normal_minimum,
            max_reading,
            min_reading,
            upper_non_recoverable_threshold,
            upper_critical_threshold,
            upper_non_critical_threshold,
            lower_non_recoverable_threshold,
            lower_critical_threshold,
            lower_non_critical_threshold,
            positive_going_threshold_hysteresis_value,
            negative_going_threshold_hysteresis_value,
            oem_data,
        })
    }

    pub fn threshold(&self, kind: ThresholdKind) -> Threshold {
        let readable = self.capabilities().threshold_access.readable(kind);
        let settable = self.capabilities().threshold_access.settable(kind);

        let asserts = self
            .capabilities()
            .assertion_threshold_events
            .for_kind(kind);
        let deasserts = self
            .capabilities()
            .deassertion_threshold_events
            .for_kind(kind);

        Threshold {
            kind,
            readable,
            settable,
            event_assert_going_high: asserts.contains(&EventKind::GoingHigh),
            event_assert_going_low: asserts.contains(&EventKind::GoingLow),
            event_deassert_going_high: deasserts.contains(&EventKind::GoingHigh),
            event_deassert_going_low: deasserts.contains(&EventKind::GoingLow),
        }
    }

    /// Convert a raw reading byte to engineering units using this record's
    /// cached factors. Returns `None` for non-linear sensors (§4.7) — the
    /// caller must fetch fresh factors via `GetSensorFactors` and call
    /// [`conversion::convert`] directly instead.
    pub fn convert(&self, value: u8) -> Option<Value> {
        let format = self.analog_data_format?;
        let factors = self.factors.as_ref()?;

        let converted = conversion::convert(value, format, factors);

        Some(Value::new(self.common().sensor_units, converted))
    }

    pub fn display_reading(&self, value: u8) -> Option<String> {
        self.convert(value).map(|v| v.display(true))
    }

    pub fn nominal_value(&self) -> Option<Value> {
        self.convert(self.nominal_reading?)
    }

    pub fn normal_max(&self) -> Option<Value> {
        self.convert(self.normal_maximum?)
    }

    pub fn normal_min(&self) -> Option<Value> {
        self.convert(self.normal_minimum?)
    }

    pub fn max_reading(&self) -> Option<Value> {
        self.convert(self.max_reading)
    }

    pub fn min_reading(&self) -> Option<Value> {
        self.convert(self.min_reading)
    }

    pub fn positive_going_hysteresis(&self) -> Option<Value> {
        let value = self.positive_going_threshold_hysteresis_value?;
        self.convert(value.get())
    }

    pub fn upper_non_recoverable_threshold(&self) -> Option<Value> {
        self.convert(self.upper_non_recoverable_threshold)
    }

    pub fn upper_critical_threshold(&self) -> Option<Value> {
        self.convert(self.upper_critical_threshold)
    }

    pub fn upper_non_critical_threshold(&self) -> Option<Value> {
        self.convert(self.upper_non_critical_threshold)
    }

    pub fn lower_non_recoverable_threshold(&self) -> Option<Value> {
        self.convert(self.lower_non_recoverable_threshold)
    }

    pub fn lower_critical_threshold(&self) -> Option<Value> {
        self.convert(self.lower_critical_threshold)
    }

    pub fn lower_non_critical_threshold(&self) -> Option<Value> {
        self.convert(self.lower_non_critical_threshold)
    }

    pub fn negative_going_threshold_hysteresis(&self) -> Option<Value> {
        let value = self.negative_going_threshold_hysteresis_value?;
        self.convert(value.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_identity_conversion() {
        let factors = Factors {
            m: 1,
            b: 0,
            b_exponent: 0,
            result_exponent: 0,
            accuracy: 0,
            accuracy_exponent: 0,
            linearization: 0,
        };
        let got = conversion::convert(0x40, DataFormat::Unsigned, &factors);
        assert_eq!(got, 64.0);
    }
}
