//! Drives sensor readings and DCMI power samples through the command layer
//! and into an [`OutputSink`], in both the metric-line form and the
//! fixed-width "overview" form (§4.8).

mod sink;
pub use sink::OutputSink;

use crate::{
    connection::IpmiConnection,
    dcmi::{DcmiPowerReading, GetDcmiPowerReading, GetDcmiPowerReadingError},
    sensor_event::{
        GetSensorFactors, GetSensorReading, GetSensorReadingError, GetSensorThresholds,
        RawSensorReading, SensorThresholds,
    },
    storage::sdr::{
        conversion,
        record::{SensorRecord, ThresholdKind},
        MaterializedSensor,
    },
    Ipmi, IpmiError,
};

/// Threshold-kind display order the overview table uses (ipmitool's own
/// column order, not the wire order the SDR/response bytes carry).
const THRESHOLD_ROW_ORDER: [ThresholdKind; 6] = [
    ThresholdKind::LowerNonRecoverable,
    ThresholdKind::LowerCritical,
    ThresholdKind::LowerNonCritical,
    ThresholdKind::UpperNonCritical,
    ThresholdKind::UpperCritical,
    ThresholdKind::UpperNonRecoverable,
];

/// Flags consumed by a single collection pass. Distinct from [`crate::config::ScanConfig`]
/// since these only affect how already-scanned sensors are rendered, not
/// which ones were kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorOptions {
    /// Skip the informational HELP/TYPE lines an external Prometheus
    /// serializer would otherwise add around each metric (no effect on the
    /// core's own output, which never emits those lines; kept for call-site
    /// parity with the external layer's own `compact` flag).
    pub compact: bool,
    /// Skip DCMI min/max/average/sample-window lines, keeping only the
    /// instantaneous power reading.
    pub no_powerstats: bool,
    /// Skip the DCMI pass entirely.
    pub no_dcmi: bool,
    /// Skip the IPMI sensor pass entirely.
    pub no_ipmi: bool,
    /// Skip threshold-state ("tstate") lines.
    pub no_state: bool,
    /// Skip threshold-value lines (overview sink only).
    pub no_thresholds: bool,
}

/// Drives one or more reading passes over a sensor list.
///
/// Tracks whether DCMI has turned out to be unsupported on this BMC, so a
/// long-running caller doesn't re-probe it every poll (§4.8, mirroring
/// `collect_dcmi`'s session-scoped skip).
#[derive(Debug, Default)]
pub struct Collector {
    dcmi_disabled: bool,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once a prior DCMI pass has seen `InvalidCommand` for `Get
    /// Power Reading` and given up on this BMC for the session.
    pub fn dcmi_disabled(&self) -> bool {
        self.dcmi_disabled
    }

    /// Metric-line pass: `<category> <value>` per sensor, plus an optional
    /// `<category>_state <tstate>` line, plus DCMI power lines. Metric-name
    /// and label construction proper is the external serializer's job; the
    /// core only emits the category name ([`crate::storage::sdr::SensorType::metric_name`])
    /// it already knows.
    pub fn collect<CON, S>(
        &mut self,
        ipmi: &mut Ipmi<CON>,
        sensors: &[MaterializedSensor],
        options: CollectorOptions,
        sink: &mut S,
    ) where
        CON: IpmiConnection,
        S: OutputSink,
    {
        if !options.no_ipmi {
            for sensor in sensors {
                self.collect_one(ipmi, sensor, options, sink);
            }
        }

        if !options.no_dcmi {
            self.collect_dcmi(ipmi, options, sink);
        }
    }

    fn collect_one<CON, S>(
        &mut self,
        ipmi: &mut Ipmi<CON>,
        sensor: &MaterializedSensor,
        options: CollectorOptions,
        sink: &mut S,
    ) where
        CON: IpmiConnection,
        S: OutputSink,
    {
        let reading = match ipmi.send_recv(GetSensorReading::for_sensor_key(sensor.key_data())) {
            Ok(reading) => reading,
            Err(IpmiError::Command {
                error: GetSensorReadingError::SensorNotFound,
                ..
            }) => return,
            Err(e) => {
                log::debug!("No reading for sensor '{}': {e:?}", sensor.id_string());
                return;
            }
        };

        if reading.is_unavailable() || reading.scanning_disabled() {
            return;
        }

        let Some(value) = convert_reading(ipmi, sensor, &reading) else {
            return;
        };

        let category = sensor.common().ty.metric_name();

        sink.append_str(category);
        sink.append_str(&format!(" {}\n", value.value()));

        if !options.no_state {
            if let Some(tstate) = threshold_state(&reading) {
                sink.append_str(category);
                sink.append_str(&format!("_state {tstate}\n"));
            }
        }
    }

    fn collect_dcmi<CON, S>(&mut self, ipmi: &mut Ipmi<CON>, options: CollectorOptions, sink: &mut S)
    where
        CON: IpmiConnection,
        S: OutputSink,
    {
        if self.dcmi_disabled {
            return;
        }

        let reading = match ipmi.send_recv(GetDcmiPowerReading) {
            Ok(reading) => reading,
            Err(IpmiError::Command {
                error: GetDcmiPowerReadingError::Unsupported,
                ..
            }) => {
                log::info!("BMC does not support DCMI power readings; disabling for this session");
                self.dcmi_disabled = true;
                return;
            }
            Err(e) => {
                log::warn!("Failed to fetch DCMI power reading: {e:?}");
                return;
            }
        };

        write_dcmi_reading(&reading, options, sink);
    }

    /// Fixed-width, ipmitool-compatible table: one header row plus one row
    /// per sensor, each with its value, unit, derived state, and the six
    /// threshold columns.
    pub fn overview<CON, S>(
        &mut self,
        ipmi: &mut Ipmi<CON>,
        sensors: &mut [MaterializedSensor],
        options: CollectorOptions,
        sink: &mut S,
    ) where
        CON: IpmiConnection,
        S: OutputSink,
    {
        sink.append_str(&format!(
            "{:<16} | {:<10} | {:<10} | {:<6}| {:<10}| {:<10}| {:<10}| {:<10}| {:<10}| {:<10}\n",
            "Name", "Value", "Unit", "State", "lower_nr", "lower_cr", "lower_nc", "upper_nc",
            "upper_cr", "upper_nr",
        ));

        for sensor in sensors.iter_mut() {
            let reading = match ipmi.send_recv(GetSensorReading::for_sensor_key(sensor.key_data()))
            {
                Ok(reading) => reading,
                Err(_) => continue,
            };

            if reading.is_unavailable() || reading.scanning_disabled() {
                continue;
            }

            let Some(value) = convert_reading(ipmi, sensor, &reading) else {
                continue;
            };

            let thresholds = if options.no_thresholds {
                render_thresholds(None)
            } else {
                fetch_thresholds_cached(ipmi, sensor)
            };

            sink.append_str(&format!(
                "{:<16} | {:<10.3} | {:<10} | {:<6}{}\n",
                sensor.id_string(),
                value.value(),
                sensor.common().sensor_units.display_str(),
                "ok",
                thresholds,
            ));
        }

        if !options.no_dcmi {
            self.collect_dcmi(ipmi, options, sink);
        }
    }
}

fn convert_reading<CON>(
    ipmi: &mut Ipmi<CON>,
    sensor: &MaterializedSensor,
    reading: &RawSensorReading,
) -> Option<crate::storage::sdr::record::Value>
where
    CON: IpmiConnection,
{
    let raw = reading.reading();

    if let Some(value) = sensor.convert(raw) {
        return Some(value);
    }

    // Non-linear sensor: no cached factors, fetch fresh ones for this
    // specific raw reading (§4.7).
    let format = sensor.analog_data_format?;
    let fresh = ipmi
        .send_recv(GetSensorFactors::for_sensor_key(sensor.key_data(), raw))
        .ok()?;
    let factors = fresh.with_linearization(sensor.linearization.into());
    let converted = conversion::convert(raw, format, &factors);

    Some(crate::storage::sdr::record::Value::new(
        sensor.common().sensor_units,
        converted,
    ))
}

/// `tstate == 0 ? 0 : (tstate >= 8 ? tstate >> 3 : -tstate)`, the threshold
/// status byte's low 6 bits reinterpreted as a signed "how far past which
/// threshold" indicator.
fn threshold_state(reading: &RawSensorReading) -> Option<i32> {
    let tstate = reading.state0()? & 0x3F;

    Some(if tstate == 0 {
        0
    } else if tstate >= 8 {
        (tstate >> 3) as i32
    } else {
        -(tstate as i32)
    })
}

fn write_dcmi_reading<S: OutputSink>(
    reading: &DcmiPowerReading,
    options: CollectorOptions,
    sink: &mut S,
) {
    sink.append_str(&format!(
        "dcmi_power_watts{{value=\"now\"}} {}\n",
        reading.current_watts
    ));

    if options.no_powerstats {
        return;
    }

    sink.append_str(&format!(
        "dcmi_power_watts{{value=\"min\"}} {}\n",
        reading.minimum_watts
    ));
    sink.append_str(&format!(
        "dcmi_power_watts{{value=\"max\"}} {}\n",
        reading.maximum_watts
    ));
    sink.append_str(&format!(
        "dcmi_power_watts{{value=\"avg\"}} {}\n",
        reading.average_watts
    ));
    sink.append_str(&format!(
        "dcmi_power_sample_seconds {}\n",
        reading.sample_period_ms / 1000
    ));
}

fn fetch_thresholds_cached<CON>(ipmi: &mut Ipmi<CON>, sensor: &mut MaterializedSensor) -> String
where
    CON: IpmiConnection,
{
    if let Some(cached) = &sensor.overview_thresholds {
        return cached.clone();
    }

    match ipmi.send_recv(GetSensorThresholds::for_sensor_key(sensor.key_data())) {
        Ok(thresholds) => {
            let rendered = render_thresholds(Some((&thresholds, sensor)));
            sensor.overview_thresholds = Some(rendered.clone());
            rendered
        }
        Err(e) => {
            log::info!(
                "Sensor '{}' (0x{:02X}) provides no thresholds: {e:?}",
                sensor.id_string(),
                sensor.sensor_number().get()
            );
            render_thresholds(None)
        }
    }
}

fn render_thresholds(thresholds: Option<(&SensorThresholds, &MaterializedSensor)>) -> String {
    let mut out = String::new();

    match thresholds {
        None => {
            for _ in THRESHOLD_ROW_ORDER {
                out.push_str(&format!("| {:<10}", "na"));
            }
        }
        Some((t, sensor)) => {
            for kind in THRESHOLD_ROW_ORDER {
                match t.value(kind) {
                    Some(raw) => {
                        let value = sensor.convert(raw).map(|v| v.value()).unwrap_or(raw as f64);
                        out.push_str(&format!("| {value:<10.3}"));
                    }
                    None => out.push_str(&format!("| {:<10}", "na")),
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_state_formula_matches_original() {
        let reading = |state0: u8| RawSensorReading::parse(&[0x40, 0x00, state0]).unwrap();

        assert_eq!(threshold_state(&reading(0b000_000)), Some(0));
        assert_eq!(threshold_state(&reading(0b000_001)), Some(-1));
        assert_eq!(threshold_state(&reading(0b000_111)), Some(-7));
        assert_eq!(threshold_state(&reading(0b001_000)), Some(1));
        assert_eq!(threshold_state(&reading(0b111_111)), Some(7));
    }

    #[test]
    fn threshold_state_ignores_high_bits() {
        let reading = RawSensorReading::parse(&[0x40, 0x00, 0xC0]).unwrap();
        assert_eq!(threshold_state(&reading), Some(0));
    }

    #[test]
    fn render_thresholds_without_fetch_is_all_na() {
        let rendered = render_thresholds(None);
        let na_field = format!("| {:<10}", "na");
        assert_eq!(rendered, na_field.repeat(6));
    }
}
