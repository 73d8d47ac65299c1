//! Walks the full SDR repository into an ordered list of materialized,
//! threshold-based analog sensors (§4.5).

use std::time::Duration;

use crate::{
    connection::{CompletionCode, IpmiConnection, NetFn},
    sensor_event::{GetSensorReading, GetSensorReadingError},
    storage::sdr::{
        event_reading_type_code::EventReadingTypeCodes,
        record::{Record, RecordContents, SensorRecord},
        MaterializedSensor, RecordId, ReservationController,
    },
    Ipmi, IpmiError,
};

/// A predicate over a sensor/metric name, e.g. compiled from a CLI-supplied
/// regex by the external caller (regex parsing itself is out of scope
/// here, see §1).
pub type Predicate = std::sync::Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// How long to wait, and how many times, when the repository reports
/// "update in progress" mid-scan (§4.5 step 2, §5 suspension points).
const REPO_WAIT_ATTEMPTS: usize = 30;
const REPO_WAIT: Duration = Duration::from_secs(10);

/// Options controlling which SDRs the scan keeps.
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Keep sensors whose SDR has the "disabled" capability bit set,
    /// instead of dropping them (some BMCs set this bit on perfectly
    /// readable sensors).
    pub ignore_disabled_flag: bool,
    /// Drop a sensor if its first reading comes back `CmdTempUnsupported`
    /// rather than keeping it for a later retry.
    pub drop_no_read: bool,
    /// Keep only sensors whose decoded id string matches.
    pub include_sensors: Option<Predicate>,
    /// Drop sensors whose decoded id string matches.
    pub exclude_sensors: Option<Predicate>,
    /// Keep only sensors whose category name ([`SensorType::metric_name`])
    /// matches.
    pub include_metrics: Option<Predicate>,
    /// Drop sensors whose category name matches.
    pub exclude_metrics: Option<Predicate>,
}

impl core::fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanOptions")
            .field("ignore_disabled_flag", &self.ignore_disabled_flag)
            .field("drop_no_read", &self.drop_no_read)
            .field("include_sensors", &self.include_sensors.is_some())
            .field("exclude_sensors", &self.exclude_sensors.is_some())
            .field("include_metrics", &self.include_metrics.is_some())
            .field("exclude_metrics", &self.exclude_metrics.is_some())
            .finish()
    }
}

/// A scan failure that is not one of the per-sensor conditions the scanner
/// already handles locally (those are silently pruned, see §4.5).
#[derive(Debug)]
pub enum ScanError<E> {
    Connection(E),
    /// The repository reported "update in progress" for
    /// [`REPO_WAIT_ATTEMPTS`] consecutive attempts.
    RepoTemporarilyUnavailable,
    Failed {
        netfn: NetFn,
        cmd: u8,
        completion_code: CompletionCode,
    },
}

fn classify<E, P>(e: IpmiError<E, P>) -> ScanError<E> {
    match e {
        IpmiError::Connection(inner) => ScanError::Connection(inner),
        IpmiError::Failed {
            netfn,
            cmd,
            completion_code,
            ..
        } => failed_or_unavailable(netfn, cmd, completion_code),
        IpmiError::Command {
            netfn,
            cmd,
            completion_code,
            ..
        } => failed_or_unavailable(
            netfn,
            cmd,
            completion_code.unwrap_or(CompletionCode::Unspecified),
        ),
        IpmiError::UnexpectedResponse {
            netfn_sent,
            cmd_sent,
            ..
        } => ScanError::Failed {
            netfn: netfn_sent,
            cmd: cmd_sent,
            completion_code: CompletionCode::Unspecified,
        },
        IpmiError::NetFnIsResponse(netfn) => ScanError::Failed {
            netfn,
            cmd: 0,
            completion_code: CompletionCode::Unspecified,
        },
        IpmiError::ParsingFailed { netfn, cmd, .. } => ScanError::Failed {
            netfn,
            cmd,
            completion_code: CompletionCode::Unspecified,
        },
    }
}

fn failed_or_unavailable<E>(netfn: NetFn, cmd: u8, completion_code: CompletionCode) -> ScanError<E> {
    if completion_code == CompletionCode::RepoTemporarilyUnavailable {
        ScanError::RepoTemporarilyUnavailable
    } else {
        ScanError::Failed {
            netfn,
            cmd,
            completion_code,
        }
    }
}

pub struct Scanner;

impl Scanner {
    /// Walk the repository once, retrying the whole walk from the start
    /// when the repository is temporarily unavailable.
    pub fn scan<CON>(
        ipmi: &mut Ipmi<CON>,
        options: ScanOptions,
    ) -> Result<Vec<MaterializedSensor>, ScanError<CON::Error>>
    where
        CON: IpmiConnection,
    {
        for attempt in 0..REPO_WAIT_ATTEMPTS {
            match Self::scan_once(ipmi, options) {
                Err(ScanError::RepoTemporarilyUnavailable) => {
                    log::info!(
                        "BMC temporarily not available. Sleeping {}s ...",
                        REPO_WAIT.as_secs()
                    );
                    if attempt + 1 < REPO_WAIT_ATTEMPTS {
                        std::thread::sleep(REPO_WAIT);
                    }
                }
                other => return other,
            }
        }

        Err(ScanError::RepoTemporarilyUnavailable)
    }

    fn scan_once<CON>(
        ipmi: &mut Ipmi<CON>,
        options: ScanOptions,
    ) -> Result<Vec<MaterializedSensor>, ScanError<CON::Error>>
    where
        CON: IpmiConnection,
    {
        let mut reservation = ReservationController::new();
        let mut sensors: Vec<MaterializedSensor> = Vec::new();
        let mut next_id = RecordId::FIRST;

        log::info!("Starting SDR repository scan");

        loop {
            if next_id.is_last() {
                break;
            }

            let fetched = reservation.get_sdr(ipmi, next_id).map_err(classify)?;
            next_id = fetched.next_entry;

            // `len < 6`: not even a usable header.
            if fetched.data.len() < 6 {
                continue;
            }

            let record = match Record::parse(&fetched.data) {
                Some(record) => record,
                None => continue,
            };

            let record_id = record.header.id;

            let full = match record.contents {
                RecordContents::FullSensor(full) => full,
                RecordContents::Unknown { ty, .. } => {
                    log::debug!("SDR 0x{:04X} ignored (type 0x{ty:02X})", record_id.value());
                    continue;
                }
            };

            if full.common().event_reading_type_code != EventReadingTypeCodes::Threshold {
                log::debug!(
                    "Non-threshold SDR of sensor '{}' (0x{:02X}) ignored",
                    full.id_string(),
                    full.sensor_number().get()
                );
                continue;
            }

            if full.analog_data_format.is_none() {
                log::debug!(
                    "Discrete unit SDR '{}' (0x{:02X}) ignored",
                    full.id_string(),
                    full.sensor_number().get()
                );
                continue;
            }

            if full.capabilities().ignore {
                if options.ignore_disabled_flag {
                    log::info!(
                        "Ignoring 'disabled' flag of sensor '{}' (0x{:02X})",
                        full.id_string(),
                        full.sensor_number().get()
                    );
                } else {
                    log::info!(
                        "Dropping sensor '{}' (0x{:02X}): disabled",
                        full.id_string(),
                        full.sensor_number().get()
                    );
                    continue;
                }
            }

            let name = full.id_string().as_str().to_string();

            if options.exclude_sensors.as_ref().is_some_and(|p| p(&name)) {
                log::debug!("Sensor '{name}' excluded by name predicate");
                continue;
            }
            if options.include_sensors.as_ref().is_some_and(|p| !p(&name)) {
                continue;
            }

            let metric_name = full.common().ty.metric_name();
            if options.exclude_metrics.as_ref().is_some_and(|p| p(metric_name)) {
                log::debug!("Sensor '{name}' excluded by metric predicate ({metric_name})");
                continue;
            }
            if options.include_metrics.as_ref().is_some_and(|p| !p(metric_name)) {
                continue;
            }

            let probe = ipmi.send_recv(GetSensorReading::new(
                full.sensor_number(),
                full.key_data().owner_lun,
            ));

            match probe {
                Ok(_) => {}
                Err(IpmiError::Command {
                    error: GetSensorReadingError::SensorNotFound,
                    ..
                }) => {
                    log::info!(
                        "Dropping sensor '{}' (0x{:02X}): probably not populated/connected",
                        full.id_string(),
                        full.sensor_number().get()
                    );
                    continue;
                }
                Err(e) => match classify(e) {
                    ScanError::Failed {
                        completion_code: CompletionCode::CmdTempUnsupported,
                        ..
                    } => {
                        if options.drop_no_read {
                            log::info!(
                                "Dropping sensor '{}' (0x{:02X}): no read",
                                full.id_string(),
                                full.sensor_number().get()
                            );
                            continue;
                        }
                    }
                    other => return Err(other),
                },
            }

            let materialized = MaterializedSensor::new(record_id, full);
            let identity = materialized.identity();

            if sensors.iter().any(|s| s.identity() == identity) {
                log::warn!(
                    "Dropping sensor '{}' (0x{:02X}): duplicate owner/LUN/number identity",
                    materialized.id_string(),
                    materialized.sensor_number().get()
                );
                continue;
            }

            sensors.push(materialized);
        }

        log::info!("{} sensors found", sensors.len());

        Ok(sensors)
    }
}
