//! Configuration shared between a scan and the collector facade that reads
//! sensors it found (§6). Regex compilation for the include/exclude
//! predicates is the caller's job; this module only consumes the resulting
//! boolean predicate.

use std::path::PathBuf;

pub use crate::storage::sdr::scanner::Predicate;
use crate::storage::sdr::scanner::ScanOptions;

/// Inputs to a single SDR repository scan.
#[derive(Clone, Default)]
pub struct ScanConfig {
    /// Path to the BMC device node (`/dev/ipmi0`, `/dev/bmc`, ...). `None`
    /// lets the caller pick a platform default.
    pub bmc_path: Option<PathBuf>,
    /// Drop a sensor on its first failed reading instead of keeping it for
    /// a later retry.
    pub drop_no_read: bool,
    /// Keep sensors whose SDR has the "disabled" capability bit set.
    pub ignore_disabled_flag: bool,
    /// Skip threshold-state collection.
    pub no_state: bool,
    /// Skip threshold-value collection (overview sink only).
    pub no_thresholds: bool,
    /// Skip the IPMI sensor pass entirely.
    pub no_ipmi: bool,
    /// Skip the DCMI power-reading pass entirely.
    pub no_dcmi: bool,
    /// Keep only sensors whose decoded id string matches.
    pub include_sensors_predicate: Option<Predicate>,
    /// Drop sensors whose decoded id string matches.
    pub exclude_sensors_predicate: Option<Predicate>,
    /// Keep only sensors whose category name matches.
    pub include_metrics_predicate: Option<Predicate>,
    /// Drop sensors whose category name matches.
    pub exclude_metrics_predicate: Option<Predicate>,
}

impl core::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("bmc_path", &self.bmc_path)
            .field("drop_no_read", &self.drop_no_read)
            .field("ignore_disabled_flag", &self.ignore_disabled_flag)
            .field("no_state", &self.no_state)
            .field("no_thresholds", &self.no_thresholds)
            .field("no_ipmi", &self.no_ipmi)
            .field("no_dcmi", &self.no_dcmi)
            .field("include_sensors_predicate", &self.include_sensors_predicate.is_some())
            .field("exclude_sensors_predicate", &self.exclude_sensors_predicate.is_some())
            .field("include_metrics_predicate", &self.include_metrics_predicate.is_some())
            .field("exclude_metrics_predicate", &self.exclude_metrics_predicate.is_some())
            .finish()
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(cfg: &ScanConfig) -> Self {
        ScanOptions {
            ignore_disabled_flag: cfg.ignore_disabled_flag,
            drop_no_read: cfg.drop_no_read,
            include_sensors: cfg.include_sensors_predicate.clone(),
            exclude_sensors: cfg.exclude_sensors_predicate.clone(),
            include_metrics: cfg.include_metrics_predicate.clone(),
            exclude_metrics: cfg.exclude_metrics_predicate.clone(),
        }
    }
}
