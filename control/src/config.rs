//! Observatory configuration
//!
//! TOML-backed configuration for the controller. Every field has a
//! default, so a missing file (or an empty one) runs the observatory at
//! the fallback site on simulated hardware.

use crate::ephemeris::Site;
use crate::scheduler::Field;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Driver selection for one subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub brand: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            brand: "simulator".to_string(),
        }
    }
}

/// Bounds on how long transient states may run before the controller
/// escalates. Exposures are non-cancelable, so these are supervision
/// limits, not aborts: an in-flight frame still completes in the
/// background.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutPolicy {
    /// Maximum time in the test-image, imaging or analyzing states
    /// before escalating through the parking funnel.
    pub exposure_wait_secs: u64,
    /// Maximum time waiting for the park position before raising the
    /// alarm. The park command is never re-issued.
    pub park_wait_secs: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            exposure_wait_secs: 300,
            park_wait_secs: 180,
        }
    }
}

impl TimeoutPolicy {
    pub fn exposure_wait(&self) -> Duration {
        Duration::from_secs(self.exposure_wait_secs)
    }

    pub fn park_wait(&self) -> Duration {
        Duration::from_secs(self.park_wait_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservatoryConfig {
    pub site: Site,
    pub mount: DriverConfig,
    pub camera: DriverConfig,
    pub weather: DriverConfig,
    pub solver: DriverConfig,
    /// Local wall-clock time at which the shutdown state starts the
    /// nightly bring-up.
    pub start_time: NaiveTime,
    pub timeouts: TimeoutPolicy,
    /// Cap on every idle backoff, in seconds. Zero makes the loop spin
    /// as fast as it can re-evaluate; used by tests and bench runs.
    pub backoff_cap_secs: Option<u64>,
    pub heartbeat_path: PathBuf,
    /// Fields offered to the scheduler.
    pub fields: Vec<Field>,
}

impl Default for ObservatoryConfig {
    fn default() -> Self {
        Self {
            site: Site::default(),
            mount: DriverConfig::default(),
            camera: DriverConfig::default(),
            weather: DriverConfig::default(),
            solver: DriverConfig::default(),
            start_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            timeouts: TimeoutPolicy::default(),
            backoff_cap_secs: None,
            heartbeat_path: PathBuf::from("argus-heartbeat"),
            fields: Vec::new(),
        }
    }
}

impl ObservatoryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Apply the configured cap to a state's idle backoff.
    pub fn capped_backoff(&self, backoff: Duration) -> Duration {
        match self.backoff_cap_secs {
            Some(cap) => backoff.min(Duration::from_secs(cap)),
            None => backoff,
        }
    }
}
