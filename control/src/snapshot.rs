//! Per-cycle condition snapshot
//!
//! All subsystem status is polled exactly once at the start of each
//! control cycle and frozen into a [`ConditionSnapshot`]. Handlers decide
//! against this single consistent view and never re-poll mid-decision, so
//! a decision can not be based on a torn view of the hardware.

use crate::controller::Devices;
use crate::ephemeris::DayNightOracle;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CameraStatus {
    pub connected: bool,
    pub cooling: bool,
    pub cooled: bool,
    pub exposing: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MountStatus {
    pub connected: bool,
    pub tracking: bool,
    pub slewing: bool,
    pub parked: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WeatherStatus {
    pub safe: bool,
}

/// Read-only aggregation of every poll, valid for one cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConditionSnapshot {
    pub is_dark: bool,
    pub past_start_time: bool,
    pub camera: CameraStatus,
    pub mount: MountStatus,
    pub weather: WeatherStatus,
}

impl ConditionSnapshot {
    /// Poll every subsystem once. The weather refresh comes first so the
    /// safety gate always sees the freshest reading of the cycle.
    pub async fn capture(
        devices: &Devices,
        oracle: &dyn DayNightOracle,
        past_start_time: bool,
    ) -> Self {
        let safe = devices.weather.check_conditions().await;
        let camera = CameraStatus {
            connected: devices.camera.is_connected().await,
            cooling: devices.camera.is_cooling().await,
            cooled: devices.camera.is_cooled().await,
            exposing: devices.camera.is_exposing().await,
        };
        let mount = MountStatus {
            connected: devices.mount.is_connected().await,
            tracking: devices.mount.is_tracking().await,
            slewing: devices.mount.is_slewing().await,
            parked: devices.mount.is_parked().await,
        };
        Self {
            is_dark: oracle.is_dark(),
            past_start_time,
            camera,
            mount,
            weather: WeatherStatus { safe },
        }
    }
}
