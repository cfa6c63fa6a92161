//! Static driver registry
//!
//! Concrete adapters are selected by a brand identifier at startup; an
//! unknown brand fails immediately with `DriverNotFound` rather than at
//! runtime dispatch. Hardware-specific drivers register here as they are
//! written; the simulator brand is always available.

use crate::astrometry::PlateSolver;
use crate::camera::Camera;
use crate::error::{DeviceError, DeviceResult};
use crate::mount::Mount;
use crate::simulator::{SimulatedCamera, SimulatedMount, SimulatedSolver, SimulatedWeather};
use crate::weather::WeatherStation;
use std::sync::Arc;

/// Brand identifier of the built-in simulated devices.
pub const SIMULATOR_BRAND: &str = "simulator";

pub fn create_mount(brand: &str) -> DeviceResult<Arc<dyn Mount>> {
    match brand {
        SIMULATOR_BRAND => Ok(Arc::new(SimulatedMount::new())),
        other => Err(DeviceError::DriverNotFound(other.to_string())),
    }
}

pub fn create_camera(brand: &str) -> DeviceResult<Arc<dyn Camera>> {
    match brand {
        SIMULATOR_BRAND => Ok(Arc::new(SimulatedCamera::new())),
        other => Err(DeviceError::DriverNotFound(other.to_string())),
    }
}

pub fn create_weather_station(brand: &str) -> DeviceResult<Arc<dyn WeatherStation>> {
    match brand {
        SIMULATOR_BRAND => Ok(Arc::new(SimulatedWeather::new())),
        other => Err(DeviceError::DriverNotFound(other.to_string())),
    }
}

pub fn create_solver(brand: &str) -> DeviceResult<Arc<dyn PlateSolver>> {
    match brand {
        SIMULATOR_BRAND => Ok(Arc::new(SimulatedSolver::new())),
        other => Err(DeviceError::DriverNotFound(other.to_string())),
    }
}
