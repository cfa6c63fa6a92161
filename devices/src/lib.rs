//! Observatory device capability layer
//!
//! Capability interfaces over the observatory's hardware and services:
//! mount, camera, weather monitor and plate solver. The supervisory
//! controller drives these adapters exclusively; adapters never drive
//! each other and own their internal connection state.
//!
//! Status polls return plain booleans. Commands return typed
//! [`DeviceError`]s so the controller's escalation policy can branch on
//! failure kind.

mod astrometry;
mod camera;
mod error;
mod mount;
pub mod registry;
pub mod simulator;
mod types;
mod weather;

pub use astrometry::{PlateSolver, SolveResult};
pub use camera::Camera;
pub use error::{DeviceError, DeviceResult};
pub use mount::Mount;
pub use types::{SkyCoordinates, SIDEREAL_RATE_ARCSEC};
pub use weather::WeatherStation;
