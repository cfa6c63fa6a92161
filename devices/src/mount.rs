//! Mount capability interface
//!
//! The controller supervises, it does not drive: status polls are plain
//! booleans refreshed from the hardware, while commands return typed
//! errors so failures can be escalated.

use crate::error::DeviceResult;
use crate::types::SkyCoordinates;
use async_trait::async_trait;

/// Telescope mount capability.
///
/// Slews are cancelable; a park, once commanded, is expected to run to
/// completion and is never interrupted by the controller.
#[async_trait]
pub trait Mount: Send + Sync {
    /// Device name used in logs and error messages.
    fn name(&self) -> &str;

    async fn connect(&self) -> DeviceResult<()>;

    async fn disconnect(&self) -> DeviceResult<()>;

    async fn is_connected(&self) -> bool;

    async fn is_tracking(&self) -> bool;

    async fn is_slewing(&self) -> bool;

    async fn is_parked(&self) -> bool;

    /// Set the tracking rate in arcseconds per second on each axis.
    /// A zero rate on both axes stops tracking.
    async fn set_tracking_rate(&self, ra_rate: f64, dec_rate: f64) -> DeviceResult<()>;

    async fn cancel_slew(&self) -> DeviceResult<()>;

    async fn slew_to(&self, coordinates: &SkyCoordinates) -> DeviceResult<()>;

    /// Slew to the safe resting orientation.
    async fn park(&self) -> DeviceResult<()>;
}
