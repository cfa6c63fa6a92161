//! Camera capability interface

use crate::error::DeviceResult;
use async_trait::async_trait;

/// Imaging camera capability.
///
/// `take_image` starts an exposure and returns immediately; completion is
/// observed by polling `is_exposing`. Once a park has been commanded, an
/// in-flight frame is left to finish in the background, so
/// `cancel_exposure` is only used as a corrective action in states where
/// no exposure should be running.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Device name used in logs and error messages.
    fn name(&self) -> &str;

    async fn connect(&self) -> DeviceResult<()>;

    async fn disconnect(&self) -> DeviceResult<()>;

    async fn is_connected(&self) -> bool;

    /// Whether the thermoelectric cooler is running.
    async fn is_cooling(&self) -> bool;

    /// Whether the sensor has settled at its operating temperature.
    async fn is_cooled(&self) -> bool;

    async fn is_exposing(&self) -> bool;

    async fn set_cooling(&self, enabled: bool) -> DeviceResult<()>;

    async fn cancel_exposure(&self) -> DeviceResult<()>;

    /// Start an exposure. Test images are short pointing-verification
    /// frames taken after a large slew; science images use the full
    /// exposure settings.
    async fn take_image(&self, is_test_image: bool) -> DeviceResult<()>;
}
