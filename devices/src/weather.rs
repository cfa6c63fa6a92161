//! Weather monitor capability interface

use async_trait::async_trait;

/// Weather / safety monitor capability.
///
/// The station owns the details of what "safe" means (rain, wind, cloud
/// sensors, an aggregate safety relay); the controller consumes a single
/// boolean refreshed once per control cycle.
#[async_trait]
pub trait WeatherStation: Send + Sync {
    /// Device name used in logs.
    fn name(&self) -> &str;

    /// Refresh the station's internal readings and report whether
    /// conditions are safe for observing.
    async fn check_conditions(&self) -> bool;
}
