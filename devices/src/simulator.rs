//! Simulated devices
//!
//! In-process implementations of every capability with scriptable
//! latencies and per-operation failure injection. These back the
//! `"simulator"` driver brand for bench runs and are the workhorse of the
//! controller's handler tests: each command is recorded in an operation
//! log so tests can assert exactly which corrective actions were issued.

use crate::astrometry::{PlateSolver, SolveResult};
use crate::camera::Camera;
use crate::error::{DeviceError, DeviceResult};
use crate::mount::Mount;
use crate::types::SkyCoordinates;
use crate::weather::WeatherStation;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Records every command issued to a simulated device.
#[derive(Debug, Default)]
pub struct OpLog {
    calls: Mutex<Vec<&'static str>>,
}

impl OpLog {
    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }

    /// Number of times `op` was issued.
    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    /// Total number of commands issued.
    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

/// Per-operation failure injection. An injected fault persists until
/// cleared, so repeated attempts keep failing the way a dead serial link
/// would.
#[derive(Debug, Default)]
struct FaultSet {
    failing: Mutex<HashSet<&'static str>>,
}

impl FaultSet {
    fn is_failing(&self, op: &str) -> bool {
        self.failing.lock().unwrap().contains(op)
    }

    fn set(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    fn clear(&self, op: &str) {
        self.failing.lock().unwrap().remove(op);
    }
}

// A deadline that has passed reads as "operation finished".
fn pending(deadline: &Mutex<Option<Instant>>) -> bool {
    matches!(*deadline.lock().unwrap(), Some(t) if Instant::now() < t)
}

fn take_if_elapsed(deadline: &Mutex<Option<Instant>>) -> bool {
    let mut guard = deadline.lock().unwrap();
    match *guard {
        Some(t) if Instant::now() >= t => {
            *guard = None;
            true
        }
        _ => false,
    }
}

// =============================================================================
// MOUNT
// =============================================================================

/// Simulated telescope mount. Starts disconnected and parked.
pub struct SimulatedMount {
    name: String,
    connected: AtomicBool,
    tracking: AtomicBool,
    parked: AtomicBool,
    slew_done_at: Mutex<Option<Instant>>,
    park_done_at: Mutex<Option<Instant>>,
    slew_duration: Duration,
    park_duration: Duration,
    pub ops: OpLog,
    faults: FaultSet,
}

impl SimulatedMount {
    pub fn new() -> Self {
        Self::with_latencies(Duration::from_secs(2), Duration::from_secs(2))
    }

    /// A mount whose slews and parks complete by the next poll.
    pub fn instant() -> Self {
        Self::with_latencies(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_latencies(slew_duration: Duration, park_duration: Duration) -> Self {
        Self {
            name: "simulated mount".to_string(),
            connected: AtomicBool::new(false),
            tracking: AtomicBool::new(false),
            parked: AtomicBool::new(true),
            slew_done_at: Mutex::new(None),
            park_done_at: Mutex::new(None),
            slew_duration,
            park_duration,
            ops: OpLog::default(),
            faults: FaultSet::default(),
        }
    }

    /// Make `op` fail until cleared.
    pub fn fail_on(&self, op: &'static str) {
        self.faults.set(op);
    }

    pub fn clear_fault(&self, op: &str) {
        self.faults.clear(op);
    }

    fn check_fault(&self, op: &'static str) -> DeviceResult<()> {
        if self.faults.is_failing(op) {
            if op == "connect" || op == "disconnect" {
                return Err(DeviceError::connection(&self.name, "injected fault"));
            }
            return Err(DeviceError::command(&self.name, op, "injected fault"));
        }
        Ok(())
    }
}

impl Default for SimulatedMount {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mount for SimulatedMount {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> DeviceResult<()> {
        self.ops.record("connect");
        self.check_fault("connect")?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> DeviceResult<()> {
        self.ops.record("disconnect");
        self.check_fault("disconnect")?;
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    async fn is_slewing(&self) -> bool {
        if take_if_elapsed(&self.slew_done_at) {
            // Real mounts resume sidereal tracking once the slew settles.
            self.tracking.store(true, Ordering::SeqCst);
        }
        pending(&self.slew_done_at)
    }

    async fn is_parked(&self) -> bool {
        if take_if_elapsed(&self.park_done_at) {
            self.parked.store(true, Ordering::SeqCst);
        }
        self.parked.load(Ordering::SeqCst)
    }

    async fn set_tracking_rate(&self, ra_rate: f64, dec_rate: f64) -> DeviceResult<()> {
        self.ops.record("set_tracking_rate");
        self.check_fault("set_tracking_rate")?;
        self.tracking
            .store(ra_rate != 0.0 || dec_rate != 0.0, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel_slew(&self) -> DeviceResult<()> {
        self.ops.record("cancel_slew");
        self.check_fault("cancel_slew")?;
        *self.slew_done_at.lock().unwrap() = None;
        self.tracking.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn slew_to(&self, coordinates: &SkyCoordinates) -> DeviceResult<()> {
        self.ops.record("slew_to");
        self.check_fault("slew_to")?;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeviceError::NotConnected(self.name.clone()));
        }
        tracing::debug!(
            ra_hours = coordinates.ra_hours,
            dec_degrees = coordinates.dec_degrees,
            "simulated slew started"
        );
        self.parked.store(false, Ordering::SeqCst);
        self.tracking.store(false, Ordering::SeqCst);
        *self.slew_done_at.lock().unwrap() = Some(Instant::now() + self.slew_duration);
        Ok(())
    }

    async fn park(&self) -> DeviceResult<()> {
        self.ops.record("park");
        self.check_fault("park")?;
        tracing::debug!("simulated park started");
        self.tracking.store(false, Ordering::SeqCst);
        *self.slew_done_at.lock().unwrap() = None;
        *self.park_done_at.lock().unwrap() = Some(Instant::now() + self.park_duration);
        Ok(())
    }
}

// =============================================================================
// CAMERA
// =============================================================================

/// Simulated camera. Starts disconnected with the cooler off.
pub struct SimulatedCamera {
    name: String,
    connected: AtomicBool,
    cooling: AtomicBool,
    cooled_at: Mutex<Option<Instant>>,
    exposure_done_at: Mutex<Option<Instant>>,
    last_exposure_was_test: Mutex<Option<bool>>,
    cool_duration: Duration,
    exposure_duration: Duration,
    pub ops: OpLog,
    faults: FaultSet,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self::with_latencies(Duration::from_secs(3), Duration::from_secs(2))
    }

    /// A camera that cools and exposes by the next poll.
    pub fn instant() -> Self {
        Self::with_latencies(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_latencies(cool_duration: Duration, exposure_duration: Duration) -> Self {
        Self {
            name: "simulated camera".to_string(),
            connected: AtomicBool::new(false),
            cooling: AtomicBool::new(false),
            cooled_at: Mutex::new(None),
            exposure_done_at: Mutex::new(None),
            last_exposure_was_test: Mutex::new(None),
            cool_duration,
            exposure_duration,
            ops: OpLog::default(),
            faults: FaultSet::default(),
        }
    }

    pub fn fail_on(&self, op: &'static str) {
        self.faults.set(op);
    }

    pub fn clear_fault(&self, op: &str) {
        self.faults.clear(op);
    }

    /// Whether the most recent exposure was a test image.
    pub fn last_exposure_was_test(&self) -> Option<bool> {
        *self.last_exposure_was_test.lock().unwrap()
    }

    fn check_fault(&self, op: &'static str) -> DeviceResult<()> {
        if self.faults.is_failing(op) {
            if op == "connect" || op == "disconnect" {
                return Err(DeviceError::connection(&self.name, "injected fault"));
            }
            return Err(DeviceError::command(&self.name, op, "injected fault"));
        }
        Ok(())
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Camera for SimulatedCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> DeviceResult<()> {
        self.ops.record("connect");
        self.check_fault("connect")?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> DeviceResult<()> {
        self.ops.record("disconnect");
        self.check_fault("disconnect")?;
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_cooling(&self) -> bool {
        self.cooling.load(Ordering::SeqCst)
    }

    async fn is_cooled(&self) -> bool {
        if !self.cooling.load(Ordering::SeqCst) {
            return false;
        }
        matches!(*self.cooled_at.lock().unwrap(), Some(t) if Instant::now() >= t)
    }

    async fn is_exposing(&self) -> bool {
        pending(&self.exposure_done_at)
    }

    async fn set_cooling(&self, enabled: bool) -> DeviceResult<()> {
        self.ops.record("set_cooling");
        self.check_fault("set_cooling")?;
        self.cooling.store(enabled, Ordering::SeqCst);
        *self.cooled_at.lock().unwrap() = if enabled {
            Some(Instant::now() + self.cool_duration)
        } else {
            None
        };
        Ok(())
    }

    async fn cancel_exposure(&self) -> DeviceResult<()> {
        self.ops.record("cancel_exposure");
        self.check_fault("cancel_exposure")?;
        *self.exposure_done_at.lock().unwrap() = None;
        Ok(())
    }

    async fn take_image(&self, is_test_image: bool) -> DeviceResult<()> {
        self.ops.record("take_image");
        self.check_fault("take_image")?;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeviceError::NotConnected(self.name.clone()));
        }
        tracing::debug!(is_test_image, "simulated exposure started");
        *self.last_exposure_was_test.lock().unwrap() = Some(is_test_image);
        *self.exposure_done_at.lock().unwrap() = Some(Instant::now() + self.exposure_duration);
        Ok(())
    }
}

// =============================================================================
// WEATHER
// =============================================================================

/// Simulated weather monitor. Safe until told otherwise.
pub struct SimulatedWeather {
    name: String,
    safe: AtomicBool,
    pub ops: OpLog,
}

impl SimulatedWeather {
    pub fn new() -> Self {
        Self {
            name: "simulated weather".to_string(),
            safe: AtomicBool::new(true),
            ops: OpLog::default(),
        }
    }

    pub fn set_safe(&self, safe: bool) {
        self.safe.store(safe, Ordering::SeqCst);
    }
}

impl Default for SimulatedWeather {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherStation for SimulatedWeather {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_conditions(&self) -> bool {
        self.ops.record("check_conditions");
        self.safe.load(Ordering::SeqCst)
    }
}

// =============================================================================
// PLATE SOLVER
// =============================================================================

/// Simulated plate solver returning a scripted result.
pub struct SimulatedSolver {
    result: Mutex<SolveResult>,
    pub ops: OpLog,
    faults: FaultSet,
}

impl SimulatedSolver {
    /// Solver that always finds a perfectly centered solution.
    pub fn new() -> Self {
        Self {
            result: Mutex::new(SolveResult::centered()),
            ops: OpLog::default(),
            faults: FaultSet::default(),
        }
    }

    pub fn set_result(&self, result: SolveResult) {
        *self.result.lock().unwrap() = result;
    }

    pub fn fail_on(&self, op: &'static str) {
        self.faults.set(op);
    }
}

impl Default for SimulatedSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlateSolver for SimulatedSolver {
    async fn solve_pointing(&self, _expected: &SkyCoordinates) -> DeviceResult<SolveResult> {
        self.ops.record("solve_pointing");
        if self.faults.is_failing("solve_pointing") {
            return Err(DeviceError::command(
                "simulated solver",
                "solve_pointing",
                "injected fault",
            ));
        }
        Ok(self.result.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mount_starts_parked_and_disconnected() {
        let mount = SimulatedMount::instant();
        assert!(!mount.is_connected().await);
        assert!(mount.is_parked().await);
        assert!(!mount.is_slewing().await);
    }

    #[tokio::test]
    async fn test_instant_slew_completes_and_tracks() {
        let mount = SimulatedMount::instant();
        mount.connect().await.unwrap();
        mount
            .slew_to(&SkyCoordinates::new(5.5, -20.0))
            .await
            .unwrap();
        assert!(!mount.is_parked().await);
        // Zero latency: the slew is done by the first poll.
        assert!(!mount.is_slewing().await);
        assert!(mount.is_tracking().await);
    }

    #[tokio::test]
    async fn test_park_clears_tracking() {
        let mount = SimulatedMount::instant();
        mount.connect().await.unwrap();
        mount
            .slew_to(&SkyCoordinates::new(0.0, 0.0))
            .await
            .unwrap();
        assert!(!mount.is_slewing().await);
        mount.park().await.unwrap();
        assert!(!mount.is_tracking().await);
        assert!(mount.is_parked().await);
        assert_eq!(mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_persists_until_cleared() {
        let mount = SimulatedMount::instant();
        mount.fail_on("connect");
        assert!(mount.connect().await.is_err());
        assert!(mount.connect().await.is_err());
        mount.clear_fault("connect");
        assert!(mount.connect().await.is_ok());
        assert_eq!(mount.ops.count("connect"), 3);
    }

    #[tokio::test]
    async fn test_camera_cooling_cycle() {
        let camera = SimulatedCamera::instant();
        camera.connect().await.unwrap();
        assert!(!camera.is_cooled().await);
        camera.set_cooling(true).await.unwrap();
        assert!(camera.is_cooling().await);
        assert!(camera.is_cooled().await);
        camera.set_cooling(false).await.unwrap();
        assert!(!camera.is_cooled().await);
    }

    #[tokio::test]
    async fn test_camera_records_test_flag() {
        let camera = SimulatedCamera::instant();
        camera.connect().await.unwrap();
        camera.take_image(true).await.unwrap();
        assert_eq!(camera.last_exposure_was_test(), Some(true));
        camera.take_image(false).await.unwrap();
        assert_eq!(camera.last_exposure_was_test(), Some(false));
        assert_eq!(camera.ops.count("take_image"), 2);
    }

    #[tokio::test]
    async fn test_weather_flag_flips() {
        let weather = SimulatedWeather::new();
        assert!(weather.check_conditions().await);
        weather.set_safe(false);
        assert!(!weather.check_conditions().await);
        assert_eq!(weather.ops.count("check_conditions"), 2);
    }

    #[tokio::test]
    async fn test_solver_scripted_result() {
        let solver = SimulatedSolver::new();
        solver.set_result(SolveResult::unsolved());
        let result = solver
            .solve_pointing(&SkyCoordinates::new(1.0, 1.0))
            .await
            .unwrap();
        assert!(!result.solved);
    }
}
