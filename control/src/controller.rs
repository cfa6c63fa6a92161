//! Controller loop
//!
//! Owns the current state, the target reference and the device adapters.
//! Each cycle: poll everything into a fresh snapshot, touch the
//! heartbeat, dispatch to the current state's handler, commit the
//! returned state. A transition is re-evaluated immediately; a settled
//! state idles for its backoff interval, interruptibly so stop requests
//! and tests never wait out a real sleep.

use crate::config::ObservatoryConfig;
use crate::ephemeris::DayNightOracle;
use crate::handlers::{self, Cycle};
use crate::heartbeat::Heartbeat;
use crate::scheduler::{FieldListScheduler, TargetScheduler};
use crate::snapshot::ConditionSnapshot;
use crate::state::ObservatoryState;
use crate::target::Target;
use argus_devices::{registry, Camera, DeviceError, Mount, PlateSolver, WeatherStation};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};

/// The subsystem adapters the controller drives. Adapters never drive
/// each other.
pub struct Devices {
    pub mount: Arc<dyn Mount>,
    pub camera: Arc<dyn Camera>,
    pub weather: Arc<dyn WeatherStation>,
    pub scheduler: Arc<dyn TargetScheduler>,
    pub solver: Arc<dyn PlateSolver>,
}

impl Devices {
    /// Instantiate every adapter from the configured brands. An unknown
    /// brand fails here, at startup, with `DriverNotFound`.
    pub fn from_config(config: &ObservatoryConfig) -> Result<Self, DeviceError> {
        Ok(Self {
            mount: registry::create_mount(&config.mount.brand)?,
            camera: registry::create_camera(&config.camera.brand)?,
            weather: registry::create_weather_station(&config.weather.brand)?,
            scheduler: Arc::new(FieldListScheduler::new(config.fields.clone())),
            solver: registry::create_solver(&config.solver.brand)?,
        })
    }
}

/// Handle for stopping a running controller from another task.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so a stop that lands before the
        // loop reaches its idle wait is not lost.
        self.wake.notify_one();
    }
}

pub struct Controller {
    devices: Devices,
    oracle: Arc<dyn DayNightOracle>,
    config: ObservatoryConfig,
    heartbeat: Heartbeat,
    state: Arc<RwLock<ObservatoryState>>,
    target: Option<Target>,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    entered_state_at: Instant,
}

impl Controller {
    /// Build a controller starting in the shutdown state, as on program
    /// startup.
    pub fn new(
        devices: Devices,
        oracle: Arc<dyn DayNightOracle>,
        config: ObservatoryConfig,
    ) -> Self {
        let heartbeat = Heartbeat::new(config.heartbeat_path.clone());
        Self {
            devices,
            oracle,
            config,
            heartbeat,
            state: Arc::new(RwLock::new(ObservatoryState::Shutdown)),
            target: None,
            stop: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            entered_state_at: Instant::now(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: self.stop.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Shared view of the current state for other tasks.
    pub fn state_handle(&self) -> Arc<RwLock<ObservatoryState>> {
        self.state.clone()
    }

    pub async fn state(&self) -> ObservatoryState {
        *self.state.read().await
    }

    /// Machine-readable status report.
    pub async fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "state": *self.state.read().await,
            "target": self.target,
        })
    }

    /// Run the control loop until a stop is requested.
    pub async fn run(&mut self) {
        tracing::info!("controller starting");
        loop {
            if self.stop.load(Ordering::SeqCst) {
                *self.state.write().await = ObservatoryState::StopObserving;
                tracing::info!("stop requested; controller exiting");
                break;
            }
            let current = *self.state.read().await;
            if current == ObservatoryState::StopObserving {
                break;
            }

            let snapshot = ConditionSnapshot::capture(
                &self.devices,
                self.oracle.as_ref(),
                self.past_start_time(),
            )
            .await;
            // Liveness marker is best-effort and must never affect the
            // control decision.
            if let Err(err) = self.heartbeat.beat() {
                tracing::warn!(error = %err, "heartbeat write failed");
            }

            let next = {
                let mut cycle = Cycle {
                    snapshot: &snapshot,
                    devices: &self.devices,
                    target: &mut self.target,
                    timeouts: &self.config.timeouts,
                    in_state_for: self.entered_state_at.elapsed(),
                };
                handlers::dispatch(current, &mut cycle).await
            };

            if next != current {
                tracing::info!(from = %current, to = %next, "state transition");
                *self.state.write().await = next;
                self.entered_state_at = Instant::now();
                // Re-evaluate the new state immediately.
                continue;
            }
            self.idle(current.idle_backoff()).await;
        }
    }

    fn past_start_time(&self) -> bool {
        Local::now().time() >= self.config.start_time
    }

    async fn idle(&self, backoff: Duration) {
        let wait = self.config.capped_backoff(backoff);
        if wait.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = self.wake.notified() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
