//! State handlers
//!
//! One decision procedure per state, all sharing the same contract: if
//! the state's settled invariant holds over the snapshot, do nothing and
//! let the controller idle; otherwise repair each violated clause
//! independently, escalate through the parking funnel if any repair
//! fails, and only then consider the forward transition.
//!
//! Handlers read the cycle's frozen snapshot and never re-poll hardware;
//! the only commands they issue are corrective or transition actions.

mod observe;
mod ready;
mod safety;
mod startup;

use crate::config::TimeoutPolicy;
use crate::controller::Devices;
use crate::snapshot::ConditionSnapshot;
use crate::state::ObservatoryState;
use crate::target::Target;
use argus_devices::DeviceError;
use std::time::Duration;

/// Everything a handler may look at during one cycle.
///
/// Owned by the controller and lent to exactly one handler invocation per
/// cycle; handlers must not retain it beyond the call.
pub struct Cycle<'a> {
    pub snapshot: &'a ConditionSnapshot,
    pub devices: &'a Devices,
    pub target: &'a mut Option<Target>,
    pub timeouts: &'a TimeoutPolicy,
    /// How long the controller has been in the current state.
    pub in_state_for: Duration,
}

/// Route one cycle to the current state's handler.
///
/// Unsafe weather is handled here, once, for every active state: the
/// single safety funnel of the whole machine. Parking, parked and the
/// terminal states tolerate bad weather by construction.
pub async fn dispatch(state: ObservatoryState, cycle: &mut Cycle<'_>) -> ObservatoryState {
    tracing::debug!(state = %state, "evaluating state");
    if state.is_active() && !cycle.snapshot.weather.safe {
        tracing::warn!(state = %state, "weather is unsafe; parking");
        return issue_park(cycle).await;
    }
    match state {
        ObservatoryState::Shutdown => startup::shutdown(cycle).await,
        ObservatoryState::Sleeping => startup::sleeping(cycle).await,
        ObservatoryState::GettingReady => ready::getting_ready(cycle).await,
        ObservatoryState::Scheduling => ready::scheduling(cycle).await,
        ObservatoryState::Slewing => observe::slewing(cycle).await,
        ObservatoryState::TakingTestImage => observe::taking_test_image(cycle).await,
        ObservatoryState::Analyzing => observe::analyzing(cycle).await,
        ObservatoryState::Imaging => observe::imaging(cycle).await,
        ObservatoryState::Parking => safety::parking(cycle).await,
        ObservatoryState::Parked => safety::parked(cycle).await,
        ObservatoryState::Alarm => safety::alarm(cycle).await,
        ObservatoryState::StopObserving => ObservatoryState::StopObserving,
    }
}

/// A corrective action failed: log critical and retreat. The failed
/// handler makes no further transition attempt this cycle.
pub(crate) async fn escalate(
    cycle: &Cycle<'_>,
    action: &str,
    err: &DeviceError,
) -> ObservatoryState {
    tracing::error!(action, error = %err, "corrective action failed; parking");
    issue_park(cycle).await
}

/// Issue the park command. A failed park has no safe fallback: the
/// machine raises the terminal alarm rather than resuming operation under
/// whatever condition forced the retreat.
pub(crate) async fn issue_park(cycle: &Cycle<'_>) -> ObservatoryState {
    match cycle.devices.mount.park().await {
        Ok(()) => ObservatoryState::Parking,
        Err(err) => {
            tracing::error!(error = %err, "park command failed; raising alarm");
            ObservatoryState::Alarm
        }
    }
}
