//! Observatory state enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The states of the supervisory controller.
///
/// Exactly one is current at any time, owned exclusively by the
/// [`Controller`](crate::controller::Controller). `Alarm` and
/// `StopObserving` are terminal: `Alarm` is reached only through a failed
/// park and never returns to operation without intervention;
/// `StopObserving` ends the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservatoryState {
    Shutdown,
    Sleeping,
    GettingReady,
    Scheduling,
    Slewing,
    TakingTestImage,
    Analyzing,
    Imaging,
    Parking,
    Parked,
    Alarm,
    StopObserving,
}

impl ObservatoryState {
    /// States in which the observatory is (or is preparing to be)
    /// operating, as opposed to retreating, retreated or stopped. Unsafe
    /// weather funnels every active state into `Parking`.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ObservatoryState::Parking
                | ObservatoryState::Parked
                | ObservatoryState::Alarm
                | ObservatoryState::StopObserving
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ObservatoryState::Alarm | ObservatoryState::StopObserving
        )
    }

    /// How long the controller waits before re-evaluating a state whose
    /// invariant is settled. Day states are slow, readiness states poll
    /// at the scheduler's tolerance window, transient hardware states are
    /// checked frequently.
    pub fn idle_backoff(&self) -> Duration {
        match self {
            ObservatoryState::Shutdown | ObservatoryState::Sleeping => Duration::from_secs(60),
            ObservatoryState::GettingReady | ObservatoryState::Scheduling => {
                Duration::from_secs(10)
            }
            ObservatoryState::Slewing
            | ObservatoryState::TakingTestImage
            | ObservatoryState::Analyzing
            | ObservatoryState::Imaging
            | ObservatoryState::Parking => Duration::from_secs(5),
            ObservatoryState::Parked | ObservatoryState::Alarm => Duration::from_secs(60),
            ObservatoryState::StopObserving => Duration::ZERO,
        }
    }
}

impl fmt::Display for ObservatoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObservatoryState::Shutdown => "shutdown",
            ObservatoryState::Sleeping => "sleeping",
            ObservatoryState::GettingReady => "getting ready",
            ObservatoryState::Scheduling => "scheduling",
            ObservatoryState::Slewing => "slewing",
            ObservatoryState::TakingTestImage => "taking test image",
            ObservatoryState::Analyzing => "analyzing",
            ObservatoryState::Imaging => "imaging",
            ObservatoryState::Parking => "parking",
            ObservatoryState::Parked => "parked",
            ObservatoryState::Alarm => "alarm",
            ObservatoryState::StopObserving => "stop observing",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_states_are_not_active() {
        assert!(!ObservatoryState::Parking.is_active());
        assert!(!ObservatoryState::Parked.is_active());
        assert!(!ObservatoryState::Alarm.is_active());
        assert!(!ObservatoryState::StopObserving.is_active());
        assert!(ObservatoryState::Shutdown.is_active());
        assert!(ObservatoryState::Imaging.is_active());
    }

    #[test]
    fn test_day_states_back_off_longest() {
        assert_eq!(
            ObservatoryState::Shutdown.idle_backoff(),
            Duration::from_secs(60)
        );
        assert_eq!(
            ObservatoryState::Scheduling.idle_backoff(),
            Duration::from_secs(10)
        );
        assert_eq!(
            ObservatoryState::Slewing.idle_backoff(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_display_matches_log_names() {
        assert_eq!(ObservatoryState::GettingReady.to_string(), "getting ready");
        assert_eq!(
            ObservatoryState::TakingTestImage.to_string(),
            "taking test image"
        );
    }
}
