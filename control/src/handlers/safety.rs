//! Safety states: parking, parked, alarm
//!
//! The retreat path every failure funnels into. A park command is never
//! re-issued while parking (a physical obstruction plus a retry loop is
//! how motors get damaged); a park that does not complete raises the
//! terminal alarm instead.

use super::{issue_park, Cycle};
use crate::state::ObservatoryState;

/// Park commanded, mount still on its way to the park position. An
/// in-flight exposure is allowed to finish in the background and is
/// tagged as interrupted downstream, so `camera.exposing` is not an
/// inconsistency here.
pub(super) async fn parking(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if snap.mount.parked {
        tracing::info!("mount reached park position");
        return ObservatoryState::Parked;
    }
    if cycle.in_state_for > cycle.timeouts.park_wait() {
        tracing::error!(
            waited_secs = cycle.in_state_for.as_secs(),
            "mount did not reach park position; raising alarm"
        );
        return ObservatoryState::Alarm;
    }
    tracing::debug!("waiting for park position");
    ObservatoryState::Parking
}

/// At the park position. Night with safe conditions resumes operations;
/// daylight (with safe conditions to retreat through) ends the night.
pub(super) async fn parked(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if cycle.target.is_some() {
        tracing::debug!("dropping target after retreat");
        *cycle.target = None;
    }
    if !snap.mount.parked {
        tracing::warn!("mount left park position unexpectedly; parking again");
        return issue_park(cycle).await;
    }
    if !snap.is_dark {
        if snap.weather.safe {
            tracing::info!("end of night; shutting down");
            return ObservatoryState::Shutdown;
        }
        // Leaving parked for shutdown while unsafe would bounce straight
        // back through the weather funnel.
        tracing::debug!("daylight but conditions unsafe; staying parked");
        return ObservatoryState::Parked;
    }
    if snap.weather.safe {
        tracing::info!("conditions are safe again; resuming operations");
        return ObservatoryState::GettingReady;
    }
    tracing::debug!("parked; waiting for conditions to clear");
    ObservatoryState::Parked
}

/// Terminal fault state: a park failed or never completed. No automatic
/// return to operation; an operator inspects the mount and restarts the
/// controller.
pub(super) async fn alarm(_cycle: &mut Cycle<'_>) -> ObservatoryState {
    tracing::warn!("in alarm state; manual intervention required");
    ObservatoryState::Alarm
}

#[cfg(test)]
mod tests {
    use crate::handlers::testkit::{rig, run, run_after, snap};
    use crate::state::ObservatoryState;
    use crate::target::Target;
    use argus_devices::SkyCoordinates;
    use std::time::Duration;

    #[tokio::test]
    async fn test_parking_waits_for_position() {
        let rig = rig();
        let snapshot = snap(); // mount.parked = false
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parking, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parking);
        // The park command is never re-issued.
        assert_eq!(rig.mount.ops.count("park"), 0);
    }

    #[tokio::test]
    async fn test_parking_completes() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.mount.parked = true;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parking, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parked);
    }

    #[tokio::test]
    async fn test_parking_tolerates_running_exposure() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.camera.exposing = true;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parking, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.camera.ops.count("cancel_exposure"), 0);
    }

    #[tokio::test]
    async fn test_parking_timeout_raises_alarm() {
        let rig = rig();
        let snapshot = snap();
        let mut held = None;
        let next = run_after(
            &rig,
            ObservatoryState::Parking,
            snapshot,
            &mut held,
            Duration::from_secs(181),
        )
        .await;
        assert_eq!(next, ObservatoryState::Alarm);
    }

    #[tokio::test]
    async fn test_parked_resumes_when_safe_at_night() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.mount.parked = true;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::GettingReady);
    }

    #[tokio::test]
    async fn test_parked_waits_out_bad_weather() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.mount.parked = true;
        snapshot.weather.safe = false;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parked);
        assert_eq!(rig.mount.ops.count("park"), 0);
    }

    #[tokio::test]
    async fn test_parked_shuts_down_at_daylight() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.is_dark = false;
        snapshot.mount.parked = true;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Shutdown);
    }

    #[tokio::test]
    async fn test_parked_stays_during_unsafe_daylight() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.is_dark = false;
        snapshot.mount.parked = true;
        snapshot.weather.safe = false;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parked);
    }

    #[tokio::test]
    async fn test_parked_drops_abandoned_target() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.mount.parked = true;
        snapshot.weather.safe = false;
        let mut held = Some(Target::new("M42", SkyCoordinates::new(5.588, -5.39), 3));
        run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert!(held.is_none());
    }

    #[tokio::test]
    async fn test_parked_reparks_if_mount_moved() {
        let rig = rig();
        let snapshot = snap(); // parked = false
        let mut held = None;
        let next = run(&rig, ObservatoryState::Parked, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_alarm_never_leaves() {
        let rig = rig();
        let mut snapshot = snap();
        snapshot.mount.parked = true;
        let mut held = None;
        let next = run(&rig, ObservatoryState::Alarm, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::Alarm);
        assert_eq!(rig.command_count(), 0);
    }
}
