//! Readiness states: getting ready and scheduling
//!
//! Getting ready waits for the camera to cool and requests a target;
//! scheduling turns the selected target into a slew. A scheduler with
//! nothing to offer is the one failure that never parks: the system
//! stays in getting ready and asks again later.

use super::{escalate, issue_park, Cycle};
use crate::state::ObservatoryState;

/// Dark, cooling toward operating temperature, nothing else in motion.
/// When the camera reports cooled, a target is requested.
pub(super) async fn getting_ready(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if snap.is_dark
        && snap.camera.connected
        && snap.camera.cooling
        && !snap.camera.cooled
        && !snap.camera.exposing
        && snap.mount.connected
        && !snap.mount.tracking
        && !snap.mount.slewing
        && cycle.target.is_none()
        && snap.weather.safe
    {
        tracing::debug!("getting ready conditions settled; waiting for camera to cool");
        return ObservatoryState::GettingReady;
    }
    if !snap.is_dark {
        tracing::info!("daylight has arrived; parking for the day");
        return issue_park(cycle).await;
    }
    if cycle.target.is_some() {
        tracing::debug!("clearing stray target");
        *cycle.target = None;
    }
    if !snap.camera.connected {
        tracing::warn!("camera is not connected; connecting");
        if let Err(err) = cycle.devices.camera.connect().await {
            return escalate(cycle, "camera connect", &err).await;
        }
    }
    if !snap.camera.cooling {
        tracing::warn!("camera cooler is off; turning it on");
        if let Err(err) = cycle.devices.camera.set_cooling(true).await {
            return escalate(cycle, "camera set cooling", &err).await;
        }
    }
    if snap.camera.exposing {
        tracing::warn!("camera is exposing in getting ready state; canceling exposure");
        if let Err(err) = cycle.devices.camera.cancel_exposure().await {
            return escalate(cycle, "camera cancel exposure", &err).await;
        }
    }
    if !snap.mount.connected {
        tracing::warn!("mount is not connected; connecting");
        if let Err(err) = cycle.devices.mount.connect().await {
            return escalate(cycle, "mount connect", &err).await;
        }
    }
    if snap.mount.tracking {
        tracing::warn!("mount is tracking in getting ready state; stopping tracking");
        if let Err(err) = cycle.devices.mount.set_tracking_rate(0.0, 0.0).await {
            return escalate(cycle, "mount set tracking rate", &err).await;
        }
    }
    if snap.mount.slewing {
        tracing::warn!("mount is slewing in getting ready state; canceling slew");
        if let Err(err) = cycle.devices.mount.cancel_slew().await {
            return escalate(cycle, "mount cancel slew", &err).await;
        }
    }
    if snap.camera.cooled && snap.weather.safe {
        match cycle.devices.scheduler.get_target().await {
            Ok(target) => {
                tracing::info!(target = %target.name, "target selected");
                *cycle.target = Some(target);
                return ObservatoryState::Scheduling;
            }
            Err(err) => {
                // The one non-escalating failure: retry on a later cycle.
                tracing::warn!(error = %err, "scheduler returned no target; will retry");
                return ObservatoryState::GettingReady;
            }
        }
    }
    ObservatoryState::GettingReady
}

/// Camera cooled, everything idle, a target in hand (or imminently
/// expected from the scheduler): issue the slew.
pub(super) async fn scheduling(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if !snap.is_dark {
        tracing::info!("end of night; parking");
        return issue_park(cycle).await;
    }
    let mut ready = true;
    if !snap.camera.connected {
        ready = false;
        tracing::warn!("camera not connected; connecting and returning to getting ready");
        if let Err(err) = cycle.devices.camera.connect().await {
            return escalate(cycle, "camera connect", &err).await;
        }
    }
    if !snap.camera.cooling {
        ready = false;
        tracing::warn!("camera cooler is off; turning it on and returning to getting ready");
        if let Err(err) = cycle.devices.camera.set_cooling(true).await {
            return escalate(cycle, "camera set cooling", &err).await;
        }
    }
    if !snap.camera.cooled {
        ready = false;
        tracing::warn!("camera not finished cooling; returning to getting ready");
    }
    if snap.camera.exposing {
        ready = false;
        tracing::warn!("camera is exposing in scheduling state; canceling exposure");
        if let Err(err) = cycle.devices.camera.cancel_exposure().await {
            return escalate(cycle, "camera cancel exposure", &err).await;
        }
    }
    if !snap.mount.connected {
        ready = false;
        tracing::warn!("mount not connected; connecting and returning to getting ready");
        if let Err(err) = cycle.devices.mount.connect().await {
            return escalate(cycle, "mount connect", &err).await;
        }
    }
    if snap.mount.slewing {
        ready = false;
        tracing::warn!("mount is slewing in scheduling state; canceling slew");
        if let Err(err) = cycle.devices.mount.cancel_slew().await {
            return escalate(cycle, "mount cancel slew", &err).await;
        }
    }
    if !ready {
        return ObservatoryState::GettingReady;
    }
    if cycle.target.is_none() {
        // Selection runs asynchronously; ask again within this state's
        // tolerance window before falling back to getting ready.
        match cycle.devices.scheduler.get_target().await {
            Ok(target) => {
                tracing::info!(target = %target.name, "target selected");
                *cycle.target = Some(target);
            }
            Err(err) => {
                tracing::warn!(error = %err, "scheduler returned no target; returning to getting ready");
                return ObservatoryState::GettingReady;
            }
        }
    }
    let coordinates = match cycle.target.as_ref() {
        Some(target) => {
            tracing::info!(target = %target.name, "slewing to target");
            target.coordinates
        }
        None => return ObservatoryState::GettingReady,
    };
    if let Err(err) = cycle.devices.mount.slew_to(&coordinates).await {
        return escalate(cycle, "mount slew", &err).await;
    }
    ObservatoryState::Slewing
}

#[cfg(test)]
mod tests {
    use crate::handlers::testkit::{rig, rig_with_fields, run, snap};
    use crate::state::ObservatoryState;
    use crate::target::Target;
    use argus_devices::SkyCoordinates;

    fn settled_getting_ready() -> crate::snapshot::ConditionSnapshot {
        let mut snapshot = snap();
        snapshot.camera.connected = true;
        snapshot.camera.cooling = true;
        snapshot.mount.connected = true;
        snapshot.mount.parked = true;
        snapshot
    }

    fn ready_to_schedule() -> crate::snapshot::ConditionSnapshot {
        let mut snapshot = settled_getting_ready();
        snapshot.camera.cooled = true;
        snapshot
    }

    fn target() -> Target {
        Target::new("M42", SkyCoordinates::new(5.588, -5.39), 3)
    }

    #[tokio::test]
    async fn test_settled_getting_ready_issues_no_commands() {
        let rig = rig();
        let mut target = None;
        let next = run(
            &rig,
            ObservatoryState::GettingReady,
            settled_getting_ready(),
            &mut target,
        )
        .await;
        assert_eq!(next, ObservatoryState::GettingReady);
        assert_eq!(rig.command_count(), 0);
    }

    #[tokio::test]
    async fn test_getting_ready_clears_stray_target() {
        let rig = rig();
        let mut stray = Some(target());
        let next = run(
            &rig,
            ObservatoryState::GettingReady,
            settled_getting_ready(),
            &mut stray,
        )
        .await;
        assert_eq!(next, ObservatoryState::GettingReady);
        assert!(stray.is_none());
    }

    #[tokio::test]
    async fn test_getting_ready_requests_target_when_cooled() {
        let rig = rig();
        let mut target = None;
        let next = run(
            &rig,
            ObservatoryState::GettingReady,
            ready_to_schedule(),
            &mut target,
        )
        .await;
        assert_eq!(next, ObservatoryState::Scheduling);
        let target = target.expect("target should be selected");
        assert_eq!(target.name, "M42");
        assert!(!target.test_image_taken);
        assert!(!target.completed);
        assert!(!target.astrometry_solved);
        assert!(!target.analysis_attempted);
    }

    #[tokio::test]
    async fn test_scheduling_failure_retries_without_parking() {
        // An empty field list makes the scheduler fail; that failure is
        // non-fatal and never touches the mount.
        let rig = rig_with_fields(Vec::new());
        let mut target = None;
        let next = run(
            &rig,
            ObservatoryState::GettingReady,
            ready_to_schedule(),
            &mut target,
        )
        .await;
        assert_eq!(next, ObservatoryState::GettingReady);
        assert!(target.is_none());
        assert_eq!(rig.mount.ops.count("park"), 0);
    }

    #[tokio::test]
    async fn test_getting_ready_parks_at_daylight() {
        let rig = rig();
        let mut snapshot = settled_getting_ready();
        snapshot.is_dark = false;
        let mut target = None;
        let next = run(&rig, ObservatoryState::GettingReady, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_scheduling_slews_to_selected_target() {
        let rig = rig();
        use argus_devices::Mount;
        rig.mount.connect().await.unwrap();
        let mut held = Some(target());
        let next = run(&rig, ObservatoryState::Scheduling, ready_to_schedule(), &mut held).await;
        assert_eq!(next, ObservatoryState::Slewing);
        assert_eq!(rig.mount.ops.count("slew_to"), 1);
        assert!(held.is_some());
    }

    #[tokio::test]
    async fn test_scheduling_demotes_when_camera_warm() {
        let rig = rig();
        let mut snapshot = ready_to_schedule();
        snapshot.camera.cooled = false;
        let mut held = Some(target());
        let next = run(&rig, ObservatoryState::Scheduling, snapshot, &mut held).await;
        assert_eq!(next, ObservatoryState::GettingReady);
        assert_eq!(rig.mount.ops.count("slew_to"), 0);
    }

    #[tokio::test]
    async fn test_scheduling_slew_failure_parks() {
        let rig = rig();
        use argus_devices::Mount;
        rig.mount.connect().await.unwrap();
        rig.mount.fail_on("slew_to");
        let mut held = Some(target());
        let next = run(&rig, ObservatoryState::Scheduling, ready_to_schedule(), &mut held).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_scheduling_fetches_target_when_missing() {
        let rig = rig();
        use argus_devices::Mount;
        rig.mount.connect().await.unwrap();
        let mut held = None;
        let next = run(&rig, ObservatoryState::Scheduling, ready_to_schedule(), &mut held).await;
        assert_eq!(next, ObservatoryState::Slewing);
        assert_eq!(held.map(|t| t.name), Some("M42".to_string()));
    }
}
