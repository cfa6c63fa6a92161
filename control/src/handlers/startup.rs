//! Daytime states: shutdown and sleeping
//!
//! Shutdown covers the day before components are connected; sleeping
//! covers the connected-but-idle wait for darkness.

use super::{escalate, issue_park, Cycle};
use crate::state::ObservatoryState;

/// Daytime, components disconnected, waiting for the configured start
/// time. At start time the camera and mount are connected and the system
/// moves to sleeping.
pub(super) async fn shutdown(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if !snap.is_dark && !snap.past_start_time && !snap.camera.connected && !snap.mount.connected {
        tracing::debug!("shutdown conditions settled; waiting for start time");
        return ObservatoryState::Shutdown;
    }
    if snap.mount.connected {
        tracing::warn!("mount is connected in shutdown state; disconnecting");
        if let Err(err) = cycle.devices.mount.disconnect().await {
            return escalate(cycle, "mount disconnect", &err).await;
        }
    }
    if snap.camera.connected {
        tracing::warn!("camera is connected in shutdown state; disconnecting");
        if let Err(err) = cycle.devices.camera.disconnect().await {
            return escalate(cycle, "camera disconnect", &err).await;
        }
    }
    if snap.past_start_time {
        tracing::info!("start time reached; connecting camera and mount");
        if let Err(err) = cycle.devices.camera.connect().await {
            return escalate(cycle, "camera connect", &err).await;
        }
        if let Err(err) = cycle.devices.mount.connect().await {
            return escalate(cycle, "mount connect", &err).await;
        }
        return ObservatoryState::Sleeping;
    }
    ObservatoryState::Shutdown
}

/// Daytime, components connected and idle, mount parked, waiting for
/// darkness. When dark arrives with safe weather, cooling starts and the
/// system moves to getting ready.
pub(super) async fn sleeping(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if !snap.is_dark
        && snap.camera.connected
        && !snap.camera.cooling
        && !snap.camera.exposing
        && snap.mount.connected
        && !snap.mount.tracking
        && !snap.mount.slewing
        && snap.mount.parked
    {
        tracing::debug!("sleeping conditions settled; waiting for dark");
        return ObservatoryState::Sleeping;
    }
    if !snap.camera.connected {
        tracing::warn!("camera is not connected; connecting");
        if let Err(err) = cycle.devices.camera.connect().await {
            return escalate(cycle, "camera connect", &err).await;
        }
    }
    if snap.camera.cooling {
        tracing::warn!("camera cooler is on in sleeping state; turning it off");
        if let Err(err) = cycle.devices.camera.set_cooling(false).await {
            return escalate(cycle, "camera set cooling", &err).await;
        }
    }
    if snap.camera.exposing {
        tracing::warn!("camera is exposing in sleeping state; canceling exposure");
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
        tracing::warn!("mount is tracking in sleeping state; stopping tracking");
        if let Err(err) = cycle.devices.mount.set_tracking_rate(0.0, 0.0).await {
            return escalate(cycle, "mount set tracking rate", &err).await;
        }
    }
    if snap.mount.slewing {
        tracing::warn!("mount is slewing in sleeping state; canceling slew");
        if let Err(err) = cycle.devices.mount.cancel_slew().await {
            return escalate(cycle, "mount cancel slew", &err).await;
        }
    }
    if !snap.mount.parked {
        tracing::error!("mount is not parked in sleeping state; parking");
        return issue_park(cycle).await;
    }
    if snap.is_dark && snap.weather.safe {
        tracing::info!("dark with safe conditions; starting camera cooling");
        if let Err(err) = cycle.devices.camera.set_cooling(true).await {
            return escalate(cycle, "camera set cooling", &err).await;
        }
        return ObservatoryState::GettingReady;
    }
    ObservatoryState::Sleeping
}

#[cfg(test)]
mod tests {
    use crate::handlers::testkit::{rig, run, snap};
    use crate::state::ObservatoryState;

    fn settled_shutdown() -> crate::snapshot::ConditionSnapshot {
        let mut snapshot = snap();
        snapshot.is_dark = false;
        snapshot.past_start_time = false;
        snapshot
    }

    fn settled_sleeping() -> crate::snapshot::ConditionSnapshot {
        let mut snapshot = snap();
        snapshot.is_dark = false;
        snapshot.camera.connected = true;
        snapshot.mount.connected = true;
        snapshot.mount.parked = true;
        snapshot
    }

    #[tokio::test]
    async fn test_settled_shutdown_issues_no_commands() {
        let rig = rig();
        let mut target = None;
        let next = run(&rig, ObservatoryState::Shutdown, settled_shutdown(), &mut target).await;
        assert_eq!(next, ObservatoryState::Shutdown);
        assert_eq!(rig.command_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects_stray_components() {
        let rig = rig();
        let mut snapshot = settled_shutdown();
        snapshot.camera.connected = true;
        snapshot.mount.connected = true;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Shutdown, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Shutdown);
        assert_eq!(rig.camera.ops.count("disconnect"), 1);
        assert_eq!(rig.mount.ops.count("disconnect"), 1);
    }

    #[tokio::test]
    async fn test_shutdown_connects_at_start_time() {
        let rig = rig();
        let mut snapshot = settled_shutdown();
        snapshot.past_start_time = true;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Shutdown, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Sleeping);
        assert_eq!(rig.camera.ops.count("connect"), 1);
        assert_eq!(rig.mount.ops.count("connect"), 1);
    }

    #[tokio::test]
    async fn test_shutdown_connect_failure_parks() {
        let rig = rig();
        rig.mount.fail_on("connect");
        let mut snapshot = settled_shutdown();
        snapshot.past_start_time = true;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Shutdown, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_settled_sleeping_issues_no_commands() {
        let rig = rig();
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, settled_sleeping(), &mut target).await;
        assert_eq!(next, ObservatoryState::Sleeping);
        assert_eq!(rig.command_count(), 0);
    }

    #[tokio::test]
    async fn test_sleeping_reconnects_camera() {
        let rig = rig();
        let mut snapshot = settled_sleeping();
        snapshot.camera.connected = false;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Sleeping);
        assert_eq!(rig.camera.ops.count("connect"), 1);
    }

    #[tokio::test]
    async fn test_sleeping_camera_connect_failure_parks() {
        // Reconnect-then-park: a camera that cannot be reconnected forces
        // the retreat with exactly one connect attempt and one park.
        let rig = rig();
        rig.camera.fail_on("connect");
        let mut snapshot = settled_sleeping();
        snapshot.camera.connected = false;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.camera.ops.count("connect"), 1);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_sleeping_cooler_failure_parks_without_other_actions() {
        let rig = rig();
        rig.camera.fail_on("set_cooling");
        let mut snapshot = settled_sleeping();
        snapshot.camera.cooling = true;
        snapshot.mount.tracking = true; // later clause must not run
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("set_tracking_rate"), 0);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_sleeping_repairs_multiple_clauses_in_one_cycle() {
        let rig = rig();
        let mut snapshot = settled_sleeping();
        snapshot.camera.cooling = true;
        snapshot.mount.tracking = true;
        snapshot.mount.slewing = true;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Sleeping);
        assert_eq!(rig.camera.ops.count("set_cooling"), 1);
        assert_eq!(rig.mount.ops.count("set_tracking_rate"), 1);
        assert_eq!(rig.mount.ops.count("cancel_slew"), 1);
    }

    #[tokio::test]
    async fn test_sleeping_unparked_mount_parks() {
        let rig = rig();
        let mut snapshot = settled_sleeping();
        snapshot.mount.parked = false;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::Parking);
        assert_eq!(rig.mount.ops.count("park"), 1);
    }

    #[tokio::test]
    async fn test_sleeping_starts_cooling_at_dark() {
        let rig = rig();
        let mut snapshot = settled_sleeping();
        snapshot.is_dark = true;
        let mut target = None;
        let next = run(&rig, ObservatoryState::Sleeping, snapshot, &mut target).await;
        assert_eq!(next, ObservatoryState::GettingReady);
        assert_eq!(rig.camera.ops.count("set_cooling"), 1);
    }
}
