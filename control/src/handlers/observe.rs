//! Observing states: slewing, test image, analysis, science imaging
//!
//! The observing pipeline for one target: slew, verify pointing with a
//! short test image, plate solve, recenter, then loop science exposures
//! through analysis until the block's quota is met.

use super::{escalate, issue_park, Cycle};
use crate::state::ObservatoryState;
use argus_devices::SIDEREAL_RATE_ARCSEC;

/// Mount in motion toward the target. When the slew settles the next
/// exposure is dispatched: a test image first, science afterwards.
pub(super) async fn slewing(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if snap.mount.connected && snap.mount.slewing {
        tracing::debug!("slew in progress");
        return ObservatoryState::Slewing;
    }
    if !snap.mount.connected {
        tracing::warn!("mount not connected while slewing; reconnecting and regrouping");
        if let Err(err) = cycle.devices.mount.connect().await {
            return escalate(cycle, "mount connect", &err).await;
        }
        return ObservatoryState::GettingReady;
    }
    let Some(target) = cycle.target.as_mut() else {
        tracing::warn!("no target while slewing; returning to getting ready");
        return ObservatoryState::GettingReady;
    };
    if !target.test_image_taken {
        tracing::info!(target = %target.name, "slew complete; taking test image");
        if let Err(err) = cycle.devices.camera.take_image(true).await {
            return escalate(cycle, "camera take test image", &err).await;
        }
        ObservatoryState::TakingTestImage
    } else {
        tracing::info!(target = %target.name, "slew complete; starting science exposure");
        target.start_science_exposure();
        if let Err(err) = cycle.devices.camera.take_image(false).await {
            return escalate(cycle, "camera take image", &err).await;
        }
        ObservatoryState::Imaging
    }
}

/// Short pointing-verification exposure in progress.
pub(super) async fn taking_test_image(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if cycle.target.is_none() {
        tracing::warn!("no target while taking test image; returning to getting ready");
        return ObservatoryState::GettingReady;
    }
    if cycle.in_state_for > cycle.timeouts.exposure_wait() {
        tracing::error!(
            waited_secs = cycle.in_state_for.as_secs(),
            "test image did not complete in time; parking"
        );
        return issue_park(cycle).await;
    }
    if snap.camera.exposing {
        if !snap.mount.tracking {
            tracing::warn!("mount not tracking during exposure; restoring sidereal rate");
            if let Err(err) = cycle
                .devices
                .mount
                .set_tracking_rate(SIDEREAL_RATE_ARCSEC, 0.0)
                .await
            {
                return escalate(cycle, "mount set tracking rate", &err).await;
            }
        }
        tracing::debug!("test exposure in progress");
        return ObservatoryState::TakingTestImage;
    }
    if let Some(target) = cycle.target.as_mut() {
        target.test_image_taken = true;
        tracing::info!(target = %target.name, "test image complete; analyzing");
    }
    ObservatoryState::Analyzing
}

/// Plate solve the last image, then decide: recenter, take the next
/// science frame, or close out a completed block.
pub(super) async fn analyzing(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if cycle.in_state_for > cycle.timeouts.exposure_wait() {
        tracing::error!(
            waited_secs = cycle.in_state_for.as_secs(),
            "analysis did not complete in time; parking"
        );
        return issue_park(cycle).await;
    }
    if snap.camera.exposing {
        tracing::debug!("waiting for camera readout");
        return ObservatoryState::Analyzing;
    }
    let Some(target) = cycle.target.as_mut() else {
        tracing::warn!("no target while analyzing; returning to getting ready");
        return ObservatoryState::GettingReady;
    };
    if !target.analysis_attempted {
        target.analysis_attempted = true;
        target.analysis_in_progress = true;
        tracing::debug!(target = %target.name, "plate solving last image");
        match cycle.devices.solver.solve_pointing(&target.coordinates).await {
            Ok(result) => {
                target.astrometry_solved = result.solved;
                if result.solved {
                    // Fold the measured pointing error into the target so
                    // every later slew uses the refined coordinates.
                    target.coordinates = target
                        .coordinates
                        .offset_by(result.ra_offset_degrees, result.dec_offset_degrees);
                    tracing::debug!(
                        ra_offset = result.ra_offset_degrees,
                        dec_offset = result.dec_offset_degrees,
                        "astrometry solved"
                    );
                } else {
                    tracing::warn!(target = %target.name, "astrometry did not solve");
                }
                if let Some(level) = result.background_level {
                    tracing::debug!(level, "background level measured");
                }
            }
            Err(err) => {
                // Analysis failures are non-fatal; the pipeline continues
                // without a pointing correction.
                tracing::warn!(error = %err, "analysis failed");
                target.astrometry_solved = false;
            }
        }
        target.analysis_in_progress = false;
    }
    if target.quota_met() {
        target.mark_complete();
        let name = target.name.clone();
        tracing::info!(
            target = %name,
            images = target.images_taken,
            "observation block complete"
        );
        cycle.devices.scheduler.mark_complete(&name).await;
        return ObservatoryState::GettingReady;
    }
    if target.astrometry_solved {
        tracing::info!(target = %target.name, "recentering on astrometric solution");
        let coordinates = target.coordinates;
        if let Err(err) = cycle.devices.mount.slew_to(&coordinates).await {
            return escalate(cycle, "mount slew", &err).await;
        }
        return ObservatoryState::Slewing;
    }
    tracing::warn!(target = %target.name, "starting science exposure without pointing correction");
    target.start_science_exposure();
    if let Err(err) = cycle.devices.camera.take_image(false).await {
        return escalate(cycle, "camera take image", &err).await;
    }
    ObservatoryState::Imaging
}

/// Science exposure in progress. Completion feeds the frame count and
/// hands off to analysis.
pub(super) async fn imaging(cycle: &mut Cycle<'_>) -> ObservatoryState {
    let snap = cycle.snapshot;
    if cycle.target.is_none() {
        tracing::warn!("no target while imaging; returning to getting ready");
        return ObservatoryState::GettingReady;
    }
    if cycle.in_state_for > cycle.timeouts.exposure_wait() {
        tracing::error!(
            waited_secs = cycle.in_state_for.as_secs(),
            "science exposure did not complete in time; parking"
        );
        return issue_park(cycle).await;
    }
    if snap.camera.exposing {
        if !snap.mount.tracking {
            tracing::warn!("mount not tracking during exposure; restoring sidereal rate");
            if let Err(err) = cycle
                .devices
                .mount
                .set_tracking_rate(SIDEREAL_RATE_ARCSEC, 0.0)
                .await
            {
                return escalate(cycle, "mount set tracking rate", &err).await;
            }
        }
        tracing::debug!("science exposure in progress");
        return ObservatoryState::Imaging;
    }
    if let Some(target) = cycle.target.as_mut() {
        target.record_image();
        tracing::info!(
            target = %target.name,
            images = target.images_taken,
            min_images = target.min_images,
            "science exposure complete; analyzing"
        );
    }
    ObservatoryState::Analyzing
}
