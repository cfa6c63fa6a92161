//! Target record and lifecycle
//!
//! A `Target` is issued by the scheduler when observing begins and lives
//! until the observation block completes or the controller retreats. The
//! controller owns the single target reference; handlers mutate it only
//! through the methods here so the progress flags stay coherent.

use argus_devices::SkyCoordinates;
use serde::Serialize;

/// The object currently being observed and its progress.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub name: String,
    pub coordinates: SkyCoordinates,
    /// Smallest schedulable block; the scheduler may re-issue the field
    /// later for more.
    pub min_images: u32,
    pub images_taken: u32,
    pub test_image_taken: bool,
    pub completed: bool,
    pub astrometry_solved: bool,
    pub analysis_attempted: bool,
    pub analysis_in_progress: bool,
}

impl Target {
    pub fn new(name: impl Into<String>, coordinates: SkyCoordinates, min_images: u32) -> Self {
        Self {
            name: name.into(),
            coordinates,
            min_images: min_images.max(1),
            images_taken: 0,
            test_image_taken: false,
            completed: false,
            astrometry_solved: false,
            analysis_attempted: false,
            analysis_in_progress: false,
        }
    }

    /// A new science exposure invalidates any prior analysis.
    pub fn start_science_exposure(&mut self) {
        self.analysis_attempted = false;
        self.analysis_in_progress = false;
        self.astrometry_solved = false;
    }

    /// Record a completed science exposure. Test images do not count
    /// toward the quota.
    pub fn record_image(&mut self) {
        self.images_taken += 1;
    }

    pub fn quota_met(&self) -> bool {
        self.images_taken >= self.min_images
    }

    /// Mark the block complete. Only legal once the quota is met.
    pub fn mark_complete(&mut self) {
        debug_assert!(self.quota_met(), "completed implies images_taken >= min_images");
        self.completed = true;
    }
}
