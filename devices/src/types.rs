//! Shared device-facing types

use serde::{Deserialize, Serialize};

/// Sidereal tracking rate in arcseconds per second of wall clock.
pub const SIDEREAL_RATE_ARCSEC: f64 = 15.041;

/// Equatorial coordinates of a pointing (RA in hours, Dec in degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoordinates {
    pub ra_hours: f64,
    pub dec_degrees: f64,
}

impl SkyCoordinates {
    pub fn new(ra_hours: f64, dec_degrees: f64) -> Self {
        Self {
            ra_hours,
            dec_degrees,
        }
    }

    /// Apply a pointing correction reported by a plate solve.
    ///
    /// Offsets are in degrees on both axes; RA wraps into [0, 24) hours
    /// and Dec clamps to the poles.
    pub fn offset_by(&self, ra_offset_degrees: f64, dec_offset_degrees: f64) -> Self {
        let ra = (self.ra_hours + ra_offset_degrees / 15.0).rem_euclid(24.0);
        let dec = (self.dec_degrees + dec_offset_degrees).clamp(-90.0, 90.0);
        Self {
            ra_hours: ra,
            dec_degrees: dec,
        }
    }
}
