//! Day/night oracle
//!
//! Wraps the site's solar ephemeris to answer one question: is the sun
//! below the configured horizon threshold right now? The answer is
//! recomputed at every call; time advances continuously, so a cached
//! value from the previous cycle is wrong by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Observing site context, consumed only by the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
    /// Solar altitude below which observing is considered dark.
    pub horizon_deg: f64,
    pub pressure_hpa: f64,
}

impl Default for Site {
    /// Fallback location when configuration is absent: Hilo, HI.
    fn default() -> Self {
        Self {
            latitude_deg: 19.535941,
            longitude_deg: -155.576199,
            elevation_m: 3400.0,
            horizon_deg: -12.0,
            pressure_hpa: 680.0,
        }
    }
}

/// The seam the controller polls each cycle.
pub trait DayNightOracle: Send + Sync {
    fn is_dark(&self) -> bool;
}

/// Oracle backed by a solar position model for a fixed site.
pub struct SolarOracle {
    site: Site,
}

impl SolarOracle {
    pub fn new(site: Site) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Solar altitude in degrees at the given instant.
    pub fn solar_altitude_at(&self, at: DateTime<Utc>) -> f64 {
        solar_altitude(at, self.site.latitude_deg, self.site.longitude_deg)
    }

    pub fn is_dark_at(&self, at: DateTime<Utc>) -> bool {
        below_horizon(self.solar_altitude_at(at), self.site.horizon_deg)
    }
}

impl DayNightOracle for SolarOracle {
    fn is_dark(&self) -> bool {
        self.is_dark_at(Utc::now())
    }
}

/// Whether a solar altitude counts as dark for the given horizon.
/// The horizon itself is not dark: the sun must be strictly below it.
pub fn below_horizon(altitude_deg: f64, horizon_deg: f64) -> bool {
    altitude_deg < horizon_deg
}

/// Geocentric solar altitude in degrees.
///
/// Low-accuracy solar position (mean elements, no nutation or
/// refraction), good to roughly a tenth of a degree. Ample for a
/// twilight gate with a −12° threshold.
pub fn solar_altitude(at: DateTime<Utc>, latitude_deg: f64, longitude_deg: f64) -> f64 {
    // Days since J2000.0, including the day fraction.
    let julian_day = at.timestamp() as f64 / 86_400.0 + 2_440_587.5;
    let n = julian_day - 2_451_545.0;

    // Mean elements of the sun, in degrees.
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    // Equatorial coordinates.
    let right_ascension = (obliquity.cos() * ecliptic_longitude.sin())
        .atan2(ecliptic_longitude.cos())
        .to_degrees();
    let declination = (obliquity.sin() * ecliptic_longitude.sin()).asin();

    // Local hour angle via sidereal time.
    let gmst = (280.460_618_37 + 360.985_647_366_29 * n).rem_euclid(360.0);
    let hour_angle = (gmst + longitude_deg - right_ascension).rem_euclid(360.0).to_radians();

    let latitude = latitude_deg.to_radians();
    (latitude.sin() * declination.sin() + latitude.cos() * declination.cos() * hour_angle.cos())
        .asin()
        .to_degrees()
}

/// Test oracle pinned to day or night.
pub struct FixedOracle {
    dark: AtomicBool,
}

impl FixedOracle {
    pub fn dark() -> Self {
        Self {
            dark: AtomicBool::new(true),
        }
    }

    pub fn light() -> Self {
        Self {
            dark: AtomicBool::new(false),
        }
    }

    pub fn set_dark(&self, dark: bool) {
        self.dark.store(dark, Ordering::SeqCst);
    }
}

impl DayNightOracle for FixedOracle {
    fn is_dark(&self) -> bool {
        self.dark.load(Ordering::SeqCst)
    }
}
