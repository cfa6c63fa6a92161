//! Plate-solving capability interface
//!
//! Astrometric solving itself is an external service; the controller only
//! consumes the reported outcome and the pointing correction it implies.

use crate::error::DeviceResult;
use crate::types::SkyCoordinates;
use async_trait::async_trait;

/// Outcome of a plate solve on the most recent image.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Whether an astrometric solution was found.
    pub solved: bool,
    /// Pointing error to correct, in degrees of RA.
    pub ra_offset_degrees: f64,
    /// Pointing error to correct, in degrees of Dec.
    pub dec_offset_degrees: f64,
    /// Median background level of the frame, if measured.
    pub background_level: Option<f64>,
}

impl SolveResult {
    /// A successful solve with no pointing error.
    pub fn centered() -> Self {
        Self {
            solved: true,
            ra_offset_degrees: 0.0,
            dec_offset_degrees: 0.0,
            background_level: None,
        }
    }

    /// A failed solve.
    pub fn unsolved() -> Self {
        Self {
            solved: false,
            ra_offset_degrees: 0.0,
            dec_offset_degrees: 0.0,
            background_level: None,
        }
    }
}

/// Plate solver capability.
#[async_trait]
pub trait PlateSolver: Send + Sync {
    /// Solve the most recent image against the expected pointing.
    async fn solve_pointing(&self, expected: &SkyCoordinates) -> DeviceResult<SolveResult>;
}
