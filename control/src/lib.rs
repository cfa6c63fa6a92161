//! Argus: autonomous observatory supervisory controller
//!
//! Once per control cycle the controller polls its mount, camera,
//! weather monitor and target scheduler, freezes the readings into a
//! [`snapshot::ConditionSnapshot`], and dispatches to the handler for the
//! current [`state::ObservatoryState`]. Handlers repair invariant
//! violations clause by clause; any hardware failure funnels through a
//! single park-and-retreat path, and a park that itself fails lands in a
//! terminal alarm state rather than resuming in unsafe conditions.
//!
//! The scheduler's ranking, plate-solving algorithms and concrete device
//! wire protocols are collaborators behind the capability traits in
//! `argus_devices`; this crate contains only the supervisory logic.

pub mod config;
pub mod controller;
pub mod ephemeris;
pub mod handlers;
pub mod heartbeat;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod target;

pub use config::ObservatoryConfig;
pub use controller::{Controller, Devices, StopHandle};
pub use state::ObservatoryState;
pub use target::Target;
