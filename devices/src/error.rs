//! Typed device errors
//!
//! The controller's escalation logic branches on failure kind, so every
//! hardware operation reports a structured error rather than an opaque
//! message.

use thiserror::Error;

/// Errors raised by device commands.
///
/// Status polls (`is_connected`, `is_slewing`, ...) never fail; only
/// commands do. Connection management failures and command failures are
/// distinct variants because the controller treats them differently in
/// its logs, even though both escalate the same way.
#[derive(Error, Debug, Clone)]
pub enum DeviceError {
    #[error("connection to {device} failed: {reason}")]
    ConnectionFailed { device: String, reason: String },

    #[error("{device} did not respond to {command}: {reason}")]
    CommandFailed {
        device: String,
        command: String,
        reason: String,
    },

    #[error("{0} is not connected")]
    NotConnected(String),

    /// Raised by the driver registry at startup, never at runtime dispatch.
    #[error("no driver registered for brand '{0}'")]
    DriverNotFound(String),
}

impl DeviceError {
    pub fn connection(device: &str, reason: impl Into<String>) -> Self {
        DeviceError::ConnectionFailed {
            device: device.to_string(),
            reason: reason.into(),
        }
    }

    pub fn command(device: &str, command: &str, reason: impl Into<String>) -> Self {
        DeviceError::CommandFailed {
            device: device.to_string(),
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;
