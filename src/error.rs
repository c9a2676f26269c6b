//! Custom error types for the designer.
//!
//! `GlassesError` is the single error type surfaced by the library. It follows the
//! failure taxonomy of the glasses workflow:
//!
//! - **`Discovery`**, **`Connection`**, **`Encoding`**, **`Display`**: a remote call
//!   failed. These variants carry the service's message and display it verbatim, so a
//!   UI can show exactly what the backend reported.
//! - **`NoSelection`** / **`Selection`**: the device directory was used incorrectly
//!   (connect without a selection, or an index outside the discovered list).
//! - **`NotConnected`** / **`AlreadyConnected`**: the session state machine refused a
//!   transition.
//! - **`Busy`**: another remote operation is still in flight. Overlapping requests are
//!   rejected rather than queued.
//! - **`OutOfBounds`**, **`InvalidFrame`**, **`InvalidSketch`**: local input problems.
//! - **`Config`**: configuration could not be loaded or failed validation.
//!
//! No error is fatal. After any failure the state objects are left in their pre-call
//! state and the designer stays usable.

use crate::session::Operation;
use thiserror::Error;

/// Convenience alias for results using the designer error type.
pub type AppResult<T> = std::result::Result<T, GlassesError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlassesError {
    #[error("{0}")]
    Discovery(String),

    #[error("No device selected")]
    NoSelection,

    #[error("Device index {index} is out of range ({len} devices discovered)")]
    Selection { index: usize, len: usize },

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Encoding(String),

    #[error("{0}")]
    Display(String),

    #[error("Not connected to a device")]
    NotConnected,

    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Another operation is in progress: {0}")]
    Busy(Operation),

    #[error("Pixel ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid sketch at line {line}: {reason}")]
    InvalidSketch { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GlassesError {
    /// True when the error came back from the glasses service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            GlassesError::Discovery(_)
                | GlassesError::Connection(_)
                | GlassesError::Encoding(_)
                | GlassesError::Display(_)
        )
    }
}

impl From<figment::Error> for GlassesError {
    fn from(value: figment::Error) -> Self {
        GlassesError::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_messages_are_displayed_verbatim() {
        let err = GlassesError::Display("Please connect to a device first".into());
        assert_eq!(err.to_string(), "Please connect to a device first");

        let err = GlassesError::Encoding("Wrong value in frame".into());
        assert_eq!(err.to_string(), "Wrong value in frame");
    }

    #[test]
    fn test_is_remote() {
        assert!(GlassesError::Connection("x".into()).is_remote());
        assert!(!GlassesError::NoSelection.is_remote());
        assert!(!GlassesError::Busy(Operation::Push).is_remote());
    }

    #[test]
    fn test_busy_names_the_operation() {
        let err = GlassesError::Busy(Operation::Connect);
        assert_eq!(err.to_string(), "Another operation is in progress: connect");
    }
}
