//! Glasses service interface.
//!
//! The backend that talks BLE to the glasses is reached through [`GlassesService`]. The
//! designer never sees HTTP or BLE details, only these five calls:
//!
//! | Call | Success | Failure |
//! |------|---------|---------|
//! | `discover` | named peripherals in range | [`ServiceError`] |
//! | `connect` | ack | [`ServiceError`] |
//! | `disconnect` | ack | [`ServiceError`] |
//! | `encode` | [`EncodedFrame`] | [`ServiceError`] |
//! | `display` | ack | [`ServiceError`] |
//!
//! Implementations:
//! - [`HttpGlassesService`] - the JSON/HTTP backend
//! - [`MockGlassesService`] - in-process stand-in for tests and offline design work

use crate::directory::Device;
use crate::frame::{EncodedFrame, FrameMatrix};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub use http::HttpGlassesService;

pub mod mock;
pub use mock::MockGlassesService;

/// Failure reported by the glasses service.
///
/// Mirrors the backend's `{"message": ...}` error body.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    /// Build an error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote calls offered by the glasses backend.
#[async_trait]
pub trait GlassesService: Send + Sync {
    /// Scan for named BLE peripherals.
    async fn discover(&self) -> Result<Vec<Device>, ServiceError>;

    /// Connect the backend to `device`.
    async fn connect(&self, device: &Device) -> Result<(), ServiceError>;

    /// Drop the backend's current connection.
    async fn disconnect(&self) -> Result<(), ServiceError>;

    /// Turn a wire matrix into the device command representation.
    async fn encode(&self, matrix: &FrameMatrix) -> Result<EncodedFrame, ServiceError>;

    /// Show an encoded frame on the connected glasses.
    async fn display(&self, frame: &EncodedFrame) -> Result<(), ServiceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
