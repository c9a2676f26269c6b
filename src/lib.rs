//! # Chemion Designer
//!
//! Client library for designing frames for Chemion LED glasses and pushing them to the
//! glasses through the glasses backend service.
//!
//! ## Crate Structure
//!
//! - **`grid`**: The 9x24 pixel canvas, the nose cutout, intensities and the paint brush.
//! - **`frame`**: Serialization of the canvas into the backend's integer matrix, and the
//!   opaque encoded frame type.
//! - **`directory`**: Discovered devices and the operator's selection.
//! - **`session`**: Connection state machine and the gate that rejects overlapping
//!   remote operations.
//! - **`pipeline`**: The encode-then-display sequence for pushing a frame.
//! - **`service`**: The `GlassesService` trait with HTTP and mock implementations.
//! - **`designer`**: `Designer`, the shared handle a front end drives.
//! - **`sketch`**: Plain-text frame notation.
//! - **`shell`**: Command parser and dispatcher for the interactive shell.
//! - **`config`**: Layered configuration (defaults, TOML file, environment).
//! - **`logging`**: `tracing` subscriber setup.
//! - **`error`**: The `GlassesError` type.

pub mod config;
pub mod designer;
pub mod directory;
pub mod error;
pub mod frame;
pub mod grid;
pub mod logging;
pub mod pipeline;
pub mod service;
pub mod session;
pub mod shell;
pub mod sketch;

pub use designer::Designer;
pub use error::{AppResult, GlassesError};
pub use grid::{Intensity, PixelGrid};
