//! The designer: canvas, devices and session behind one handle.
//!
//! [`Designer`] owns the state objects and exposes every command a front end needs.
//! Grid commands are synchronous. Remote commands are async and go through the
//! [`OperationGate`], so at most one of discover/connect/disconnect/push runs at a time;
//! overlapping requests fail fast with [`GlassesError::Busy`].
//!
//! The state mutex is only ever held for short synchronous sections, never across an
//! await, so grid editing stays responsive while a push is in flight. A push sends the
//! grid as it was when the push started.
//!
//! `Designer` is cheap to clone; clones share the same state.

use crate::directory::{Device, DeviceDirectory};
use crate::error::{AppResult, GlassesError};
use crate::frame::{self, EncodedFrame, FrameMatrix};
use crate::grid::{Intensity, PaintBrush, PixelGrid, CUTOUT};
use crate::pipeline::DisplayPipeline;
use crate::service::GlassesService;
use crate::session::{ConnectionSession, Operation, OperationGate, SessionState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// State owned by a [`Designer`].
#[derive(Debug, Clone, Default)]
struct DesignerState {
    grid: PixelGrid,
    brush: PaintBrush,
    directory: DeviceDirectory,
    session: ConnectionSession,
}

/// Shared handle to the designer state and the glasses service.
#[derive(Clone)]
pub struct Designer {
    service: Arc<dyn GlassesService>,
    pipeline: DisplayPipeline,
    state: Arc<Mutex<DesignerState>>,
    gate: OperationGate,
}

impl Designer {
    /// Designer talking to `service`, with a blank grid and a full-intensity brush.
    pub fn new(service: Arc<dyn GlassesService>) -> Self {
        info!(service = %service.describe(), "Creating designer");
        Self {
            pipeline: DisplayPipeline::new(Arc::clone(&service)),
            service,
            state: Arc::new(Mutex::new(DesignerState::default())),
            gate: OperationGate::new(),
        }
    }

    /// Start with a different brush intensity.
    pub fn with_brush(self, intensity: Intensity) -> Self {
        self.lock().brush.set(intensity);
        self
    }

    fn lock(&self) -> MutexGuard<'_, DesignerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // Canvas
    // ---------------------------------------------------------------------

    /// Toggle a pixel with the current brush. Returns its new intensity.
    pub fn toggle(&self, row: usize, col: usize) -> AppResult<Intensity> {
        let mut state = self.lock();
        let brush = state.brush;
        state.grid.toggle(row, col, &brush)
    }

    /// Set a pixel directly.
    pub fn set_intensity(&self, row: usize, col: usize, intensity: Intensity) -> AppResult<()> {
        self.lock().grid.set_intensity(row, col, intensity)
    }

    /// Select the intensity used by future toggles.
    pub fn set_brush(&self, intensity: Intensity) {
        debug!(%intensity, "Brush changed");
        self.lock().brush.set(intensity);
    }

    /// Current brush intensity.
    pub fn brush(&self) -> Intensity {
        self.lock().brush.intensity()
    }

    /// Blank the canvas and restore the nose cutout.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.grid.clear();
        state.grid.disable_region(&CUTOUT);
    }

    /// Replace the canvas contents with a wire matrix.
    pub fn load_matrix(&self, matrix: &[Vec<u8>]) -> AppResult<()> {
        let mut state = self.lock();
        let mut grid = state.grid.clone();
        grid.clear();
        frame::load_matrix(&mut grid, matrix)?;
        state.grid = grid;
        Ok(())
    }

    /// Replace the canvas with `grid`, keeping the cutout disabled.
    pub fn replace_grid(&self, mut grid: PixelGrid) {
        grid.disable_region(&CUTOUT);
        self.lock().grid = grid;
    }

    /// Copy of the current canvas.
    pub fn grid(&self) -> PixelGrid {
        self.lock().grid.clone()
    }

    /// Wire matrix for the current canvas.
    pub fn matrix(&self) -> FrameMatrix {
        frame::serialize(&self.lock().grid)
    }

    // ---------------------------------------------------------------------
    // Devices and session
    // ---------------------------------------------------------------------

    /// Devices from the last discovery.
    pub fn devices(&self) -> Vec<Device> {
        self.lock().directory.devices().to_vec()
    }

    /// Select a discovered device for the next connect.
    pub fn select(&self, index: usize) -> AppResult<Device> {
        let mut state = self.lock();
        let device = state.directory.select(index)?.clone();
        info!(index, device = %device, "Device selected");
        Ok(device)
    }

    /// Currently selected device.
    pub fn selected(&self) -> Option<Device> {
        self.lock().directory.selected().cloned()
    }

    /// Connection state.
    pub fn session_state(&self) -> SessionState {
        self.lock().session.state()
    }

    /// Device the session is connected to.
    pub fn connected_device(&self) -> Option<Device> {
        self.lock().session.device().cloned()
    }

    /// Remote operation currently in flight.
    pub fn active_operation(&self) -> Option<Operation> {
        self.gate.active()
    }

    /// One-line status for display.
    pub fn status(&self) -> String {
        let state = self.lock();
        let connection = match state.session.device() {
            Some(device) if state.session.is_connected() => format!("Connected to {}", device.name),
            _ => "Not connected".to_string(),
        };
        let selection = match state.directory.selected() {
            Some(device) => format!("selected {}", device),
            None => "no device selected".to_string(),
        };
        format!(
            "{}; {} of {} discovered; brush {}; {} lit",
            connection,
            selection,
            state.directory.devices().len(),
            state.brush.intensity(),
            state.grid.lit_count()
        )
    }

    /// Scan for devices, replacing the list and clearing the selection.
    ///
    /// The old list and selection are dropped before the scan starts; on failure the
    /// directory stays empty.
    pub async fn discover(&self) -> AppResult<Vec<Device>> {
        let _permit = self.gate.try_begin(Operation::Discover)?;
        self.discover_unguarded().await
    }

    async fn discover_unguarded(&self) -> AppResult<Vec<Device>> {
        self.lock().directory.reset();

        let devices = self.service.discover().await.map_err(|e| {
            error!(error = %e, "Discovery failed");
            GlassesError::Discovery(e.message)
        })?;

        info!(count = devices.len(), "Discovered devices");
        self.lock().directory.install(devices.clone());
        Ok(devices)
    }

    /// Connect to the selected device.
    ///
    /// Requires a selection and a disconnected session. On failure the session stays
    /// disconnected.
    pub async fn connect(&self) -> AppResult<Device> {
        let _permit = self.gate.try_begin(Operation::Connect)?;

        let device = {
            let state = self.lock();
            state.session.begin_connect(&state.directory)?
        };

        info!(device = %device, "Connecting");
        self.service.connect(&device).await.map_err(|e| {
            error!(device = %device, error = %e, "Connection failed");
            GlassesError::Connection(e.message)
        })?;

        self.lock().session.complete_connect(device.clone());
        info!(device = %device, "Connected");
        Ok(device)
    }

    /// Disconnect, clear the selection and rediscover devices.
    ///
    /// A no-op when already disconnected. If the disconnect succeeds but the follow-up
    /// discovery fails, the session is disconnected and the discovery error is returned.
    pub async fn disconnect(&self) -> AppResult<()> {
        let _permit = self.gate.try_begin(Operation::Disconnect)?;

        if !self.lock().session.is_connected() {
            debug!("Disconnect requested while disconnected, nothing to do");
            return Ok(());
        }

        info!("Disconnecting");
        self.service.disconnect().await.map_err(|e| {
            error!(error = %e, "Disconnect failed");
            GlassesError::Connection(e.message)
        })?;

        {
            let mut state = self.lock();
            state.session.complete_disconnect();
            state.directory.clear_selection();
        }
        info!("Disconnected");

        self.discover_unguarded().await?;
        Ok(())
    }

    /// Encode and display the current canvas on the connected glasses.
    pub async fn push(&self) -> AppResult<EncodedFrame> {
        let _permit = self.gate.try_begin(Operation::Push)?;

        let grid = {
            let state = self.lock();
            state.session.require_connected()?;
            state.grid.clone()
        };

        self.pipeline.push(&grid).await.map_err(|e| {
            warn!(error = %e, "Push failed");
            e
        })
    }
}
