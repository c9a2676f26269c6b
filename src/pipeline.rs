//! Encode-then-display pipeline.
//!
//! Pushing a frame takes two remote calls. The display call is only issued after encode
//! has returned successfully, and it receives encode's output untouched, never the raw
//! matrix. An encode failure ends the push before anything reaches the glasses. A
//! display failure does not undo the encode; encoding has no effect on the device.

use crate::error::{AppResult, GlassesError};
use crate::frame::{self, EncodedFrame};
use crate::grid::PixelGrid;
use crate::service::GlassesService;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sends frames through the service's encode and display calls.
#[derive(Clone)]
pub struct DisplayPipeline {
    service: Arc<dyn GlassesService>,
}

impl DisplayPipeline {
    /// Pipeline backed by `service`.
    pub fn new(service: Arc<dyn GlassesService>) -> Self {
        Self { service }
    }

    /// Serialize `grid`, encode it, and display the encoded frame.
    ///
    /// Returns the encoded frame that was displayed.
    #[instrument(skip_all, fields(lit = grid.lit_count()))]
    pub async fn push(&self, grid: &PixelGrid) -> AppResult<EncodedFrame> {
        let matrix = frame::serialize(grid);

        debug!("Encoding frame");
        let encoded = self.service.encode(&matrix).await.map_err(|e| {
            warn!(error = %e, "Encode failed, frame not displayed");
            GlassesError::Encoding(e.message)
        })?;

        debug!("Displaying encoded frame");
        self.service.display(&encoded).await.map_err(|e| {
            warn!(error = %e, "Display failed");
            GlassesError::Display(e.message)
        })?;

        info!("Frame displayed");
        Ok(encoded)
    }
}
