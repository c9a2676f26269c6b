//! Frame serialization.
//!
//! Converts a [`PixelGrid`] into the integer matrix the glasses service expects and back.
//! This module owns the intensity/wire-integer mapping; nothing else in the crate should
//! hardcode `0..=3`.

use crate::error::{AppResult, GlassesError};
use crate::grid::{Intensity, PixelGrid, GRID_COLS, GRID_ROWS};
use serde::{Deserialize, Serialize};

/// Row-major matrix of wire integers, `GRID_ROWS` x `GRID_COLS`.
pub type FrameMatrix = Vec<Vec<u8>>;

/// JSON body shared by the encode and display calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload<T> {
    pub glasses_frame: T,
}

/// Output of the encode service.
///
/// Opaque to the client: it is forwarded to display exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedFrame(serde_json::Value);

impl EncodedFrame {
    /// Wrap a raw service value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The value as received from the encode service.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl Intensity {
    /// Wire integer for this intensity.
    pub fn wire(self) -> u8 {
        match self {
            Intensity::Off => 0,
            Intensity::Quarter => 1,
            Intensity::Mid => 2,
            Intensity::Full => 3,
        }
    }

    /// Intensity for a wire integer, if valid.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Intensity::Off),
            1 => Some(Intensity::Quarter),
            2 => Some(Intensity::Mid),
            3 => Some(Intensity::Full),
            _ => None,
        }
    }
}

/// Produce the wire matrix for a grid.
pub fn serialize(grid: &PixelGrid) -> FrameMatrix {
    grid.iter_rows()
        .map(|row| row.iter().map(|cell| cell.intensity().wire()).collect())
        .collect()
}

/// Apply a wire matrix onto a grid.
///
/// The matrix must be exactly `GRID_ROWS` x `GRID_COLS` with values in `0..=3`.
/// Entries at disabled positions are ignored. The grid is only modified when the whole
/// matrix is valid.
pub fn load_matrix(grid: &mut PixelGrid, matrix: &[Vec<u8>]) -> AppResult<()> {
    if matrix.len() != GRID_ROWS {
        return Err(GlassesError::InvalidFrame(format!(
            "expected {} rows, got {}",
            GRID_ROWS,
            matrix.len()
        )));
    }

    let mut decoded = Vec::with_capacity(GRID_ROWS);
    for (row, values) in matrix.iter().enumerate() {
        if values.len() != GRID_COLS {
            return Err(GlassesError::InvalidFrame(format!(
                "row {} has {} columns, expected {}",
                row,
                values.len(),
                GRID_COLS
            )));
        }
        let intensities = values
            .iter()
            .enumerate()
            .map(|(col, &value)| {
                Intensity::from_wire(value).ok_or_else(|| {
                    GlassesError::InvalidFrame(format!(
                        "value {} at ({}, {}) is not a valid intensity",
                        value, row, col
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        decoded.push(intensities);
    }

    for (row, intensities) in decoded.into_iter().enumerate() {
        for (col, intensity) in intensities.into_iter().enumerate() {
            grid.set_intensity(row, col, intensity)?;
        }
    }
    Ok(())
}
