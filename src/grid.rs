//! Pixel canvas for the glasses' LED matrix.
//!
//! The glasses carry a fixed 9x24 matrix. A handful of positions around the nose bridge
//! have no LED at all; these form the [`CUTOUT`] and are modelled as disabled cells whose
//! intensity is pinned to [`Intensity::Off`] for the lifetime of the grid.
//!
//! Editing is binary: [`PixelGrid::toggle`] switches a cell between `Off` and whatever
//! intensity the [`PaintBrush`] currently holds. Direct writes go through
//! [`PixelGrid::set_intensity`].

use crate::error::{AppResult, GlassesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of LED rows on the glasses.
pub const GRID_ROWS: usize = 9;

/// Number of LED columns on the glasses.
pub const GRID_COLS: usize = 24;

/// Positions with no physical LED (nose bridge gap), as `(row, col)`.
pub const CUTOUT: [(usize, usize); 6] = [(7, 11), (7, 12), (8, 10), (8, 11), (8, 12), (8, 13)];

/// Brightness of a single LED.
///
/// Ordered `Off < Quarter < Mid < Full`. The wire encoding lives in [`crate::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[default]
    Off,
    Quarter,
    Mid,
    Full,
}

impl Intensity {
    /// All intensities in ascending order.
    pub const ALL: [Intensity; 4] = [
        Intensity::Off,
        Intensity::Quarter,
        Intensity::Mid,
        Intensity::Full,
    ];

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Intensity::Off => "off",
            Intensity::Quarter => "quarter",
            Intensity::Mid => "mid",
            Intensity::Full => "full",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if let Some(intensity) = Intensity::ALL.into_iter().find(|i| i.name() == name) {
            return Ok(intensity);
        }
        // Numeric levels go through the wire mapping
        name.parse::<u8>()
            .ok()
            .and_then(Intensity::from_wire)
            .ok_or_else(|| {
                format!(
                    "Invalid intensity '{}'. Must be one of: off, quarter, mid, full",
                    name
                )
            })
    }
}

/// One LED position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelCell {
    intensity: Intensity,
    enabled: bool,
}

impl PixelCell {
    fn new() -> Self {
        Self {
            intensity: Intensity::Off,
            enabled: true,
        }
    }

    /// Current brightness. Always `Off` for disabled cells.
    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// False for positions without an LED.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// The intensity applied by [`PixelGrid::toggle`].
///
/// Changing the brush never touches existing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintBrush {
    intensity: Intensity,
}

impl PaintBrush {
    /// Create a brush loaded with the given intensity.
    pub fn new(intensity: Intensity) -> Self {
        Self { intensity }
    }

    /// Intensity the next toggle will paint with.
    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Select the intensity used by future toggles.
    pub fn set(&mut self, intensity: Intensity) {
        self.intensity = intensity;
    }
}

impl Default for PaintBrush {
    fn default() -> Self {
        Self::new(Intensity::Full)
    }
}

/// Fixed-size LED canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    cells: Vec<Vec<PixelCell>>,
}

impl PixelGrid {
    /// Create an all-off grid with the [`CUTOUT`] disabled.
    pub fn new() -> Self {
        let mut grid = Self {
            cells: vec![vec![PixelCell::new(); GRID_COLS]; GRID_ROWS],
        };
        grid.disable_region(&CUTOUT);
        grid
    }

    /// Number of rows (always [`GRID_ROWS`]).
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Number of columns (always [`GRID_COLS`]).
    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Look up a cell.
    pub fn cell(&self, row: usize, col: usize) -> AppResult<PixelCell> {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// Brightness at a position.
    pub fn intensity(&self, row: usize, col: usize) -> AppResult<Intensity> {
        self.cell(row, col).map(|c| c.intensity)
    }

    /// Whether a position has an LED.
    pub fn is_enabled(&self, row: usize, col: usize) -> AppResult<bool> {
        self.cell(row, col).map(|c| c.enabled)
    }

    /// Flip a cell between `Off` and the brush intensity.
    ///
    /// Disabled cells are left untouched. Returns the cell's new intensity.
    pub fn toggle(&mut self, row: usize, col: usize, brush: &PaintBrush) -> AppResult<Intensity> {
        let cell = self.cell_mut(row, col)?;
        if cell.enabled {
            cell.intensity = if cell.intensity == Intensity::Off {
                brush.intensity()
            } else {
                Intensity::Off
            };
        }
        Ok(cell.intensity)
    }

    /// Write a cell directly. No-op on disabled cells.
    pub fn set_intensity(&mut self, row: usize, col: usize, intensity: Intensity) -> AppResult<()> {
        let cell = self.cell_mut(row, col)?;
        if cell.enabled {
            cell.intensity = intensity;
        }
        Ok(())
    }

    /// Turn every enabled cell off. Idempotent.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            if cell.enabled {
                cell.intensity = Intensity::Off;
            }
        }
    }

    /// Mark positions as having no LED and force them off.
    ///
    /// Coordinates outside the grid are skipped.
    pub fn disable_region(&mut self, coords: &[(usize, usize)]) {
        for &(row, col) in coords {
            if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
                cell.enabled = false;
                cell.intensity = Intensity::Off;
            }
        }
    }

    /// Number of cells that are not off.
    pub fn lit_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.intensity != Intensity::Off)
            .count()
    }

    /// Iterate rows of cells, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[PixelCell]> {
        self.cells.iter().map(Vec::as_slice)
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> AppResult<&mut PixelCell> {
        let err = self.out_of_bounds(row, col);
        self.cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(err)
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> GlassesError {
        GlassesError::OutOfBounds {
            row,
            col,
            rows: GRID_ROWS,
            cols: GRID_COLS,
        }
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_dimensions_and_cutout() {
        let grid = PixelGrid::new();
        assert_eq!(grid.rows(), GRID_ROWS);
        assert_eq!(grid.cols(), GRID_COLS);
        assert_eq!(grid.lit_count(), 0);

        for &(row, col) in &CUTOUT {
            assert!(!grid.is_enabled(row, col).unwrap());
        }
        assert!(grid.is_enabled(0, 0).unwrap());
        assert!(grid.is_enabled(7, 10).unwrap());
    }

    #[test]
    fn test_toggle_uses_brush_then_turns_off() {
        let mut grid = PixelGrid::new();
        let brush = PaintBrush::new(Intensity::Mid);

        assert_eq!(grid.toggle(2, 3, &brush).unwrap(), Intensity::Mid);
        assert_eq!(grid.toggle(2, 3, &brush).unwrap(), Intensity::Off);
    }

    #[test]
    fn test_toggle_lit_cell_turns_off_regardless_of_brush() {
        let mut grid = PixelGrid::new();
        grid.set_intensity(1, 1, Intensity::Quarter).unwrap();

        let brush = PaintBrush::new(Intensity::Full);
        assert_eq!(grid.toggle(1, 1, &brush).unwrap(), Intensity::Off);
    }

    #[test]
    fn test_brush_change_does_not_touch_existing_cells() {
        let mut grid = PixelGrid::new();
        let mut brush = PaintBrush::default();
        assert_eq!(brush.intensity(), Intensity::Full);

        grid.toggle(0, 0, &brush).unwrap();
        brush.set(Intensity::Quarter);
        grid.toggle(0, 1, &brush).unwrap();

        assert_eq!(grid.intensity(0, 0).unwrap(), Intensity::Full);
        assert_eq!(grid.intensity(0, 1).unwrap(), Intensity::Quarter);
    }

    #[test]
    fn test_disabled_cells_ignore_edits() {
        let mut grid = PixelGrid::new();
        let brush = PaintBrush::default();

        assert_eq!(grid.toggle(8, 11, &brush).unwrap(), Intensity::Off);
        grid.set_intensity(7, 12, Intensity::Full).unwrap();
        assert_eq!(grid.intensity(7, 12).unwrap(), Intensity::Off);
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let mut grid = PixelGrid::new();
        let brush = PaintBrush::default();

        assert!(matches!(
            grid.toggle(GRID_ROWS, 0, &brush),
            Err(GlassesError::OutOfBounds { row: 9, col: 0, .. })
        ));
        assert!(grid.set_intensity(0, GRID_COLS, Intensity::Full).is_err());
        assert!(grid.cell(100, 100).is_err());
    }

    #[test]
    fn test_clear_is_idempotent_and_keeps_cutout() {
        let mut grid = PixelGrid::new();
        grid.set_intensity(0, 0, Intensity::Full).unwrap();
        grid.set_intensity(8, 23, Intensity::Mid).unwrap();

        grid.clear();
        let once = grid.clone();
        grid.clear();

        assert_eq!(grid, once);
        assert_eq!(grid.lit_count(), 0);
        assert!(!grid.is_enabled(8, 10).unwrap());
    }

    #[test]
    fn test_disable_region_forces_off() {
        let mut grid = PixelGrid::new();
        grid.set_intensity(3, 3, Intensity::Full).unwrap();
        grid.disable_region(&[(3, 3), (40, 40)]);

        assert_eq!(grid.intensity(3, 3).unwrap(), Intensity::Off);
        assert!(!grid.is_enabled(3, 3).unwrap());
    }

    #[test]
    fn test_intensity_parsing() {
        assert_eq!("FULL".parse::<Intensity>().unwrap(), Intensity::Full);
        assert_eq!("quarter".parse::<Intensity>().unwrap(), Intensity::Quarter);
        assert_eq!("2".parse::<Intensity>().unwrap(), Intensity::Mid);
        assert!("bright".parse::<Intensity>().is_err());
        assert!("4".parse::<Intensity>().is_err());
        for intensity in Intensity::ALL {
            assert_eq!(intensity.wire().to_string().parse::<Intensity>(), Ok(intensity));
        }
        assert!(Intensity::Off < Intensity::Quarter);
        assert!(Intensity::Mid < Intensity::Full);
    }
}
