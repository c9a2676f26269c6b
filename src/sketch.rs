//! Plain-text frame sketches.
//!
//! A sketch is 9 lines of 24 characters, one per LED:
//!
//! ```text
//! .  off      -  quarter
//! +  mid      #  full
//! ```
//!
//! Cutout positions are drawn as a space and accept either a space or `.` when parsed;
//! a space anywhere else, or a lit pixel in the cutout, is rejected.
//! Lines starting with `;` are comments; blank lines after the last row are ignored.
//! Short rows are padded with off pixels.

use crate::error::{AppResult, GlassesError};
use crate::grid::{Intensity, PixelGrid, GRID_COLS, GRID_ROWS};

fn glyph(intensity: Intensity) -> char {
    match intensity {
        Intensity::Off => '.',
        Intensity::Quarter => '-',
        Intensity::Mid => '+',
        Intensity::Full => '#',
    }
}

fn from_glyph(c: char) -> Option<Intensity> {
    match c {
        '.' => Some(Intensity::Off),
        '-' => Some(Intensity::Quarter),
        '+' => Some(Intensity::Mid),
        '#' => Some(Intensity::Full),
        _ => None,
    }
}

/// Render a grid as a sketch.
pub fn render(grid: &PixelGrid) -> String {
    let mut out = String::with_capacity(GRID_ROWS * (GRID_COLS + 1));
    for row in grid.iter_rows() {
        for cell in row {
            out.push(if cell.is_enabled() {
                glyph(cell.intensity())
            } else {
                ' '
            });
        }
        out.push('\n');
    }
    out
}

/// Parse a sketch into a fresh grid.
pub fn parse(text: &str) -> AppResult<PixelGrid> {
    let mut grid = PixelGrid::new();
    let mut row = 0;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.starts_with(';') {
            continue;
        }
        if row == GRID_ROWS {
            if line.trim().is_empty() {
                continue;
            }
            return Err(GlassesError::InvalidSketch {
                line: line_no,
                reason: format!("more than {} rows", GRID_ROWS),
            });
        }

        let line = line.trim_end_matches('\r');
        if line.chars().count() > GRID_COLS {
            return Err(GlassesError::InvalidSketch {
                line: line_no,
                reason: format!("more than {} columns", GRID_COLS),
            });
        }
        for (col, c) in line.chars().enumerate() {
            let invalid = |reason: String| GlassesError::InvalidSketch {
                line: line_no,
                reason,
            };
            if !grid.is_enabled(row, col)? {
                // Cutout: blank or off only
                if c != ' ' && c != '.' {
                    return Err(invalid(format!(
                        "column {} has no LED, found '{}'",
                        col + 1,
                        c
                    )));
                }
                continue;
            }
            if c == ' ' {
                return Err(invalid(format!(
                    "blank in column {} outside the nose cutout",
                    col + 1
                )));
            }
            let intensity = from_glyph(c)
                .ok_or_else(|| invalid(format!("unknown pixel '{}' in column {}", c, col + 1)))?;
            grid.set_intensity(row, col, intensity)?;
        }
        row += 1;
    }

    if row < GRID_ROWS {
        return Err(GlassesError::InvalidSketch {
            line: text.lines().count() + 1,
            reason: format!("expected {} rows, found {}", GRID_ROWS, row),
        });
    }
    Ok(grid)
}
