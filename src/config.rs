//! Tunable geometry and animation speeds for the tape and the delta sheet.

use serde::{Deserialize, Serialize};

/// Width of one tape cell, in display units.
pub const CELL_SIZE: f32 = 40.0;
/// Distance the tape slides per frame.
pub const TAPE_SPEED: f32 = 5.0;
/// Height of one sheet row, in display units.
pub const ROW_HEIGHT: f32 = 36.0;
/// Distance the sheet scrolls per frame.
pub const SHEET_SPEED: f32 = 4.0;
/// How close the head may get to the last materialized cell before the tape grows.
pub const LOOKAHEAD: i64 = 5;
/// Number of cells materialized on each side of the origin at startup.
pub const INITIAL_EXTENT: i64 = 5;
/// Upper bound for `lookahead` and `initial_extent`.
pub const MAX_EXTENT: i64 = 4096;

/// Configuration shared by the tape and the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub cell_size: f32,
    pub tape_speed: f32,
    pub row_height: f32,
    pub sheet_speed: f32,
    pub lookahead: i64,
    pub initial_extent: i64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            tape_speed: TAPE_SPEED,
            row_height: ROW_HEIGHT,
            sheet_speed: SHEET_SPEED,
            lookahead: LOOKAHEAD,
            initial_extent: INITIAL_EXTENT,
        }
    }
}

impl MachineConfig {
    /// Returns a copy with the given tape speed. Speeds that are not finite and positive are
    /// ignored.
    pub fn with_tape_speed(mut self, speed: f32) -> Self {
        self.tape_speed = positive_or(speed, self.tape_speed);
        self
    }

    /// Returns a copy with the given sheet speed. Speeds that are not finite and positive are
    /// ignored.
    pub fn with_sheet_speed(mut self, speed: f32) -> Self {
        self.sheet_speed = positive_or(speed, self.sheet_speed);
        self
    }

    /// Returns a copy the tape and the sheet can run with.
    ///
    /// Sizes and speeds that are not finite and positive fall back to their defaults, so every
    /// slide comes to rest. Cell counts are clamped to `0..=MAX_EXTENT`.
    pub fn sanitized(self) -> Self {
        Self {
            cell_size: positive_or(self.cell_size, CELL_SIZE),
            tape_speed: positive_or(self.tape_speed, TAPE_SPEED),
            row_height: positive_or(self.row_height, ROW_HEIGHT),
            sheet_speed: positive_or(self.sheet_speed, SHEET_SPEED),
            lookahead: self.lookahead.clamp(0, MAX_EXTENT),
            initial_extent: self.initial_extent.clamp(0, MAX_EXTENT),
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
