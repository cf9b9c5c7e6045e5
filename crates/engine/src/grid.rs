//! The cell store: a dense, fixed-extent 2-D array of cell records.
//!
//! Every cell in the configured extent exists from construction with empty
//! raw text; edits and recomputations mutate records in place. The extent
//! never changes after construction.
//!
//! Invariants:
//! - `cells.len() == rows * cols`, always.
//! - Accessors take coordinates already inside the extent; callers gate on
//!   `contains` first.

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellConfig};
use crate::error::EngineError;
use crate::formula::eval::Value;
use crate::loc::Coord;

/// Dense cell store addressed by [`Coord`] or by location label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid with every cell initialized to cleared.
    ///
    /// Fails on a zero row or column count; no cell addressing would be
    /// possible afterwards.
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::InvalidExtent { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether a coordinate falls inside the extent.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Parse a location label and keep it only if it addresses this grid.
    pub fn coord(&self, label: &str) -> Option<Coord> {
        Coord::parse(label).filter(|c| self.contains(*c))
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    pub fn raw(&self, coord: Coord) -> &str {
        &self.cell(coord).raw
    }

    pub fn computed(&self, coord: Coord) -> &Value {
        &self.cell(coord).computed
    }

    pub fn config(&self, coord: Coord) -> &CellConfig {
        &self.cell(coord).config
    }

    /// Store raw input text verbatim. Emptiness means exactly `""`.
    pub fn set_raw(&mut self, coord: Coord, raw: &str) {
        let idx = self.index(coord);
        self.cells[idx].raw = raw.to_string();
    }

    /// Store a computed value; returns whether it differs from the old one.
    pub fn set_computed(&mut self, coord: Coord, value: Value) -> bool {
        let idx = self.index(coord);
        if self.cells[idx].computed == value {
            return false;
        }
        self.cells[idx].computed = value;
        true
    }

    pub fn set_config(&mut self, coord: Coord, config: CellConfig) {
        let idx = self.index(coord);
        self.cells[idx].config = config;
    }

    /// Coordinates of every cell holding a formula, row-major.
    pub fn formula_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            if cell.is_formula() {
                Some(Coord::new(i / self.cols, i % self.cols))
            } else {
                None
            }
        })
    }
}
