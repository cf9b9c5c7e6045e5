//! Change notifications for the rendering layer.
//!
//! The engine delivers one `CellUpdate` per cell whose computed value
//! changed during an edit, the edited cell and spill targets included, and
//! never more than one per cell per edit. The collector mirrors the
//! callback for tests that verify delivery and deduplication.

use crate::formula::eval::Value;
use crate::loc::Coord;

/// One changed cell, delivered after an edit has fully propagated.
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub coord: Coord,
    /// The new computed value
    pub value: Value,
}

/// Callback type for receiving cell updates.
pub type UpdateCallback = Box<dyn FnMut(CellUpdate) + Send>;

/// Simple update collector for testing.
#[derive(Default)]
pub struct UpdateCollector {
    updates: Vec<CellUpdate>,
}

impl UpdateCollector {
    pub fn new() -> Self {
        Self { updates: Vec::new() }
    }

    pub fn push(&mut self, update: CellUpdate) {
        self.updates.push(update);
    }

    pub fn updates(&self) -> &[CellUpdate] {
        &self.updates
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Coords in delivery order.
    pub fn coords(&self) -> Vec<Coord> {
        self.updates.iter().map(|u| u.coord).collect()
    }

    /// Updates delivered for one cell.
    pub fn for_coord(&self, coord: Coord) -> Vec<&CellUpdate> {
        self.updates.iter().filter(|u| u.coord == coord).collect()
    }
}
