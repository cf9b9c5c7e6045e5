//! Test harness for engine edits with update tracking.
//!
//! This module provides `EngineHarness`, a wrapper around `Engine` that
//! registers a listener and records every `CellUpdate` it delivers, so
//! tests can assert on delivery order and content without a rendering
//! layer attached.

use std::sync::{Arc, Mutex};

use crate::engine::{Engine, DEFAULT_COLS, DEFAULT_ROWS};
use crate::events::{CellUpdate, UpdateCollector};
use crate::formula::eval::Value;
use crate::loc::Coord;
use crate::recalc::EditReport;

/// Engine wrapper that collects delivered updates.
pub struct EngineHarness {
    engine: Engine,
    updates: Arc<Mutex<UpdateCollector>>,
}

impl EngineHarness {
    /// Create a harness around a fresh engine of the given extent.
    ///
    /// Panics on a zero extent; constructor failures are tested against
    /// `Engine::new` directly.
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut engine = Engine::new(rows, cols).unwrap();
        let updates = Arc::new(Mutex::new(UpdateCollector::new()));
        let sink = Arc::clone(&updates);
        engine.set_listener(Box::new(move |update| {
            sink.lock().unwrap().push(update);
        }));
        Self { engine, updates }
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Apply an edit, panicking on an invalid location.
    pub fn edit(&mut self, location: &str, raw: &str) -> EditReport {
        self.engine.on_edit(location, raw).unwrap()
    }

    /// Display text of a cell.
    pub fn display(&self, location: &str) -> String {
        self.engine.get_display(location).unwrap()
    }

    /// Computed value of a cell.
    pub fn computed(&self, location: &str) -> Value {
        self.engine.get_computed(location).unwrap()
    }

    /// Snapshot of the collected updates, in delivery order.
    pub fn updates(&self) -> Vec<CellUpdate> {
        self.updates.lock().unwrap().updates().to_vec()
    }

    /// Coordinates of the collected updates, in delivery order.
    pub fn update_coords(&self) -> Vec<Coord> {
        self.updates.lock().unwrap().coords()
    }

    /// Drop all collected updates.
    pub fn clear_updates(&self) {
        self.updates.lock().unwrap().clear();
    }
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(label: &str) -> Coord {
        Coord::parse(label).unwrap()
    }

    #[test]
    fn test_harness_collects_updates_in_delivery_order() {
        let mut h = EngineHarness::new(10, 10);
        h.edit("A1", "1");
        h.edit("B1", "=A1+1");
        h.edit("A1", "5");

        // The last edit recomputes the dependent first
        let coords = h.update_coords();
        assert_eq!(coords, vec![c("A1"), c("B1"), c("B1"), c("A1")]);
    }

    #[test]
    fn test_harness_update_values() {
        let mut h = EngineHarness::new(10, 10);
        h.edit("A1", "2");
        let updates = h.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].value, Value::Number(2.0));
    }

    #[test]
    fn test_harness_clear_updates() {
        let mut h = EngineHarness::new(10, 10);
        h.edit("A1", "1");
        assert!(!h.update_coords().is_empty());
        h.clear_updates();
        assert!(h.update_coords().is_empty());
    }
}
