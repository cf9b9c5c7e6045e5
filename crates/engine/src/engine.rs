//! The engine facade: cell store, dependency index, and the edit state
//! machine behind the collaborator interface.
//!
//! The rendering layer pushes raw text in through [`Engine::on_edit`] and
//! receives changed cells through the registered callback. It is a
//! subscriber, never a source of truth: every value a cell shows comes out
//! of this module.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cell::CellConfig;
use crate::dep_graph::DepGraph;
use crate::error::EngineError;
use crate::events::{CellUpdate, UpdateCallback};
use crate::formula::eval::{self, CellOutcome, SpillWrite, Value};
use crate::grid::Grid;
use crate::loc::Coord;
use crate::recalc::EditReport;

/// Extent of the stock grid.
pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 10;

/// A live-formula grid.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    grid: Grid,

    /// Dependency edges and spill relations.
    /// Rebuilt on load, updated incrementally per edit.
    #[serde(skip)]
    graph: DepGraph,

    #[serde(skip)]
    listener: Option<UpdateCallback>,
}

impl Engine {
    /// Create an engine with every cell of the extent present and empty.
    /// Fails on a zero extent.
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        Ok(Self {
            grid: Grid::new(rows, cols)?,
            graph: DepGraph::new(),
            listener: None,
        })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// Get a reference to the cell store.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Get a reference to the dependency graph.
    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    fn coord(&self, location: &str) -> Result<Coord, EngineError> {
        self.grid
            .coord(location)
            .ok_or_else(|| EngineError::InvalidLocation(location.to_string()))
    }

    // =========================================================================
    // Reading cells
    // =========================================================================

    /// Computed value of a cell.
    pub fn get_computed(&self, location: &str) -> Result<Value, EngineError> {
        Ok(self.grid.computed(self.coord(location)?).clone())
    }

    /// Rendering text of a cell: the computed value, formatted.
    pub fn get_display(&self, location: &str) -> Result<String, EngineError> {
        Ok(self.grid.computed(self.coord(location)?).to_display())
    }

    /// Raw text as last edited.
    pub fn get_raw(&self, location: &str) -> Result<&str, EngineError> {
        Ok(self.grid.raw(self.coord(location)?))
    }

    /// Presentation config of a cell.
    pub fn get_config(&self, location: &str) -> Result<CellConfig, EngineError> {
        Ok(self.grid.config(self.coord(location)?).clone())
    }

    /// Cells currently registered as depending on a location, row-major.
    pub fn dependents_of(&self, location: &str) -> Result<Vec<Coord>, EngineError> {
        let coord = self.coord(location)?;
        let mut dependents: Vec<Coord> = self.graph.dependents_of(coord).collect();
        dependents.sort();
        Ok(dependents)
    }

    // =========================================================================
    // Listener
    // =========================================================================

    /// Register the rendering-layer callback. Replaces any previous one.
    pub fn set_listener(&mut self, listener: UpdateCallback) {
        self.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Set presentation config without touching values or edges.
    pub fn set_config(&mut self, location: &str, config: CellConfig) -> Result<(), EngineError> {
        let coord = self.coord(location)?;
        self.grid.set_config(coord, config);
        Ok(())
    }

    /// Apply one raw-text edit and propagate.
    ///
    /// The new text is stored first, so the cell's registered dependents
    /// (and any cells it spilled into) recompute against it. The edited
    /// cell itself is then re-evaluated and its edges rewired; an empty
    /// text clears the cell and its edges instead. Each cell whose
    /// computed value changed is delivered to the listener exactly once,
    /// dependents before the edited cell.
    pub fn on_edit(&mut self, location: &str, raw: &str) -> Result<EditReport, EngineError> {
        let coord = self.coord(location)?;

        self.grid.set_raw(coord, raw);

        let mut updates: Vec<CellUpdate> = Vec::new();
        let mut spill_writes = 0usize;

        // Dependents first. The set is taken before this cell's own edges
        // change, and ordered row-major.
        let mut dependents: Vec<Coord> = self
            .graph
            .dependents_of(coord)
            .chain(self.graph.spill_targets_of(coord).iter().copied())
            .filter(|c| *c != coord)
            .collect();
        dependents.sort();
        dependents.dedup();

        for dep in &dependents {
            let outcome = eval::evaluate_cell(&self.grid, *dep);
            log::trace!("[recalc/{}] after edit of {}", dep, coord);
            spill_writes += self.apply_outcome(*dep, outcome, &mut updates);
        }

        // The edited cell itself.
        if raw.is_empty() {
            self.graph.clear_dependencies(coord);
            self.graph.clear_spill_targets(coord);
            if self.grid.set_computed(coord, Value::Empty) {
                updates.push(CellUpdate {
                    coord,
                    value: Value::Empty,
                });
            }
        } else {
            let outcome = eval::evaluate_cell(&self.grid, coord);
            spill_writes += self.apply_outcome(coord, outcome, &mut updates);
        }

        let updates = dedup_last(updates);
        let report = EditReport {
            location: coord.label(),
            dependents: dependents.len(),
            changed: updates.len(),
            spills: spill_writes,
        };
        log::debug!("{}", report.log_line());

        if let Some(listener) = self.listener.as_mut() {
            for update in updates {
                listener(update);
            }
        }

        Ok(report)
    }

    /// Rebuild edges and spill relations by re-deriving every formula cell
    /// from its raw text.
    ///
    /// Call this after deserializing: the graph is never stored. No
    /// updates are delivered; loading is not an edit.
    pub fn rebuild_graph(&mut self) {
        self.graph = DepGraph::new();
        let mut updates = Vec::new();
        let formulas: Vec<Coord> = self.grid.formula_cells().collect();
        for coord in formulas {
            let outcome = eval::evaluate_cell(&self.grid, coord);
            self.apply_outcome(coord, outcome, &mut updates);
        }
    }

    /// Store one evaluation's results: edges, spill relation and writes,
    /// then the cell's own value. Returns the number of spill writes.
    fn apply_outcome(
        &mut self,
        cell: Coord,
        outcome: CellOutcome,
        updates: &mut Vec<CellUpdate>,
    ) -> usize {
        let CellOutcome { value, refs, spills } = outcome;

        self.graph.set_dependencies(cell, refs);

        // A formula that resolves the same anchor more than once collects
        // that anchor's writes once per resolution; one copy counts.
        let mut seen = FxHashSet::default();
        let spills: Vec<SpillWrite> = spills
            .into_iter()
            .filter(|s| seen.insert((s.anchor, s.target)))
            .collect();

        // Each touched anchor's spill relation is replaced wholesale. An
        // evaluation of this cell that spilled nothing drops its own,
        // except on error: the last block stays recorded until a later
        // edit of the anchor refreshes or clears it.
        let mut anchors: Vec<Coord> = spills.iter().map(|s| s.anchor).collect();
        anchors.sort();
        anchors.dedup();
        if !anchors.contains(&cell) && !value.is_error() {
            self.graph.clear_spill_targets(cell);
        }
        for anchor in anchors {
            let targets: Vec<Coord> = spills
                .iter()
                .filter(|s| s.anchor == anchor)
                .map(|s| s.target)
                .collect();
            self.graph.set_spill_targets(anchor, targets);
        }

        let spill_count = spills.len();
        for spill in spills {
            if self.grid.set_computed(spill.target, spill.value.clone()) {
                updates.push(CellUpdate {
                    coord: spill.target,
                    value: spill.value,
                });
            }
        }

        if self.grid.set_computed(cell, value.clone()) {
            updates.push(CellUpdate { coord: cell, value });
        }

        spill_count
    }
}

/// Keep the last update per cell, preserving the order of the kept ones.
fn dedup_last(updates: Vec<CellUpdate>) -> Vec<CellUpdate> {
    let mut seen = FxHashSet::default();
    let mut kept: Vec<CellUpdate> = Vec::with_capacity(updates.len());
    for update in updates.into_iter().rev() {
        if seen.insert(update.coord) {
            kept.push(update);
        }
    }
    kept.reverse();
    kept
}
