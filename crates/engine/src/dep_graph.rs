//! Dependency graph for formula cells.
//!
//! Tracks, for every cell with at least one outgoing reference, the ordered
//! list of cells it reads, plus the reverse index answering "who depends on
//! X". The spill relation (cells an `ARRAY` anchor last wrote) lives here
//! too, since edits to the anchor propagate through it the same way.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B reads A"  (B is a dependent of A)
//! ```
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** r ∈ refs[B] iff B ∈ dependents[r].
//! 2. **No empty entries:** a cell with zero references has no edge at all;
//!    same for spill sets.
//! 3. **Wholesale replacement:** `set_dependencies` is the only mutator that
//!    touches both maps; reference sets are replaced, never merged.
//! 4. **Order preserved:** forward reference lists keep discovery order and
//!    carry no duplicates (callers de-duplicate).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::loc::Coord;

/// Dependency edges plus the spill relation, with O(1) dependent lookups.
#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// Forward: for each dependent cell B, the ordered cells it reads.
    refs: FxHashMap<Coord, Vec<Coord>>,

    /// Reverse: for each referenced cell A, the cells that read it.
    dependents: FxHashMap<Coord, FxHashSet<Coord>>,

    /// Spill relation: for each `ARRAY` anchor, the cells it last wrote.
    spills: FxHashMap<Coord, Vec<Coord>>,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered references of a cell; empty if it has no edge.
    pub fn references(&self, cell: Coord) -> &[Coord] {
        self.refs.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every cell whose reference set contains `cell`.
    ///
    /// Always reflects the most recent `set_dependencies`/`clear_dependencies`
    /// call; nothing is cached.
    pub fn dependents_of(&self, cell: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True if the cell currently has an outgoing reference set.
    pub fn has_dependencies(&self, cell: Coord) -> bool {
        self.refs.contains_key(&cell)
    }

    /// Number of cells with at least one outgoing reference.
    pub fn dependent_count(&self) -> usize {
        self.refs.len()
    }

    /// Number of cells referenced by at least one formula.
    pub fn referenced_count(&self) -> usize {
        self.dependents.len()
    }

    /// Replace a cell's full reference set in one step.
    ///
    /// Removing the old edge and inserting the new one happen together, so
    /// queries never observe a half-updated state. An unchanged list (same
    /// references, same order) is a no-op. An empty list deletes the edge.
    pub fn set_dependencies(&mut self, dependent: Coord, referenced: Vec<Coord>) {
        if self.references(dependent) == referenced.as_slice() {
            return;
        }

        if let Some(old) = self.refs.remove(&dependent) {
            for r in old {
                if let Some(deps) = self.dependents.get_mut(&r) {
                    deps.remove(&dependent);
                    if deps.is_empty() {
                        self.dependents.remove(&r);
                    }
                }
            }
        }

        if referenced.is_empty() {
            return;
        }

        for r in &referenced {
            self.dependents.entry(*r).or_default().insert(dependent);
        }
        self.refs.insert(dependent, referenced);
    }

    /// Remove a cell's edge entirely; no-op if it has none.
    pub fn clear_dependencies(&mut self, dependent: Coord) {
        self.set_dependencies(dependent, Vec::new());
    }

    /// The cells an anchor's `ARRAY` call last spilled into.
    pub fn spill_targets_of(&self, anchor: Coord) -> &[Coord] {
        self.spills.get(&anchor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace an anchor's spill set wholesale. Empty clears it.
    pub fn set_spill_targets(&mut self, anchor: Coord, targets: Vec<Coord>) {
        if targets.is_empty() {
            self.spills.remove(&anchor);
        } else {
            self.spills.insert(anchor, targets);
        }
    }

    /// Remove an anchor's spill set; no-op if it has none.
    pub fn clear_spill_targets(&mut self, anchor: Coord) {
        self.spills.remove(&anchor);
    }

    /// Verify invariants 1 and 2 hold in both directions.
    #[cfg(test)]
    fn assert_consistent(&self) {
        for (dependent, referenced) in &self.refs {
            assert!(!referenced.is_empty(), "empty edge stored for {dependent}");
            for r in referenced {
                assert!(
                    self.dependents[r].contains(dependent),
                    "missing reverse edge {r} -> {dependent}"
                );
            }
        }
        for (referenced, deps) in &self.dependents {
            assert!(!deps.is_empty(), "empty dependent set stored for {referenced}");
            for d in deps {
                assert!(
                    self.refs[d].contains(referenced),
                    "missing forward edge {d} -> {referenced}"
                );
            }
        }
        for (anchor, targets) in &self.spills {
            assert!(!targets.is_empty(), "empty spill set stored for {anchor}");
        }
    }
}
