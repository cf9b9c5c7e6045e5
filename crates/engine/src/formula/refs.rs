//! Reference extraction from formula AST.
//!
//! Walks an expression and collects the reference tokens it mentions, for
//! dependency graph construction. Plain references and whole-range tokens
//! are kept apart, each in first-appearance order without duplicates.

use rustc_hash::FxHashSet;

use crate::grid::Grid;
use crate::loc::Coord;

use super::parser::Expr;

/// A whole range token, corners as written in the formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub start: Coord,
    pub end: Coord,
}

impl RangeRef {
    /// Corners normalized independently per axis, so start <= end on both.
    pub fn normalized(&self) -> (Coord, Coord) {
        let (top, bottom) = if self.start.row <= self.end.row {
            (self.start.row, self.end.row)
        } else {
            (self.end.row, self.start.row)
        };
        let (left, right) = if self.start.col <= self.end.col {
            (self.start.col, self.end.col)
        } else {
            (self.end.col, self.start.col)
        };
        (Coord::new(top, left), Coord::new(bottom, right))
    }

    /// Every cell of the inclusive box, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        let (start, end) = self.normalized();
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| Coord::new(row, col)))
    }
}

/// References discovered in one formula.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaRefs {
    pub cells: Vec<Coord>,
    pub ranges: Vec<RangeRef>,
}

/// Collect the reference tokens of an expression.
pub fn extract_refs(expr: &Expr) -> FormulaRefs {
    let mut refs = FormulaRefs::default();
    let mut seen_cells = FxHashSet::default();
    let mut seen_ranges = FxHashSet::default();
    collect_refs(expr, &mut refs, &mut seen_cells, &mut seen_ranges);
    refs
}

fn collect_refs(
    expr: &Expr,
    refs: &mut FormulaRefs,
    seen_cells: &mut FxHashSet<Coord>,
    seen_ranges: &mut FxHashSet<RangeRef>,
) {
    match expr {
        Expr::Number(_) | Expr::Text(_) => {
            // Literals have no dependencies
        }

        Expr::CellRef(coord) => {
            if seen_cells.insert(*coord) {
                refs.cells.push(*coord);
            }
        }

        Expr::Range { start, end } => {
            let range = RangeRef {
                start: *start,
                end: *end,
            };
            if seen_ranges.insert(range) {
                refs.ranges.push(range);
            }
        }

        Expr::Function { args, .. } => {
            for arg in args {
                collect_refs(arg, refs, seen_cells, seen_ranges);
            }
        }

        Expr::BinaryOp { left, right, .. } => {
            collect_refs(left, refs, seen_cells, seen_ranges);
            collect_refs(right, refs, seen_cells, seen_ranges);
        }
    }
}

/// Dependency edge targets of a formula: plain references first, then each
/// range expanded cell by cell, de-duplicated and filtered to the grid
/// extent. The order is stable for a given formula text, which lets the
/// graph skip rewiring when an edit re-derives identical edges.
pub fn edge_targets(expr: &Expr, grid: &Grid) -> Vec<Coord> {
    let refs = extract_refs(expr);
    let mut seen = FxHashSet::default();
    let mut targets = Vec::new();
    for coord in refs.cells {
        if grid.contains(coord) && seen.insert(coord) {
            targets.push(coord);
        }
    }
    for range in refs.ranges {
        for coord in range.cells() {
            if grid.contains(coord) && seen.insert(coord) {
                targets.push(coord);
            }
        }
    }
    targets
}
