// Formula evaluator - walks the parsed AST against the grid's raw text

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult, ERROR_MARKER};
use crate::grid::Grid;
use crate::loc::Coord;

use super::functions::{self, Func, Operand};
use super::parser::{self, Expr, Op};
use super::refs;

// =============================================================================
// Value: the computed form of a cell
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    /// Aggregate produced by a bare range
    List(Vec<Value>),
    /// Formula failure; renders as the error marker
    Error(CalcError),
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl Value {
    /// Numeric coercion for arithmetic: empty acts as zero, numeric text
    /// parses, and error values re-raise.
    pub fn to_number(&self) -> CalcResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) if s.trim().is_empty() => Ok(0.0),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CalcError::Type(format!("cannot use {:?} as a number", s))),
            Value::Empty => Ok(0.0),
            Value::List(_) => Err(CalcError::Type(
                "cannot use a range result as a number".to_string(),
            )),
            Value::Error(e) => Err(e.clone()),
        }
    }

    /// Rendering form: numbers drop a trailing .0, lists join with commas,
    /// and every error collapses to the one marker.
    pub fn to_display(&self) -> String {
        match self {
            Value::Number(n) => {
                if !n.is_finite() {
                    ERROR_MARKER.to_string()
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(|v| v.to_display())
                .collect::<Vec<_>>()
                .join(","),
            Value::Empty => String::new(),
            Value::Error(_) => ERROR_MARKER.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// One write produced by an `ARRAY` call, beyond the anchor's own result.
#[derive(Debug, Clone, PartialEq)]
pub struct SpillWrite {
    /// Cell whose formula made the call
    pub anchor: Coord,
    /// Cell receiving the value
    pub target: Coord,
    pub value: Value,
}

/// Everything evaluating one cell produces.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutcome {
    pub value: Value,
    /// In-extent cells the formula references, for dependency edges
    pub refs: Vec<Coord>,
    /// Spill writes collected anywhere in the evaluation
    pub spills: Vec<SpillWrite>,
}

impl CellOutcome {
    fn plain(value: Value) -> Self {
        CellOutcome {
            value,
            refs: Vec::new(),
            spills: Vec::new(),
        }
    }
}

/// Evaluate one cell from its raw text.
///
/// References resolve against the raw text of the referenced cells, never
/// against cached computed values, so results are current even while an
/// edit is mid-propagation. A reference chain that revisits a cell already
/// on the resolution stack fails with a cycle error instead of recursing.
pub fn evaluate_cell(grid: &Grid, coord: Coord) -> CellOutcome {
    let raw = grid.raw(coord);
    if raw.is_empty() {
        return CellOutcome::plain(Value::Empty);
    }
    if !raw.starts_with('=') {
        return CellOutcome::plain(literal_value(raw));
    }

    let expr = match parser::parse(raw) {
        Ok(expr) => expr,
        Err(e) => return CellOutcome::plain(Value::Error(e)),
    };

    let refs = refs::edge_targets(&expr, grid);
    let mut ctx = EvalCtx {
        grid,
        active: FxHashSet::default(),
        spills: Vec::new(),
    };
    ctx.active.insert(coord);
    let value = match eval_expr(&mut ctx, coord, &expr) {
        Ok(value) => value,
        Err(e) => Value::Error(e),
    };

    CellOutcome {
        value,
        refs,
        spills: ctx.spills,
    }
}

struct EvalCtx<'a> {
    grid: &'a Grid,
    /// Cells on the resolution stack, for cycle detection
    active: FxHashSet<Coord>,
    /// Spill writes from ARRAY calls, applied by the caller afterwards
    spills: Vec<SpillWrite>,
}

/// Literal cell text: numeric text is a number, anything else passes
/// through verbatim. Non-finite parses (inf, NaN) stay text.
fn literal_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

fn eval_expr(ctx: &mut EvalCtx, at: Coord, expr: &Expr) -> CalcResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::CellRef(coord) => resolve(ctx, *coord),
        Expr::Range { start, end } => {
            let ops = resolve_range(ctx, *start, *end)?;
            Ok(Value::List(ops.into_iter().map(|op| op.value).collect()))
        }
        Expr::Function { func, args } => eval_function(ctx, at, *func, args),
        Expr::BinaryOp { op, left, right } => {
            let lhs = eval_expr(ctx, at, left)?.to_number()?;
            let rhs = eval_expr(ctx, at, right)?.to_number()?;
            let n = match op {
                Op::Add => lhs + rhs,
                Op::Sub => lhs - rhs,
                Op::Mul => lhs * rhs,
                Op::Div => {
                    if rhs == 0.0 {
                        return Err(CalcError::Arith("division by zero".to_string()));
                    }
                    lhs / rhs
                }
                Op::Mod => {
                    if rhs == 0.0 {
                        return Err(CalcError::Arith("modulo by zero".to_string()));
                    }
                    lhs % rhs
                }
            };
            Ok(Value::Number(n))
        }
    }
}

/// Resolve a reference to the current value of the referenced cell, by
/// evaluating its raw text. Empty cells resolve to zero.
fn resolve(ctx: &mut EvalCtx, coord: Coord) -> CalcResult<Value> {
    let grid = ctx.grid;
    if !grid.contains(coord) {
        return Err(CalcError::Ref(coord.label()));
    }
    if ctx.active.contains(&coord) {
        return Err(CalcError::Cycle(coord.label()));
    }

    let raw = grid.raw(coord);
    if raw.is_empty() {
        return Ok(Value::Number(0.0));
    }
    if !raw.starts_with('=') {
        return Ok(literal_value(raw));
    }

    let expr = parser::parse(raw)?;
    ctx.active.insert(coord);
    let result = eval_expr(ctx, coord, &expr);
    ctx.active.remove(&coord);
    result
}

fn resolve_range(ctx: &mut EvalCtx, start: Coord, end: Coord) -> CalcResult<Vec<Operand>> {
    let range = refs::RangeRef { start, end };
    let mut ops = Vec::new();
    for coord in range.cells() {
        let value = resolve(ctx, coord)?;
        ops.push(Operand::at(value, coord));
    }
    Ok(ops)
}

fn eval_function(ctx: &mut EvalCtx, at: Coord, func: Func, args: &[Expr]) -> CalcResult<Value> {
    // A range written directly as an argument splices one operand per
    // covered cell; every other argument contributes a single operand.
    let mut operands = Vec::new();
    for arg in args {
        match arg {
            Expr::Range { start, end } => {
                operands.extend(resolve_range(ctx, *start, *end)?);
            }
            Expr::CellRef(coord) => {
                let value = resolve(ctx, *coord)?;
                operands.push(Operand::at(value, *coord));
            }
            other => operands.push(Operand::bare(eval_expr(ctx, at, other)?)),
        }
    }
    let ops = functions::flatten(operands)?;

    match func {
        Func::Sum => functions::sum(&ops),
        Func::Res => functions::res(&ops),
        Func::Mul => functions::mul(&ops),
        Func::Div => functions::div(&ops),
        Func::Mod => functions::modulo(&ops),
        Func::Sqrt => functions::sqrt(&ops),
        Func::Character => functions::character(&ops),
        Func::Array => eval_array(ctx, at, ops),
    }
}

/// ARRAY spills its operands into the block anchored at the calling cell.
/// Operands sourced from one grid row fill downward in one target column
/// and the column advances per source row, so a horizontal run lands
/// vertically. The first operand becomes the anchor's own result; targets
/// outside the extent are dropped.
fn eval_array(ctx: &mut EvalCtx, anchor: Coord, ops: Vec<Operand>) -> CalcResult<Value> {
    if ops.is_empty() {
        return Err(CalcError::Type("ARRAY needs at least one operand".to_string()));
    }
    // Operands per source row: the bounding-box width of the located
    // sources. Location-less operand lists form a single run.
    let group = source_row_width(&ops).unwrap_or(ops.len());
    let first = ops[0].value.clone();

    for (i, op) in ops.iter().enumerate() {
        let target = Coord::new(anchor.row + i % group, anchor.col + i / group);
        if target == anchor {
            continue;
        }
        if !ctx.grid.contains(target) {
            continue;
        }
        ctx.spills.push(SpillWrite {
            anchor,
            target,
            value: op.value.clone(),
        });
    }

    Ok(first)
}

fn source_row_width(ops: &[Operand]) -> Option<usize> {
    let mut min: Option<usize> = None;
    let mut max: Option<usize> = None;
    for op in ops {
        if let Some(src) = op.source {
            min = Some(min.map_or(src.col, |m: usize| m.min(src.col)));
            max = Some(max.map_or(src.col, |m: usize| m.max(src.col)));
        }
    }
    Some(max? - min? + 1)
}
