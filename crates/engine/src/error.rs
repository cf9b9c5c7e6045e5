//! Engine error types.
//!
//! Two disjoint surfaces: `CalcError` covers every way a formula can fail
//! and always collapses to the `!ERROR` marker as the cell's computed
//! value; `EngineError` covers caller misuse of the engine API and is the
//! only kind ever returned as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display text every formula failure collapses to.
pub const ERROR_MARKER: &str = "!ERROR";

/// Failure of a single formula.
///
/// Caught at the evaluator boundary and stored as the cell's computed
/// value; never surfaced to the caller as `Err`.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalcError {
    /// Malformed formula text or unknown function name
    #[error("parse error: {0}")]
    Parse(String),

    /// Reference resolves outside the grid extent
    #[error("reference out of extent: {0}")]
    Ref(String),

    /// Operand a function or operator cannot use
    #[error("type error: {0}")]
    Type(String),

    /// Division or modulo by zero, negative square root
    #[error("arithmetic error: {0}")]
    Arith(String),

    /// Recursive resolution re-entered a cell
    #[error("cycle detected through {0}")]
    Cycle(String),
}

/// Result type for formula work inside the evaluator.
pub type CalcResult<T> = std::result::Result<T, CalcError>;

/// Caller misuse of the engine API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Grid extent with zero rows or columns; no cell addressing is possible
    #[error("invalid grid extent: {rows}x{cols}")]
    InvalidExtent { rows: usize, cols: usize },

    /// Location label the schema guarantees callers never produce
    #[error("invalid location: {0:?}")]
    InvalidLocation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_error_display() {
        assert_eq!(
            CalcError::Parse("unexpected character: @".to_string()).to_string(),
            "parse error: unexpected character: @"
        );
        assert_eq!(
            CalcError::Cycle("B1".to_string()).to_string(),
            "cycle detected through B1"
        );
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidExtent { rows: 0, cols: 10 };
        assert_eq!(err.to_string(), "invalid grid extent: 0x10");

        let err = EngineError::InvalidLocation("1A".to_string());
        assert_eq!(err.to_string(), "invalid location: \"1A\"");
    }

    #[test]
    fn test_marker_text() {
        assert_eq!(ERROR_MARKER, "!ERROR");
    }
}
