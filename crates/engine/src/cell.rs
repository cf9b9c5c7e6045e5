//! Cell records and presentation configuration.
//!
//! A `Cell` owns the raw input text and the last computed value. The
//! `CellConfig` block is presentation metadata carried for the rendering
//! layer: the engine stores and round-trips it but never reads it during
//! parsing or evaluation.

use serde::{Deserialize, Serialize};

use crate::formula::eval::Value;

/// Input widget kind the rendering layer should use for a cell.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Number,
    File,
    Range,
    Checkbox,
    Radio,
    Button,
}

/// Display format applied to the computed value by the rendering layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComputedFormat {
    #[default]
    Default,
    Number,
    Decimal,
    Money,
    Size,
    Weight,
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Presentation-only cell options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellConfig {
    pub input: InputKind,
    pub format: ComputedFormat,
    pub halign: HorizontalAlign,
    pub valign: VerticalAlign,
    /// Background color, e.g. "#ffffff". `None` means the grid default.
    pub background: Option<String>,
}

/// One cell of the grid.
///
/// Cells exist for the whole extent from construction and are mutated in
/// place; clearing a cell resets `raw` and `computed`, it never removes
/// the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    /// Raw input text. Empty string means cleared.
    pub raw: String,
    /// Last evaluated display value.
    pub computed: Value,
    /// Presentation options (ignored by evaluation).
    pub config: CellConfig,
}

impl Cell {
    /// True when the cell holds no input at all.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// True when the raw text is a formula (leading `=`).
    pub fn is_formula(&self) -> bool {
        self.raw.starts_with('=')
    }
}
