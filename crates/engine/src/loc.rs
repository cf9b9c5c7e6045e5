//! Cell coordinates and the location codec.
//!
//! A `Coord` identifies a cell by 0-based row/column indices; the textual
//! location label ("C10") is always derived from it, never stored. Column
//! letters follow the bijective base-26 spreadsheet sequence A..Z, AA, AB...

use serde::{Deserialize, Serialize};

/// Numeric identity of a cell.
///
/// Used as graph nodes in the dependency graph and as store indices.
/// Ordering is row-major (row first, then column), which is the order
/// ranges expand in and the order dependents recompute in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
}

impl Coord {
    /// Create a new Coord.
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse a location label ("C10") into a coordinate.
    ///
    /// Labels are one-or-more uppercase letters followed by a 1-based row
    /// number. Returns `None` for anything else: empty parts, lowercase,
    /// row zero, trailing garbage.
    pub fn parse(label: &str) -> Option<Coord> {
        let split = label.find(|c: char| !c.is_ascii_uppercase())?;
        let (letters, digits) = label.split_at(split);
        if letters.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let col = letters_to_col(letters)?;
        let row: usize = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Coord::new(row - 1, col))
    }

    /// The textual location label for this coordinate.
    pub fn label(&self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

/// Convert a 0-based column index to spreadsheet letters: 0=A, 25=Z, 26=AA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Inverse of [`col_to_letters`]. Returns `None` for empty input, anything
/// but uppercase ASCII letters, or values that overflow `usize`.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc = acc
            .checked_mul(26)?
            .checked_add(c as usize - 'A' as usize + 1)?;
    }
    Some(acc - 1)
}
