//! Cell and range references as they appear in the operation tree.
//!
//! Rows and columns are **1-based** throughout, matching A1 notation.

use core::fmt;

/// Last addressable row of a sheet (1-based).
pub const MAX_ROW: u32 = 1_048_576;
/// Last addressable column of a sheet (1-based, `XFD`).
pub const MAX_COL: u32 = 16_384;

/// Convert a 1-based column into letters (1 ⇒ A, 27 ⇒ AA).
pub fn col_to_letters(col: u32) -> String {
    let mut col = col.saturating_sub(1);
    let mut buf = String::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(char::from(b'A' + rem));
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1; // letters are 1-based internally
    }
    buf.chars().rev().collect()
}

/// Convert letters (e.g. "AA") back to a 1-based column. Lowercase is accepted.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(val)?;
    }
    Some(col)
}

//------------------------------------------------------------------------------
// CellRef
//------------------------------------------------------------------------------

/// The cell a formula is being evaluated for.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellRef {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
        }
    }

    /// Shift by signed deltas; `None` when the result leaves the grid.
    pub fn offset(&self, drow: i64, dcol: i64) -> Option<CellRef> {
        let row = u32::try_from(i64::from(self.row) + drow).ok()?;
        let col = u32::try_from(i64::from(self.col) + dcol).ok()?;
        if row == 0 || col == 0 {
            return None;
        }
        Some(CellRef {
            sheet: self.sheet.clone(),
            row,
            col,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.sheet, col_to_letters(self.col), self.row)
    }
}

//------------------------------------------------------------------------------
// ReferenceType
//------------------------------------------------------------------------------

/// A reference node's target. `sheet == None` means the calling cell's sheet.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    Cell {
        sheet: Option<String>,
        row: u32,
        col: u32,
    },
    /// Inclusive on both corners, like `A1:B5`.
    Range {
        sheet: Option<String>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    },
}

impl ReferenceType {
    pub fn cell(sheet: Option<&str>, row: u32, col: u32) -> Self {
        ReferenceType::Cell {
            sheet: sheet.map(str::to_owned),
            row,
            col,
        }
    }

    pub fn range(sheet: Option<&str>, start: (u32, u32), end: (u32, u32)) -> Self {
        ReferenceType::Range {
            sheet: sheet.map(str::to_owned),
            start_row: start.0,
            start_col: start.1,
            end_row: end.0,
            end_col: end.1,
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        match self {
            ReferenceType::Cell { sheet, .. } | ReferenceType::Range { sheet, .. } => {
                sheet.as_deref()
            }
        }
    }

    /// Top-left corner `(row, col)`.
    pub fn origin(&self) -> (u32, u32) {
        match self {
            ReferenceType::Cell { row, col, .. } => (*row, *col),
            ReferenceType::Range {
                start_row,
                start_col,
                ..
            } => (*start_row, *start_col),
        }
    }

    /// `(rows, cols)` covered.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ReferenceType::Cell { .. } => (1, 1),
            ReferenceType::Range {
                start_row,
                start_col,
                end_row,
                end_col,
                ..
            } => (
                end_row.saturating_sub(*start_row) + 1,
                end_col.saturating_sub(*start_col) + 1,
            ),
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = self.sheet() {
            write!(f, "{sheet}!")?;
        }
        match self {
            ReferenceType::Cell { row, col, .. } => write!(f, "{}{}", col_to_letters(*col), row),
            ReferenceType::Range {
                start_row,
                start_col,
                end_row,
                end_col,
                ..
            } => write!(
                f,
                "{}{}:{}{}",
                col_to_letters(*start_col),
                start_row,
                col_to_letters(*end_col),
                end_row
            ),
        }
    }
}
