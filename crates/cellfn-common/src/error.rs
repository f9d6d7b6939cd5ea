//! Excel-style error values.
//!
//! - **`ExcelErrorKind`** : the canonical set of error codes a formula can yield
//! - **`ErrorContext`**   : lightweight, sheet-agnostic location info
//! - **`ExcelError`**     : kind + optional message + optional location
//!
//! Errors are ordinary values: a function that fails returns
//! `LiteralValue::Error(..)` and evaluation carries on with the next cell.

use std::{error::Error, fmt};

use crate::LiteralValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised error codes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders them exactly as a spreadsheet shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Null,
    /// A reference points at nothing.
    Ref,
    /// No provider knows the function name.
    Name,
    /// Wrong argument type or count.
    Value,
    Div,
    Na,
    Num,
    /// Operator or feature the engine does not implement.
    NImpl,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
            Self::NImpl => "#N/IMPL!",
        })
    }
}

impl ExcelErrorKind {
    /// Parse the displayed form (`"#REF!"`, case-insensitive). Unknown codes yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "#null!" => Self::Null,
            "#ref!" => Self::Ref,
            "#name?" => Self::Name,
            "#value!" => Self::Value,
            "#div/0!" => Self::Div,
            "#n/a" => Self::Na,
            "#num!" => Self::Num,
            "#n/impl!" => Self::NImpl,
            _ => return None,
        })
    }

    /// Numeric code as reported by `ERROR.TYPE`.
    pub fn code(self) -> u8 {
        match self {
            Self::Null => 1,
            Self::Div => 2,
            Self::Value => 3,
            Self::Ref => 4,
            Self::Name => 5,
            Self::Num => 6,
            Self::Na => 7,
            Self::NImpl => 8,
        }
    }
}

/// Where an error was produced. Kept minimal on purpose.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    pub sheet: Option<String>,
    pub row: Option<u32>,
    pub col: Option<u32>,
}

/// The single error struct the API passes around.
///
/// Two errors compare equal when their kind, message and context agree; use
/// [`ExcelError::kind`] when only the code matters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcelError {
    pub kind: ExcelErrorKind,
    pub message: Option<String>,
    pub context: Option<ErrorContext>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<ExcelErrorKind> for ExcelError {
    fn from(kind: ExcelErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl ExcelError {
    /// Basic constructor (no message, no location).
    pub fn new(kind: ExcelErrorKind) -> Self {
        kind.into()
    }

    pub fn new_value() -> Self {
        Self::new(ExcelErrorKind::Value)
    }

    pub fn new_name() -> Self {
        Self::new(ExcelErrorKind::Name)
    }

    pub fn new_ref() -> Self {
        Self::new(ExcelErrorKind::Ref)
    }

    pub fn new_div() -> Self {
        Self::new(ExcelErrorKind::Div)
    }

    pub fn new_num() -> Self {
        Self::new(ExcelErrorKind::Num)
    }

    pub fn new_na() -> Self {
        Self::new(ExcelErrorKind::Na)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach the cell the error surfaced in. An existing location is kept, so the
    /// innermost cell wins when errors travel through nested evaluation.
    pub fn with_location(mut self, sheet: Option<&str>, row: u32, col: u32) -> Self {
        if self.context.is_none() {
            self.context = Some(ErrorContext {
                sheet: sheet.map(str::to_owned),
                row: Some(row),
                col: Some(col),
            });
        }
        self
    }

    pub fn kind(&self) -> ExcelErrorKind {
        self.kind
    }

    /// Build from the displayed form; unknown strings become `#VALUE!`.
    pub fn from_error_string(s: &str) -> Self {
        let kind = ExcelErrorKind::parse(s).unwrap_or(ExcelErrorKind::Value);
        Self::new(kind)
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for ExcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }

        if let Some(ref ctx) = self.context
            && let (Some(r), Some(c)) = (ctx.row, ctx.col)
        {
            match ctx.sheet {
                Some(ref sheet) => write!(f, " ({sheet}!R{r}C{c})")?,
                None => write!(f, " (R{r}C{c})")?,
            }
        }

        Ok(())
    }
}

impl Error for ExcelError {}

impl From<ExcelError> for String {
    fn from(error: ExcelError) -> Self {
        format!("{error}")
    }
}

impl From<ExcelError> for LiteralValue {
    fn from(error: ExcelError) -> Self {
        LiteralValue::Error(error)
    }
}

impl From<ExcelErrorKind> for LiteralValue {
    fn from(kind: ExcelErrorKind) -> Self {
        LiteralValue::Error(kind.into())
    }
}

impl PartialEq<str> for ExcelErrorKind {
    fn eq(&self, other: &str) -> bool {
        format!("{self}") == other
    }
}

impl PartialEq<&str> for ExcelError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.to_string() == *other
    }
}

impl PartialEq<ExcelErrorKind> for ExcelError {
    fn eq(&self, other: &ExcelErrorKind) -> bool {
        self.kind == *other
    }
}
