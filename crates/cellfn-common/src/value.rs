use std::fmt::{self, Display};

use crate::ExcelError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An **interpreter** value. Every formula node and every function call produces
/// exactly one of these; failures are carried in the `Error` variant.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ExcelError),
    /// Blank cell or omitted argument.
    Empty,
    /// Row-major, rectangular. Build through [`LiteralValue::array`] to have the
    /// shape checked.
    Array(Vec<Vec<LiteralValue>>),
}

/// Discriminant of a [`LiteralValue`], cheap to copy and compare.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    Error,
    Empty,
    Array,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Boolean => "boolean",
            ValueKind::Error => "error",
            ValueKind::Empty => "blank",
            ValueKind::Array => "array",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// A typed accessor was used on the wrong variant.
    TypeMismatch { expected: ValueKind, found: ValueKind },
    /// Array rows of differing length; `row` is the first offending row.
    Ragged { row: usize, expected: usize, found: usize },
}

impl Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ValueError::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "array row {row} has {found} column(s), expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ValueError {}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Text(s) => write!(f, "{s}"),
            LiteralValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            LiteralValue::Error(e) => write!(f, "{}", e.kind),
            LiteralValue::Empty => Ok(()),
            LiteralValue::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, v) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{v}")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

impl LiteralValue {
    /// Build an array value, rejecting ragged rows.
    pub fn array(rows: Vec<Vec<LiteralValue>>) -> Result<Self, ValueError> {
        if let Some(first) = rows.first() {
            let width = first.len();
            if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
                return Err(ValueError::Ragged {
                    row,
                    expected: width,
                    found: r.len(),
                });
            }
        }
        Ok(LiteralValue::Array(rows))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            LiteralValue::Number(_) => ValueKind::Number,
            LiteralValue::Text(_) => ValueKind::Text,
            LiteralValue::Boolean(_) => ValueKind::Boolean,
            LiteralValue::Error(_) => ValueKind::Error,
            LiteralValue::Empty => ValueKind::Empty,
            LiteralValue::Array(_) => ValueKind::Array,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LiteralValue::Error(_))
    }

    /// `(rows, cols)`; scalars are 1×1.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            LiteralValue::Array(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
            _ => (1, 1),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_number(&self) -> Result<f64, ValueError> {
        match self {
            LiteralValue::Number(n) => Ok(*n),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_text(&self) -> Result<&str, ValueError> {
        match self {
            LiteralValue::Text(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Text)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            LiteralValue::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Boolean)),
        }
    }

    pub fn as_error(&self) -> Result<&ExcelError, ValueError> {
        match self {
            LiteralValue::Error(e) => Ok(e),
            other => Err(other.mismatch(ValueKind::Error)),
        }
    }

    pub fn as_array(&self) -> Result<&[Vec<LiteralValue>], ValueError> {
        match self {
            LiteralValue::Array(rows) => Ok(rows),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    /// Collapse a 1×1 array to its single element; other values pass through.
    pub fn into_scalar(self) -> LiteralValue {
        match self {
            LiteralValue::Array(mut rows) if rows.len() == 1 && rows[0].len() == 1 => {
                rows.swap_remove(0).swap_remove(0)
            }
            other => other,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            LiteralValue::Boolean(b) => *b,
            LiteralValue::Number(n) => *n != 0.0,
            LiteralValue::Text(s) => !s.is_empty(),
            LiteralValue::Array(arr) => !arr.is_empty(),
            LiteralValue::Error(_) | LiteralValue::Empty => false,
        }
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Text(s.to_owned())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::Text(s)
    }
}
