//! Arithmetic, concatenation and comparison operators.
//!
//! Operators are ordinary [`Function`]s registered under [`UNARY_OP_NS`] and
//! [`BINARY_OP_NS`], so a provider placed ahead of the builtins can redefine
//! them. Array operands broadcast element-wise.

use std::cmp::Ordering;
use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use super::utils::{coerce_num, coerce_text, sanitize_numeric};
use super::{BINARY_OP_NS, UNARY_OP_NS};
use crate::broadcast::{map_value, zip_values};
use crate::function::Function;
use crate::function_registry::FunctionTable;
use crate::traits::{ArgumentHandle, FunctionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 12] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::Concat,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Gt,
        BinaryOp::Le,
        BinaryOp::Ge,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }

    /// Apply to two scalars. Errors propagate left operand first.
    pub fn apply(self, left: LiteralValue, right: LiteralValue) -> Result<LiteralValue, ExcelError> {
        if let LiteralValue::Error(e) = left {
            return Err(e);
        }
        if let LiteralValue::Error(e) = right {
            return Err(e);
        }
        match self {
            BinaryOp::Concat => Ok(LiteralValue::Text(format!(
                "{}{}",
                coerce_text(&left)?,
                coerce_text(&right)?
            ))),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                let ord = compare_values(&left, &right);
                Ok(LiteralValue::Boolean(match self {
                    BinaryOp::Eq => ord == Ordering::Equal,
                    BinaryOp::Ne => ord != Ordering::Equal,
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Le => ord != Ordering::Greater,
                    _ => ord != Ordering::Less,
                }))
            }
            arith => {
                let a = coerce_num(&left)?;
                let b = coerce_num(&right)?;
                let n = match arith {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if b == 0.0 {
                            return Err(ExcelError::new_div());
                        }
                        a / b
                    }
                    _ => {
                        // negative base with a fractional exponent has no real result
                        if a < 0.0 && b.fract() != 0.0 {
                            return Err(ExcelError::new_num());
                        }
                        a.powf(b)
                    }
                };
                Ok(LiteralValue::Number(sanitize_numeric(n)?))
            }
        }
    }
}

/// Spreadsheet ordering: numbers < text < booleans. A blank compares as the
/// zero value of the other side's type. Text compares case-insensitively.
pub fn compare_values(left: &LiteralValue, right: &LiteralValue) -> Ordering {
    use LiteralValue::*;

    fn rank(v: &LiteralValue) -> u8 {
        match v {
            Number(_) | Empty => 0,
            Text(_) => 1,
            Boolean(_) => 2,
            _ => 3,
        }
    }

    match (left, right) {
        (Empty, Empty) => Ordering::Equal,
        (Empty, Text(s)) => "".cmp(s.as_str()),
        (Text(s), Empty) => s.as_str().cmp(""),
        (Empty, Boolean(b)) => false.cmp(b),
        (Boolean(b), Empty) => b.cmp(&false),
        (Empty, Number(n)) => 0.0f64.total_cmp(n),
        (Number(n), Empty) => n.total_cmp(&0.0),
        (Number(a), Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Text(a), Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Boolean(a), Boolean(b)) => a.cmp(b),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Percent,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Percent => "%",
        }
    }

    pub fn apply(self, v: LiteralValue) -> Result<LiteralValue, ExcelError> {
        let n = coerce_num(&v)?;
        let out = match self {
            UnaryOp::Plus => n,
            UnaryOp::Minus => -n,
            UnaryOp::Percent => n / 100.0,
        };
        Ok(LiteralValue::Number(sanitize_numeric(out)?))
    }
}

/* ─────────────────────────── Function wrappers ─────────────────────────── */

#[derive(Debug)]
pub struct BinaryOperatorFn(pub BinaryOp);

impl Function for BinaryOperatorFn {
    fn name(&self) -> &str {
        self.0.symbol()
    }

    fn namespace(&self) -> &str {
        BINARY_OP_NS
    }

    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        let [left, right] = args else {
            return Err(ExcelError::new_value()
                .with_message(format!("operator {} takes two operands", self.0.symbol())));
        };
        let l = left.value().into_owned();
        let r = right.value().into_owned();
        let op = self.0;
        Ok(zip_values(l, r, |a, b| op.apply(a, b)))
    }
}

#[derive(Debug)]
pub struct UnaryOperatorFn(pub UnaryOp);

impl Function for UnaryOperatorFn {
    fn name(&self) -> &str {
        self.0.symbol()
    }

    fn namespace(&self) -> &str {
        UNARY_OP_NS
    }

    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        let [operand] = args else {
            return Err(ExcelError::new_value()
                .with_message(format!("operator {} takes one operand", self.0.symbol())));
        };
        let op = self.0;
        Ok(map_value(operand.value().into_owned(), |v| op.apply(v)))
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    for op in BinaryOp::ALL {
        table.register_function(Arc::new(BinaryOperatorFn(op)));
    }
    for op in [UnaryOp::Plus, UnaryOp::Minus, UnaryOp::Percent] {
        table.register_function(Arc::new(UnaryOperatorFn(op)));
    }
}
