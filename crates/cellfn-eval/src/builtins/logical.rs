// Logical builtins. IF, IFERROR, AND and OR read their arguments lazily and
// stop as soon as the answer is known.

use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use super::utils::{check_arity, coerce_bool, scalar_arg};
use crate::function::{FnCaps, Function};
use crate::function_registry::FunctionTable;
use crate::traits::{ArgumentHandle, FunctionContext};

/* ─────────────────────────── TRUE() / FALSE() ─────────────────────────── */

#[derive(Debug)]
pub struct TrueFn;

impl Function for TrueFn {
    fn name(&self) -> &str {
        "TRUE"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 0, Some(0))?;
        Ok(LiteralValue::Boolean(true))
    }
}

#[derive(Debug)]
pub struct FalseFn;

impl Function for FalseFn {
    fn name(&self) -> &str {
        "FALSE"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 0, Some(0))?;
        Ok(LiteralValue::Boolean(false))
    }
}

/* ─────────────────────────── NOT() ─────────────────────────── */

#[derive(Debug)]
pub struct NotFn;

impl Function for NotFn {
    fn name(&self) -> &str {
        "NOT"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, Some(1))?;
        Ok(LiteralValue::Boolean(!coerce_bool(&scalar_arg(&args[0]))?))
    }
}

/* ─────────────────────────── AND() / OR() ─────────────────────────── */

/// Fold the logical values of `args`. Blanks and text inside arrays are skipped;
/// a literal text argument that is not TRUE/FALSE is `#VALUE!`. Returns `None`
/// when `stop_on` was seen, otherwise whether anything was counted.
fn scan_logicals(args: &[ArgumentHandle<'_>], stop_on: bool) -> Result<Option<bool>, ExcelError> {
    let mut seen = false;
    for arg in args {
        let v = arg.value();
        let cells: Box<dyn Iterator<Item = &LiteralValue> + '_> = match v.as_ref() {
            LiteralValue::Array(rows) => Box::new(rows.iter().flatten()),
            scalar => Box::new(std::iter::once(scalar)),
        };
        let in_array = matches!(v.as_ref(), LiteralValue::Array(_)) || arg.reference().is_some();
        for cell in cells {
            let b = match cell {
                LiteralValue::Empty => continue,
                LiteralValue::Text(_) if in_array => continue,
                other => coerce_bool(other)?,
            };
            seen = true;
            if b == stop_on {
                return Ok(None);
            }
        }
    }
    Ok(Some(seen))
}

#[derive(Debug)]
pub struct AndFn;

impl Function for AndFn {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }
    fn name(&self) -> &str {
        "AND"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, None)?;
        match scan_logicals(args, false)? {
            None => Ok(LiteralValue::Boolean(false)),
            Some(true) => Ok(LiteralValue::Boolean(true)),
            Some(false) => Err(ExcelError::new_value().with_message("AND found no logical values")),
        }
    }
}

#[derive(Debug)]
pub struct OrFn;

impl Function for OrFn {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }
    fn name(&self) -> &str {
        "OR"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, None)?;
        match scan_logicals(args, true)? {
            None => Ok(LiteralValue::Boolean(true)),
            Some(true) => Ok(LiteralValue::Boolean(false)),
            Some(false) => Err(ExcelError::new_value().with_message("OR found no logical values")),
        }
    }
}

/* ─────────────────────────── IF() ─────────────────────────── */

#[derive(Debug)]
pub struct IfFn;

impl Function for IfFn {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }
    fn name(&self) -> &str {
        "IF"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 2, Some(3))?;
        let condition = coerce_bool(&scalar_arg(&args[0]))?;
        if condition {
            Ok(args[1].value().into_owned())
        } else if let Some(otherwise) = args.get(2) {
            Ok(otherwise.value().into_owned())
        } else {
            Ok(LiteralValue::Boolean(false))
        }
    }
}

/* ─────────────────────────── IFERROR() ─────────────────────────── */

#[derive(Debug)]
pub struct IfErrorFn;

impl Function for IfErrorFn {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }
    fn name(&self) -> &str {
        "IFERROR"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 2, Some(2))?;
        match args[0].value().into_owned() {
            LiteralValue::Error(_) => Ok(args[1].value().into_owned()),
            value => Ok(value),
        }
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    table.register_function(Arc::new(TrueFn));
    table.register_function(Arc::new(FalseFn));
    table.register_function(Arc::new(NotFn));
    table.register_function(Arc::new(AndFn));
    table.register_function(Arc::new(OrFn));
    table.register_function(Arc::new(IfFn));
    table.register_function(Arc::new(IfErrorFn));
}

/* ─────────────────────────── tests ─────────────────────────────── */
