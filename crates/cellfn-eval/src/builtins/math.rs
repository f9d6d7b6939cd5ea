use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use super::utils::{check_arity, coerce_num, sanitize_numeric, scalar_arg};
use crate::broadcast::map_value;
use crate::function::Function;
use crate::function_registry::FunctionTable;
use crate::traits::{ArgumentHandle, FunctionContext};

/* ─────────────────────────── SUM() ─────────────────────────── */

/// Adds its arguments.
///
/// Values typed directly into the call are coerced (`SUM("2", TRUE)` is 3).
/// Values reached through a reference or array only count when they are
/// numbers; text, booleans and blanks there are skipped. Any error wins.
#[derive(Debug)]
pub struct SumFn;

impl Function for SumFn {
    fn name(&self) -> &str {
        "SUM"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        let mut total = 0.0;
        for arg in args {
            let v = arg.value();
            match v.as_ref() {
                LiteralValue::Array(rows) => {
                    for cell in rows.iter().flatten() {
                        match cell {
                            LiteralValue::Number(n) => total += n,
                            LiteralValue::Error(e) => return Err(e.clone()),
                            _ => {}
                        }
                    }
                }
                LiteralValue::Error(e) => return Err(e.clone()),
                LiteralValue::Number(n) => total += n,
                _ if arg.reference().is_some() => {}
                other => total += coerce_num(other)?,
            }
        }
        Ok(LiteralValue::Number(sanitize_numeric(total)?))
    }
}

/* ─────────────────────────── ABS() ─────────────────────────── */

#[derive(Debug)]
pub struct AbsFn;

impl Function for AbsFn {
    fn name(&self) -> &str {
        "ABS"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, Some(1))?;
        Ok(map_value(args[0].value().into_owned(), |v| {
            Ok(LiteralValue::Number(coerce_num(&v)?.abs()))
        }))
    }
}

/* ─────────────────────────── MOD() ─────────────────────────── */

/// Remainder with the sign of the divisor.
#[derive(Debug)]
pub struct ModFn;

impl Function for ModFn {
    fn name(&self) -> &str {
        "MOD"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 2, Some(2))?;
        let n = coerce_num(&scalar_arg(&args[0]))?;
        let d = coerce_num(&scalar_arg(&args[1]))?;
        if d == 0.0 {
            return Err(ExcelError::new_div());
        }
        let r = n - d * (n / d).floor();
        Ok(LiteralValue::Number(sanitize_numeric(r)?))
    }
}

/* ─────────────────────────── ROUND() ─────────────────────────── */

/// `ROUND(number, [digits])`, halves away from zero. Negative `digits` round to
/// the left of the decimal point. Precision beyond what an `f64` holds leaves
/// `number` as it is.
#[derive(Debug)]
pub struct RoundFn;

impl Function for RoundFn {
    fn name(&self) -> &str {
        "ROUND"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, Some(2))?;
        let n = coerce_num(&scalar_arg(&args[0]))?;
        let digits = match args.get(1) {
            Some(a) => coerce_num(&scalar_arg(a))?.trunc(),
            None => 0.0,
        };
        let factor = 10f64.powi(digits.abs().min(400.0) as i32);
        let rounded = if digits >= 0.0 {
            let scaled = n * factor;
            // no fractional part left at this precision
            if !scaled.is_finite() {
                n
            } else {
                scaled.round() / factor
            }
        } else if factor.is_finite() {
            (n / factor).round() * factor
        } else {
            0.0
        };
        Ok(LiteralValue::Number(sanitize_numeric(rounded)?))
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    table.register_function(Arc::new(SumFn));
    table.register_function(Arc::new(AbsFn));
    table.register_function(Arc::new(ModFn));
    table.register_function(Arc::new(RoundFn));
}
