use cellfn_common::{ExcelError, LiteralValue};

use crate::traits::ArgumentHandle;

/// Reject calls outside `min..=max` arguments with `#VALUE!`.
pub fn check_arity(
    name: &str,
    args: &[ArgumentHandle<'_>],
    min: usize,
    max: Option<usize>,
) -> Result<(), ExcelError> {
    let n = args.len();
    if n < min || max.is_some_and(|m| n > m) {
        let expected = match max {
            Some(m) if m == min => format!("{min}"),
            Some(m) => format!("{min} to {m}"),
            None => format!("at least {min}"),
        };
        return Err(ExcelError::new_value()
            .with_message(format!("{name} expects {expected} argument(s), got {n}")));
    }
    Ok(())
}

/// Coerce a `LiteralValue` to `f64` using spreadsheet semantics.
/// - Boolean maps to 1.0/0.0, blank to 0.0
/// - Text must parse as a finite number (`"nan"` and `"inf"` do not)
/// - Errors pass through; arrays are `#VALUE!`
pub fn coerce_num(value: &LiteralValue) -> Result<f64, ExcelError> {
    match value {
        LiteralValue::Number(n) => Ok(*n),
        LiteralValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        LiteralValue::Empty => Ok(0.0),
        LiteralValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| {
                ExcelError::new_value().with_message(format!("Cannot convert '{s}' to number"))
            }),
        LiteralValue::Error(e) => Err(e.clone()),
        LiteralValue::Array(_) => {
            Err(ExcelError::new_value().with_message("Expected a single value, got an array"))
        }
    }
}

pub fn coerce_text(value: &LiteralValue) -> Result<String, ExcelError> {
    match value {
        LiteralValue::Error(e) => Err(e.clone()),
        LiteralValue::Array(_) => {
            Err(ExcelError::new_value().with_message("Expected a single value, got an array"))
        }
        other => Ok(other.to_string()),
    }
}

pub fn coerce_bool(value: &LiteralValue) -> Result<bool, ExcelError> {
    match value {
        LiteralValue::Boolean(b) => Ok(*b),
        LiteralValue::Number(n) => Ok(*n != 0.0),
        LiteralValue::Empty => Ok(false),
        LiteralValue::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        LiteralValue::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        LiteralValue::Error(e) => Err(e.clone()),
        _ => Err(ExcelError::new_value()),
    }
}

/// NaN and infinities become `#NUM!`.
pub fn sanitize_numeric(n: f64) -> Result<f64, ExcelError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ExcelError::new_num())
    }
}

/// Evaluate one argument to a scalar; a 1×1 array collapses.
pub fn scalar_arg(arg: &ArgumentHandle<'_>) -> LiteralValue {
    arg.value().into_owned().into_scalar()
}
