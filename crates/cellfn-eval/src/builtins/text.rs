use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use super::utils::{check_arity, coerce_text};
use crate::broadcast::map_value;
use crate::function::Function;
use crate::function_registry::FunctionTable;
use crate::traits::{ArgumentHandle, FunctionContext};

/* ─────────────────────────── CONCATENATE() ─────────────────────────── */

/// Joins the text form of every argument; arrays contribute their cells in
/// row-major order. Registered as both `CONCATENATE` and `CONCAT`.
#[derive(Debug)]
pub struct ConcatenateFn;

impl Function for ConcatenateFn {
    fn name(&self) -> &str {
        "CONCATENATE"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 1, None)?;
        let mut out = String::new();
        for arg in args {
            match arg.value().as_ref() {
                LiteralValue::Array(rows) => {
                    for cell in rows.iter().flatten() {
                        out.push_str(&coerce_text(cell)?);
                    }
                }
                other => out.push_str(&coerce_text(other)?),
            }
        }
        Ok(LiteralValue::Text(out))
    }
}

/* ─────────────────────── LEN() / UPPER() / LOWER() ─────────────────────── */

#[derive(Debug, Clone, Copy)]
enum TextOp {
    Len,
    Upper,
    Lower,
}

/// Single-argument text functions; arrays map element-wise.
#[derive(Debug)]
pub struct TextMapFn {
    name: &'static str,
    op: TextOp,
}

impl Function for TextMapFn {
    fn name(&self) -> &str {
        self.name
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name, args, 1, Some(1))?;
        let op = self.op;
        Ok(map_value(args[0].value().into_owned(), |v| {
            let s = coerce_text(&v)?;
            Ok(match op {
                TextOp::Len => LiteralValue::Number(s.chars().count() as f64),
                TextOp::Upper => LiteralValue::Text(s.to_uppercase()),
                TextOp::Lower => LiteralValue::Text(s.to_lowercase()),
            })
        }))
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    let concat: Arc<dyn Function> = Arc::new(ConcatenateFn);
    table.register_function(concat.clone());
    table.register_alias("CONCAT", concat);
    for (name, op) in [
        ("LEN", TextOp::Len),
        ("UPPER", TextOp::Upper),
        ("LOWER", TextOp::Lower),
    ] {
        table.register_function(Arc::new(TextMapFn { name, op }));
    }
}
