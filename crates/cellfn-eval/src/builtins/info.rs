use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue, ValueKind};

use super::utils::check_arity;
use crate::broadcast::map_value;
use crate::function::Function;
use crate::function_registry::FunctionTable;
use crate::traits::{ArgumentHandle, FunctionContext};

/* Type-introspection builtins. None of them propagate errors: inspecting an
error value is their job. */

/// `ISERROR`, `ISBLANK`, `ISNUMBER` and `ISTEXT`: true when the argument has
/// the given kind. Arrays map element-wise.
#[derive(Debug)]
pub struct IsKindFn {
    name: &'static str,
    kind: ValueKind,
}

impl Function for IsKindFn {
    fn name(&self) -> &str {
        self.name
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name, args, 1, Some(1))?;
        let kind = self.kind;
        Ok(map_value(args[0].value().into_owned(), |v| {
            Ok(LiteralValue::Boolean(v.kind() == kind))
        }))
    }
}

/// `NA()` always yields `#N/A`.
#[derive(Debug)]
pub struct NaFn;

impl Function for NaFn {
    fn name(&self) -> &str {
        "NA"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        _ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 0, Some(0))?;
        Err(ExcelError::new_na())
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    for (name, kind) in [
        ("ISERROR", ValueKind::Error),
        ("ISBLANK", ValueKind::Empty),
        ("ISNUMBER", ValueKind::Number),
        ("ISTEXT", ValueKind::Text),
    ] {
        table.register_function(Arc::new(IsKindFn { name, kind }));
    }
    table.register_function(Arc::new(NaFn));
}
