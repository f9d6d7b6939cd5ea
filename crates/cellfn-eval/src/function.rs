//! The core `Function` trait, its capability flags, and the eager adapter that
//! turns plain callbacks into functions.

use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use crate::traits::{ArgumentHandle, FunctionContext};

bitflags::bitflags! {
    /// Describes the properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u8 {
        /// Same output for the same input, no side effects. The default.
        const PURE          = 0b0000_0001;
        /// Output may change between evaluations with identical inputs (`RAND()`,
        /// `NOW()`). Schedulers re-evaluate cells that contain one.
        const VOLATILE      = 0b0000_0010;
        /// Evaluates only some of its arguments (`IF`, `IFERROR`).
        const SHORT_CIRCUIT = 0b0000_0100;
    }
}

/// Object-safe trait for every callable the interpreter can dispatch to.
///
/// Arguments arrive as lazy [`ArgumentHandle`]s, evaluated left-to-right as the
/// function asks for them. Returning `Err(e)` is shorthand for returning
/// `Ok(LiteralValue::Error(e))`: the interpreter folds it into the result value.
/// A panic inside `eval` is contained by the interpreter and reported as `#VALUE!`.
pub trait Function: Send + Sync + 'static {
    /// Capability flags for this function
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn name(&self) -> &str;

    fn namespace(&self) -> &str {
        ""
    }

    fn volatile(&self) -> bool {
        self.caps().contains(FnCaps::VOLATILE)
    }

    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError>;
}

/* ─────────────────────── extension callbacks ─────────────────────── */

/// Callback form for extension authors: receives fully evaluated arguments.
///
/// Implemented for any `Fn(&[LiteralValue], &dyn FunctionContext) -> Result<..>`,
/// so plain `fn` items and closures can be registered directly.
pub trait CustomFnHandler: Send + Sync {
    fn call(
        &self,
        args: &[LiteralValue],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError>;
}

impl<F> CustomFnHandler for F
where
    F: Fn(&[LiteralValue], &dyn FunctionContext) -> Result<LiteralValue, ExcelError>
        + Send
        + Sync,
{
    fn call(
        &self,
        args: &[LiteralValue],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        (self)(args, ctx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFnOptions {
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub volatile: bool,
}

impl Default for CustomFnOptions {
    fn default() -> Self {
        Self {
            min_args: 0,
            max_args: None,
            volatile: false,
        }
    }
}

impl CustomFnOptions {
    /// Exactly `n` arguments.
    pub fn exact(n: usize) -> Self {
        Self {
            min_args: n,
            max_args: Some(n),
            ..Default::default()
        }
    }
}

/// Adapts a [`CustomFnHandler`] to [`Function`]: evaluates every argument
/// left-to-right and enforces the declared arity.
pub struct CustomFunction {
    canonical_name: String,
    options: CustomFnOptions,
    handler: Arc<dyn CustomFnHandler>,
}

impl CustomFunction {
    pub fn new(name: String, options: CustomFnOptions, handler: Arc<dyn CustomFnHandler>) -> Self {
        Self {
            canonical_name: name,
            options,
            handler,
        }
    }

    pub fn options(&self) -> &CustomFnOptions {
        &self.options
    }

    fn validate_arity(&self, provided: usize) -> Result<(), ExcelError> {
        if provided < self.options.min_args {
            return Err(ExcelError::new_value().with_message(format!(
                "{} expects at least {} argument(s), got {}",
                self.canonical_name, self.options.min_args, provided
            )));
        }
        if let Some(max) = self.options.max_args
            && provided > max
        {
            return Err(ExcelError::new_value().with_message(format!(
                "{} expects at most {} argument(s), got {}",
                self.canonical_name, max, provided
            )));
        }
        Ok(())
    }
}

impl Function for CustomFunction {
    fn caps(&self) -> FnCaps {
        if self.options.volatile {
            FnCaps::VOLATILE
        } else {
            FnCaps::PURE
        }
    }

    fn name(&self) -> &str {
        &self.canonical_name
    }

    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        self.validate_arity(args.len())?;

        let materialized: Vec<LiteralValue> = args.iter().map(|a| a.value().into_owned()).collect();

        self.handler.call(&materialized, ctx)
    }
}
