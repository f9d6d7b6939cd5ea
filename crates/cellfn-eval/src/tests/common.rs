use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cellfn_common::{ExcelError, LiteralValue};

use crate::evaluator::Evaluator;
use crate::provider::UdfProvider;
use crate::test_workbook::TestWorkbook;
use crate::traits::FunctionContext;

/// Handler that appends `suffix` to a single text argument; anything else is
/// `#VALUE!`.
pub fn appender(
    suffix: &'static str,
) -> impl Fn(&[LiteralValue], &dyn FunctionContext) -> Result<LiteralValue, ExcelError> + Send + Sync
{
    move |args: &[LiteralValue], _: &dyn FunctionContext| match args {
        [LiteralValue::Text(s)] => Ok(LiteralValue::Text(format!("{s}{suffix}"))),
        _ => Err(ExcelError::new_value()),
    }
}

pub fn provider_with(name: &str, suffix: &'static str) -> UdfProvider {
    UdfProvider::builder()
        .function(name, appender(suffix))
        .build()
        .unwrap()
}

/// Handler that counts its invocations and returns the count so far.
pub fn counting(
    counter: Arc<AtomicUsize>,
) -> impl Fn(&[LiteralValue], &dyn FunctionContext) -> Result<LiteralValue, ExcelError> + Send + Sync
{
    move |_: &[LiteralValue], _: &dyn FunctionContext| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(LiteralValue::Number(n as f64))
    }
}

pub fn evaluator_with(providers: Vec<UdfProvider>) -> Evaluator {
    providers
        .into_iter()
        .fold(Evaluator::builder(TestWorkbook::new()), |b, p| b.provider(p))
        .build()
}
