use crate::{ASTNode, Evaluator, LiteralValue, UdfProvider};
use cellfn_eval::test_workbook::TestWorkbook;

/// Evaluate `node` against an empty workbook with `providers` ahead of the
/// builtins and return the resulting value.
///
/// This helper is intended for documentation examples to avoid repetitive setup.
///
/// # Example
///
/// ```rust
/// # use cellfn::doc_examples::eval_with;
/// # use cellfn::{ASTNode, ExcelError, FunctionContext, LiteralValue, UdfProvider};
/// let shout = UdfProvider::builder()
///     .function(
///         "SHOUT",
///         |args: &[LiteralValue], _: &dyn FunctionContext| -> Result<LiteralValue, ExcelError> {
///             Ok(LiteralValue::Text(format!("{}!", args[0])))
///         },
///     )
///     .build()?;
/// let value = eval_with(vec![shout], &ASTNode::function("SHOUT", vec![ASTNode::text("hi")]));
/// assert_eq!(value, LiteralValue::Text("hi!".into()));
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
pub fn eval_with(providers: Vec<UdfProvider>, node: &ASTNode) -> LiteralValue {
    providers
        .into_iter()
        .fold(Evaluator::builder(TestWorkbook::new()), |b, p| b.provider(p))
        .build()
        .evaluate_formula(node)
}
