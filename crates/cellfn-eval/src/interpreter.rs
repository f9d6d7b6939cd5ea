use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use cellfn_common::{ExcelError, ExcelErrorKind, LiteralValue};
use smallvec::SmallVec;

use crate::ast::{ASTNode, ASTNodeType};
use crate::builtins::{BINARY_OP_NS, UNARY_OP_NS};
use crate::function::Function;
use crate::reference::{CellRef, ReferenceType};
use crate::traits::{ArgumentHandle, DefaultFunctionContext, EvaluationContext};

/// Walks one operation tree on behalf of one cell.
///
/// The interpreter holds no mutable state: nested evaluation (arguments,
/// [`crate::traits::FunctionContext::evaluate`]) is plain recursion over `&self`.
pub struct Interpreter<'a> {
    pub context: &'a dyn EvaluationContext,
    current_sheet: &'a str,
    current_cell: Option<&'a CellRef>,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a dyn EvaluationContext, current_sheet: &'a str) -> Self {
        Self {
            context,
            current_sheet,
            current_cell: None,
        }
    }

    /// Evaluate on behalf of `cell`; unqualified references read from its sheet.
    pub fn new_with_cell(context: &'a dyn EvaluationContext, cell: &'a CellRef) -> Self {
        Self {
            context,
            current_sheet: &cell.sheet,
            current_cell: Some(cell),
        }
    }

    pub fn current_sheet(&self) -> &'a str {
        self.current_sheet
    }

    pub fn current_cell(&self) -> Option<&'a CellRef> {
        self.current_cell
    }

    /* ===================  public  =================== */

    /// Evaluate `node`, folding any error into the returned value.
    pub fn evaluate(&self, node: &ASTNode) -> LiteralValue {
        self.evaluate_ast(node).unwrap_or_else(LiteralValue::Error)
    }

    /// Evaluate `node`. An `Err` is an error the top node produced itself; errors
    /// from subtrees have already been folded into values by then.
    pub fn evaluate_ast(&self, node: &ASTNode) -> Result<LiteralValue, ExcelError> {
        match &node.node_type {
            ASTNodeType::Literal(v) => Ok(v.clone()),
            ASTNodeType::Reference(reference) => Ok(self.eval_reference(reference)),
            ASTNodeType::UnaryOp { op, expr } => {
                self.eval_operator(UNARY_OP_NS, op, std::iter::once(&**expr))
            }
            ASTNodeType::BinaryOp { op, left, right } => {
                self.eval_operator(BINARY_OP_NS, op, [&**left, &**right].into_iter())
            }
            ASTNodeType::Function { name, args } => self.eval_function(name, args),
            ASTNodeType::Array(rows) => self.eval_array_literal(rows),
        }
    }

    /* ===================  reference  =================== */

    /// Read a reference through the resolver. Single cells (and 1×1 ranges)
    /// come back as scalars, larger ranges as arrays. A failed read is `#REF!`
    /// located at the referenced cell.
    pub(crate) fn eval_reference(&self, reference: &ReferenceType) -> LiteralValue {
        let sheet = reference.sheet().unwrap_or(self.current_sheet);
        let (row, col) = reference.origin();
        let read = match reference {
            ReferenceType::Cell { row, col, .. } => {
                self.context.resolve_cell_reference(Some(sheet), *row, *col)
            }
            ReferenceType::Range {
                start_row,
                start_col,
                end_row,
                end_col,
                ..
            } => self
                .context
                .resolve_range_reference(Some(sheet), *start_row, *start_col, *end_row, *end_col)
                .map(|data| LiteralValue::Array(data).into_scalar()),
        };
        match read {
            Ok(v) => v,
            Err(e) => {
                let message = e.message.unwrap_or_else(|| e.kind.to_string());
                LiteralValue::Error(
                    ExcelError::new_ref()
                        .with_message(message)
                        .with_location(Some(sheet), row, col),
                )
            }
        }
    }

    /* ===================  operators  =================== */

    fn eval_operator<'n>(
        &self,
        ns: &str,
        op: &str,
        operands: impl Iterator<Item = &'n ASTNode>,
    ) -> Result<LiteralValue, ExcelError> {
        match self.context.get_function(ns, op) {
            Some(fun) => self.invoke(&fun, operands),
            None => {
                let kind = if ns == UNARY_OP_NS { "Unary" } else { "Binary" };
                Err(ExcelError::new(ExcelErrorKind::NImpl).with_message(format!("{kind} op '{op}'")))
            }
        }
    }

    /* ===================  function calls  =================== */

    /// The name is resolved before anything else: an unknown function is
    /// `#NAME?` and none of its arguments are evaluated.
    fn eval_function(&self, name: &str, args: &[ASTNode]) -> Result<LiteralValue, ExcelError> {
        match self.context.get_function("", name) {
            Some(fun) => self.invoke(&fun, args.iter()),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(function = name, "no provider defines function");
                Err(ExcelError::new_name().with_message(format!("Unknown function {name}")))
            }
        }
    }

    /// Call `fun` with handles over `args`. A panic inside the call is contained
    /// and becomes `#VALUE!`.
    fn invoke<'n>(
        &self,
        fun: &Arc<dyn Function>,
        args: impl Iterator<Item = &'n ASTNode>,
    ) -> Result<LiteralValue, ExcelError> {
        let handles: SmallVec<[ArgumentHandle<'_>; 4]> =
            args.map(|n| ArgumentHandle::new(n, self)).collect();
        let fctx = DefaultFunctionContext::new(self);
        match catch_unwind(AssertUnwindSafe(|| fun.eval(&handles, &fctx))) {
            Ok(result) => result,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(function = fun.name(), "function panicked");
                Err(ExcelError::new_value().with_message(format!("{} panicked", fun.name())))
            }
        }
    }

    /* ===================  array literal  =================== */

    fn eval_array_literal(&self, rows: &[Vec<ASTNode>]) -> Result<LiteralValue, ExcelError> {
        let values = rows
            .iter()
            .map(|row| row.iter().map(|cell| self.evaluate(cell)).collect())
            .collect();
        LiteralValue::array(values)
            .map_err(|e| ExcelError::new_value().with_message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_workbook::TestWorkbook;

    #[test]
    fn unknown_operator_is_not_implemented() {
        let wb = TestWorkbook::new();
        let v = wb
            .interpreter()
            .evaluate(&ASTNode::binary("~", ASTNode::number(1.0), ASTNode::number(2.0)));
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::NImpl);
    }

    #[test]
    fn unqualified_references_use_the_calling_sheet() {
        let wb = TestWorkbook::new()
            .with_cell_a1("Sheet1", "A1", LiteralValue::Number(1.0))
            .with_cell_a1("Data", "A1", LiteralValue::Number(2.0));
        let cell = CellRef::new("Data", 5, 5);
        let interp = wb.interpreter_for(&cell);
        assert_eq!(interp.evaluate(&ASTNode::cell(1, 1)), LiteralValue::Number(2.0));
        assert_eq!(interp.current_sheet(), "Data");
    }

    #[test]
    fn failed_reads_become_located_ref_errors() {
        let wb = TestWorkbook::new();
        let node = ASTNode::reference(ReferenceType::cell(Some("Missing"), 3, 4));
        let v = wb.interpreter().evaluate(&node);
        let err = v.as_error().unwrap();
        assert_eq!(err.kind, ExcelErrorKind::Ref);
        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.sheet.as_deref(), Some("Missing"));
        assert_eq!((ctx.row, ctx.col), (Some(3), Some(4)));
    }

    #[test]
    fn array_literals_evaluate_each_element() {
        let wb = TestWorkbook::new();
        let node = ASTNode::array(vec![
            vec![ASTNode::number(1.0), ASTNode::binary("/", ASTNode::number(1.0), ASTNode::number(0.0))],
            vec![ASTNode::text("a"), ASTNode::literal(true)],
        ]);
        let v = wb.interpreter().evaluate(&node);
        let rows = v.as_array().unwrap();
        assert_eq!(rows[0][0], LiteralValue::Number(1.0));
        assert_eq!(rows[0][1].as_error().unwrap().kind, ExcelErrorKind::Div);
        assert_eq!(rows[1][1], LiteralValue::Boolean(true));
    }

    #[test]
    fn ragged_array_literal_is_value_error() {
        let wb = TestWorkbook::new();
        let node = ASTNode::array(vec![vec![ASTNode::number(1.0)], vec![]]);
        let v = wb.interpreter().evaluate(&node);
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }
}
