//! cellfn-eval – core traits (object-safe)
//!
//! The seams between the interpreter and the outside world:
//!
//! * [`ReferenceResolver`]: read-only access to cell data (owned by the host)
//! * [`FunctionProvider`]: name → [`Function`] lookup (builtins, extension providers,
//!   aggregators)
//! * [`FunctionContext`]: what a function sees of its call site while it runs
//! * [`ArgumentHandle`]: a lazily evaluated argument

use std::borrow::Cow;
use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use crate::ast::{ASTNode, ASTNodeType};
use crate::interpreter::Interpreter;
use crate::reference::{CellRef, ReferenceType};

pub use crate::function::Function;

/* ─────────────────────── Resolver ─────────────────────── */

/// Read accessor into the workbook. Rows and columns are 1-based.
pub trait ReferenceResolver: Send + Sync {
    fn resolve_cell_reference(
        &self,
        sheet: Option<&str>,
        row: u32,
        col: u32,
    ) -> Result<LiteralValue, ExcelError>;

    /// Rectangular block, row-major. The default reads cell by cell.
    fn resolve_range_reference(
        &self,
        sheet: Option<&str>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Vec<Vec<LiteralValue>>, ExcelError> {
        if start_row == 0 || start_col == 0 || end_row < start_row || end_col < start_col {
            return Err(ExcelError::new_ref().with_message("Invalid range bounds"));
        }
        let mut data = Vec::with_capacity((end_row - start_row + 1) as usize);
        for r in start_row..=end_row {
            let mut row = Vec::with_capacity((end_col - start_col + 1) as usize);
            for c in start_col..=end_col {
                row.push(self.resolve_cell_reference(sheet, r, c)?);
            }
            data.push(row);
        }
        Ok(data)
    }
}

impl<T: ReferenceResolver + ?Sized> ReferenceResolver for Arc<T> {
    fn resolve_cell_reference(
        &self,
        sheet: Option<&str>,
        row: u32,
        col: u32,
    ) -> Result<LiteralValue, ExcelError> {
        (**self).resolve_cell_reference(sheet, row, col)
    }

    fn resolve_range_reference(
        &self,
        sheet: Option<&str>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Vec<Vec<LiteralValue>>, ExcelError> {
        (**self).resolve_range_reference(sheet, start_row, start_col, end_row, end_col)
    }
}

/* ─────────────────────── Function lookup ─────────────────────── */

/// Anything that can map a function name to an implementation.
///
/// `ns` is empty for ordinary spreadsheet functions; operators live in the
/// reserved namespaces [`crate::builtins::UNARY_OP_NS`] and
/// [`crate::builtins::BINARY_OP_NS`]. Lookups are case-insensitive.
pub trait FunctionProvider: Send + Sync {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>>;

    fn find(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.get_function("", name)
    }
}

impl<T: FunctionProvider + ?Sized> FunctionProvider for Arc<T> {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        (**self).get_function(ns, name)
    }
}

/// Everything the interpreter needs from its host.
pub trait EvaluationContext: ReferenceResolver + FunctionProvider {}
impl<T> EvaluationContext for T where T: ReferenceResolver + FunctionProvider + ?Sized {}

/* ─────────────────────── Call-site context ─────────────────────── */

/// The view a running function has of its invocation site. A fresh one is
/// created for every call and dropped when the call returns.
pub trait FunctionContext {
    /// The cell whose formula is being evaluated, if any.
    fn current_cell(&self) -> Option<&CellRef>;

    /// Sheet that unqualified references resolve against.
    fn current_sheet(&self) -> &str;

    /// Read a reference. Failures come back as `#REF!` values.
    fn resolve_reference(&self, reference: &ReferenceType) -> LiteralValue;

    fn cell_value(&self, sheet: Option<&str>, row: u32, col: u32) -> LiteralValue {
        self.resolve_reference(&ReferenceType::cell(sheet, row, col))
    }

    /// Evaluate an arbitrary subtree at this call site (re-entrant).
    fn evaluate(&self, node: &ASTNode) -> LiteralValue;
}

pub struct DefaultFunctionContext<'a> {
    interp: &'a Interpreter<'a>,
}

impl<'a> DefaultFunctionContext<'a> {
    pub fn new(interp: &'a Interpreter<'a>) -> Self {
        Self { interp }
    }
}

impl FunctionContext for DefaultFunctionContext<'_> {
    fn current_cell(&self) -> Option<&CellRef> {
        self.interp.current_cell()
    }

    fn current_sheet(&self) -> &str {
        self.interp.current_sheet()
    }

    fn resolve_reference(&self, reference: &ReferenceType) -> LiteralValue {
        self.interp.eval_reference(reference)
    }

    fn evaluate(&self, node: &ASTNode) -> LiteralValue {
        self.interp.evaluate(node)
    }
}

/* ────────────────────── ArgumentHandle ───────────────────── */

pub type CowValue<'a> = Cow<'a, LiteralValue>;

/// One argument of a call. Nothing is evaluated until [`ArgumentHandle::value`]
/// is asked for, so functions like `IF` only pay for the branch they take.
pub struct ArgumentHandle<'a> {
    node: &'a ASTNode,
    interp: &'a Interpreter<'a>,
}

impl<'a> ArgumentHandle<'a> {
    pub(crate) fn new(node: &'a ASTNode, interp: &'a Interpreter<'a>) -> Self {
        Self { node, interp }
    }

    /// Evaluate the argument. Errors arrive as `LiteralValue::Error`.
    pub fn value(&self) -> CowValue<'a> {
        if let ASTNodeType::Literal(ref v) = self.node.node_type {
            return Cow::Borrowed(v);
        }
        Cow::Owned(self.interp.evaluate(self.node))
    }

    /// The reference this argument spells out, when it is one.
    pub fn reference(&self) -> Option<&'a ReferenceType> {
        match &self.node.node_type {
            ASTNodeType::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn ast(&self) -> &'a ASTNode {
        self.node
    }
}
