//! Function dispatch for spreadsheet formulas.
//!
//! A parsed [`ast::ASTNode`] is walked by an [`interpreter::Interpreter`]. Every
//! function call (and every operator) is looked up by name through a
//! [`traits::FunctionProvider`]; sessions chain several providers with an
//! [`aggregator::AggregatingProvider`] where the first provider that knows a name
//! wins. Errors are values: evaluation always produces a
//! [`cellfn_common::LiteralValue`].

pub mod aggregator;
pub mod ast;
pub mod broadcast;
pub mod builtins;
pub mod evaluator;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod provider;
pub mod reference;
pub mod traits;

pub mod test_workbook;

pub use aggregator::{AggregatingProvider, Unresolved};
pub use ast::{ASTNode, ASTNodeType};
pub use evaluator::{EvalConfig, Evaluator, EvaluatorBuilder};
pub use function::{CustomFnHandler, CustomFnOptions, CustomFunction, FnCaps, Function};
pub use function_registry::BuiltinProvider;
pub use interpreter::Interpreter;
pub use provider::{RegistryError, UdfProvider, UdfProviderBuilder};
pub use reference::{CellRef, ReferenceType};
pub use traits::{
    ArgumentHandle, EvaluationContext, FunctionContext, FunctionProvider, ReferenceResolver,
};

#[cfg(test)]
mod tests;
