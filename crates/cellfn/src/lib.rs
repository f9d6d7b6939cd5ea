//! Meta crate that re-exports the cellfn building blocks. Downstream users can
//! depend on this crate and opt into specific layers via feature flags while
//! keeping access to the underlying crates when deeper integration is required.

#[cfg(feature = "common")]
pub use cellfn_common as common;

#[cfg(feature = "eval")]
pub use cellfn_eval as eval;

#[cfg(feature = "common")]
pub use cellfn_common::{ExcelError, ExcelErrorKind, LiteralValue, ValueKind};

#[cfg(feature = "eval")]
pub use cellfn_eval::{
    ASTNode, AggregatingProvider, BuiltinProvider, CellRef, CustomFnOptions, EvalConfig,
    Evaluator, FunctionContext, FunctionProvider, ReferenceResolver, RegistryError, UdfProvider,
};

#[cfg(feature = "eval")]
pub mod doc_examples;
