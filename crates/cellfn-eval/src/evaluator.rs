//! Session-level evaluation: one data accessor, one provider chain, many cells.

use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};
use rayon::prelude::*;

use crate::aggregator::{AggregatingProvider, Unresolved};
use crate::ast::ASTNode;
use crate::function::Function;
use crate::function_registry::BuiltinProvider;
use crate::interpreter::Interpreter;
use crate::reference::CellRef;
use crate::traits::{FunctionProvider, ReferenceResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Append the builtin provider after every user provider.
    pub include_builtins: bool,
    /// Evaluate batches on the rayon pool.
    pub parallel: bool,
    /// Sheet for formulas evaluated without a calling cell.
    pub default_sheet: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            include_builtins: true,
            parallel: false,
            default_sheet: "Sheet1".to_string(),
        }
    }
}

/// Owns everything a formula needs to run. Immutable once built and safe to
/// share across threads.
pub struct Evaluator {
    resolver: Arc<dyn ReferenceResolver>,
    functions: AggregatingProvider,
    config: EvalConfig,
}

impl Evaluator {
    pub fn builder<R: ReferenceResolver + 'static>(resolver: R) -> EvaluatorBuilder {
        EvaluatorBuilder {
            resolver: Arc::new(resolver),
            providers: Vec::new(),
            config: EvalConfig::default(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn functions(&self) -> &AggregatingProvider {
        &self.functions
    }

    /// Evaluate `node` as the formula of `cell`.
    pub fn evaluate_cell(&self, cell: &CellRef, node: &ASTNode) -> LiteralValue {
        Interpreter::new_with_cell(self, cell).evaluate(node)
    }

    /// Evaluate `node` with no calling cell, against the default sheet.
    pub fn evaluate_formula(&self, node: &ASTNode) -> LiteralValue {
        Interpreter::new(self, &self.config.default_sheet).evaluate(node)
    }

    /// Evaluate independent cells. Results line up with `cells`; an error in one
    /// cell does not affect the others.
    pub fn evaluate_batch(&self, cells: &[(CellRef, ASTNode)]) -> Vec<LiteralValue> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "evaluate_batch",
            cells = cells.len(),
            parallel = self.config.parallel
        )
        .entered();

        if self.config.parallel {
            cells
                .par_iter()
                .map(|(cell, node)| self.evaluate_cell(cell, node))
                .collect()
        } else {
            cells
                .iter()
                .map(|(cell, node)| self.evaluate_cell(cell, node))
                .collect()
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Function>, Unresolved> {
        self.functions.resolve(name)
    }

    /// True when any function called in `node` is volatile. Unknown names do
    /// not count.
    pub fn is_volatile(&self, node: &ASTNode) -> bool {
        node.function_names()
            .into_iter()
            .filter_map(|name| self.functions.find(name))
            .any(|f| f.volatile())
    }

    /// Every name `node` calls that no provider defines.
    pub fn unresolved_names<'n>(&self, node: &'n ASTNode) -> Vec<&'n str> {
        let mut missing: Vec<&str> = Vec::new();
        for name in node.function_names() {
            if self.functions.find(name).is_none() && !missing.contains(&name) {
                missing.push(name);
            }
        }
        missing
    }
}

impl ReferenceResolver for Evaluator {
    fn resolve_cell_reference(
        &self,
        sheet: Option<&str>,
        row: u32,
        col: u32,
    ) -> Result<LiteralValue, ExcelError> {
        self.resolver.resolve_cell_reference(sheet, row, col)
    }

    fn resolve_range_reference(
        &self,
        sheet: Option<&str>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Vec<Vec<LiteralValue>>, ExcelError> {
        self.resolver
            .resolve_range_reference(sheet, start_row, start_col, end_row, end_col)
    }
}

impl FunctionProvider for Evaluator {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get_function(ns, name)
    }
}

pub struct EvaluatorBuilder {
    resolver: Arc<dyn ReferenceResolver>,
    providers: Vec<Arc<dyn FunctionProvider>>,
    config: EvalConfig,
}

impl EvaluatorBuilder {
    /// Add a provider. Earlier providers take priority over later ones.
    pub fn provider<P: FunctionProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn FunctionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Evaluator {
        let mut providers = self.providers;
        if self.config.include_builtins {
            providers.push(Arc::new(BuiltinProvider));
        }
        Evaluator {
            resolver: self.resolver,
            functions: AggregatingProvider::new(providers),
            config: self.config,
        }
    }
}
