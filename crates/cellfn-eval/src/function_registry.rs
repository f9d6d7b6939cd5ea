//! The process-wide table of builtin functions and operators.
//!
//! Filled exactly once on first use and read-only afterwards, so lookups need
//! no locking.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::function::Function;
use crate::traits::FunctionProvider;

/// Builtins grouped by namespace, then by upper-cased name.
#[derive(Default)]
pub struct FunctionTable {
    by_ns: FxHashMap<String, FxHashMap<String, Arc<dyn Function>>>,
}

impl FunctionTable {
    /// Later registrations under the same key replace earlier ones.
    pub fn register_function(&mut self, f: Arc<dyn Function>) {
        let key = f.name().to_ascii_uppercase();
        self.insert(key, f);
    }

    /// Register `f` under an extra name (`CONCAT` for `CONCATENATE`).
    pub fn register_alias(&mut self, alias: &str, f: Arc<dyn Function>) {
        self.insert(alias.to_ascii_uppercase(), f);
    }

    fn insert(&mut self, key: String, f: Arc<dyn Function>) {
        self.by_ns
            .entry(f.namespace().to_string())
            .or_default()
            .insert(key, f);
    }

    pub fn get(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        let table = self.by_ns.get(ns)?;
        table
            .get(name)
            .or_else(|| table.get(&name.trim().to_ascii_uppercase()))
            .cloned()
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_ns
            .get("")
            .map(|t| t.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

static REG: Lazy<FunctionTable> = Lazy::new(|| {
    let mut table = FunctionTable::default();
    crate::builtins::load_builtins(&mut table);
    #[cfg(feature = "tracing")]
    tracing::debug!(functions = table.names().len(), "loaded builtin functions");
    table
});

pub fn get(ns: &str, name: &str) -> Option<Arc<dyn Function>> {
    REG.get(ns, name)
}

/// Names of all builtin (non-operator) functions, sorted.
pub fn builtin_names() -> Vec<&'static str> {
    REG.names()
}

/// The builtin table as a provider. Sessions append it after any extension
/// providers, so extensions can shadow builtins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProvider;

impl FunctionProvider for BuiltinProvider {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        get(ns, name)
    }
}
