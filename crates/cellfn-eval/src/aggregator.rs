use std::sync::Arc;

use thiserror::Error;

use crate::function::Function;
use crate::traits::FunctionProvider;

/// Raised when no provider in an aggregator knows a name. The interpreter maps
/// this onto a `#NAME?` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown function `{name}`")]
pub struct Unresolved {
    pub name: String,
}

/// Presents an ordered list of providers as one.
///
/// Lookups walk the list front to back and stop at the first provider that
/// answers, so earlier providers shadow later ones. The list is fixed at
/// construction; providers are never reordered or deduplicated.
#[derive(Clone, Default)]
pub struct AggregatingProvider {
    providers: Vec<Arc<dyn FunctionProvider>>,
}

impl std::fmt::Debug for AggregatingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatingProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl AggregatingProvider {
    pub fn new(providers: Vec<Arc<dyn FunctionProvider>>) -> Self {
        Self { providers }
    }

    pub fn builder() -> AggregatingProviderBuilder {
        AggregatingProviderBuilder::default()
    }

    /// Resolve an ordinary function, reporting a miss as [`Unresolved`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Function>, Unresolved> {
        self.resolve_with_index(name).map(|(_, f)| f)
    }

    /// Like [`AggregatingProvider::resolve`], also returning the position of the
    /// provider that answered.
    pub fn resolve_with_index(&self, name: &str) -> Result<(usize, Arc<dyn Function>), Unresolved> {
        self.lookup("", name).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(function = name, providers = self.providers.len(), "unresolved function");
            Unresolved {
                name: name.to_string(),
            }
        })
    }

    fn lookup(&self, ns: &str, name: &str) -> Option<(usize, Arc<dyn Function>)> {
        self.providers
            .iter()
            .enumerate()
            .find_map(|(i, p)| p.get_function(ns, name).map(|f| (i, f)))
    }

    pub fn providers(&self) -> &[Arc<dyn FunctionProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FunctionProvider for AggregatingProvider {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        self.lookup(ns, name).map(|(_, f)| f)
    }
}

#[derive(Default)]
pub struct AggregatingProviderBuilder {
    providers: Vec<Arc<dyn FunctionProvider>>,
}

impl AggregatingProviderBuilder {
    /// Append a provider at the lowest priority so far.
    pub fn provider<P: FunctionProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn shared(mut self, provider: Arc<dyn FunctionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> AggregatingProvider {
        AggregatingProvider::new(self.providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::UdfProvider;
    use crate::traits::FunctionContext;
    use cellfn_common::{ExcelError, LiteralValue};

    fn named(tag: &'static str) -> impl Fn(&[LiteralValue], &dyn FunctionContext) -> Result<LiteralValue, ExcelError> + Send + Sync {
        move |_: &[LiteralValue], _: &dyn FunctionContext| Ok(LiteralValue::from(tag))
    }

    fn provider(name: &str, tag: &'static str) -> UdfProvider {
        UdfProvider::builder().function(name, named(tag)).build().unwrap()
    }

    #[test]
    fn first_provider_wins() {
        let agg = AggregatingProvider::builder()
            .provider(provider("N", "one"))
            .provider(provider("n", "two"))
            .build();
        let (idx, f) = agg.resolve_with_index("N").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(f.name(), "N");
    }

    #[test]
    fn falls_through_to_later_providers() {
        let agg = AggregatingProvider::builder()
            .provider(provider("A", "a"))
            .provider(provider("B", "b"))
            .build();
        assert_eq!(agg.resolve_with_index("b").unwrap().0, 1);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn miss_is_reported_as_unresolved() {
        let agg = AggregatingProvider::new(vec![Arc::new(provider("A", "a"))]);
        let err = agg.resolve("nope").err().unwrap();
        assert_eq!(err.name, "nope");
        assert_eq!(err.to_string(), "unknown function `nope`");
        assert!(agg.find("nope").is_none());
    }

    #[test]
    fn empty_aggregator_resolves_nothing() {
        let agg = AggregatingProvider::default();
        assert!(agg.is_empty());
        assert!(agg.resolve("SUM").is_err());
    }
}
