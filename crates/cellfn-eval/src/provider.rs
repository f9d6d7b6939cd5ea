//! Extension providers: immutable name → function tables built once from
//! user-supplied callbacks.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::function::{CustomFnHandler, CustomFnOptions, CustomFunction, Function};
use crate::traits::FunctionProvider;

/// Configuration problems detected while building a provider. These are fatal to
/// session setup and never show up as cell values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("function `{name}` is registered more than once (case-insensitive)")]
    DuplicateName { name: String },
    #[error("function name cannot be empty")]
    EmptyName,
    #[error("{names} name(s) supplied for {handles} handler(s)")]
    LengthMismatch { names: usize, handles: usize },
    #[error("invalid arity for {name}: max_args ({max}) < min_args ({min})")]
    InvalidArity { name: String, min: usize, max: usize },
}

/// Canonical lookup key: trimmed, ASCII upper-case.
pub(crate) fn normalize_fn_name(name: &str) -> Result<String, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// An immutable set of extension functions.
///
/// Names are unique within one provider; two different providers may define the
/// same name and an [`crate::aggregator::AggregatingProvider`] decides which wins.
#[derive(Clone, Default)]
pub struct UdfProvider {
    functions: FxHashMap<String, Arc<dyn Function>>,
    order: Vec<String>,
}

impl std::fmt::Debug for UdfProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdfProvider")
            .field("functions", &self.order)
            .finish()
    }
}

impl UdfProvider {
    /// Pair `names[i]` with `handles[i]`.
    pub fn build<S: AsRef<str>>(
        names: &[S],
        handles: Vec<Arc<dyn CustomFnHandler>>,
    ) -> Result<Self, RegistryError> {
        if names.len() != handles.len() {
            return Err(RegistryError::LengthMismatch {
                names: names.len(),
                handles: handles.len(),
            });
        }
        names
            .iter()
            .zip(handles)
            .fold(UdfProvider::builder(), |b, (name, handler)| {
                b.handler(name.as_ref(), CustomFnOptions::default(), handler)
            })
            .build()
    }

    pub fn builder() -> UdfProviderBuilder {
        UdfProviderBuilder::default()
    }

    /// Case-insensitive lookup.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions
            .get(&name.trim().to_ascii_uppercase())
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FunctionProvider for UdfProvider {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        if ns.is_empty() { self.find(name) } else { None }
    }
}

enum Pending {
    Handler(CustomFnOptions, Arc<dyn CustomFnHandler>),
    Raw(Arc<dyn Function>),
}

/// Collects registrations; all validation happens in [`UdfProviderBuilder::build`].
#[derive(Default)]
pub struct UdfProviderBuilder {
    entries: Vec<(String, Pending)>,
}

impl UdfProviderBuilder {
    pub fn function<H>(self, name: &str, handler: H) -> Self
    where
        H: CustomFnHandler + 'static,
    {
        self.handler(name, CustomFnOptions::default(), Arc::new(handler))
    }

    pub fn function_with_options<H>(self, name: &str, options: CustomFnOptions, handler: H) -> Self
    where
        H: CustomFnHandler + 'static,
    {
        self.handler(name, options, Arc::new(handler))
    }

    pub fn handler(
        mut self,
        name: &str,
        options: CustomFnOptions,
        handler: Arc<dyn CustomFnHandler>,
    ) -> Self {
        self.entries
            .push((name.to_string(), Pending::Handler(options, handler)));
        self
    }

    /// Register a full [`Function`] (lazy arguments, own caps).
    pub fn raw(mut self, name: &str, function: Arc<dyn Function>) -> Self {
        self.entries.push((name.to_string(), Pending::Raw(function)));
        self
    }

    pub fn build(self) -> Result<UdfProvider, RegistryError> {
        let mut functions: FxHashMap<String, Arc<dyn Function>> = FxHashMap::default();
        let mut order = Vec::with_capacity(self.entries.len());

        for (name, pending) in self.entries {
            let canonical = normalize_fn_name(&name)?;
            if functions.contains_key(&canonical) {
                return Err(RegistryError::DuplicateName { name: canonical });
            }
            let function: Arc<dyn Function> = match pending {
                Pending::Handler(options, handler) => {
                    if let Some(max) = options.max_args
                        && max < options.min_args
                    {
                        return Err(RegistryError::InvalidArity {
                            name: canonical,
                            min: options.min_args,
                            max,
                        });
                    }
                    Arc::new(CustomFunction::new(canonical.clone(), options, handler))
                }
                Pending::Raw(f) => f,
            };
            functions.insert(canonical.clone(), function);
            order.push(canonical);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(functions = order.len(), "built function provider");

        Ok(UdfProvider { functions, order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FunctionContext;
    use cellfn_common::{ExcelError, LiteralValue};

    fn noop(_: &[LiteralValue], _: &dyn FunctionContext) -> Result<LiteralValue, ExcelError> {
        Ok(LiteralValue::Empty)
    }

    fn handles(n: usize) -> Vec<Arc<dyn CustomFnHandler>> {
        (0..n)
            .map(|_| Arc::new(noop) as Arc<dyn CustomFnHandler>)
            .collect()
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let p = UdfProvider::build(&["myFunc"], handles(1)).unwrap();
        assert!(p.find("MYFUNC").is_some());
        assert!(p.find("myfunc").is_some());
        assert!(p.find(" MyFunc ").is_some());
        assert!(p.find("myFunc2").is_none());
        assert_eq!(p.names(), &["MYFUNC".to_string()]);
    }

    #[test]
    fn duplicate_names_fail_at_build_time() {
        let err = UdfProvider::build(&["dupe", "DUPE"], handles(2)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                name: "DUPE".into()
            }
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = UdfProvider::build(&["a", "b"], handles(1)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::LengthMismatch {
                names: 2,
                handles: 1
            }
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = UdfProvider::builder().function("   ", noop).build().unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn inverted_arity_is_rejected() {
        let err = UdfProvider::builder()
            .function_with_options(
                "bad",
                CustomFnOptions {
                    min_args: 3,
                    max_args: Some(1),
                    ..Default::default()
                },
                noop,
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArity { min: 3, max: 1, .. }));
        assert!(err.to_string().contains("BAD"));
    }

    #[test]
    fn operator_namespaces_are_not_served() {
        let p = UdfProvider::build(&["+"], handles(1)).unwrap();
        assert!(p.get_function("", "+").is_some());
        assert!(p.get_function(crate::builtins::BINARY_OP_NS, "+").is_none());
    }

    #[test]
    fn empty_provider_is_valid() {
        let p = UdfProvider::build::<&str>(&[], Vec::new()).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
    }
}
