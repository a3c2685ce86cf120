//! Entropy source contract and registry.
//!
//! An entropy source produces one named browser/device signal per collection
//! run. Sources follow a two-stage protocol: a cheap **load** stage (e.g.
//! opening an audio context) and an optional expensive **get** stage (e.g.
//! awaiting the rendered buffer). A source that has its final value at the
//! end of the load stage skips the get stage entirely.
//!
//! Both stages may be synchronous or asynchronous. The boundary normalizes
//! everything to futures: synchronous work simply completes on the first
//! poll, without any artificially introduced suspension, so duration
//! measurement stays accurate for cheap sources.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

/// Arbitrary JSON-serializable signal data produced by a source.
pub type SourceValue = serde_json::Value;

/// Failure captured from a single source invocation.
///
/// Carried as data inside the affected component; never propagated to
/// sibling sources or to the caller of `get()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct SourceError {
    /// Error kind, analogous to an exception class name. `"Error"` unless
    /// the source says otherwise; `"Panic"` for captured panics.
    pub name: String,
    /// Human-readable failure description.
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_owned(),
            message: message.into(),
        }
    }

    pub fn with_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Future driving a source's deferred get stage.
pub type GetterFuture = BoxFuture<'static, Result<SourceValue, SourceError>>;

/// Outcome of a source's load stage.
///
/// Decided exactly once when the load stage completes; downstream code
/// switches on the tag instead of sniffing the value's shape.
pub enum Loaded {
    /// The final value was already produced during the load stage; the get
    /// stage is skipped.
    Ready(SourceValue),
    /// An expensive get stage remains. The future is not polled until the
    /// scheduler's get phase reaches it.
    Deferred(GetterFuture),
}

impl Loaded {
    /// Convenience constructor for sources that finish in one stage.
    pub fn ready(value: impl Into<SourceValue>) -> Self {
        Self::Ready(value.into())
    }
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"<getter>").finish(),
        }
    }
}

/// Shared options bag handed to every source invocation.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    /// Propagated debug flag; sources may emit extra diagnostics when set.
    pub debug: bool,
}

/// Trait every entropy source implements.
///
/// `load` is the stage-1 entry point. Errors returned here (or panics raised
/// here) surface as the component's error; they never abort the run.
#[async_trait]
pub trait EntropySource: Send + Sync {
    /// Registry key. Identity of the source and of its component.
    fn name(&self) -> &'static str;

    /// Run the load stage. Return [`Loaded::Ready`] with a final value, or
    /// [`Loaded::Deferred`] with the get-stage future.
    async fn load(&self, cx: &SourceContext) -> Result<Loaded, SourceError>;
}

/// Closure-backed source, for signals that are naturally just a function.
///
/// The load stage runs the closure synchronously; asynchronous measurement
/// goes into a [`Loaded::Deferred`] getter returned by the closure.
pub struct FnSource<F> {
    name: &'static str,
    body: F,
}

/// Build a source from a plain function. See [`FnSource`].
pub fn from_fn<F>(name: &'static str, body: F) -> FnSource<F>
where
    F: Fn(&SourceContext) -> Result<Loaded, SourceError> + Send + Sync,
{
    FnSource { name, body }
}

#[async_trait]
impl<F> EntropySource for FnSource<F>
where
    F: Fn(&SourceContext) -> Result<Loaded, SourceError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load(&self, cx: &SourceContext) -> Result<Loaded, SourceError> {
        (self.body)(cx)
    }
}

/// Error raised when binding sources to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A source with the same registry key is already bound.
    #[error("source `{0}` is already registered")]
    Duplicate(String),
}

/// Ordered set of registered sources.
///
/// Registration order is collection order and component order; duplicate
/// keys are rejected at registration time rather than surfacing later as a
/// scrambled components record.
#[derive(Default)]
pub struct SourceRegistry {
    entries: Vec<Arc<dyn EntropySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source. Fails if its name is already taken.
    pub fn register(&mut self, source: Arc<dyn EntropySource>) -> Result<(), RegistryError> {
        if self.entries.iter().any(|s| s.name() == source.name()) {
            return Err(RegistryError::Duplicate(source.name().to_owned()));
        }
        self.entries.push(source);
        Ok(())
    }

    /// Registered source names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn EntropySource>> {
        self.entries.iter()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fn_source_produces_ready_value() {
        let source = from_fn("platform", |_cx| Ok(Loaded::ready("Win32")));
        let loaded = source.load(&SourceContext::default()).await.unwrap();
        match loaded {
            Loaded::Ready(value) => assert_eq!(value, json!("Win32")),
            Loaded::Deferred(_) => panic!("expected a ready value"),
        }
    }

    #[tokio::test]
    async fn fn_source_can_defer() {
        let source = from_fn("audio", |_cx| {
            Ok(Loaded::Deferred(Box::pin(async { Ok(json!(0.25)) })))
        });
        let loaded = source.load(&SourceContext::default()).await.unwrap();
        match loaded {
            Loaded::Deferred(getter) => assert_eq!(getter.await.unwrap(), json!(0.25)),
            Loaded::Ready(_) => panic!("expected a deferred getter"),
        }
    }

    #[test]
    fn registry_preserves_registration_order() {
        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(from_fn("b", |_| Ok(Loaded::ready(1)))))
            .unwrap();
        registry
            .register(Arc::new(from_fn("a", |_| Ok(Loaded::ready(2)))))
            .unwrap();
        registry
            .register(Arc::new(from_fn("c", |_| Ok(Loaded::ready(3)))))
            .unwrap();
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(from_fn("fonts", |_| Ok(Loaded::ready(1)))))
            .unwrap();
        let err = registry
            .register(Arc::new(from_fn("fonts", |_| Ok(Loaded::ready(2)))))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("fonts".to_owned()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn source_error_display_includes_kind() {
        let err = SourceError::with_name("SecurityError", "blocked by permissions policy");
        assert_eq!(
            err.to_string(),
            "SecurityError: blocked by permissions policy"
        );
        assert_eq!(SourceError::new("boom").name, "Error");
    }
}
