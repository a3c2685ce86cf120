//! Source loader: one entropy source wrapped into a uniform, memoized
//! asynchronous component accessor.
//!
//! The loader normalizes all the variance a source is allowed to have —
//! synchronous or asynchronous, one stage or two, value or error or panic —
//! behind a single state machine:
//!
//! ```text
//! Loading ──ready value / error / panic──▶ Done
//!    │
//!    └──deferred getter──▶ Getting ──value / error / panic──▶ Done
//! ```
//!
//! Nothing runs until the loader is polled. [`SourceLoader::poke`] polls the
//! load stage exactly once, so a synchronous source completes its load stage
//! inline (no suspension is ever inserted on its behalf) and an asynchronous
//! one parks until [`SourceLoader::resolve`] drives it to completion.
//!
//! Stage durations are measured through the injected [`Clock`](crate::clock::Clock):
//! the load stage from first poll to completion, the get stage from its own
//! first poll to completion. The component carries their sum.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, poll_immediate};

use crate::clock::SharedClock;
use crate::component::Component;
use crate::source::{EntropySource, Loaded, SourceContext, SourceError, SourceValue};

/// Stage future with panic capture applied.
type StageFuture<T> = BoxFuture<'static, Result<Result<T, SourceError>, Box<dyn Any + Send>>>;

enum LoaderState {
    /// Load stage future; not yet polled, or parked on an await point.
    Loading(StageFuture<Loaded>),
    /// Load stage left a deferred getter behind. The future is lazy and
    /// stays untouched until the scheduler's get phase reaches it.
    Getting(StageFuture<SourceValue>),
    /// Final component, cloned out to every caller from here on.
    Done(Component),
}

/// Uniform asynchronous accessor for one source's component.
pub struct SourceLoader {
    name: &'static str,
    clock: SharedClock,
    load_started: Option<Duration>,
    load_duration: Duration,
    get_started: Option<Duration>,
    state: LoaderState,
}

impl SourceLoader {
    /// Wrap a source. The load stage future is created here but does not run
    /// until the loader is first polled.
    pub fn begin(
        source: Arc<dyn EntropySource>,
        cx: Arc<SourceContext>,
        clock: SharedClock,
    ) -> Self {
        let name = source.name();
        let fut = AssertUnwindSafe(async move { source.load(&cx).await })
            .catch_unwind()
            .boxed();
        Self {
            name,
            clock,
            load_started: None,
            load_duration: Duration::ZERO,
            get_started: None,
            state: LoaderState::Loading(fut),
        }
    }

    /// Registry key of the wrapped source.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the final component is already available.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, LoaderState::Done(_))
    }

    /// Poll the load stage exactly once.
    ///
    /// A synchronous source finishes its load stage here; an asynchronous
    /// one is started and left parked for [`resolve`](Self::resolve).
    pub async fn poke(&mut self) {
        if let LoaderState::Loading(fut) = &mut self.state {
            if self.load_started.is_none() {
                self.load_started = Some(self.clock.now());
            }
            let outcome = poll_immediate(fut).await;
            if let Some(outcome) = outcome {
                self.finish_load(outcome);
            }
        }
    }

    /// Poll the get stage exactly once, starting its duration measurement.
    ///
    /// No-op unless the load stage already completed with a deferred getter;
    /// a still-loading source picks its get stage up inside `resolve`.
    pub async fn start_get(&mut self) {
        if let LoaderState::Getting(fut) = &mut self.state {
            if self.get_started.is_none() {
                self.get_started = Some(self.clock.now());
            }
            let outcome = poll_immediate(fut).await;
            if let Some(outcome) = outcome {
                self.finish_get(outcome);
            }
        }
    }

    /// Drive both stages to completion and return the component.
    ///
    /// Memoized: repeated calls return the same component and the underlying
    /// source work runs exactly once.
    pub async fn resolve(&mut self) -> Component {
        loop {
            match &mut self.state {
                LoaderState::Done(component) => return component.clone(),
                LoaderState::Loading(fut) => {
                    if self.load_started.is_none() {
                        self.load_started = Some(self.clock.now());
                    }
                    let outcome = fut.as_mut().await;
                    self.finish_load(outcome);
                }
                LoaderState::Getting(fut) => {
                    if self.get_started.is_none() {
                        self.get_started = Some(self.clock.now());
                    }
                    let outcome = fut.as_mut().await;
                    self.finish_get(outcome);
                }
            }
        }
    }

    fn finish_load(&mut self, outcome: Result<Result<Loaded, SourceError>, Box<dyn Any + Send>>) {
        let now = self.clock.now();
        self.load_duration = now.saturating_sub(self.load_started.unwrap_or(now));
        self.state = match outcome {
            Err(payload) => {
                LoaderState::Done(Component::failed(panic_error(payload), self.load_duration))
            }
            Ok(Err(error)) => LoaderState::Done(Component::failed(error, self.load_duration)),
            Ok(Ok(Loaded::Ready(value))) => {
                LoaderState::Done(Component::ok(value, self.load_duration))
            }
            Ok(Ok(Loaded::Deferred(getter))) => {
                LoaderState::Getting(AssertUnwindSafe(getter).catch_unwind().boxed())
            }
        };
    }

    fn finish_get(
        &mut self,
        outcome: Result<Result<SourceValue, SourceError>, Box<dyn Any + Send>>,
    ) {
        let now = self.clock.now();
        let get_duration = now.saturating_sub(self.get_started.unwrap_or(now));
        let duration = self.load_duration + get_duration;
        let component = match outcome {
            Err(payload) => Component::failed(panic_error(payload), duration),
            Ok(Err(error)) => Component::failed(error, duration),
            Ok(Ok(value)) => Component::ok(value, duration),
        };
        self.state = LoaderState::Done(component);
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> SourceError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "source panicked".to_owned()
    };
    SourceError::with_name("Panic", message)
}
