//! Cooperative scheduler driving all source loaders on one event loop.
//!
//! The scheduler never spawns tasks or threads. Concurrency comes from
//! interleaving: every loader is started in registration order, then all of
//! them are awaited jointly, so an asynchronous source makes progress while
//! its siblings run. Long stretches of synchronous sources are broken up by
//! a breath budget: once more than [`DEFAULT_LOOP_RELEASE_INTERVAL`] of
//! wall-clock time has passed since the last release, the scheduler yields
//! control back to the event loop before continuing. Cheap batches finish
//! without a single suspension.
//!
//! Collection runs in two phases, mirroring the sources' two-stage
//! protocol:
//!
//! 1. **load** — poke every loader once, in order, under the breath budget;
//! 2. **get** — start every deferred getter the same way, then await the
//!    whole set.
//!
//! A source failure never aborts the run: loaders deliver failures in-band
//! as their component's error.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::clock::SharedClock;
use crate::component::Components;
use crate::loader::SourceLoader;
use crate::source::{SourceContext, SourceRegistry};

/// How much synchronous work may accumulate before the scheduler yields.
pub const DEFAULT_LOOP_RELEASE_INTERVAL: Duration = Duration::from_millis(16);

/// Wall-clock budget between voluntary yields.
///
/// `breathe` is called after each unit of work; it inserts a zero-duration
/// suspension only when the elapsed time since the last release crosses the
/// configured interval, so it costs nothing on fast paths.
pub struct BreathBudget {
    clock: SharedClock,
    interval: Duration,
    last_release: Duration,
    yields_taken: u64,
}

impl BreathBudget {
    pub fn new(clock: SharedClock, interval: Duration) -> Self {
        let last_release = clock.now();
        Self {
            clock,
            interval,
            last_release,
            yields_taken: 0,
        }
    }

    /// Restart the interval measurement, e.g. at a phase boundary.
    pub fn reset(&mut self) {
        self.last_release = self.clock.now();
    }

    /// Yield to the event loop if the budget since the last release is spent.
    pub async fn breathe(&mut self) {
        let now = self.clock.now();
        if now.saturating_sub(self.last_release) >= self.interval {
            self.last_release = now;
            self.yields_taken += 1;
            tokio::task::yield_now().await;
        }
    }

    /// Number of voluntary yields inserted so far.
    pub fn yields_taken(&self) -> u64 {
        self.yields_taken
    }
}

/// Prepared collection run over a filtered, ordered set of loaders.
///
/// Produced by [`load_sources`]; [`collect`](Self::collect) performs the
/// actual run and memoizes its result, so repeated calls are cheap and the
/// sources execute exactly once.
pub struct ComponentCollector {
    loaders: Vec<SourceLoader>,
    budget: BreathBudget,
    collected: Option<Components>,
}

impl ComponentCollector {
    /// Names of the sources included in this run, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.loaders.iter().map(SourceLoader::name).collect()
    }

    /// Voluntary yields inserted by the breath budget so far.
    pub fn yields_taken(&self) -> u64 {
        self.budget.yields_taken()
    }

    /// Run both phases and assemble the components record.
    ///
    /// The record carries exactly the included source names as keys, in
    /// registration order, one component each — errored sources included.
    pub async fn collect(&mut self) -> Components {
        if let Some(components) = &self.collected {
            return components.clone();
        }

        // Load phase: start every source in registration order. Synchronous
        // load stages complete inline; asynchronous ones park.
        self.budget.reset();
        for i in 0..self.loaders.len() {
            self.loaders[i].poke().await;
            self.budget.breathe().await;
        }

        // Get phase: start deferred getters under a fresh budget window...
        self.budget.reset();
        for i in 0..self.loaders.len() {
            self.loaders[i].start_get().await;
            self.budget.breathe().await;
        }

        // ...then await the whole set so pending sources interleave freely.
        let resolved = join_all(self.loaders.iter_mut().map(|loader| async move {
            let component = loader.resolve().await;
            (loader.name().to_owned(), component)
        }))
        .await;

        let components: Components = resolved.into_iter().collect();
        self.collected = Some(components.clone());
        components
    }
}

/// Bind every non-excluded registered source to a loader, ready to collect.
///
/// Exclusion filters by registry key and keeps the registration order of the
/// remainder. Unknown excluded names are ignored.
pub fn load_sources(
    registry: &SourceRegistry,
    cx: Arc<SourceContext>,
    excluded: &[&str],
    clock: SharedClock,
    loop_release_interval: Duration,
) -> ComponentCollector {
    let loaders = registry
        .iter()
        .filter(|source| !excluded.contains(&source.name()))
        .map(|source| SourceLoader::begin(Arc::clone(source), Arc::clone(&cx), Arc::clone(&clock)))
        .collect();
    ComponentCollector {
        loaders,
        budget: BreathBudget::new(clock, loop_release_interval),
        collected: None,
    }
}
