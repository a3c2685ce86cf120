//! Public entry point: load an agent, collect, identify.
//!
//! `load` binds a set of sources, optionally reports a heavily sampled
//! usage ping, and waits out a short warm-up delay so other page-load work
//! (fonts, CSS) can settle before sampling begins. The returned [`Agent`]
//! then produces one [`GetResult`] per `get` call: components and
//! confidence eagerly, the visitor identifier lazily on first read.

use std::env::consts;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::VERSION;
use crate::clock::{MonotonicClock, SharedClock};
use crate::component::{Components, components_to_debug_string};
use crate::confidence::{Confidence, confidence};
use crate::hash::hash_components;
use crate::scheduler::{DEFAULT_LOOP_RELEASE_INTERVAL, load_sources};
use crate::source::{SourceContext, SourceRegistry};

/// Share of `load` calls that report a usage ping. A draw at or above this
/// threshold skips the ping; the rate is fixed, only on/off is exposed.
const MONITORING_SAMPLE_RATE: f64 = 0.001;

/// Warm-up timer used when the host has no idle primitive to offer.
const DEFAULT_DELAY_FALLBACK: Duration = Duration::from_millis(50);

/// Host-provided idle primitive.
///
/// When present, the warm-up delay resolves on the host's next idle period
/// instead of a fixed timer, bounded by `deadline`. Either path behaves the
/// same from the caller's point of view: a future that resolves once, with
/// no value.
#[async_trait]
pub trait IdleHook: Send + Sync {
    async fn idle(&self, deadline: Duration);
}

/// Delivery channel for the usage ping.
pub trait PingSink: Send + Sync {
    fn send(&self, ping: &UsagePing);
}

/// Privacy-light usage report: library version and coarse host facts only.
#[derive(Debug, Clone, Serialize)]
pub struct UsagePing {
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

/// Default sink: report on the log channel.
struct LogPingSink;

impl PingSink for LogPingSink {
    fn send(&self, ping: &UsagePing) {
        log::debug!(
            "usage ping: {}",
            serde_json::to_string(ping).unwrap_or_default()
        );
    }
}

/// Options for [`load`].
pub struct LoadOptions {
    /// Sources to bind, in collection order.
    pub sources: SourceRegistry,
    /// Warm-up delay used when no idle hook is injected.
    pub delay_fallback: Duration,
    /// Emit the diagnostic dump on every `get`.
    pub debug: bool,
    /// Usage-ping reporting. On by default; sampled hard at 0.1%.
    pub monitoring: bool,
    /// Host idle primitive, if the environment has one.
    pub idle_hook: Option<Arc<dyn IdleHook>>,
    /// Usage-ping delivery override; defaults to the log channel.
    pub ping_sink: Option<Arc<dyn PingSink>>,
    /// Clock override for deterministic tests.
    pub clock: Option<SharedClock>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sources: SourceRegistry::new(),
            delay_fallback: DEFAULT_DELAY_FALLBACK,
            debug: false,
            monitoring: true,
            idle_hook: None,
            ping_sink: None,
            clock: None,
        }
    }
}

/// Options for [`Agent::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Emit the diagnostic dump for this call.
    pub debug: bool,
    /// Registry keys to leave out of this collection run.
    pub exclude: Vec<String>,
}

/// Result of one collection run.
#[derive(Debug, Clone)]
pub struct GetResult {
    /// One entry per included source, in registration order.
    pub components: Components,
    /// Heuristic confidence in the identifier.
    pub confidence: Confidence,
    /// Library version the result was produced with.
    pub version: &'static str,
    visitor_id: OnceLock<String>,
}

impl GetResult {
    pub(crate) fn new(components: Components, confidence: Confidence) -> Self {
        Self {
            components,
            confidence,
            version: VERSION,
            visitor_id: OnceLock::new(),
        }
    }

    /// The visitor identifier: 32 lowercase hex characters.
    ///
    /// Computed from `components` on first access and cached; later reads
    /// return the cached value unconditionally, it is never recomputed.
    pub fn visitor_id(&self) -> &str {
        self.visitor_id
            .get_or_init(|| hash_components(&self.components))
    }
}

/// Bound engine instance produced by [`load`].
pub struct Agent {
    sources: SourceRegistry,
    clock: SharedClock,
    loaded_at: Duration,
    debug: bool,
}

/// Bind sources and produce an agent.
///
/// Fires the sampled usage ping first when monitoring is on — fire and
/// forget, panic-proof, invisible to the rest of the call — then awaits the
/// warm-up delay: the injected idle hook when present, a plain timer
/// otherwise.
pub async fn load(options: LoadOptions) -> Agent {
    let LoadOptions {
        sources,
        delay_fallback,
        debug,
        monitoring,
        idle_hook,
        ping_sink,
        clock,
    } = options;

    if monitoring && rand::random::<f64>() < MONITORING_SAMPLE_RATE {
        deliver_ping(ping_sink.as_deref().unwrap_or(&LogPingSink));
    }

    // Let fonts, CSS and other page-load entropy settle before sampling.
    match &idle_hook {
        Some(hook) => hook.idle(delay_fallback.saturating_mul(2)).await,
        None => tokio::time::sleep(delay_fallback).await,
    }

    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
    let loaded_at = clock.now();
    Agent {
        sources,
        clock,
        loaded_at,
        debug,
    }
}

fn deliver_ping(sink: &dyn PingSink) {
    let ping = UsagePing {
        version: VERSION,
        os: consts::OS,
        arch: consts::ARCH,
    };
    // The sink is embedder code; a broken one must not take `load` down.
    if std::panic::catch_unwind(AssertUnwindSafe(|| sink.send(&ping))).is_err() {
        log::debug!("usage ping sink panicked; ignoring");
    }
}

impl Agent {
    /// Run one collection over the bound sources.
    ///
    /// Always resolves: individual source failures surface as component
    /// errors inside the result, never as a failure of this call.
    pub async fn get(&self, options: GetOptions) -> GetResult {
        let debug = options.debug || self.debug;
        let cx = Arc::new(SourceContext { debug });
        let excluded: Vec<&str> = options.exclude.iter().map(String::as_str).collect();

        let mut collector = load_sources(
            &self.sources,
            cx,
            &excluded,
            Arc::clone(&self.clock),
            DEFAULT_LOOP_RELEASE_INTERVAL,
        );
        let components = collector.collect().await;
        let confidence = confidence(&components);
        let result = GetResult::new(components, confidence);

        if debug {
            self.emit_debug_dump(&result);
        }
        result
    }

    fn emit_debug_dump(&self, result: &GetResult) {
        let since_load = self.clock.now().saturating_sub(self.loaded_at);
        log::debug!(
            "visitor identification\nversion: {}\nenvironment: {} {}\ntime between load and get: {:?}\nvisitor id: {}\ncomponents: {}",
            result.version,
            consts::OS,
            consts::ARCH,
            since_load,
            result.visitor_id(),
            components_to_debug_string(&result.components),
        );
    }
}
