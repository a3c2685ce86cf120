//! # tabprint-core
//!
//! **Turn a tab's quirks into a stable visitor identifier.**
//!
//! `tabprint-core` is the identification engine behind tabprint: it drives a
//! pluggable set of heterogeneous, possibly-asynchronous entropy sources on
//! one cooperative event loop, combines their outputs deterministically, and
//! derives a stable pseudo-identifier plus a confidence score — without
//! starving the host loop and without ever failing the pipeline because one
//! signal is unavailable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tabprint_core::{load, GetOptions, LoadOptions, SourceRegistry};
//!
//! # async fn demo() {
//! let sources = SourceRegistry::new();
//! // Register sources here; `sources::reference_sources` is a ready-made set.
//! let agent = load(LoadOptions {
//!     sources,
//!     ..LoadOptions::default()
//! })
//! .await;
//!
//! let result = agent.get(GetOptions::default()).await;
//! println!("visitor id: {}", result.visitor_id());
//! println!("confidence: {}", result.confidence.score);
//! # }
//! ```
//!
//! ## Architecture
//!
//! Sources → Loaders (two-stage, memoized) → Scheduler (cooperative,
//! breath-budgeted) → Components → Canonical string → MurmurHash3 x64/128
//!
//! Every source follows a two-stage load/get contract and is wrapped by a
//! [`SourceLoader`] that contains its failures. The scheduler interleaves
//! asynchronous sources and yields the event loop after every
//! [`DEFAULT_LOOP_RELEASE_INTERVAL`] of synchronous work. Components are
//! canonicalized by sorted key — iteration and finish order can never move
//! the identifier — and hashed to 32 hex characters. Errored sources still
//! contribute to the identifier as a bare error marker, so a partially
//! blocked environment degrades uniqueness instead of failing the call.

pub mod agent;
pub mod canonical;
pub mod clock;
pub mod component;
pub mod confidence;
pub mod hash;
pub mod loader;
pub mod scheduler;
pub mod screen_frame;
pub mod source;
pub mod sources;

pub use agent::{Agent, GetOptions, GetResult, IdleHook, LoadOptions, PingSink, UsagePing, load};
pub use canonical::canonicalize;
pub use clock::{Clock, FakeClock, MonotonicClock, SharedClock};
pub use component::{Component, Components, components_to_debug_string};
pub use confidence::{Confidence, confidence};
pub use hash::{hash_components, murmur3_x64_128, murmur3_x64_128_hex};
pub use loader::SourceLoader;
pub use scheduler::{
    BreathBudget, ComponentCollector, DEFAULT_LOOP_RELEASE_INTERVAL, load_sources,
};
pub use screen_frame::{FrameStabilizer, ScreenFrame};
pub use source::{
    EntropySource, FnSource, GetterFuture, Loaded, RegistryError, SourceContext, SourceError,
    SourceRegistry, SourceValue, from_fn,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
