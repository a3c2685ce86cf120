//! Reference entropy sources backed by a host environment.
//!
//! The engine itself is host-agnostic: sources are pluggable collaborators
//! and embedders are expected to bring their own (a WebView bridge, a wasm
//! host, a device-probe layer). The sources here cover the handful of
//! signals the confidence scorer reads, expressed against the minimal
//! [`HostEnvironment`] trait, so the whole pipeline can run end-to-end
//! in-repo and the plug-in contract has worked examples.

pub mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::screen_frame::{FrameStabilizer, ScreenFrame};
use crate::source::{EntropySource, Loaded, SourceContext, SourceError, SourceRegistry};

/// Minimal view of the hosting browser-like environment.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// Platform identifier as the host reports it (e.g. `"Win32"`,
    /// `"MacIntel"`, `"Linux armv81"`).
    fn platform(&self) -> Option<String>;

    /// Browser vendor string (e.g. `"Google Inc."`, `"Apple Computer, Inc."`).
    fn vendor(&self) -> Option<String>;

    /// Maximum number of simultaneous touch points.
    fn max_touch_points(&self) -> u32;

    /// Live screen available-area frame.
    fn screen_frame(&self) -> ScreenFrame;

    /// Best-effort mitigation when the live frame reading is degenerate,
    /// e.g. briefly leaving fullscreen. Returns whether anything was done.
    async fn exit_fullscreen(&self) -> bool {
        false
    }
}

/// `platform` — the host's platform identifier.
pub struct PlatformSource {
    host: Arc<dyn HostEnvironment>,
}

impl PlatformSource {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl EntropySource for PlatformSource {
    fn name(&self) -> &'static str {
        "platform"
    }

    async fn load(&self, _cx: &SourceContext) -> Result<Loaded, SourceError> {
        Ok(Loaded::Ready(helpers::opt_string_value(
            self.host.platform(),
        )))
    }
}

/// `vendor` — the host's vendor string.
pub struct VendorSource {
    host: Arc<dyn HostEnvironment>,
}

impl VendorSource {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl EntropySource for VendorSource {
    fn name(&self) -> &'static str {
        "vendor"
    }

    async fn load(&self, _cx: &SourceContext) -> Result<Loaded, SourceError> {
        Ok(Loaded::Ready(helpers::opt_string_value(self.host.vendor())))
    }
}

/// `touch_support` — touch capability summary.
pub struct TouchSupportSource {
    host: Arc<dyn HostEnvironment>,
}

impl TouchSupportSource {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl EntropySource for TouchSupportSource {
    fn name(&self) -> &'static str {
        "touch_support"
    }

    async fn load(&self, _cx: &SourceContext) -> Result<Loaded, SourceError> {
        Ok(Loaded::Ready(json!({
            "max_touch_points": self.host.max_touch_points(),
        })))
    }
}

/// `screen_frame` — stabilized screen available-area insets.
///
/// Two-stage source: the load stage claims the watch role and seeds the
/// backup from the live reading; the get stage re-reads, runs the
/// fullscreen mitigation if the reading is degenerate, and reports the
/// stabilized frame.
pub struct ScreenFrameSource {
    host: Arc<dyn HostEnvironment>,
    frames: Arc<FrameStabilizer>,
}

impl ScreenFrameSource {
    pub fn new(host: Arc<dyn HostEnvironment>, frames: Arc<FrameStabilizer>) -> Self {
        Self { host, frames }
    }
}

#[async_trait]
impl EntropySource for ScreenFrameSource {
    fn name(&self) -> &'static str {
        "screen_frame"
    }

    async fn load(&self, _cx: &SourceContext) -> Result<Loaded, SourceError> {
        self.frames.begin_watch();
        self.frames.observe(self.host.screen_frame());

        let host = Arc::clone(&self.host);
        let frames = Arc::clone(&self.frames);
        Ok(Loaded::Deferred(Box::pin(async move {
            let mut reading = host.screen_frame();
            if reading.is_degenerate() && host.exit_fullscreen().await {
                reading = host.screen_frame();
            }
            Ok(frames.stabilize(reading).to_value())
        })))
    }
}

/// All reference sources bound to one host, in canonical registration order.
pub fn reference_sources(
    host: Arc<dyn HostEnvironment>,
    frames: Arc<FrameStabilizer>,
) -> SourceRegistry {
    let sources: [Arc<dyn EntropySource>; 4] = [
        Arc::new(PlatformSource::new(Arc::clone(&host))),
        Arc::new(VendorSource::new(Arc::clone(&host))),
        Arc::new(TouchSupportSource::new(Arc::clone(&host))),
        Arc::new(ScreenFrameSource::new(host, frames)),
    ];
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry
            .register(source)
            .expect("reference source names are distinct");
    }
    registry
}
