//! Screen-frame readings and their page-lifetime stabilization.
//!
//! Browsers sometimes transiently report an all-zero "available area" frame
//! (certain fullscreen and installed-app states). A frame source therefore
//! keeps the last known non-degenerate reading and substitutes it whenever
//! the live reading collapses. The backup lives for the page lifetime, never
//! expires, and is only ever overwritten by a fresher non-degenerate
//! reading; [`FrameStabilizer::reset`] exists for tests only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::source::SourceValue;

/// Insets of the screen's available area, one per edge, in CSS pixels.
///
/// `None` models an edge the host could not measure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenFrame {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl ScreenFrame {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top: Some(top),
            right: Some(right),
            bottom: Some(bottom),
            left: Some(left),
        }
    }

    /// Whether this reading carries no signal: every edge absent or zero.
    pub fn is_degenerate(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|side| side.is_none_or(|v| v == 0.0))
    }

    /// Component-value form: `[top, right, bottom, left]` with nulls.
    pub fn to_value(&self) -> SourceValue {
        serde_json::json!([self.top, self.right, self.bottom, self.left])
    }
}

/// Page-lifetime backup of the last non-degenerate screen frame.
///
/// Shared by every collection run of one engine instance; the watch flag
/// keeps concurrent runs from starting the observation logic twice.
#[derive(Debug, Default)]
pub struct FrameStabilizer {
    backup: Mutex<Option<ScreenFrame>>,
    watching: AtomicBool,
}

impl FrameStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Remember `reading` if it carries signal; degenerate readings are
    /// never allowed to displace a good backup.
    pub fn observe(&self, reading: ScreenFrame) {
        if !reading.is_degenerate() {
            *self.backup.lock().unwrap() = Some(reading);
        }
    }

    /// Substitute the backup for a degenerate live reading.
    ///
    /// Non-degenerate readings pass through unchanged and refresh the
    /// backup. A degenerate reading with no backup available is returned
    /// as-is.
    pub fn stabilize(&self, reading: ScreenFrame) -> ScreenFrame {
        if reading.is_degenerate() {
            self.backup.lock().unwrap().unwrap_or(reading)
        } else {
            self.observe(reading);
            reading
        }
    }

    /// Claim the watch role. Returns `true` only for the first caller;
    /// subsequent calls are no-ops until [`reset`](Self::reset).
    pub fn begin_watch(&self) -> bool {
        !self.watching.swap(true, Ordering::SeqCst)
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Latest remembered non-degenerate reading, if any.
    pub fn backup(&self) -> Option<ScreenFrame> {
        *self.backup.lock().unwrap()
    }

    /// Test hook: forget the backup and release the watch flag.
    pub fn reset(&self) {
        *self.backup.lock().unwrap() = None;
        self.watching.store(false, Ordering::SeqCst);
    }
}
