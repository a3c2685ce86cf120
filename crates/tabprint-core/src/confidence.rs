//! Heuristic confidence scoring for a collected components record.
//!
//! The score estimates how distinguishing the collected signals are likely
//! to be for this device population. It is driven by engine/platform
//! detection only: engines that aggressively normalize or partition
//! entropy (Android WebView, mobile WebKit) score low, long-tail desktop
//! platforms score high. Everything here is a pure function of the
//! components record — no I/O, no randomness, no mutation.

use crate::component::{Component, Components};
use crate::source::SourceValue;
use crate::sources::helpers::round_to;

/// Comment template for the informational upgrade hint; `$` is replaced by
/// the upgrade score. Carries no behavioral contract.
pub const UPGRADE_HINT_TEMPLATE: &str = "$ if upgraded to the server-side identification API";

/// Confidence in the identifier derived from the same components record.
#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    /// Heuristic trustworthiness in `[0, 1]`.
    pub score: f64,
    /// Informational hint embedding the non-binding upgrade score.
    pub comment: String,
}

/// Score a components record.
///
/// Decision table, first match wins:
///
/// | condition                        | score |
/// |----------------------------------|-------|
/// | Android engine                   | 0.4   |
/// | WebKit, mobile or tablet         | 0.3   |
/// | WebKit, desktop Safari           | 0.5   |
/// | platform starts with `Win`       | 0.6   |
/// | platform starts with `Mac`       | 0.5   |
/// | anything else                    | 0.7   |
pub fn confidence(components: &Components) -> Confidence {
    let score = base_score(components);
    let upgraded = round_to(0.99 + 0.01 * score, 0.0001);
    Confidence {
        score,
        comment: UPGRADE_HINT_TEMPLATE.replace('$', &upgraded.to_string()),
    }
}

fn base_score(components: &Components) -> f64 {
    if is_android_engine(components) {
        0.4
    } else if is_webkit_engine(components) {
        if is_desktop_webkit(components) { 0.5 } else { 0.3 }
    } else {
        let platform = platform_string(components);
        if platform.starts_with("Win") {
            0.6
        } else if platform.starts_with("Mac") {
            0.5
        } else {
            0.7
        }
    }
}

/// Whether the components look like an Android browser engine.
///
/// Android builds report ARM Linux platform strings (`"Linux armv81"`,
/// `"Linux aarch64"`) or, on some WebViews, a literal `"Android"`.
pub fn is_android_engine(components: &Components) -> bool {
    let platform = platform_string(components);
    platform.starts_with("Android")
        || platform.starts_with("Linux arm")
        || platform.starts_with("Linux aarch64")
}

/// Whether the components look like a WebKit engine (Safari family).
pub fn is_webkit_engine(components: &Components) -> bool {
    vendor_string(components) == "Apple Computer, Inc."
}

/// Whether a WebKit engine is desktop Safari rather than mobile/tablet.
///
/// Desktop Safari reports a Mac platform with no touch points; iPadOS
/// reports the same platform string but with touch support.
pub fn is_desktop_webkit(components: &Components) -> bool {
    platform_string(components).starts_with("Mac") && max_touch_points(components) == 0
}

fn platform_string(components: &Components) -> &str {
    component_str(components, "platform")
}

fn vendor_string(components: &Components) -> &str {
    component_str(components, "vendor")
}

fn component_str<'a>(components: &'a Components, name: &str) -> &'a str {
    components
        .get(name)
        .and_then(Component::value)
        .and_then(SourceValue::as_str)
        .unwrap_or("")
}

fn max_touch_points(components: &Components) -> u64 {
    components
        .get("touch_support")
        .and_then(Component::value)
        .and_then(|value| value.get("max_touch_points"))
        .and_then(SourceValue::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn fixture(platform: &str, vendor: &str, touch_points: u64) -> Components {
        let mut components = Components::new();
        components.insert("platform", Component::ok(platform, Duration::ZERO));
        components.insert("vendor", Component::ok(vendor, Duration::ZERO));
        components.insert(
            "touch_support",
            Component::ok(json!({ "max_touch_points": touch_points }), Duration::ZERO),
        );
        components
    }

    fn assert_scored(components: &Components, score: f64, comment: &str) {
        let result = confidence(components);
        assert!(
            (result.score - score).abs() < f64::EPSILON,
            "expected score {score}, got {}",
            result.score
        );
        assert_eq!(result.comment, comment);
    }

    #[test]
    fn android_engine_scores_lowest_tier() {
        assert_scored(
            &fixture("Linux armv81", "Google Inc.", 5),
            0.4,
            "0.994 if upgraded to the server-side identification API",
        );
        assert_scored(
            &fixture("Android", "", 5),
            0.4,
            "0.994 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn mobile_webkit_scores_below_android() {
        assert_scored(
            &fixture("iPhone", "Apple Computer, Inc.", 5),
            0.3,
            "0.993 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn ipados_counts_as_mobile_webkit_despite_mac_platform() {
        assert_scored(
            &fixture("MacIntel", "Apple Computer, Inc.", 5),
            0.3,
            "0.993 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn desktop_safari_scores_mid_tier() {
        assert_scored(
            &fixture("MacIntel", "Apple Computer, Inc.", 0),
            0.5,
            "0.995 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn windows_platforms_score_above_mac() {
        assert_scored(
            &fixture("Win32", "Google Inc.", 0),
            0.6,
            "0.996 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn mac_on_a_non_webkit_engine_scores_mid_tier() {
        assert_scored(
            &fixture("MacIntel", "Google Inc.", 0),
            0.5,
            "0.995 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn desktop_linux_falls_through_to_the_top_tier() {
        assert_scored(
            &fixture("Linux x86_64", "Google Inc.", 0),
            0.7,
            "0.997 if upgraded to the server-side identification API",
        );
    }

    #[test]
    fn missing_platform_falls_through_to_the_top_tier() {
        let components = Components::new();
        let result = confidence(&components);
        assert!((result.score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn errored_platform_component_is_treated_as_absent() {
        let mut components = Components::new();
        components.insert(
            "platform",
            Component::failed(crate::source::SourceError::new("gone"), Duration::ZERO),
        );
        let result = confidence(&components);
        assert!((result.score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn scoring_is_pure() {
        let components = fixture("Win32", "Google Inc.", 0);
        let before = components.clone();
        let first = confidence(&components);
        let second = confidence(&components);
        assert_eq!(first, second);
        assert_eq!(components, before);
    }
}
