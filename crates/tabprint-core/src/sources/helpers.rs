//! Shared helpers used by source implementations and the scorer.

use crate::source::SourceValue;

/// Round `value` to the nearest multiple of `base`.
pub fn round_to(value: f64, base: f64) -> f64 {
    (value / base).round() * base
}

/// Turn an optional host string into a component value, keeping absence
/// visible as JSON `null` instead of an empty string.
pub fn opt_string_value(value: Option<String>) -> SourceValue {
    match value {
        Some(s) => SourceValue::String(s),
        None => SourceValue::Null,
    }
}
