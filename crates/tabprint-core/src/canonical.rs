//! Canonical serialization of a components record.
//!
//! The canonical string is the hashing preimage, so it must be byte-for-byte
//! deterministic: entries are emitted in sorted key order regardless of how
//! the record was assembled, and delimiter characters inside keys are
//! escaped so entry boundaries stay unambiguous.

use crate::component::Components;

/// Literal token contributed by an errored component.
///
/// The error's message is deliberately excluded: transient error text must
/// not move the identifier, only the fact of the error matters.
const ERROR_TOKEN: &str = "error";

/// Render a components record into its canonical string.
///
/// Format: `key:value` entries joined by `|`, keys sorted lexicographically,
/// values as compact JSON (or the `error` token), and `:`/`|`/`\` escaped
/// with a backslash inside keys.
pub fn canonicalize(components: &Components) -> String {
    let mut entries: Vec<_> = components.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut out = String::new();
    for (key, component) in entries {
        if !out.is_empty() {
            out.push('|');
        }
        push_escaped_key(&mut out, key);
        out.push(':');
        match &component.result {
            Ok(value) => out.push_str(
                &serde_json::to_string(value).expect("JSON value serialization cannot fail"),
            ),
            Err(_) => out.push_str(ERROR_TOKEN),
        }
    }
    out
}

fn push_escaped_key(out: &mut String, key: &str) {
    for ch in key.chars() {
        if matches!(ch, ':' | '|' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
}
