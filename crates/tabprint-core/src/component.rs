//! Per-source outcomes and the ordered components record.

use std::time::Duration;

use serde_json::json;

use crate::source::{SourceError, SourceValue};

/// Result of one source for one collection run.
///
/// Exactly one of value/error exists, carried by the `Result`. `duration`
/// is the time spent across both stages (load + get).
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub result: Result<SourceValue, SourceError>,
    pub duration: Duration,
}

impl Component {
    pub fn ok(value: impl Into<SourceValue>, duration: Duration) -> Self {
        Self {
            result: Ok(value.into()),
            duration,
        }
    }

    pub fn failed(error: SourceError, duration: Duration) -> Self {
        Self {
            result: Err(error),
            duration,
        }
    }

    pub fn value(&self) -> Option<&SourceValue> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&SourceError> {
        self.result.as_ref().err()
    }
}

/// Ordered mapping from source name to [`Component`].
///
/// One entry per registered, non-excluded source, in registration order.
/// Built fresh for every collection run; key order is normalized later by
/// the canonicalizer, so iteration order never leaks into the identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    entries: Vec<(String, Component)>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing any previous component under the same name
    /// so the key set stays unique.
    pub fn insert(&mut self, name: impl Into<String>, component: Component) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = component;
        } else {
            self.entries.push((name, component));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Component)> for Components {
    fn from_iter<I: IntoIterator<Item = (String, Component)>>(iter: I) -> Self {
        let mut components = Self::new();
        for (name, component) in iter {
            components.insert(name, component);
        }
        components
    }
}

/// Serialize a components record for diagnostics.
///
/// Pretty-printed JSON; errored entries become `{"error": {"name", "message"}}`
/// objects so failures read like data instead of disappearing into a string.
pub fn components_to_debug_string(components: &Components) -> String {
    let mut map = serde_json::Map::new();
    for (name, component) in components.iter() {
        let duration_ms = component.duration.as_millis() as u64;
        let entry = match &component.result {
            Ok(value) => json!({ "value": value, "duration": duration_ms }),
            Err(error) => json!({
                "error": { "name": error.name, "message": error.message },
                "duration": duration_ms,
            }),
        };
        map.insert(name.to_owned(), entry);
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(map))
        .expect("JSON map serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn component_value_and_error_are_exclusive() {
        let ok = Component::ok("Win32", ms(1));
        assert_eq!(ok.value(), Some(&json!("Win32")));
        assert!(ok.error().is_none());

        let failed = Component::failed(SourceError::new("denied"), ms(2));
        assert!(failed.value().is_none());
        assert_eq!(failed.error().unwrap().message, "denied");
    }

    #[test]
    fn insert_preserves_insertion_order() {
        let mut components = Components::new();
        components.insert("platform", Component::ok("Win32", ms(0)));
        components.insert("fonts", Component::ok(json!(["Arial"]), ms(3)));
        components.insert("audio", Component::ok(35.7, ms(20)));
        assert_eq!(components.names(), vec!["platform", "fonts", "audio"]);
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let mut components = Components::new();
        components.insert("platform", Component::ok("Win32", ms(0)));
        components.insert("fonts", Component::ok(json!(["Arial"]), ms(3)));
        components.insert("platform", Component::ok("MacIntel", ms(1)));
        assert_eq!(components.len(), 2);
        assert_eq!(components.names(), vec!["platform", "fonts"]);
        assert_eq!(
            components.get("platform").unwrap().value(),
            Some(&json!("MacIntel"))
        );
    }

    #[test]
    fn from_iterator_collects_in_order() {
        let components: Components = vec![
            ("b".to_owned(), Component::ok(1, ms(0))),
            ("a".to_owned(), Component::ok(2, ms(0))),
        ]
        .into_iter()
        .collect();
        assert_eq!(components.names(), vec!["b", "a"]);
    }

    #[test]
    fn debug_string_spells_out_errors() {
        let mut components = Components::new();
        components.insert("platform", Component::ok("Linux x86_64", ms(1)));
        components.insert(
            "canvas",
            Component::failed(
                SourceError::with_name("SecurityError", "canvas read blocked"),
                ms(4),
            ),
        );

        let dump = components_to_debug_string(&components);
        let parsed: serde_json::Value = serde_json::from_str(&dump).unwrap();
        assert_eq!(parsed["platform"]["value"], json!("Linux x86_64"));
        assert_eq!(parsed["canvas"]["error"]["name"], json!("SecurityError"));
        assert_eq!(
            parsed["canvas"]["error"]["message"],
            json!("canvas read blocked")
        );
        assert_eq!(parsed["canvas"]["duration"], json!(4));
    }
}
