//! Decoded response bodies.
//!
//! Zendesk list and search responses share one envelope: the records live
//! under `results` (search) or `tickets` (list), with `count`, `next_page`,
//! `previous_page` and `facets` alongside. `Payload` keeps every key of the
//! body so callers can read fields this crate knows nothing about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ZenexError;

/// Keys that hold record arrays, dropped from logged summaries.
const RECORD_KEYS: &[&str] = &["results", "tickets"];

/// A successful JSON response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Decodes a response body. Anything but a JSON object is malformed.
    pub fn from_body(body: &str) -> Result<Self, ZenexError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the search records, or `None` when the body has no
    /// `results` array.
    pub fn results(&self) -> Option<&Vec<Value>> {
        self.0.get("results").and_then(Value::as_array)
    }

    /// Cursor URL of the next page. Empty strings and `null` mean the last page.
    pub fn next_page(&self) -> Option<&str> {
        self.cursor("next_page")
    }

    /// Cursor URL of the previous page.
    pub fn previous_page(&self) -> Option<&str> {
        self.cursor("previous_page")
    }

    /// Total number of matching records reported by the server.
    pub fn count(&self) -> Option<u64> {
        self.0.get("count").and_then(Value::as_u64)
    }

    /// Facet metadata, when the server returns any.
    pub fn facets(&self) -> Option<&Value> {
        self.0.get("facets").filter(|v| !v.is_null())
    }

    /// Number of records in this page, from whichever record key is present.
    pub fn record_count(&self) -> Option<usize> {
        RECORD_KEYS
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_array))
            .map(Vec::len)
    }

    /// A copy of the body without its record arrays, for logging.
    pub fn summary(&self) -> Value {
        let map = self
            .0
            .iter()
            .filter(|(key, _)| !RECORD_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(map)
    }

    fn cursor(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_body_preserves_all_keys() {
        let body = r#"{
            "results": [{"id": 1}],
            "next_page": "https://acme.zendesk.com/api/v2/search/export?page[after]=abc",
            "previous_page": null,
            "count": 42,
            "facets": {"type": {"ticket": 42}},
            "end_of_stream": false
        }"#;
        let payload = Payload::from_body(body).unwrap();

        assert_eq!(payload.results().map(Vec::len), Some(1));
        assert_eq!(
            payload.next_page(),
            Some("https://acme.zendesk.com/api/v2/search/export?page[after]=abc")
        );
        assert_eq!(payload.previous_page(), None);
        assert_eq!(payload.count(), Some(42));
        assert!(payload.facets().is_some());
        assert_eq!(payload.get("end_of_stream"), Some(&json!(false)));
    }

    #[test]
    fn test_from_body_rejects_non_object() {
        let err = Payload::from_body("[1, 2, 3]").unwrap_err();
        assert!(err.is_transport_fault());

        let err = Payload::from_body("<html>gateway</html>").unwrap_err();
        assert!(err.is_transport_fault());
    }

    #[test]
    fn test_empty_next_page_is_last_page() {
        assert_eq!(payload(json!({"results": [], "next_page": ""})).next_page(), None);
        assert_eq!(payload(json!({"results": [], "next_page": null})).next_page(), None);
        assert_eq!(payload(json!({"results": []})).next_page(), None);
    }

    #[test]
    fn test_results_missing_or_not_array() {
        assert!(payload(json!({"error": "InvalidEndpoint"})).results().is_none());
        assert!(payload(json!({"results": "nope"})).results().is_none());
    }

    #[test]
    fn test_record_count_uses_tickets_key() {
        let p = payload(json!({"tickets": [{"id": 1}, {"id": 2}], "count": 2}));
        assert_eq!(p.record_count(), Some(2));
        assert_eq!(payload(json!({"user": {"id": 1}})).record_count(), None);
    }

    #[test]
    fn test_summary_drops_record_arrays() {
        let p = payload(json!({
            "results": [{"id": 1}],
            "next_page": "https://acme.zendesk.com/next",
            "count": 1
        }));
        assert_eq!(
            p.summary(),
            json!({"next_page": "https://acme.zendesk.com/next", "count": 1})
        );
        // the payload itself is untouched
        assert!(p.results().is_some());
    }
}
