//! Wire-level models shared by the session and backend implementations.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::BackendError;

/// Opaque identifier of one list row. Servers may send strings or integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Unsigned(value) => Self(value.to_string()),
            Raw::Signed(value) => Self(value.to_string()),
            Raw::Text(value) => Self(value),
        })
    }
}

/// A managed entity shown as one row of the list.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable identifier of the entity.
    fn id(&self) -> ItemId;

    /// Current status label, for entities that carry one.
    fn status(&self) -> Option<&str> {
        None
    }
}

/// Schemaless entity used when the caller has no typed model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier field.
    pub id: ItemId,
    /// Every other field, as sent by the server.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Read a raw field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Read a boolean field.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Best-effort display title (`title`, then `name`).
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        ["title", "name"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
    }
}

impl Entity for Record {
    fn id(&self) -> ItemId {
        self.id.clone()
    }

    fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }
}

/// Aggregate counters shown above the list. Shape is owned by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stats(Map<String, Value>);

impl Stats {
    /// Wrap a JSON object.
    #[must_use]
    pub const fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Read one statistic.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read one statistic as a non-negative count.
    #[must_use]
    pub fn count(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Whether no statistics are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate statistics in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Stats {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

/// Body returned by mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Application-level outcome.
    #[serde(default, alias = "ok")]
    pub success: bool,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Any additional payload fields.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Reply {
    /// Successful reply with an optional message.
    #[must_use]
    pub fn ok(message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            data: Map::new(),
        }
    }

    /// Failed reply with an optional message.
    #[must_use]
    pub fn failed(message: Option<&str>) -> Self {
        Self {
            success: false,
            message: message.map(str::to_string),
            data: Map::new(),
        }
    }

    /// Convert `success: false` into [`BackendError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] when the server reported failure.
    pub fn into_result(self) -> Result<Self, BackendError> {
        if self.success {
            Ok(self)
        } else {
            Err(BackendError::Rejected {
                message: self.message,
            })
        }
    }
}

/// Search term plus categorical filters describing the wanted list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Free-text search term.
    #[serde(default)]
    pub term: String,
    /// Categorical filters keyed by field name.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    /// Query with only a search term.
    #[must_use]
    pub fn with_term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            filters: BTreeMap::new(),
        }
    }

    /// Set or clear one filter. Empty values clear the filter.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match value.filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                self.filters.insert(key, value);
            }
            None => {
                self.filters.remove(&key);
            }
        }
    }

    /// Encode as a URL query string (`search=...&key=value`).
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let term = self.term.trim();
        if !term.is_empty() {
            serializer.append_pair("search", term);
        }
        for (key, value) in &self.filters {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// Result of the JSON search endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    /// Rows matching the query, in display order.
    pub items: Vec<T>,
    /// Aggregate statistics for the result.
    #[serde(default)]
    pub stats: Stats,
}

/// Result of the markup filter endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFragment {
    /// Replacement markup for the list container.
    pub markup: String,
    /// Row identifiers present in the markup, in display order.
    pub row_ids: Vec<ItemId>,
    /// Statistics embedded in the response, when available.
    pub stats: Option<Stats>,
}

/// Severity of a notification or realtime event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    #[serde(alias = "danger")]
    Error,
    /// Operation was rejected client-side or needs attention.
    Warning,
    /// Neutral information.
    #[default]
    Info,
}

impl NoticeKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Server-pushed event, displayed once and discarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Severity.
    #[serde(default, alias = "type")]
    pub kind: NoticeKind,
    /// Short heading.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Emission time; receive time when the server omits it.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_ids_accept_numbers_and_strings() {
        let ids: Vec<ItemId> = serde_json::from_value(json!([42, "abc", -7])).unwrap();
        assert_eq!(ids, vec![ItemId::from(42), ItemId::from("abc"), ItemId::from("-7")]);
        assert_eq!(serde_json::to_value(&ids[0]).unwrap(), json!("42"));
    }

    #[test]
    fn record_reads_status_and_title() {
        let record: Record = serde_json::from_value(json!({
            "id": 3,
            "name": "Episode 3",
            "status": "draft",
            "is_verified": false
        }))
        .unwrap();
        assert_eq!(record.id(), ItemId::from(3));
        assert_eq!(record.status(), Some("draft"));
        assert_eq!(record.title(), Some("Episode 3"));
        assert_eq!(record.flag("is_verified"), Some(false));
    }

    #[test]
    fn reply_accepts_ok_alias_and_keeps_payload() {
        let reply: Reply =
            serde_json::from_value(json!({"ok": true, "message": "done", "count": 2})).unwrap();
        assert!(reply.success);
        assert_eq!(reply.message.as_deref(), Some("done"));
        assert_eq!(reply.data.get("count"), Some(&json!(2)));
    }

    #[test]
    fn failed_reply_becomes_rejection() {
        let err = Reply::failed(Some("nope")).into_result().unwrap_err();
        assert_eq!(
            err,
            BackendError::Rejected {
                message: Some("nope".into())
            }
        );
    }

    #[test]
    fn query_string_skips_blank_term_and_sorts_filters() {
        let mut query = ListQuery::with_term("  ");
        query.set_filter("status", Some("draft".into()));
        query.set_filter("category", Some("kids & family".into()));
        assert_eq!(query.query_string(), "category=kids+%26+family&status=draft");

        query.term = "cat".into();
        query.set_filter("status", Some(String::new()));
        assert_eq!(query.query_string(), "search=cat&category=kids+%26+family");
    }

    #[test]
    fn realtime_event_defaults_missing_fields() {
        let event: RealtimeEvent =
            serde_json::from_value(json!({"type": "danger", "message": "disk full"})).unwrap();
        assert_eq!(event.kind, NoticeKind::Error);
        assert!(event.title.is_empty());
        assert_eq!(event.message, "disk full");
    }

    #[test]
    fn stats_count_reads_integers() {
        let stats: Stats = serde_json::from_value(json!({"total": 12, "ratio": 0.5})).unwrap();
        assert_eq!(stats.count("total"), Some(12));
        assert_eq!(stats.count("ratio"), None);
        assert!(!stats.is_empty());
    }
}
