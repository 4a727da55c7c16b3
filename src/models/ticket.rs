//! Ticket records as returned in search `results`.
//!
//! `Ticket` is a read-only view over one entry of a page's `results` array.
//! Only the members needed for exports are decoded; anything missing or
//! `null` decodes to its empty value so that sparse records still project.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A support ticket.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ticket {
    /// Ticket id (numeric in the API, kept as text).
    #[serde(default, deserialize_with = "deserialize_string_or_int")]
    pub id: String,

    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,

    /// Ticket subject line.
    #[serde(default)]
    pub subject: Option<String>,

    /// First comment of the ticket.
    #[serde(default)]
    pub description: Option<String>,

    /// Status name (`new`, `open`, `pending`, `solved`, `closed`, ...).
    #[serde(default)]
    pub status: Option<String>,

    /// Channel the ticket came in through.
    #[serde(default)]
    pub via: Option<Via>,

    /// Custom field values, in the order the account defines them.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub fields: Vec<CustomField>,
}

/// The `via` block of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Via {
    /// Channel name (`web`, `email`, `api`, ...).
    #[serde(default)]
    pub channel: Option<String>,

    /// Details of where the ticket came from.
    #[serde(default)]
    pub source: Option<ViaSource>,
}

/// `via.source`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViaSource {
    /// The originating party.
    #[serde(default)]
    pub from: Option<ViaParty>,
}

/// `via.source.from`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViaParty {
    /// Display name of the source.
    #[serde(default)]
    pub name: Option<String>,
}

/// One `{id, value}` entry of a ticket's custom fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomField {
    /// Ticket field id.
    #[serde(default)]
    pub id: Option<u64>,

    /// Raw value; `null` when unset.
    #[serde(default)]
    pub value: Value,
}

impl Ticket {
    /// Reads a ticket out of one `results` entry.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Ticket::deserialize(value)
    }

    /// The `YYYY-MM-DD` part of `created_at`.
    ///
    /// Timestamps that are not RFC 3339 use a leading `YYYY-MM-DD` when there
    /// is one, otherwise the text before the first `T` or space.
    pub fn created_date(&self) -> String {
        let Some(raw) = self.created_at.as_deref() else {
            return String::new();
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return ts.date_naive().format("%Y-%m-%d").to_string();
        }
        if let Some(date) = raw
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        {
            return date.format("%Y-%m-%d").to_string();
        }
        raw.split(['T', ' ']).next().unwrap_or_default().to_string()
    }

    /// `via.source.from.name`, or an empty string.
    pub fn source_name(&self) -> &str {
        self.via
            .as_ref()
            .and_then(|via| via.source.as_ref())
            .and_then(|source| source.from.as_ref())
            .and_then(|from| from.name.as_deref())
            .unwrap_or_default()
    }

    /// Value of the custom field at `index` in `fields`.
    pub fn field_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|field| &field.value)
    }

    /// Value of the custom field whose id is `id`.
    pub fn field_by_id(&self, id: u64) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.id == Some(id))
            .map(|field| &field.value)
    }
}

fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a string, an integer, or `null` into a `String`.
fn deserialize_string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrIntVisitor;

    impl<'de> Visitor<'de> for StringOrIntVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("null, a string, or an integer")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(String::new())
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrIntVisitor)
}
