use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset};
use serde_json::{Map, Value};

use super::{ChangeNotifier, FeedRef};

pub const KEY_ID: &str = "id";
pub const KEY_DATE: &str = "date";
pub const KEY_TITLE: &str = "title";
pub const KEY_AUTHOR: &str = "author";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_TORRENT_URL: &str = "torrentURL";
pub const KEY_LINK: &str = "link";
pub const KEY_IS_READ: &str = "isRead";

/// Open field bag describing one feed item.
pub type ArticleFields = HashMap<String, FieldValue>;

/// Persisted form of an article.
pub type ArticleDocument = Map<String, Value>;

/// A single value in an [`ArticleFields`] bag.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Date(DateTime<FixedOffset>),
    Other(Value),
}

impl FieldValue {
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(dt) => dt.to_rfc3339(),
            FieldValue::Null | FieldValue::Other(_) => String::new(),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            FieldValue::Text(s) => {
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
            FieldValue::Null | FieldValue::Date(_) | FieldValue::Other(_) => false,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(dt) => Some(*dt),
            FieldValue::Text(s) => DateTime::parse_from_rfc3339(s).ok(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(dt) => Value::String(format_date(Some(dt))),
            FieldValue::Other(v) => v.clone(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Other(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::Date(value)
    }
}

/// Persisted date text. Invalid dates have no text form.
pub fn format_date(date: Option<&DateTime<FixedOffset>>) -> String {
    // RFC 2822 only covers four digit years
    date.filter(|dt| (0..=9999).contains(&dt.year()))
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_default()
}

pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(text.trim()).ok()
}

/// One item of a feed with a stable identity.
///
/// Built through [`super::ArticleFactory`]. Everything except the read flag is
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct Article {
    pub(super) feed: FeedRef,
    pub(super) guid: String,
    pub(super) published_at: Option<DateTime<FixedOffset>>,
    pub(super) title: String,
    pub(super) author: String,
    pub(super) description: String,
    pub(super) torrent_url: String,
    pub(super) link: String,
    pub(super) is_read: bool,
    pub(super) raw_fields: ArticleFields,
    pub(super) notifier: ChangeNotifier,
}

impl Article {
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// `None` when the source had no usable date.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Torrent URL to download, falling back to the item link.
    pub fn torrent_url(&self) -> &str {
        if self.torrent_url.is_empty() {
            &self.link
        } else {
            &self.torrent_url
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn feed(&self) -> &FeedRef {
        &self.feed
    }

    pub fn raw_fields(&self) -> &ArticleFields {
        &self.raw_fields
    }

    /// Marks the article read. Listeners hear about it only on the first call.
    pub fn mark_as_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }

        self.is_read = true;
        self.raw_fields
            .insert(KEY_IS_READ.to_string(), FieldValue::Bool(true));
        self.notifier.notify_read(self);
        true
    }

    pub fn is_newer_than(&self, date: &DateTime<FixedOffset>) -> bool {
        self.published_at.map(|d| d > *date).unwrap_or(false)
    }

    pub fn to_document(&self) -> ArticleDocument {
        let mut document: ArticleDocument = self
            .raw_fields
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();

        document.insert(
            KEY_DATE.to_string(),
            Value::String(format_date(self.published_at.as_ref())),
        );

        document
    }
}
