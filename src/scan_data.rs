/// Data structures for Quick QR Scan
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title and URL of the tab a scan was taken from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// One decoded QR event.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub id: String,
    pub text: String,
    pub tab_title: String,
    pub tab_url: String,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    /// Persisted form, with the timestamp rendered as RFC 3339 text at
    /// second precision.
    pub fn to_stored(&self) -> StoredRecord {
        StoredRecord {
            id: self.id.clone(),
            text: self.text.clone(),
            tab_title: self.tab_title.clone(),
            tab_url: self.tab_url.clone(),
            timestamp: Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Persisted form of a [`ScanRecord`]. Field shapes are kept loose so one
/// damaged entry degrades on load instead of discarding the whole history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tab_title: String,
    #[serde(default)]
    pub tab_url: String,
    #[serde(default)]
    pub timestamp: Value,
}

impl StoredRecord {
    /// Rehydrate, normalizing the timestamp: RFC 3339 text or epoch
    /// milliseconds are honored, anything else falls back to `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> ScanRecord {
        let timestamp = normalize_timestamp(&self.timestamp, now);
        ScanRecord {
            id: self.id,
            text: self.text,
            tab_title: self.tab_title,
            tab_url: self.tab_url,
            timestamp,
        }
    }
}

fn normalize_timestamp(raw: &Value, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or(now),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or(now),
        _ => now,
    }
}
