//! Submission records and their recency order
//!
//! A submission's owning person is the `_links["osdi:person"].href` of the payload;
//! its recency is the `created_date` field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// Entity reference used when a submission carries no person link
pub const NULL_ENTITY_REF: &str = "N/A";

/// One form submission as returned by the submissions endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    /// Person link, or [`NULL_ENTITY_REF`] when absent
    pub entity_ref: String,

    /// Raw `created_date`, empty when absent
    pub created_at: String,

    /// The full submission object, kept as received
    pub payload: Value,
}

impl SubmissionRecord {
    /// Builds a record from one entry of `_embedded["osdi:submissions"]`
    pub fn from_payload(payload: Value) -> Self {
        let entity_ref = payload
            .pointer("/_links/osdi:person/href")
            .and_then(Value::as_str)
            .filter(|href| !href.is_empty())
            .unwrap_or(NULL_ENTITY_REF)
            .to_string();

        let created_at = payload
            .get("created_date")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            entity_ref,
            created_at,
            payload,
        }
    }

    /// Returns true when the submission has no person link
    pub fn has_null_entity(&self) -> bool {
        self.entity_ref == NULL_ENTITY_REF
    }

    /// Position of this record in the recency order
    pub fn recency(&self) -> Recency {
        Recency(parse_timestamp(&self.created_at))
    }
}

/// Recency key of a submission
///
/// Unparseable or empty timestamps compare older than every valid timestamp
/// and equal to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recency(Option<DateTime<Utc>>);

#[cfg(test)]
impl Recency {
    fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl Ord for Recency {
    fn cmp(&self, other: &Self) -> Ordering {
        // Option orders None before Some, which is exactly "invalid is oldest"
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Recency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parses a `created_date` value into UTC
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (or space separated)
/// interpreted as UTC, and a bare `YYYY-MM-DD` at midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
