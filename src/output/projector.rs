//! Record projection
//!
//! Maps a person detail payload and that person's newest submission into the
//! fixed output schema. Each field has exactly one source path and one
//! default substitution point.

use crate::state::SubmissionRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value written for any field whose source is missing
pub const SENTINEL: &str = "N/A";

/// Extended attributes of one person, as returned by the person endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDetail(Value);

impl EntityDetail {
    /// Wraps a decoded person payload
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// The raw payload
    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// `postal_addresses[0].postal_code`
    pub fn postal_code(&self) -> Option<String> {
        text_at(&self.0, "/postal_addresses/0/postal_code")
    }

    /// `postal_addresses[0].locality`
    pub fn locality(&self) -> Option<String> {
        text_at(&self.0, "/postal_addresses/0/locality")
    }

    /// `custom_fields.ChapterLeaderName`
    pub fn chapter_leader_name(&self) -> Option<String> {
        text_at(&self.0, "/custom_fields/ChapterLeaderName")
    }

    /// `custom_fields.ChapterName`
    pub fn chapter_name(&self) -> Option<String> {
        text_at(&self.0, "/custom_fields/ChapterName")
    }
}

/// One row of the emitted dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(rename = "Zip code")]
    pub zip_code: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "ChapterLeaderName")]
    pub chapter_leader_name: String,

    #[serde(rename = "ChapterName")]
    pub chapter_name: String,

    /// The submission's `created_date`, passed through as received
    #[serde(rename = "Timestamp (EST)")]
    pub timestamp_est: String,
}

/// Projects a person detail (if any) and a submission into an [`OutputRecord`]
///
/// Fields are defaulted independently, so a record may mix real values and
/// [`SENTINEL`]s.
pub fn project(detail: Option<&EntityDetail>, record: &SubmissionRecord) -> OutputRecord {
    let from_detail = |field: fn(&EntityDetail) -> Option<String>| detail.and_then(field);

    OutputRecord {
        zip_code: or_sentinel(from_detail(EntityDetail::postal_code)),
        city: or_sentinel(from_detail(EntityDetail::locality)),
        chapter_leader_name: or_sentinel(from_detail(EntityDetail::chapter_leader_name)),
        chapter_name: or_sentinel(from_detail(EntityDetail::chapter_name)),
        timestamp_est: or_sentinel(text_at(&record.payload, "/created_date")),
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| SENTINEL.to_string())
}

/// Reads a scalar at a JSON pointer as text
///
/// Empty strings and non-scalar values count as missing. Numbers are rendered
/// as written, since zip codes sometimes arrive unquoted.
fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
