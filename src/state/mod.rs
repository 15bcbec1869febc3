//! State module for the harvest
//!
//! This module holds the records collected during the pagination phase.
//!
//! # Components
//!
//! - `SubmissionRecord`: One form submission together with its owning person link
//! - `Recency`: The total order used to decide which submission is newest
//! - `DedupIndex`: Concurrent last-write-wins map from person link to newest submission

mod dedup;
mod submission;

// Re-export main types
pub use dedup::{DedupIndex, UpsertOutcome};
pub use submission::{parse_timestamp, Recency, SubmissionRecord, NULL_ENTITY_REF};
