//! Output module for the harvested dataset
//!
//! This module handles:
//! - Projecting (person detail, submission) pairs into flat output records
//! - Writing the JSON dataset once at the end of a run
//! - The append-only diagnostic log shared by all workers
//! - Run statistics

mod diagnostic;
mod projector;
pub mod stats;
mod writer;

pub use diagnostic::DiagnosticLog;
pub use projector::{project, EntityDetail, OutputRecord, SENTINEL};
pub use stats::{print_statistics, RunStatistics, RunStats};
pub use writer::write_dataset;
