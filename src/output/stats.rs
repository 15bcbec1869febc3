//! Run statistics
//!
//! Workers bump lock-free counters while the run progresses; a plain snapshot
//! is taken at the end for logging and display.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every worker of a run
#[derive(Debug, Default)]
pub struct RunStats {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    records_seen: AtomicU64,
    details_fetched: AtomicU64,
    details_failed: AtomicU64,
    details_skipped: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_fetched(&self, records: usize) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.records_seen
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_fetched(&self) {
        self.details_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_failed(&self) {
        self.details_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_skipped(&self) {
        self.details_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters
    ///
    /// # Arguments
    ///
    /// * `entities` - Distinct entities in the finalized dedup index
    /// * `output_records` - Records in the output collection
    pub fn snapshot(&self, entities: usize, output_records: usize) -> RunStatistics {
        RunStatistics {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            records_seen: self.records_seen.load(Ordering::Relaxed),
            entities: entities as u64,
            details_fetched: self.details_fetched.load(Ordering::Relaxed),
            details_failed: self.details_failed.load(Ordering::Relaxed),
            details_skipped: self.details_skipped.load(Ordering::Relaxed),
            output_records: output_records as u64,
        }
    }
}

/// Final statistics of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Submission pages fetched and decoded
    pub pages_fetched: u64,

    /// Submission pages abandoned after a fetch or decode failure
    pub pages_failed: u64,

    /// Submissions folded into the dedup index, duplicates included
    pub records_seen: u64,

    /// Distinct entities retained
    pub entities: u64,

    /// Person details fetched and decoded
    pub details_fetched: u64,

    /// Person details that failed and were projected as missing
    pub details_failed: u64,

    /// Entities without a person link, never fetched
    pub details_skipped: u64,

    /// Records written to the dataset
    pub output_records: u64,
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Pagination:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Submissions seen: {}", stats.records_seen);
    println!("  Distinct people: {}", stats.entities);
    println!();

    println!("Enrichment:");
    println!("  Details fetched: {}", stats.details_fetched);
    println!("  Details failed: {}", stats.details_failed);
    println!("  Without person link: {}", stats.details_skipped);
    println!();

    println!("Output records: {}", stats.output_records);
}
