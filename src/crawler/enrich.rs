//! Enrichment crawler
//!
//! Fetches the person behind every retained submission with a fixed pool of
//! workers and projects each pair into an output record. Workers claim
//! entries through a shared atomic cursor, so each entry is handled once.
//! Output records are collected in completion order.

use crate::crawler::coordinator::CrawlContext;
use crate::output::{project, EntityDetail, OutputRecord};
use crate::state::SubmissionRecord;
use crate::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;

type Entries = Arc<Vec<(String, SubmissionRecord)>>;
type Collected = Arc<Mutex<Vec<OutputRecord>>>;

/// Fixed-size worker pool over a finalized dedup snapshot
pub struct EnrichmentCrawler {
    ctx: Arc<CrawlContext>,
    workers: usize,
}

impl EnrichmentCrawler {
    pub fn new(ctx: Arc<CrawlContext>, workers: usize) -> Self {
        Self {
            ctx,
            workers: workers.max(1),
        }
    }

    /// Enriches every snapshot entry and returns one output record per entry
    ///
    /// A failed detail fetch does not drop the entry; it is projected without
    /// detail. The order of the returned records is not meaningful.
    pub async fn run(
        &self,
        snapshot: Vec<(String, SubmissionRecord)>,
    ) -> Result<Vec<OutputRecord>, HarvestError> {
        let total = snapshot.len();
        let entries: Entries = Arc::new(snapshot);
        let cursor = Arc::new(AtomicUsize::new(0));
        let collected: Collected = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let mut join_set = JoinSet::new();
        for _ in 0..self.workers.min(total) {
            join_set.spawn(detail_worker(
                Arc::clone(&self.ctx),
                Arc::clone(&entries),
                Arc::clone(&cursor),
                Arc::clone(&collected),
            ));
        }

        while let Some(result) = join_set.join_next().await {
            result.map_err(|e| HarvestError::Worker(format!("enrichment worker: {}", e)))??;
        }

        let records = std::mem::take(&mut *collected.lock().unwrap_or_else(PoisonError::into_inner));
        Ok(records)
    }
}

async fn detail_worker(
    ctx: Arc<CrawlContext>,
    entries: Entries,
    cursor: Arc<AtomicUsize>,
    collected: Collected,
) -> Result<(), HarvestError> {
    loop {
        let claimed = cursor.fetch_add(1, Ordering::Relaxed);
        let Some((entity_ref, record)) = entries.get(claimed) else {
            return Ok(());
        };

        let detail = resolve_detail(&ctx, entity_ref, record).await?;
        let row = project(detail.as_ref(), record);

        collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }
}

/// Looks up the person behind a submission
///
/// `Ok(None)` when there is no person or the fetch failed recoverably.
async fn resolve_detail(
    ctx: &CrawlContext,
    entity_ref: &str,
    record: &SubmissionRecord,
) -> Result<Option<EntityDetail>, HarvestError> {
    if record.has_null_entity() {
        ctx.stats.detail_skipped();
        return Ok(None);
    }

    match ctx.api.fetch_detail(entity_ref).await {
        Ok(detail) => {
            ctx.log.person_fetched(detail.payload()).await;
            ctx.stats.detail_fetched();
            Ok(Some(detail))
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Error fetching person details for {}: {}", entity_ref, e);
            ctx.log.person_failed(entity_ref, &e).await;
            ctx.stats.detail_failed();
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Aborting enrichment on {}: {}", entity_ref, e);
            Err(e)
        }
    }
}
