//! Pagination crawler
//!
//! Drains the submissions pages of one form with a fixed pool of workers,
//! folding every page's records into the shared dedup index. A page that
//! fails is logged and abandoned; pages reachable only through its next link
//! are never visited.

use crate::crawler::coordinator::CrawlContext;
use crate::crawler::frontier::PageFrontier;
use crate::state::DedupIndex;
use crate::HarvestError;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fixed-size worker pool over the pagination frontier
pub struct PaginationCrawler {
    ctx: Arc<CrawlContext>,
    workers: usize,
}

impl PaginationCrawler {
    pub fn new(ctx: Arc<CrawlContext>, workers: usize) -> Self {
        Self {
            ctx,
            workers: workers.max(1),
        }
    }

    /// Crawls from `root_url` until the frontier is drained and every worker has exited
    ///
    /// Returns only after all workers have been joined, so the index is no
    /// longer written to once this resolves.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every reachable page was attempted
    /// * `Err(HarvestError)` - A worker task panicked or hit a non-recoverable error
    pub async fn run(&self, root_url: String, index: Arc<DedupIndex>) -> Result<(), HarvestError> {
        let frontier = Arc::new(PageFrontier::new([root_url]));
        let mut join_set = JoinSet::new();

        for worker_id in 0..self.workers {
            let ctx = Arc::clone(&self.ctx);
            let frontier = Arc::clone(&frontier);
            let index = Arc::clone(&index);
            join_set.spawn(page_worker(worker_id, ctx, frontier, index));
        }

        while let Some(result) = join_set.join_next().await {
            result.map_err(|e| HarvestError::Worker(format!("pagination worker: {}", e)))??;
        }

        Ok(())
    }
}

async fn page_worker(
    worker_id: usize,
    ctx: Arc<CrawlContext>,
    frontier: Arc<PageFrontier>,
    index: Arc<DedupIndex>,
) -> Result<(), HarvestError> {
    let mut pages = 0usize;

    while let Some(url) = frontier.next().await {
        match process_page(&ctx, &url, &index).await {
            Ok(next) => {
                frontier.complete(next);
            }
            Err(e) => {
                // Idle workers wait on in-flight pages
                frontier.complete(None);
                return Err(e);
            }
        }
        pages += 1;
    }

    tracing::debug!("Pagination worker {} done after {} pages", worker_id, pages);
    Ok(())
}

/// Fetches one page and folds its records, returning the next-page URL
///
/// Recoverable failures are logged and yield `Ok(None)`; anything else is returned.
async fn process_page(
    ctx: &CrawlContext,
    url: &str,
    index: &DedupIndex,
) -> Result<Option<String>, HarvestError> {
    tracing::debug!("Fetching page: {}", url);

    match ctx.api.fetch_page(url).await {
        Ok(page) => {
            ctx.log.page_fetched(&page.body).await;
            ctx.stats.page_fetched(page.records.len());

            let total = page.records.len();
            let changed = index.upsert_all(page.records);
            tracing::debug!(
                "Page {}: {} submissions, {} changed the index",
                url,
                total,
                changed
            );

            Ok(page.next_url)
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Error fetching page {}: {}", url, e);
            ctx.log.page_failed(url, &e).await;
            ctx.stats.page_failed();
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Aborting pagination on {}: {}", url, e);
            Err(e)
        }
    }
}
