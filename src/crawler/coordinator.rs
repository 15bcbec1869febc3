//! Harvest coordinator - run orchestration
//!
//! This module sequences a complete harvest:
//! - Building the API client and opening the diagnostic log
//! - Draining the pagination phase into the dedup index
//! - Snapshotting the index once pagination has fully settled
//! - Running the enrichment phase over the snapshot
//! - Writing the dataset exactly once

use crate::config::{validate, Config};
use crate::crawler::enrich::EnrichmentCrawler;
use crate::crawler::fetcher::ApiClient;
use crate::crawler::pages::PaginationCrawler;
use crate::output::{write_dataset, DiagnosticLog, OutputRecord, RunStatistics, RunStats};
use crate::state::DedupIndex;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Read-mostly state shared by every worker of both phases
#[derive(Debug)]
pub struct CrawlContext {
    pub api: ApiClient,
    pub log: DiagnosticLog,
    pub stats: RunStats,
}

/// Outcome of a successful harvest
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Every record written, in completion order
    pub records: Vec<OutputRecord>,

    /// Counters collected during the run
    pub statistics: RunStatistics,

    /// Where the dataset was written
    pub output_path: PathBuf,
}

/// Main harvest coordinator
pub struct Harvester {
    config: Config,
    ctx: Arc<CrawlContext>,
}

impl Harvester {
    /// Creates a harvester, failing before any network activity on bad configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Client built and diagnostic log opened
    /// * `Err(HarvestError)` - Invalid configuration, unusable token or unwritable log
    pub async fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;

        let api = ApiClient::new(&config.api)?;
        let log = DiagnosticLog::open(Path::new(&config.output.debug_log_path)).await?;

        Ok(Self {
            config,
            ctx: Arc::new(CrawlContext {
                api,
                log,
                stats: RunStats::new(),
            }),
        })
    }

    /// Runs both phases and writes the dataset
    ///
    /// Recoverable page and person failures are absorbed by the phases. Any
    /// error that reaches this method aborts the run before the dataset is written.
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let start_time = Instant::now();
        let root_url = self.config.api.submissions_url();
        tracing::info!("Harvesting submissions from {}", root_url);

        let index = Arc::new(DedupIndex::new());
        PaginationCrawler::new(Arc::clone(&self.ctx), self.config.crawler.page_workers)
            .run(root_url, Arc::clone(&index))
            .await?;

        // Every pagination worker has been joined; the index is final from here on
        let snapshot = index.snapshot();
        tracing::info!(
            "Pagination complete: {} distinct people in {:?}",
            snapshot.len(),
            start_time.elapsed()
        );

        let entities = snapshot.len();
        let records = EnrichmentCrawler::new(Arc::clone(&self.ctx), self.config.crawler.detail_workers)
            .run(snapshot)
            .await?;
        tracing::info!("Enrichment complete: {} records", records.len());

        let output_path = PathBuf::from(&self.config.output.data_path);
        write_dataset(&records, &output_path).await?;

        let statistics = self.ctx.stats.snapshot(entities, records.len());
        tracing::info!(
            "Harvest completed: {} pages ({} failed), {} records in {:?}",
            statistics.pages_fetched,
            statistics.pages_failed,
            statistics.output_records,
            start_time.elapsed()
        );

        Ok(HarvestReport {
            records,
            statistics,
            output_path,
        })
    }
}

/// Runs a complete harvest
///
/// # Arguments
///
/// * `config` - Validated configuration with credentials
///
/// # Returns
///
/// * `Ok(HarvestReport)` - Dataset written
/// * `Err(HarvestError)` - Run aborted; no dataset was written
///
/// # Example
///
/// ```no_run
/// use osdi_harvest::config::load_config;
/// use osdi_harvest::crawler::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(None)?;
/// let report = run_harvest(config).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestReport, HarvestError> {
    let harvester = Harvester::new(config).await?;
    harvester.run().await
}
