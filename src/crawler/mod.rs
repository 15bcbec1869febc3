//! Crawler module for the two harvest phases
//!
//! This module contains the core harvesting logic, including:
//! - Authenticated HTTP fetching of pages and person details
//! - The pagination frontier and its worker pool
//! - The enrichment worker pool
//! - Overall run coordination

mod coordinator;
mod enrich;
mod fetcher;
mod frontier;
mod pages;

pub use coordinator::{run_harvest, CrawlContext, HarvestReport, Harvester};
pub use enrich::EnrichmentCrawler;
pub use fetcher::{build_http_client, ApiClient, FetchedPage, TOKEN_HEADER};
pub use frontier::PageFrontier;
pub use pages::PaginationCrawler;
