//! HTTP fetcher implementation
//!
//! This module handles all requests against the upstream API, including:
//! - Building the HTTP client with the token and timeouts baked in
//! - GET requests for submission pages and person details
//! - Splitting a decoded page into submission records and the next-page link
//! - Error classification (status, transport, timeout, malformed body)

use crate::config::ApiConfig;
use crate::output::EntityDetail;
use crate::state::SubmissionRecord;
use crate::{ConfigError, HarvestError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Header carrying the API token on every request
pub const TOKEN_HEADER: &str = "OSDI-API-Token";

/// One decoded page of submissions
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The decoded body, as received
    pub body: Value,

    /// Submissions found at `_embedded["osdi:submissions"]`
    pub records: Vec<SubmissionRecord>,

    /// Absolute URL from `_links.next.href`, if pagination continues
    pub next_url: Option<String>,
}

impl FetchedPage {
    /// Splits a decoded page body into records and the next-page link
    ///
    /// A missing or non-array submissions list yields no records. A relative
    /// next link is resolved against `page_url`.
    pub fn from_body(body: Value, page_url: &str) -> Self {
        let records = body
            .pointer("/_embedded/osdi:submissions")
            .and_then(Value::as_array)
            .map(|subs| {
                subs.iter()
                    .cloned()
                    .map(SubmissionRecord::from_payload)
                    .collect()
            })
            .unwrap_or_default();

        let next_url = body
            .pointer("/_links/next/href")
            .and_then(Value::as_str)
            .filter(|href| !href.is_empty())
            .and_then(|href| resolve_link(page_url, href));

        Self {
            body,
            records,
            next_url,
        }
    }
}

fn resolve_link(base: &str, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.into()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = Url::parse(base).and_then(|base| base.join(href));
            match joined {
                Ok(url) => Some(url.into()),
                Err(e) => {
                    tracing::warn!("Dropping unresolvable next link {} on {}: {}", href, base, e);
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!("Dropping malformed next link {} on {}: {}", href, base, e);
            None
        }
    }
}

/// Builds an HTTP client with the API token and timeouts configured
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - The token is not a valid header value, or the client failed to build
///
/// # Example
///
/// ```no_run
/// use osdi_harvest::config::ApiConfig;
/// use osdi_harvest::crawler::build_http_client;
///
/// let config = ApiConfig {
///     token: "secret".to_string(),
///     form_id: "my-form".to_string(),
///     ..ApiConfig::default()
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig) -> Result<Client, HarvestError> {
    let mut token = HeaderValue::from_str(&config.token).map_err(|_| {
        ConfigError::Validation("token contains characters not allowed in an HTTP header".into())
    })?;
    token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("osdi-api-token"), token);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = Client::builder()
        .user_agent(concat!("osdi-harvest/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Authenticated client for the upstream API
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Creates a client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Fetches one page of submissions
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - Records and next link of the page
    /// * `Err(HarvestError)` - Non-success status, transport failure, timeout or malformed JSON
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, HarvestError> {
        let body = self.get_json(url).await?;
        Ok(FetchedPage::from_body(body, url))
    }

    /// Fetches the detail payload of one person
    pub async fn fetch_detail(&self, url: &str) -> Result<EntityDetail, HarvestError> {
        let body = self.get_json(url).await?;
        Ok(EntityDetail::new(body))
    }

    /// Issues one authenticated GET and decodes the body as JSON
    ///
    /// # Error Classification
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Status outside 2xx | `HttpStatus` |
    /// | Request or body read exceeded the timeout | `Timeout` |
    /// | Connection, TLS or other transport failure | `Http` |
    /// | Body is not valid JSON | `Decode` |
    pub async fn get_json(&self, url: &str) -> Result<Value, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;

        serde_json::from_str(&body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
