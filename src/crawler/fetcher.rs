//! HTTP fetcher implementation
//!
//! This module performs the single GET behind every cache miss:
//! - Building the HTTP client with a proper user agent string
//! - Bounding the whole request, body included, by a timeout
//! - Classifying the outcome into a `PageRecord`

use crate::config::UserAgentConfig;
use crate::state::FetchOutcome;
use crate::storage::PageRecord;
use crate::url::parse_target;
use crate::UrlError;
use chrono::Utc;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Message recorded when the caller passed no URL
pub const EMPTY_URL_MESSAGE: &str = "url is empty";

/// Message recorded for any non-2xx response
pub const NOT_FOUND_MESSAGE: &str = "Page not found";

/// Formats the user agent string
///
/// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// Certificate validation is disabled on purpose: pages behind self-signed
/// or misconfigured certificates are still worth classifying, and nothing
/// sensitive is ever sent. Do not reuse this client for anything else.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound for one request
///
/// # Example
///
/// ```no_run
/// use page_sieve::config::UserAgentConfig;
/// use page_sieve::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageSieve".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs single bounded GET requests
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches a URL and classifies the outcome
    ///
    /// | Condition | Record |
    /// |-----------|--------|
    /// | Empty URL | `EmptyUrl`, "url is empty", no request |
    /// | Unparseable URL | `TransportFailure`, parse error text |
    /// | Transport error or timeout | `TransportFailure`, error text |
    /// | Non-2xx status | `HttpStatusFailure`, "Page not found" |
    /// | 2xx status | `Fetched`, body as text |
    ///
    /// Never fails: every path yields a record with `fetched_at` set.
    pub async fn fetch(&self, url: &str) -> PageRecord {
        let target = match parse_target(url) {
            Ok(target) => target,
            Err(UrlError::Empty) => {
                tracing::debug!("Skipping empty url");
                return PageRecord::failed(
                    url,
                    FetchOutcome::EmptyUrl,
                    EMPTY_URL_MESSAGE,
                    None,
                    Utc::now(),
                );
            }
            Err(e) => {
                tracing::warn!("Cannot fetch {}: {}", url, e);
                return PageRecord::failed(
                    url,
                    FetchOutcome::TransportFailure,
                    e.to_string(),
                    None,
                    Utc::now(),
                );
            }
        };

        tracing::debug!("Fetching {}", url);

        let record = match tokio::time::timeout(self.timeout, self.get_body(target)).await {
            Ok(Ok((status, Some(body)))) => PageRecord::fetched(url, status, body, Utc::now()),
            Ok(Ok((status, None))) => PageRecord::failed(
                url,
                FetchOutcome::HttpStatusFailure,
                NOT_FOUND_MESSAGE,
                Some(status),
                Utc::now(),
            ),
            Ok(Err(e)) => PageRecord::failed(
                url,
                FetchOutcome::TransportFailure,
                describe_transport_error(&e),
                None,
                Utc::now(),
            ),
            Err(_) => PageRecord::failed(
                url,
                FetchOutcome::TransportFailure,
                format!("Request timed out after {}ms", self.timeout.as_millis()),
                None,
                Utc::now(),
            ),
        };

        if record.fetch_error {
            tracing::warn!("Fetch failed for {}: {}", url, record.fetch_message);
        } else {
            tracing::debug!(
                "Fetched {} ({} bytes, status {:?})",
                url,
                record.raw_content.len(),
                record.status_code
            );
        }

        record
    }

    /// Sends the GET and reads the body only for 2xx responses
    async fn get_body(&self, target: Url) -> Result<(u16, Option<String>), reqwest::Error> {
        let response = self.client.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok((status.as_u16(), None));
        }
        let body = response.text().await?;
        Ok((status.as_u16(), Some(body)))
    }
}

/// Describes a transport error, keeping reqwest's text
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
