use crate::extractor::ExtractorKind;
use serde::Deserialize;

/// Main configuration structure for Page-Sieve
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Fetching and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Upper bound for a single GET, including the body read (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Fetch workers spawned per available CPU
    #[serde(rename = "workers-per-cpu", default = "default_workers_per_cpu")]
    pub workers_per_cpu: usize,

    /// Hard cap on the number of concurrent workers
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Batches of at most this many items are processed sequentially
    #[serde(
        rename = "sequential-threshold",
        default = "default_sequential_threshold"
    )]
    pub sequential_threshold: usize,

    /// Hours after which a cached fetch failure is retried (0 = never)
    #[serde(rename = "failure-ttl-hours", default = "default_failure_ttl_hours")]
    pub failure_ttl_hours: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            workers_per_cpu: default_workers_per_cpu(),
            max_workers: default_max_workers(),
            sequential_threshold: default_sequential_threshold(),
            failure_ttl_hours: default_failure_ttl_hours(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Cache storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Extraction strategy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Strategy selected when the pipeline is built
    #[serde(default)]
    pub strategy: ExtractorKind,

    /// Time box for the metadata-aggregation analysis of one page (milliseconds)
    #[serde(rename = "metadata-timeout-ms", default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,

    /// Time box for the whole extraction of one page (milliseconds)
    #[serde(rename = "page-timeout-ms", default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Separator placed between non-empty output components
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Minimum words for a text block to survive boilerplate removal
    #[serde(rename = "min-block-words", default = "default_min_block_words")]
    pub min_block_words: usize,

    /// Maximum share of linked characters in a kept text block
    #[serde(rename = "max-link-density", default = "default_max_link_density")]
    pub max_link_density: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractorKind::default(),
            metadata_timeout_ms: default_metadata_timeout_ms(),
            page_timeout_ms: default_page_timeout_ms(),
            delimiter: default_delimiter(),
            min_block_words: default_min_block_words(),
            max_link_density: default_max_link_density(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_workers_per_cpu() -> usize {
    2
}

fn default_max_workers() -> usize {
    32
}

fn default_sequential_threshold() -> usize {
    2
}

fn default_failure_ttl_hours() -> u64 {
    24
}

fn default_metadata_timeout_ms() -> u64 {
    3_000
}

fn default_page_timeout_ms() -> u64 {
    10_000
}

fn default_delimiter() -> String {
    ", ".to_string()
}

fn default_min_block_words() -> usize {
    5
}

fn default_max_link_density() -> f64 {
    0.5
}
