//! Extraction strategies turning raw HTML into a short clean text
//!
//! Every strategy implements [`Extractor`] and is selected once, when the
//! pipeline is built, through [`ExtractorKind`]. Strategies never fail: a
//! problem inside one page degrades that page's [`Extraction`] to whatever
//! parts were obtained and sets `failed`.

mod boilerplate;
mod deadline;
mod html;
mod hybrid;
mod metadata;
mod reading_view;

pub use boilerplate::BoilerplateExtractor;
pub use deadline::{run_with_deadline, Deadline};
pub use hybrid::HybridExtractor;
pub use metadata::{ArticleMetadata, MetadataExtractor};
pub use reading_view::ReadabilityExtractor;

use crate::config::ExtractorConfig;
use serde::Deserialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while extracting a single page
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Extraction timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("Extraction panicked: {0}")]
    Panicked(String),
}

/// Text parts obtained from one page
///
/// Which parts are filled depends on the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub body_text: String,
    /// Set when a step failed; the other fields hold what was obtained
    pub failed: bool,
}

impl Extraction {
    /// An empty extraction flagged as failed
    pub fn failure() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }

    /// Parts in output order: title, description, keywords, body
    pub fn components(&self) -> [&str; 4] {
        [
            &self.title,
            &self.meta_description,
            &self.meta_keywords,
            &self.body_text,
        ]
    }

    /// Joins the non-empty parts with `delimiter`
    pub fn joined(&self, delimiter: &str) -> String {
        self.components()
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    pub fn is_empty(&self) -> bool {
        self.components().iter().all(|part| part.trim().is_empty())
    }

    /// Fills `body_text` from `body`
    ///
    /// If the body step panics, the parts already set are kept and the
    /// extraction is flagged as failed.
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: FnOnce() -> String,
    {
        match catch_step(body) {
            Ok(text) => self.body_text = text,
            Err(e) => {
                tracing::warn!("Body extraction failed: {}", e);
                self.failed = true;
            }
        }
        self
    }
}

/// Runs one extraction step, turning a panic into `ExtractError::Panicked`
pub fn catch_step<T, F>(step: F) -> Result<T, ExtractError>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(step))
        .map_err(|payload| ExtractError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A strategy converting raw HTML into an [`Extraction`]
///
/// Implementations must be deterministic: the same input always gives the
/// same output.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> ExtractorKind;

    fn extract(&self, url: &str, raw_content: &str) -> Extraction;
}

/// The available extraction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Main content after navigation/ads/boilerplate removal, plus title and meta tags
    Boilerplate,
    /// Reading view: title and text summary
    Readability,
    /// Full-document metadata analysis with a cleaned body, time-boxed
    Metadata,
    /// Boilerplate body with metadata title, description and keywords
    #[default]
    Hybrid,
}

impl ExtractorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boilerplate => "boilerplate",
            Self::Readability => "readability",
            Self::Metadata => "metadata",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::Boilerplate,
            Self::Readability,
            Self::Metadata,
            Self::Hybrid,
        ]
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown extractor '{}', expected one of: boilerplate, readability, metadata, hybrid",
                    s
                )
            })
    }
}

/// Builds the strategy named by `config.strategy`
pub fn build_extractor(config: &ExtractorConfig) -> Arc<dyn Extractor> {
    build_extractor_kind(config.strategy, config)
}

/// Builds a given strategy with the tuning from `config`
pub fn build_extractor_kind(kind: ExtractorKind, config: &ExtractorConfig) -> Arc<dyn Extractor> {
    let boilerplate = || BoilerplateExtractor::new(config.min_block_words, config.max_link_density);
    let metadata = || MetadataExtractor::new(Duration::from_millis(config.metadata_timeout_ms));

    match kind {
        ExtractorKind::Boilerplate => Arc::new(boilerplate()),
        ExtractorKind::Readability => Arc::new(ReadabilityExtractor::new()),
        ExtractorKind::Metadata => Arc::new(metadata()),
        ExtractorKind::Hybrid => Arc::new(HybridExtractor::new(boilerplate(), metadata())),
    }
}
