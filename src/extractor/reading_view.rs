//! Reading-view extraction
//!
//! Runs the readability scoring algorithm and keeps its title and plain
//! text summary. When the algorithm gives up, the `<title>` is still
//! returned and the extraction is flagged as failed.

use crate::extractor::html::{collapse_whitespace, page_title};
use crate::extractor::{catch_step, Extraction, Extractor, ExtractorKind};
use scraper::Html;
use std::io::Cursor;
use url::Url;

/// Base used to resolve relative links when the page URL does not parse
const FALLBACK_BASE: &str = "http://localhost/";

/// Title plus readability text summary
#[derive(Debug, Clone, Default)]
pub struct ReadabilityExtractor;

impl ReadabilityExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ReadabilityExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Readability
    }

    fn extract(&self, url: &str, raw_content: &str) -> Extraction {
        let base = match Url::parse(url).or_else(|_| Url::parse(FALLBACK_BASE)) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("No usable base url for {}: {}", url, e);
                return title_only(raw_content);
            }
        };

        let mut cursor = Cursor::new(raw_content.as_bytes());
        match catch_step(|| readability::extractor::extract(&mut cursor, &base)) {
            Ok(Ok(product)) => Extraction {
                title: collapse_whitespace(&product.title),
                body_text: collapse_whitespace(&product.text),
                ..Extraction::default()
            },
            Ok(Err(e)) => {
                tracing::debug!("Readability gave up on {}: {}", url, e);
                title_only(raw_content)
            }
            Err(e) => {
                tracing::warn!("Readability failed on {}: {}", url, e);
                title_only(raw_content)
            }
        }
    }
}

fn title_only(raw_content: &str) -> Extraction {
    let document = Html::parse_document(raw_content);
    Extraction {
        title: page_title(&document).unwrap_or_default(),
        failed: true,
        ..Extraction::default()
    }
}
