//! Metadata-aggregation extraction
//!
//! Reads the whole document for its best title, description and keywords,
//! then picks a cleaned article body. Analysis is the most expensive
//! strategy, so it always runs under a deadline:
//! - Title: `og:title`, `twitter:title`, `<title>`, first `<h1>`
//! - Description: `og:description`, `description`, `twitter:description`
//! - Keywords: `keywords`, `news_keywords`, `article:tag`
//! - Body: an article container, else the parent with the most paragraph text

use crate::extractor::deadline::{run_with_deadline, Deadline};
use crate::extractor::html::{
    first_heading, meta_content, meta_keywords, page_title, visible_text, word_count,
};
use crate::extractor::{catch_step, ExtractError, Extraction, Extractor, ExtractorKind};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;

/// Containers tried in order before falling back to paragraph density
const ARTICLE_CONTAINERS: &[&str] = &["[itemprop=articleBody]", "article", "main", "[role=main]"];

/// A container with fewer words is not trusted as the article body
const MIN_CONTAINER_WORDS: usize = 25;

/// Paragraphs between two deadline checks
const CHECK_EVERY: usize = 64;

/// Everything the analysis found about one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub body: String,
    /// The body step broke; the other fields are still valid
    pub failed: bool,
}

/// Metadata aggregation bounded by a per-page timeout
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    timeout: Duration,
}

impl MetadataExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs the analysis on a helper thread
    ///
    /// # Returns
    ///
    /// * `Ok(ArticleMetadata)` - Analysis finished in time
    /// * `Err(ExtractError::Timeout)` - The timeout elapsed first
    /// * `Err(ExtractError::Panicked)` - The analysis thread died
    pub fn analyze(&self, raw_content: &str) -> Result<ArticleMetadata, ExtractError> {
        let raw = raw_content.to_string();
        run_with_deadline(self.timeout, move |deadline| analyze_document(&raw, &deadline))
    }
}

impl Extractor for MetadataExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Metadata
    }

    fn extract(&self, url: &str, raw_content: &str) -> Extraction {
        match self.analyze(raw_content) {
            Ok(meta) => Extraction {
                title: meta.title,
                meta_description: meta.description,
                meta_keywords: meta.keywords,
                body_text: meta.body,
                failed: meta.failed,
            },
            Err(e) => {
                tracing::warn!("Metadata analysis failed for {}: {}", url, e);
                Extraction::failure()
            }
        }
    }
}

fn analyze_document(raw: &str, deadline: &Deadline) -> Result<ArticleMetadata, ExtractError> {
    analyze_with(raw, deadline, article_body)
}

/// Collects the meta fields, then runs `body_step`
///
/// A panic in `body_step` keeps the fields and sets `failed`; a timeout
/// anywhere fails the whole analysis.
fn analyze_with<B>(
    raw: &str,
    deadline: &Deadline,
    body_step: B,
) -> Result<ArticleMetadata, ExtractError>
where
    B: FnOnce(&Html, &Deadline) -> Result<String, ExtractError>,
{
    let document = Html::parse_document(raw);
    deadline.check()?;

    let title = meta_content(&document, &["og:title", "twitter:title"])
        .or_else(|| page_title(&document))
        .or_else(|| first_heading(&document))
        .unwrap_or_default();
    let description = meta_content(
        &document,
        &["og:description", "description", "twitter:description"],
    )
    .unwrap_or_default();
    let keywords = meta_keywords(&document).unwrap_or_default();
    deadline.check()?;

    let (body, failed) = match catch_step(|| body_step(&document, deadline)) {
        Ok(body) => (body?, false),
        Err(e) => {
            tracing::warn!("Article body step failed: {}", e);
            (String::new(), true)
        }
    };

    Ok(ArticleMetadata {
        title,
        description,
        keywords,
        body,
        failed,
    })
}

fn article_body(document: &Html, deadline: &Deadline) -> Result<String, ExtractError> {
    for css in ARTICLE_CONTAINERS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(container) = document.select(&selector).next() {
            let text = visible_text(container);
            if word_count(&text) >= MIN_CONTAINER_WORDS {
                return Ok(text);
            }
        }
        deadline.check()?;
    }

    densest_paragraphs(document, deadline)
}

/// Paragraph text of the parent element holding the most paragraph words
fn densest_paragraphs(document: &Html, deadline: &Deadline) -> Result<String, ExtractError> {
    let Ok(selector) = Selector::parse("p") else {
        return Ok(String::new());
    };

    let mut order = Vec::new();
    let mut groups = HashMap::new();

    for (index, paragraph) in document.select(&selector).enumerate() {
        if index % CHECK_EVERY == 0 {
            deadline.check()?;
        }
        let Some(parent) = paragraph.parent() else {
            continue;
        };
        let text = visible_text(paragraph);
        if text.is_empty() {
            continue;
        }

        let (words, texts) = groups.entry(parent.id()).or_insert_with(|| {
            order.push(parent.id());
            (0usize, Vec::new())
        });
        *words += word_count(&text);
        texts.push(text);
    }

    let mut best: Option<&(usize, Vec<String>)> = None;
    for id in &order {
        if let Some(group) = groups.get(id) {
            if best.map_or(true, |b| group.0 > b.0) {
                best = Some(group);
            }
        }
    }

    Ok(best.map(|(_, texts)| texts.join(" ")).unwrap_or_default())
}
