//! Hybrid extraction
//!
//! Combines the boilerplate-removal body with the title, description and
//! keywords found by metadata aggregation. The metadata body is used only
//! when boilerplate removal leaves nothing.

use crate::extractor::boilerplate::BoilerplateExtractor;
use crate::extractor::metadata::MetadataExtractor;
use crate::extractor::{catch_step, Extraction, Extractor, ExtractorKind};
use scraper::Html;

#[derive(Debug, Clone)]
pub struct HybridExtractor {
    boilerplate: BoilerplateExtractor,
    metadata: MetadataExtractor,
}

impl HybridExtractor {
    pub fn new(boilerplate: BoilerplateExtractor, metadata: MetadataExtractor) -> Self {
        Self {
            boilerplate,
            metadata,
        }
    }
}

impl Extractor for HybridExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Hybrid
    }

    fn extract(&self, url: &str, raw_content: &str) -> Extraction {
        let (body, body_failed) = match catch_step(|| {
            self.boilerplate
                .main_text(&Html::parse_document(raw_content))
        }) {
            Ok(body) => (body, false),
            Err(e) => {
                tracing::warn!("Boilerplate body failed for {}: {}", url, e);
                (String::new(), true)
            }
        };

        match self.metadata.analyze(raw_content) {
            Ok(meta) => Extraction {
                title: meta.title,
                meta_description: meta.description,
                meta_keywords: meta.keywords,
                body_text: if body.is_empty() { meta.body } else { body },
                failed: body_failed || meta.failed,
            },
            Err(e) => {
                // Metadata parts stay empty, the body is still usable
                tracing::warn!("Metadata analysis failed for {}: {}", url, e);
                Extraction {
                    body_text: body,
                    failed: true,
                    ..Extraction::default()
                }
            }
        }
    }
}
