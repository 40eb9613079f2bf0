//! Boilerplate-removal extraction
//!
//! Text nodes are grouped into blocks by their nearest block-level ancestor.
//! A block survives when it is long enough and not dominated by link text;
//! anything inside navigation, headers, footers, forms or elements whose
//! class/id names such chrome is dropped before grouping.

use crate::extractor::html::{
    collapse_whitespace, has_boilerplate_marker, is_block_tag, is_excluded_tag, meta_description,
    meta_keywords, page_title, word_count,
};
use crate::extractor::{Extraction, Extractor, ExtractorKind};
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Text gathered under one block element
#[derive(Debug, Default)]
struct TextBlock {
    parts: Vec<String>,
    chars: usize,
    link_chars: usize,
}

impl TextBlock {
    fn push(&mut self, text: &str, in_link: bool) {
        let len = text.chars().count();
        self.chars += len;
        if in_link {
            self.link_chars += len;
        }
        self.parts.push(text.to_string());
    }

    fn text(&self) -> String {
        collapse_whitespace(&self.parts.join(" "))
    }

    fn link_density(&self) -> f64 {
        if self.chars == 0 {
            return 1.0;
        }
        self.link_chars as f64 / self.chars as f64
    }
}

/// Main-content extraction with boilerplate removal
#[derive(Debug, Clone)]
pub struct BoilerplateExtractor {
    min_block_words: usize,
    max_link_density: f64,
}

impl BoilerplateExtractor {
    /// # Arguments
    ///
    /// * `min_block_words` - Blocks with fewer words are dropped
    /// * `max_link_density` - Blocks whose link text share exceeds this are dropped
    pub fn new(min_block_words: usize, max_link_density: f64) -> Self {
        Self {
            min_block_words,
            max_link_density,
        }
    }

    /// Main text of a parsed document, blocks in document order
    pub fn main_text(&self, document: &Html) -> String {
        let mut blocks: Vec<TextBlock> = Vec::new();
        let mut slots = HashMap::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let mut block = None;
            let mut in_link = false;
            let mut skipped = false;

            for ancestor in node.ancestors() {
                let Some(element) = ElementRef::wrap(ancestor) else {
                    continue;
                };
                let name = element.value().name();
                if is_excluded_tag(name) || has_boilerplate_marker(&element) {
                    skipped = true;
                    break;
                }
                if name == "a" {
                    in_link = true;
                }
                if block.is_none() && is_block_tag(name) {
                    block = Some(ancestor.id());
                }
            }

            let Some(block_id) = block.filter(|_| !skipped) else {
                continue;
            };

            let slot = *slots.entry(block_id).or_insert_with(|| {
                blocks.push(TextBlock::default());
                blocks.len() - 1
            });
            blocks[slot].push(text, in_link);
        }

        let kept: Vec<String> = blocks
            .iter()
            .filter(|block| block.link_density() <= self.max_link_density)
            .map(TextBlock::text)
            .filter(|text| word_count(text) >= self.min_block_words)
            .collect();

        tracing::trace!("Kept {} of {} text blocks", kept.len(), blocks.len());
        kept.join(" ")
    }
}

impl Extractor for BoilerplateExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Boilerplate
    }

    fn extract(&self, _url: &str, raw_content: &str) -> Extraction {
        let document = Html::parse_document(raw_content);

        Extraction {
            title: page_title(&document).unwrap_or_default(),
            meta_description: meta_description(&document).unwrap_or_default(),
            meta_keywords: meta_keywords(&document).unwrap_or_default(),
            ..Extraction::default()
        }
        .with_body(|| self.main_text(&document))
    }
}
