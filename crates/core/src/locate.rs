//! Main-content location.
//!
//! The locator picks the one subtree of a sanitized document that most likely
//! holds the article body. Three steps are tried in order:
//!
//! 1. a cascade of content-indicating selectors, first match wins;
//! 2. a density fallback that counts qualifying `<p>` children per parent;
//! 3. the document body.
//!
//! The tree is never mutated. Density candidates live in an indexed list and
//! their scores in a parallel map keyed by arena node id.

use std::collections::HashMap;

use tracing::debug;

use crate::parse::{Document, Element};

/// Selectors tried, in order, by the cascade step.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    ".content",
    ".post",
    ".post-content",
    ".entry-content",
    "#content",
];

/// Configuration for main-content location
#[derive(Debug, Clone)]
pub struct LocateConfig {
    /// Ordered cascade selectors
    pub selectors: Vec<String>,
    /// A cascade match must have more trimmed characters than this
    pub min_selector_chars: usize,
    /// A paragraph must have more trimmed characters than this to be counted
    pub min_paragraph_chars: usize,
    /// A density candidate must have more qualifying paragraphs than this
    pub min_paragraphs: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            selectors: CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            min_selector_chars: 500,
            min_paragraph_chars: 10,
            min_paragraphs: 3,
        }
    }
}

/// Which locator step produced a [`ContentBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Matched a cascade selector.
    Selector(String),
    /// Highest paragraph density.
    Density,
    /// Nothing qualified; the whole body was taken.
    Body,
}

/// A node of the document chosen as the content root.
#[derive(Debug, Clone)]
pub struct ContentBlock<'a> {
    /// The chosen element, borrowed from the document
    pub element: Element<'a>,
    /// Number of qualifying paragraph descendants
    pub paragraph_count: usize,
    /// How the element was chosen
    pub selection: Selection,
}

/// Locate the main content of a document.
///
/// Always returns exactly one block; for documents without any qualifying
/// node that block is the body.
pub fn locate_content<'a>(doc: &'a Document, config: &LocateConfig) -> ContentBlock<'a> {
    if let Some(block) = select_by_cascade(doc, config) {
        debug!(selector = ?block.selection, paragraphs = block.paragraph_count, "content located by selector");
        return block;
    }

    if let Some(block) = select_by_density(doc, config) {
        debug!(paragraphs = block.paragraph_count, tag = %block.element.tag_name(), "content located by density");
        return block;
    }

    let body = doc.body();
    debug!("no content container qualified, using document body");
    ContentBlock { paragraph_count: count_paragraphs(&body, config), element: body, selection: Selection::Body }
}

/// Try each selector in order; the first matching node that clears the
/// character threshold is taken without looking any further.
fn select_by_cascade<'a>(doc: &'a Document, config: &LocateConfig) -> Option<ContentBlock<'a>> {
    for selector in &config.selectors {
        let element = match doc.select_first(selector) {
            Ok(Some(element)) => element,
            Ok(None) => continue,
            Err(e) => {
                debug!(selector = %selector, error = %e, "skipping invalid content selector");
                continue;
            }
        };

        if element.trimmed_text_len() > config.min_selector_chars {
            return Some(ContentBlock {
                paragraph_count: count_paragraphs(&element, config),
                element,
                selection: Selection::Selector(selector.clone()),
            });
        }
    }

    None
}

/// Group qualifying paragraphs by their immediate parent and pick the parent
/// with the most of them.
fn select_by_density<'a>(doc: &'a Document, config: &LocateConfig) -> Option<ContentBlock<'a>> {
    let paragraphs = doc.select("p").ok()?;

    let mut candidates: Vec<Element<'a>> = Vec::new();
    let mut index = HashMap::new();
    let mut scores: Vec<usize> = Vec::new();

    for paragraph in paragraphs {
        if paragraph.trimmed_text_len() <= config.min_paragraph_chars {
            continue;
        }
        let Some(parent) = paragraph.parent() else {
            continue;
        };
        if parent.trimmed_text_len() == 0 {
            continue;
        }

        let slot = *index.entry(parent.element_ref().id()).or_insert_with(|| {
            candidates.push(parent);
            scores.push(0);
            candidates.len() - 1
        });
        scores[slot] += 1;
    }

    let mut best: Option<usize> = None;
    for (slot, score) in scores.iter().enumerate() {
        if best.is_none_or(|current| *score > scores[current]) {
            best = Some(slot);
        }
    }

    let slot = best?;
    if scores[slot] <= config.min_paragraphs {
        return None;
    }

    Some(ContentBlock { element: candidates[slot], paragraph_count: scores[slot], selection: Selection::Density })
}

fn count_paragraphs(element: &Element<'_>, config: &LocateConfig) -> usize {
    element
        .select("p")
        .map(|ps| ps.iter().filter(|p| p.trimmed_text_len() > config.min_paragraph_chars).count())
        .unwrap_or(0)
}
