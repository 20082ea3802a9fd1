//! The note produced by the pipeline, with export renderings.
//!
//! A [`NoteDocument`] is immutable once built: the constructor derives the
//! plain-text view and reading metrics from the body so they can never
//! disagree with it.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::export::{MarkdownConfig, convert_to_markdown};
use crate::metadata::Metadata;
use crate::narration::{count_words, narration_script, plain_text};

/// Words read per minute when estimating reading time.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Output format options for note content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The note body as HTML.
    Html,
    /// Markdown with TOML frontmatter.
    Markdown,
    /// Plain text, one block per paragraph.
    PlainText,
    /// The whole note as JSON.
    Json,
    /// A speech-ready narration script.
    Narration,
}

/// How the body of a note was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteOrigin {
    /// Written by the rewrite provider.
    Generated,
    /// The provider failed; deterministic fallback document.
    Fallback,
    /// No provider key was supplied; raw fragment with a notice.
    Unconfigured,
    /// A previous note revised by the provider.
    Revised,
}

impl NoteOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteOrigin::Generated => "generated",
            NoteOrigin::Fallback => "fallback",
            NoteOrigin::Unconfigured => "unconfigured",
            NoteOrigin::Revised => "revised",
        }
    }
}

/// A finished set of notes for one source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDocument {
    /// Note title.
    pub title: String,

    /// Note body as HTML.
    pub body_html: String,

    /// URL or path the content came from.
    pub source_url: String,

    /// How the body was produced.
    pub origin: NoteOrigin,

    /// Page metadata read from the source document.
    #[serde(default)]
    pub metadata: Metadata,

    /// Plain text version of the body.
    pub text_content: String,

    /// Word count of the body.
    pub word_count: usize,

    /// Estimated reading time in minutes.
    pub reading_time: f64,
}

impl NoteDocument {
    /// Creates a note, deriving the text view and metrics from `body_html`.
    pub fn new(
        title: impl Into<String>, body_html: impl Into<String>, source_url: impl Into<String>, origin: NoteOrigin,
        metadata: Metadata,
    ) -> Self {
        let body_html = body_html.into();
        let text_content = plain_text(&body_html);
        let word_count = count_words(&text_content);
        let reading_time = word_count as f64 / WORDS_PER_MINUTE;

        Self {
            title: title.into(),
            body_html,
            source_url: source_url.into(),
            origin,
            metadata,
            text_content,
            word_count,
            reading_time,
        }
    }

    /// A copy of this note with a new body, keeping title, source and metadata.
    pub fn with_body(&self, body_html: impl Into<String>, origin: NoteOrigin) -> Self {
        Self::new(self.title.clone(), body_html, self.source_url.clone(), origin, self.metadata.clone())
    }

    /// Converts the note to the specified format.
    pub fn to_format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Html => Ok(self.body_html.clone()),
            OutputFormat::Markdown => Ok(self.to_markdown()),
            OutputFormat::PlainText => Ok(self.text_content.clone()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Narration => Ok(self.narration()),
        }
    }

    /// Gets the note as Markdown with TOML frontmatter.
    pub fn to_markdown(&self) -> String {
        convert_to_markdown(self, &MarkdownConfig::default())
    }

    /// Gets the note as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Gets the speech-ready narration script.
    pub fn narration(&self) -> String {
        narration_script(&self.body_html)
    }
}
