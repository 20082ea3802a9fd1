//! Rewrite orchestration.
//!
//! A [`Rewriter`] asks a [`RewriteProvider`] to turn the semantic fragment
//! into structured notes. Generation never fails: without a key, or when the
//! provider errors, a deterministic document is built from the fragment
//! instead. Revision of existing notes has no fallback and propagates
//! provider errors.

use tracing::{debug, warn};

use crate::error::{ProviderError, Result};
use crate::format::{SemanticFragment, escape_html};
use crate::provider::{GenerationParams, RewriteProvider};

/// Notice placed under the title when the provider could not be used.
pub const FALLBACK_NOTICE: &str = "AI-generated notes are unavailable right now. \
     Below is the content extracted directly from the page";

/// Advisory closing the fallback document.
pub const FALLBACK_ADVISORY: &str = "These notes were produced without AI rewriting. \
     Try again later for a summarized, structured version.";

/// Notice appended when no provider key is configured.
pub const UNCONFIGURED_NOTICE: &str = "No rewrite provider key is configured, so this is the extracted \
     content without AI structuring. Supply an API key to generate full notes.";

/// Tag vocabulary the provider is asked to stay within.
const PERMITTED_TAGS: &str = "\
- <h1>, <h2>, <h3>, <h4> for headings
- <p> for paragraphs
- <ul> and <li> for unordered lists
- <ol> and <li> for ordered lists
- <blockquote> for definitions or important quotes
- <pre><code> for code blocks
- <strong> for bold/important text
- <em> for emphasized text
- <hr> for section breaks";

/// Build the prompt that turns extracted content into notes.
pub fn generation_prompt(content: &str, url: &str) -> String {
    format!(
        "You are a professional note-taking assistant. Create clear, well organized and structured notes \
from the following web content.
Your notes MUST:
1. Open with a concise executive summary (3-5 sentences at most)
2. Follow it with a table of contents listing each section
3. Use a proper hierarchy of headings and subheadings (h2, h3, h4 tags)
4. Present information in small, digestible chunks
5. Use bullet points and numbered lists where they help clarity
6. Put important definitions in blockquote elements
7. Bold key terms and concepts for easy scanning
8. Separate sections with clear transitions and visual breaks
9. Format code examples, if any, as code blocks
10. End with a brief conclusion

Format the notes as semantic HTML using only these elements:
{PERMITTED_TAGS}

Focus on clarity and structure. Leave out advertisements and irrelevant content.

Here is the content from the webpage ({url}):
{content}
"
    )
}

/// Build the prompt that revises existing notes per a user instruction.
pub fn revision_prompt(content: &str, url: &str, instruction: &str) -> String {
    format!(
        "You are a professional note-taking assistant. REVISE and CUSTOMIZE the following notes about web content.

The user gave these customization instructions:
\"{instruction}\"

Apply them while keeping:
1. Proper HTML formatting with semantic tags
2. A well organized structure with clear headings
3. Readability

Format the notes as semantic HTML using these elements as needed:
{PERMITTED_TAGS}

Here are the notes to customize (they are about content from {url}):
{content}
"
    )
}

/// Why the deterministic document was used instead of provider output.
#[derive(Debug)]
pub enum FallbackReason {
    /// No API key was supplied; the provider was never called.
    NoKeyConfigured,
    /// The provider was called and failed.
    ProviderFailed(ProviderError),
}

/// Outcome of a generation attempt.
#[derive(Debug)]
pub enum RewriteResult {
    /// Provider output, code fences removed.
    Generated(String),
    FallbackUsed(FallbackReason),
}

impl RewriteResult {
    pub fn is_generated(&self) -> bool {
        matches!(self, RewriteResult::Generated(_))
    }

    /// Produce the note body for this outcome.
    pub fn into_body(self, fragment: &SemanticFragment, url: &str) -> String {
        match self {
            RewriteResult::Generated(text) => text,
            RewriteResult::FallbackUsed(FallbackReason::NoKeyConfigured) => unconfigured_document(fragment),
            RewriteResult::FallbackUsed(FallbackReason::ProviderFailed(_)) => fallback_document(fragment, url),
        }
    }
}

/// Drives a [`RewriteProvider`] with the note prompts.
#[derive(Debug, Clone)]
pub struct Rewriter<P> {
    provider: P,
    generation: GenerationParams,
    revision: GenerationParams,
}

impl<P: RewriteProvider> Rewriter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, generation: GenerationParams::generation(), revision: GenerationParams::revision() }
    }

    /// Override the sampling parameters of both entry points.
    pub fn with_params(mut self, generation: GenerationParams, revision: GenerationParams) -> Self {
        self.generation = generation;
        self.revision = revision;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ask the provider for notes built from `fragment`.
    ///
    /// A missing or blank key skips the call entirely. Provider errors are
    /// logged and reported as [`FallbackReason::ProviderFailed`].
    pub async fn rewrite(&self, fragment: &SemanticFragment, url: &str, api_key: Option<&str>) -> RewriteResult {
        let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            debug!("no provider key configured, skipping rewrite");
            return RewriteResult::FallbackUsed(FallbackReason::NoKeyConfigured);
        };

        let prompt = generation_prompt(&fragment.to_html(), url);
        match self.provider.generate(key, &prompt, &self.generation).await.and_then(|text| cleaned_output(&text)) {
            Ok(text) => RewriteResult::Generated(text),
            Err(e) => {
                warn!(url, error = %e, "rewrite provider failed, using fallback document");
                RewriteResult::FallbackUsed(FallbackReason::ProviderFailed(e))
            }
        }
    }

    /// Revise an existing note body according to `instruction`.
    pub async fn revise(&self, body_html: &str, url: &str, instruction: &str, api_key: &str) -> Result<String> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(ProviderError::MissingKey.into());
        }

        let prompt = revision_prompt(body_html, url, instruction);
        let text = self.provider.generate(key, &prompt, &self.revision).await?;
        Ok(cleaned_output(&text)?)
    }
}

/// Fence-stripped provider output; nothing left after stripping is an empty response.
fn cleaned_output(text: &str) -> std::result::Result<String, ProviderError> {
    let body = strip_code_fences(text);
    if body.is_empty() { Err(ProviderError::EmptyResponse) } else { Ok(body) }
}

/// Deterministic notes used when the provider fails.
///
/// Performs no I/O. The body between the two rules is the fragment's own
/// item markup, so the document is never empty.
pub fn fallback_document(fragment: &SemanticFragment, url: &str) -> String {
    let items = if fragment.is_empty() {
        "<p>No readable content was found on this page.</p>".to_string()
    } else {
        fragment.items_html()
    };

    format!(
        "{}<p>{} ({}).</p><hr>{}<hr><p><em>{}</em></p>",
        fragment.title_html(),
        FALLBACK_NOTICE,
        escape_html(url),
        items,
        FALLBACK_ADVISORY
    )
}

/// The raw fragment followed by a short notice that no key was supplied.
pub fn unconfigured_document(fragment: &SemanticFragment) -> String {
    format!("{}<hr><p><em>{}</em></p>", fragment.to_html(), UNCONFIGURED_NOTICE)
}

/// Remove a Markdown code fence wrapped around the whole answer.
///
/// Text without an opening fence is returned trimmed but otherwise intact.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // drop the info string, e.g. ```html
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim().to_string()
}
