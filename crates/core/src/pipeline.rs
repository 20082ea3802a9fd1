//! Main note extraction API.
//!
//! [`NotePipeline`] sequences retrieval, sanitizing, content location,
//! semantic formatting and the rewrite-or-fallback step. Only retrieval can
//! fail; every later stage always produces a note.
//!
//! # Example
//!
//! ```rust,no_run
//! use noteify_core::{FetchConfig, NoteConfig, NotePipeline, ProviderConfig};
//!
//! # async fn example() -> noteify_core::Result<()> {
//! let pipeline = NotePipeline::new(NoteConfig::default(), FetchConfig::default(), ProviderConfig::default())?;
//! let note = pipeline.extract("https://example.com/article", None).await?;
//! println!("{}", note.body_html);
//! # Ok(())
//! # }
//! ```

use tracing::debug;

use crate::Result;
use crate::fetch::HtmlFetcher;
use crate::format::{FormatConfig, SemanticFragment, format_content};
use crate::locate::{LocateConfig, Selection, locate_content};
use crate::metadata::Metadata;
use crate::note::{NoteDocument, NoteOrigin};
use crate::parse::Document;
use crate::provider::{GenerationParams, RewriteProvider};
use crate::rewrite::{FallbackReason, RewriteResult, Rewriter};
use crate::sanitize::SanitizeConfig;

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, HttpFetcher};
#[cfg(feature = "fetch")]
use crate::provider::{GeminiProvider, ProviderConfig};

/// Configuration for the extraction stages.
///
/// # Example
///
/// ```rust
/// use noteify_core::NoteConfig;
///
/// let config = NoteConfig::builder()
///     .min_content_chars(300)
///     .min_paragraphs(2)
///     .fallback_title("Untitled")
///     .build();
/// assert_eq!(config.locate.min_selector_chars, 300);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NoteConfig {
    pub sanitize: SanitizeConfig,
    pub locate: LocateConfig,
    pub format: FormatConfig,
}

impl NoteConfig {
    /// Creates a new builder for NoteConfig.
    pub fn builder() -> NoteConfigBuilder {
        NoteConfigBuilder::new()
    }
}

/// Builder for NoteConfig.
pub struct NoteConfigBuilder {
    config: NoteConfig,
}

impl NoteConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: NoteConfig::default() }
    }

    /// Replaces the class-name patterns that mark removable containers.
    pub fn class_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.sanitize.class_patterns = patterns;
        self
    }

    /// Adds selectors removed during sanitizing.
    pub fn extra_selectors(mut self, selectors: Vec<String>) -> Self {
        self.config.sanitize.extra_selectors = selectors;
        self
    }

    pub fn remove_comments(mut self, value: bool) -> Self {
        self.config.sanitize.remove_comments = value;
        self
    }

    /// Replaces the ordered content selector cascade.
    pub fn content_selectors(mut self, selectors: Vec<String>) -> Self {
        self.config.locate.selectors = selectors;
        self
    }

    /// Sets the character count a cascade match must exceed.
    pub fn min_content_chars(mut self, value: usize) -> Self {
        self.config.locate.min_selector_chars = value;
        self
    }

    /// Sets the character count a paragraph must exceed, for both location and formatting.
    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.locate.min_paragraph_chars = value;
        self.config.format.min_paragraph_chars = value;
        self
    }

    /// Sets the paragraph count a density candidate must exceed.
    pub fn min_paragraphs(mut self, value: usize) -> Self {
        self.config.locate.min_paragraphs = value;
        self
    }

    /// Sets the title used when the page has none.
    pub fn fallback_title(mut self, value: impl Into<String>) -> Self {
        self.config.format.fallback_title = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> NoteConfig {
        self.config
    }
}

impl Default for NoteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of the deterministic stages for one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub fragment: SemanticFragment,
    pub metadata: Metadata,
    /// Locator step that chose the content root
    pub selection: Selection,
    /// Qualifying paragraphs under the content root
    pub paragraph_count: usize,
}

/// Sanitize, locate and format `html` without any I/O.
pub fn build_fragment(html: &str, config: &NoteConfig) -> Extraction {
    let doc = Document::parse_sanitized(html, &config.sanitize);
    let block = locate_content(&doc, &config.locate);
    let fragment = format_content(&doc, &block, &config.format);

    debug!(
        selection = ?block.selection,
        items = fragment.len(),
        headings = fragment.heading_count(),
        paragraphs = fragment.paragraph_count(),
        "formatted content"
    );

    Extraction {
        fragment,
        metadata: doc.extract_metadata(),
        selection: block.selection.clone(),
        paragraph_count: block.paragraph_count,
    }
}

/// Turns web pages into [`NoteDocument`]s.
///
/// Generic over the retrieval and rewrite collaborators so either can be
/// replaced; [`NotePipeline::new`] wires the HTTP implementations.
#[derive(Debug, Clone)]
pub struct NotePipeline<F, P> {
    config: NoteConfig,
    fetcher: F,
    rewriter: Rewriter<P>,
}

#[cfg(feature = "fetch")]
impl NotePipeline<HttpFetcher, GeminiProvider> {
    /// Pipeline backed by reqwest for retrieval and the Gemini API for rewriting.
    pub fn new(config: NoteConfig, fetch: FetchConfig, provider: ProviderConfig) -> Result<Self> {
        Ok(Self::with_parts(config, HttpFetcher::new(fetch)?, GeminiProvider::new(provider)?))
    }
}

impl<F: HtmlFetcher, P: RewriteProvider> NotePipeline<F, P> {
    pub fn with_parts(config: NoteConfig, fetcher: F, provider: P) -> Self {
        Self { config, fetcher, rewriter: Rewriter::new(provider) }
    }

    /// Override the provider sampling parameters.
    pub fn with_params(mut self, generation: GenerationParams, revision: GenerationParams) -> Self {
        self.rewriter = self.rewriter.with_params(generation, revision);
        self
    }

    pub fn config(&self) -> &NoteConfig {
        &self.config
    }

    /// Run the deterministic stages on already retrieved markup.
    pub fn prepare(&self, html: &str) -> Extraction {
        build_fragment(html, &self.config)
    }

    /// Fetch `url` and turn it into notes.
    ///
    /// Fails only when the page cannot be retrieved. With no `api_key` the
    /// provider is not contacted.
    pub async fn extract(&self, url: &str, api_key: Option<&str>) -> Result<NoteDocument> {
        debug!(url, "fetching page");
        let html = self.fetcher.fetch_html(url).await?;
        debug!(url, bytes = html.len(), "fetched page");

        Ok(self.extract_html(&html, url, api_key).await)
    }

    /// Turn already retrieved markup into notes; never fails.
    pub async fn extract_html(&self, html: &str, source_url: &str, api_key: Option<&str>) -> NoteDocument {
        let Extraction { fragment, metadata, .. } = self.prepare(html);

        let result = self.rewriter.rewrite(&fragment, source_url, api_key).await;
        let origin = match &result {
            RewriteResult::Generated(_) => NoteOrigin::Generated,
            RewriteResult::FallbackUsed(FallbackReason::NoKeyConfigured) => NoteOrigin::Unconfigured,
            RewriteResult::FallbackUsed(FallbackReason::ProviderFailed(_)) => NoteOrigin::Fallback,
        };
        debug!(origin = origin.as_str(), "rewrite finished");

        let body = result.into_body(&fragment, source_url);
        NoteDocument::new(fragment.title, body, source_url, origin, metadata)
    }

    /// Revise an existing note with a free-text instruction.
    ///
    /// Unlike generation there is no fallback: provider failures are returned.
    pub async fn customize(&self, note: &NoteDocument, instruction: &str, api_key: &str) -> Result<NoteDocument> {
        debug!(source = %note.source_url, "customizing note");
        let body = self.rewriter.revise(&note.body_html, &note.source_url, instruction, api_key).await?;
        Ok(note.with_body(body, NoteOrigin::Revised))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteError;
    use crate::error::ProviderError;

    struct StaticFetcher(Option<&'static str>);

    impl HtmlFetcher for StaticFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| NoteError::RetrievalFailed { url: url.to_string(), status: Some(404) })
        }
    }

    struct EchoProvider;

    impl RewriteProvider for EchoProvider {
        async fn generate(
            &self, _api_key: &str, prompt: &str, _params: &GenerationParams,
        ) -> std::result::Result<String, ProviderError> {
            if prompt.contains("REVISE") {
                Ok("<h1>Revised</h1>".to_string())
            } else {
                Ok("<h1>Generated</h1>".to_string())
            }
        }
    }

    const PAGE: &str = r#"
        <html><head><title>Sample</title></head>
        <body><nav>Menu</nav><div><p>A paragraph that is long enough.</p></div></body></html>
    "#;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
    }

    #[test]
    fn test_builder() {
        let config = NoteConfig::builder()
            .min_content_chars(100)
            .min_paragraph_chars(20)
            .min_paragraphs(1)
            .remove_comments(false)
            .content_selectors(vec!["main".to_string()])
            .fallback_title("Untitled")
            .build();

        assert_eq!(config.locate.min_selector_chars, 100);
        assert_eq!(config.locate.min_paragraph_chars, 20);
        assert_eq!(config.format.min_paragraph_chars, 20);
        assert_eq!(config.locate.min_paragraphs, 1);
        assert!(!config.sanitize.remove_comments);
        assert_eq!(config.locate.selectors, vec!["main"]);
        assert_eq!(config.format.fallback_title, "Untitled");
    }

    #[test]
    fn test_build_fragment() {
        let extraction = build_fragment(PAGE, &NoteConfig::default());
        assert_eq!(extraction.fragment.title, "Sample");
        assert_eq!(extraction.fragment.paragraph_count(), 1);
        assert_eq!(extraction.selection, Selection::Body);
        assert!(!extraction.fragment.to_html().contains("Menu"));
    }

    #[test]
    fn test_extract_without_key() {
        let pipeline = NotePipeline::with_parts(NoteConfig::default(), StaticFetcher(Some(PAGE)), EchoProvider);
        let note = block_on(pipeline.extract("https://example.com/a", None)).unwrap();

        assert_eq!(note.origin, NoteOrigin::Unconfigured);
        assert_eq!(note.title, "Sample");
        assert_eq!(note.source_url, "https://example.com/a");
        assert!(note.body_html.starts_with("<h1>Sample</h1><p>A paragraph that is long enough.</p>"));
    }

    #[test]
    fn test_extract_with_key() {
        let pipeline = NotePipeline::with_parts(NoteConfig::default(), StaticFetcher(Some(PAGE)), EchoProvider);
        let note = block_on(pipeline.extract("https://example.com/a", Some("key"))).unwrap();

        assert_eq!(note.origin, NoteOrigin::Generated);
        assert_eq!(note.body_html, "<h1>Generated</h1>");
    }

    #[test]
    fn test_retrieval_failure_surfaces() {
        let pipeline = NotePipeline::with_parts(NoteConfig::default(), StaticFetcher(None), EchoProvider);
        let err = block_on(pipeline.extract("https://example.com/missing", Some("key"))).unwrap_err();
        assert!(matches!(err, NoteError::RetrievalFailed { status: Some(404), .. }));
    }

    #[test]
    fn test_customize() {
        let pipeline = NotePipeline::with_parts(NoteConfig::default(), StaticFetcher(Some(PAGE)), EchoProvider);
        let note = block_on(pipeline.extract_html(PAGE, "page.html", None));
        let revised = block_on(pipeline.customize(&note, "add a glossary", "key")).unwrap();

        assert_eq!(revised.origin, NoteOrigin::Revised);
        assert_eq!(revised.body_html, "<h1>Revised</h1>");
        assert_eq!(revised.title, note.title);
    }
}
