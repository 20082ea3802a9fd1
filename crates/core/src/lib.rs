pub mod error;
pub mod export;
pub mod fetch;
pub mod format;
pub mod locate;
pub mod metadata;
pub mod narration;
pub mod note;
pub mod parse;
pub mod pipeline;
pub mod provider;
pub mod quota;
pub mod rewrite;
pub mod sanitize;
pub mod store;

pub use error::{NoteError, ProviderError, Result};
pub use export::{MarkdownConfig, convert_to_markdown};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use fetch::{FetchConfig, HtmlFetcher, fetch_file, fetch_stdin};
pub use format::{ContentItem, DEFAULT_TITLE, FormatConfig, SemanticFragment, format_content};
pub use locate::{ContentBlock, LocateConfig, Selection, locate_content};
pub use metadata::Metadata;
pub use narration::{narration_script, plain_text};
pub use note::{NoteDocument, NoteOrigin, OutputFormat};
pub use parse::Document;
pub use pipeline::{Extraction, NoteConfig, NoteConfigBuilder, NotePipeline, build_fragment};
pub use provider::{GenerationParams, RewriteProvider};
#[cfg(feature = "fetch")]
pub use provider::{GeminiProvider, ProviderConfig};
pub use quota::{Account, FREE_EXTRACTION_LIMIT, QuotaLedger, QuotaService};
pub use rewrite::{FallbackReason, RewriteResult, Rewriter, fallback_document};
pub use sanitize::{SanitizeConfig, sanitize_html};
pub use store::{NoteStore, SavedNote};
