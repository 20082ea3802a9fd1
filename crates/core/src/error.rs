//! Error types for Noteify operations.
//!
//! This module defines the main error type [`NoteError`] and the
//! provider-specific [`ProviderError`]. Only two failures are visible to
//! callers of the pipeline: retrieval of the source page and, on the
//! customization path, the rewrite provider.
//!
//! # Example
//!
//! ```rust
//! use noteify_core::{NoteError, Result};
//!
//! fn require_html(html: &str) -> Result<&str> {
//!     if html.is_empty() {
//!         return Err(NoteError::RetrievalFailed { url: "https://example.com".into(), status: None });
//!     }
//!     Ok(html)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for note extraction operations.
#[derive(Error, Debug)]
pub enum NoteError {
    /// The source page could not be retrieved.
    ///
    /// Covers DNS and connection failures, timeouts, and non-2xx responses.
    /// There is nothing to extract, so no fallback exists for this variant.
    #[error("Failed to retrieve {url}{}", status_suffix(.status))]
    RetrievalFailed { url: String, status: Option<u16> },

    /// The rewrite provider did not produce usable text.
    ///
    /// On the generation path this is recovered with the fallback document;
    /// the customization path returns it to the caller.
    #[error("Rewrite provider failed: {0}")]
    ProviderFailed(#[from] ProviderError),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A CSS selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The HTTP client could not be built, e.g. the user agent is not a valid header value.
    #[cfg(feature = "fetch")]
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    /// The identity has used up its extraction allowance.
    #[error("Extraction limit reached for {identity} ({limit} notes)")]
    QuotaExceeded { identity: String, limit: u32 },
}

impl From<serde_json::Error> for NoteError {
    fn from(err: serde_json::Error) -> Self {
        NoteError::Serialization(err.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Failure modes of a single call to the rewrite provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with a non-2xx status.
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The response parsed but carried no generated text.
    #[error("no text was generated")]
    EmptyResponse,

    /// A revision was requested without an API key.
    #[error("no provider API key configured")]
    MissingKey,

    /// The request exceeded the configured timeout.
    #[error("provider request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Transport-level errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for NoteError.
pub type Result<T> = std::result::Result<T, NoteError>;
