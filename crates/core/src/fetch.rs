//! Content fetching from URLs, files, and stdin.
//!
//! URL retrieval goes through the [`HtmlFetcher`] trait so the pipeline can
//! be driven by other transports; [`HttpFetcher`] is the reqwest-backed
//! implementation.

use std::fs;
use std::future::Future;
use std::path::PathBuf;

use crate::{NoteError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Noteify/1.0)".to_string() }
    }
}

/// Retrieves the HTML of a page.
pub trait HtmlFetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Any failure is reported as [`NoteError::RetrievalFailed`], or
    /// [`NoteError::InvalidUrl`] when `url` cannot be parsed.
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(feature = "fetch")]
pub use http::HttpFetcher;

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use reqwest::Client;
    use tracing::debug;
    use url::Url;

    use super::{FetchConfig, HtmlFetcher};
    use crate::{NoteError, Result};

    /// Fetches pages over HTTP(S) with reqwest.
    ///
    /// Follows redirects and sends a browser-like `Accept` header.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
        config: FetchConfig,
    }

    impl HttpFetcher {
        pub fn new(config: FetchConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(NoteError::HttpClient)?;
            Ok(Self { client, config })
        }

        pub fn config(&self) -> &FetchConfig {
            &self.config
        }
    }

    impl HtmlFetcher for HttpFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String> {
            let parsed = Url::parse(url).map_err(|e| NoteError::InvalidUrl(format!("{url}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(NoteError::InvalidUrl(format!("{url}: URL must use http:// or https://")));
            }

            let retrieval_failed = |status: Option<u16>| NoteError::RetrievalFailed { url: url.to_string(), status };

            let response = self
                .client
                .get(parsed)
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await
                .map_err(|e| {
                    debug!(url, error = %e, timeout = e.is_timeout(), "request failed");
                    retrieval_failed(e.status().map(|s| s.as_u16()))
                })?;

            let status = response.status();
            if !status.is_success() {
                debug!(url, status = status.as_u16(), "non-success response");
                return Err(retrieval_failed(Some(status.as_u16())));
            }

            response.text().await.map_err(|e| {
                debug!(url, error = %e, "failed to read response body");
                retrieval_failed(Some(status.as_u16()))
            })
        }
    }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(NoteError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(NoteError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(NoteError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Noteify"));
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_fetch_url_invalid() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();

        for url in ["not-a-url", "ftp://example.com/file"] {
            let result = runtime.block_on(fetcher.fetch_html(url));
            assert!(matches!(result, Err(NoteError::InvalidUrl(_))), "{url}");
        }
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_invalid_user_agent_is_client_error() {
        let config = FetchConfig { user_agent: "bad\nagent".to_string(), ..Default::default() };
        assert!(matches!(HttpFetcher::new(config), Err(NoteError::HttpClient(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(NoteError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>Saved page</p>").unwrap();

        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "<p>Saved page</p>");
    }
}
