use crate::Document;
use crate::parse::collapse_whitespace;
use serde::{Deserialize, Serialize};

/// Page-level metadata read from the document head
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. Twitter `twitter:title`
    /// 3. Meta `title` / `DC.title`
    /// 4. `<title>` element
    pub fn extract_title(&self) -> Option<String> {
        ["og:title", "twitter:title", "title", "DC.title"]
            .iter()
            .find_map(|name| self.get_meta_content(name))
            .or_else(|| self.title())
    }

    /// Extract the first non-empty `<h1>` text.
    pub fn first_heading(&self) -> Option<String> {
        self.select("h1")
            .ok()?
            .iter()
            .map(|h| collapse_whitespace(&h.text()))
            .find(|text| !text.is_empty())
    }

    /// Extract excerpt from `description` / `og:description`
    pub fn extract_excerpt(&self) -> Option<String> {
        self.get_meta_content("description")
            .or_else(|| self.get_meta_content("og:description"))
    }

    /// Extract site name from `og:site_name` / `application-name`
    pub fn extract_site_name(&self) -> Option<String> {
        self.get_meta_content("og:site_name")
            .or_else(|| self.get_meta_content("application-name"))
    }

    /// Extract the `lang` attribute of the root element
    pub fn extract_language(&self) -> Option<String> {
        self.select_first("html")
            .ok()
            .flatten()
            .and_then(|html| html.attr("lang"))
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    }

    /// Extract all metadata
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            title: self.extract_title(),
            site_name: self.extract_site_name(),
            excerpt: self.extract_excerpt(),
            language: self.extract_language(),
        }
    }

    /// Get meta tag content by name or property
    fn get_meta_content(&self, attr: &str) -> Option<String> {
        for selector in [format!("meta[name=\"{}\"]", attr), format!("meta[property=\"{}\"]", attr)] {
            if let Ok(Some(el)) = self.select_first(&selector)
                && let Some(content) = el.attr("content")
            {
                let content = collapse_whitespace(content);
                if !content.is_empty() {
                    return Some(content);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Page Title | Site</title>
            <meta property="og:title" content="Open Graph Title">
            <meta property="og:site_name" content="Example Site">
            <meta name="description" content="A short description.">
        </head>
        <body><h1>Heading</h1></body>
        </html>
    "#;

    const HTML_WITHOUT_META: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Simple Page</title></head>
        <body><h1>  </h1><h1>Real
            Heading</h1></body>
        </html>
    "#;

    #[test]
    fn test_extract_title_prefers_open_graph() {
        let doc = Document::parse(HTML_WITH_META);
        assert_eq!(doc.extract_title(), Some("Open Graph Title".to_string()));
    }

    #[test]
    fn test_extract_title_fallback() {
        let doc = Document::parse(HTML_WITHOUT_META);
        assert_eq!(doc.extract_title(), Some("Simple Page".to_string()));
    }

    #[test]
    fn test_blank_meta_is_skipped() {
        let html = r#"<html><head><meta property="og:title" content="  "><title>Fallback</title></head></html>"#;
        let doc = Document::parse(html);
        assert_eq!(doc.extract_title(), Some("Fallback".to_string()));
    }

    #[test]
    fn test_first_heading_skips_empty() {
        let doc = Document::parse(HTML_WITHOUT_META);
        assert_eq!(doc.first_heading(), Some("Real Heading".to_string()));
    }

    #[test]
    fn test_extract_all_metadata() {
        let doc = Document::parse(HTML_WITH_META);
        let metadata = doc.extract_metadata();

        assert_eq!(metadata.site_name, Some("Example Site".to_string()));
        assert_eq!(metadata.excerpt, Some("A short description.".to_string()));
        assert_eq!(metadata.language, Some("en".to_string()));
    }

    #[test]
    fn test_missing_metadata() {
        let doc = Document::parse("<html><body></body></html>");
        assert_eq!(doc.extract_metadata(), Metadata::default());
    }
}
