//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types used by every
//! stage of the pipeline. A `Document` is created once per extraction, is
//! never mutated after parsing, and every [`Element`] borrows from it.
//!
//! # Example
//!
//! ```rust
//! use noteify_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! assert_eq!(doc.select("p.content").unwrap().len(), 1);
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::sanitize::{SanitizeConfig, sanitize_html};
use crate::{NoteError, Result};

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page and provides methods for querying elements
/// using CSS selectors and reading title metadata.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without sanitizing it.
    ///
    /// Parsing is lenient: malformed markup is repaired the way a browser
    /// would, so this never fails.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Sanitizes the raw markup and parses the result.
    ///
    /// This is the entry point used by the pipeline: scripts, navigation,
    /// forms and ad-like containers are gone before any element is visited.
    pub fn parse_sanitized(html: &str, config: &SanitizeConfig) -> Self {
        let cleaned = sanitize_html(html, config);
        Self::parse(&cleaned)
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::InvalidSelector`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Gets the first element matching a selector, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(Element::new))
    }

    /// Gets the `<body>` element.
    ///
    /// html5ever always synthesizes a body, so the root element is only
    /// returned for documents that were built without one.
    pub fn body(&self) -> Element<'_> {
        match Selector::parse("body").ok().and_then(|sel| self.html.select(&sel).next()) {
            Some(body) => Element::new(body),
            None => Element::new(self.html.root_element()),
        }
    }

    /// Gets the text of the `<title>` element, trimmed.
    ///
    /// Returns `None` if the element is missing or blank.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| NoteError::InvalidSelector(format!("{}: {}", selector, e)))
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A wrapper around scraper's ElementRef.
///
/// Element represents a single node in the HTML document tree and provides
/// methods for accessing its attributes, text content, and children.
///
/// # Example
///
/// ```rust
/// use noteify_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Gets the underlying scraper element.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the number of characters in the trimmed text content.
    pub fn trimmed_text_len(&self) -> usize {
        self.text().trim().chars().count()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the tag name of this element.
    ///
    /// Returns the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Gets the nearest ancestor that is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }
}
