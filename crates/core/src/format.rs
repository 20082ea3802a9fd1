//! Semantic formatting of the located content.
//!
//! The formatter walks the chosen [`ContentBlock`] and produces a
//! [`SemanticFragment`]: a title and a flat list of headings, paragraphs,
//! lists and tables, each re-serialized with the permitted tag vocabulary
//! only. Attributes, links, spans and every other wrapper are flattened to
//! escaped text; `strong`, `em` and `code` survive as inline markup.
//!
//! Items keep document order within their category, but the categories are
//! concatenated headings, then paragraphs, then lists, then tables. Existing
//! consumers depend on that grouping.

use scraper::{ElementRef, Node};
use serde::Serialize;

use crate::Document;
use crate::locate::ContentBlock;
use crate::parse::{Element, collapse_whitespace};

/// Title used when the document carries no title metadata and no `<h1>`.
pub const DEFAULT_TITLE: &str = "Extracted Notes";

/// Configuration for semantic formatting
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// A paragraph must have more trimmed characters than this
    pub min_paragraph_chars: usize,
    /// Title used when the document provides none
    pub fallback_title: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { min_paragraph_chars: 10, fallback_title: DEFAULT_TITLE.to_string() }
    }
}

/// One typed piece of extracted content with its normalized markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Heading { level: u8, text: String, html: String },
    Paragraph { text: String, html: String },
    List { ordered: bool, items: Vec<String>, html: String },
    Table { rows: Vec<Vec<String>>, html: String },
}

impl ContentItem {
    /// The serialized markup of this item.
    pub fn html(&self) -> &str {
        match self {
            ContentItem::Heading { html, .. }
            | ContentItem::Paragraph { html, .. }
            | ContentItem::List { html, .. }
            | ContentItem::Table { html, .. } => html,
        }
    }
}

/// The formatter's output: a title plus normalized content items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticFragment {
    pub title: String,
    pub items: Vec<ContentItem>,
}

impl SemanticFragment {
    /// The synthesized `<h1>` title heading.
    pub fn title_html(&self) -> String {
        format!("<h1>{}</h1>", escape_html(&self.title))
    }

    /// All item markup concatenated, without the title heading.
    pub fn items_html(&self) -> String {
        self.items.iter().map(ContentItem::html).collect()
    }

    /// The complete fragment: title heading followed by every item.
    pub fn to_html(&self) -> String {
        let mut html = self.title_html();
        html.push_str(&self.items_html());
        html
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn heading_count(&self) -> usize {
        self.items.iter().filter(|i| matches!(i, ContentItem::Heading { .. })).count()
    }

    pub fn paragraph_count(&self) -> usize {
        self.items.iter().filter(|i| matches!(i, ContentItem::Paragraph { .. })).count()
    }
}

/// Resolve the note title: metadata, then the first `<h1>`, then the fallback.
pub fn resolve_title(doc: &Document, config: &FormatConfig) -> String {
    doc.extract_title()
        .or_else(|| doc.first_heading())
        .unwrap_or_else(|| config.fallback_title.clone())
}

/// Serialize the located block into a [`SemanticFragment`].
pub fn format_content(doc: &Document, block: &ContentBlock<'_>, config: &FormatConfig) -> SemanticFragment {
    let title = resolve_title(doc, config);
    let root = block.element;

    let mut items = Vec::new();
    items.extend(collect_headings(&root, &title));
    items.extend(collect_paragraphs(&root, config));
    items.extend(collect_lists(&root));
    items.extend(collect_tables(&root));

    SemanticFragment { title, items }
}

/// Headings with any text, except one whose text equals the note title.
fn collect_headings(root: &Element<'_>, title: &str) -> Vec<ContentItem> {
    let Ok(headings) = root.select("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    headings
        .iter()
        .filter_map(|heading| {
            let text = collapse_whitespace(&heading.text());
            if text.is_empty() || text == title {
                return None;
            }
            let level = heading_level(&heading.tag_name());
            let tag = format!("h{}", level.min(4));
            let html = format!("<{tag}>{}</{tag}>", escape_html(&text));
            Some(ContentItem::Heading { level, text, html })
        })
        .collect()
}

fn collect_paragraphs(root: &Element<'_>, config: &FormatConfig) -> Vec<ContentItem> {
    let Ok(paragraphs) = root.select("p") else {
        return Vec::new();
    };

    paragraphs
        .iter()
        .filter(|p| p.trimmed_text_len() > config.min_paragraph_chars)
        .map(|p| {
            let text = collapse_whitespace(&p.text());
            let html = format!("<p>{}</p>", render_inline(p.element_ref()));
            ContentItem::Paragraph { text, html }
        })
        .collect()
}

fn collect_lists(root: &Element<'_>) -> Vec<ContentItem> {
    let Ok(lists) = root.select("ul, ol") else {
        return Vec::new();
    };

    lists
        .iter()
        .filter(|list| !nested_within(list, root, &["ul", "ol"]))
        .filter_map(|list| {
            let list = list.element_ref();
            let items: Vec<String> = list_items(list)
                .map(|li| collapse_whitespace(&li.text().collect::<Vec<_>>().join(" ")))
                .filter(|text| !text.is_empty())
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(ContentItem::List { ordered: list.value().name() == "ol", items, html: render_list(list) })
        })
        .collect()
}

fn collect_tables(root: &Element<'_>) -> Vec<ContentItem> {
    let Ok(tables) = root.select("table") else {
        return Vec::new();
    };

    tables
        .iter()
        .filter(|table| !nested_within(table, root, &["table"]))
        .filter_map(|table| {
            let rows: Vec<Vec<String>> = table
                .select("tr")
                .unwrap_or_default()
                .iter()
                .map(|tr| {
                    tr.element_ref()
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                        .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                        .collect::<Vec<_>>()
                })
                .filter(|cells| cells.iter().any(|c| !c.is_empty()))
                .collect();
            if rows.is_empty() {
                return None;
            }
            let html = render_table(&rows);
            Some(ContentItem::Table { rows, html })
        })
        .collect()
}

/// True when `element` sits inside one of `tags` below `root`.
fn nested_within(element: &Element<'_>, root: &Element<'_>, tags: &[&str]) -> bool {
    let root_id = root.element_ref().id();
    for ancestor in element.element_ref().ancestors() {
        if ancestor.id() == root_id {
            return false;
        }
        if let Some(el) = ElementRef::wrap(ancestor)
            && tags.contains(&el.value().name())
        {
            return true;
        }
    }
    false
}

fn heading_level(tag: &str) -> u8 {
    tag.strip_prefix('h').and_then(|n| n.parse().ok()).unwrap_or(1)
}

fn list_items(list: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    list.children().filter_map(ElementRef::wrap).filter(|c| c.value().name() == "li")
}

fn render_list(list: ElementRef<'_>) -> String {
    let tag = if list.value().name() == "ol" { "ol" } else { "ul" };
    let mut html = format!("<{tag}>");
    for li in list_items(list) {
        let inner = render_inline(li);
        if !inner.is_empty() {
            html.push_str(&format!("<li>{inner}</li>"));
        }
    }
    html.push_str(&format!("</{tag}>"));
    html
}

fn render_table(rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Render an element's children keeping only inline emphasis and nested lists.
fn render_inline(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_inline(element, &mut out);
    collapse_whitespace(&out)
}

fn push_inline(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&escape_html(&squash_spaces(text)));
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                match child.value().name() {
                    "strong" | "b" => push_wrapped(child, "strong", out),
                    "em" | "i" => push_wrapped(child, "em", out),
                    "code" => push_wrapped(child, "code", out),
                    "br" => out.push(' '),
                    "ul" | "ol" => {
                        out.push(' ');
                        out.push_str(&render_list(child));
                        out.push(' ');
                    }
                    _ => push_inline(child, out),
                }
            }
            _ => {}
        }
    }
}

fn push_wrapped(element: ElementRef<'_>, tag: &str, out: &mut String) {
    let mut inner = String::new();
    push_inline(element, &mut inner);
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        out.push_str(&inner);
        return;
    }

    if inner.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&format!("<{tag}>{trimmed}</{tag}>"));
    if inner.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Collapse whitespace runs to one space, keeping a single leading/trailing space.
fn squash_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
