//! Plain-text rendering of note bodies and speech-ready narration scripts.

use scraper::{ElementRef, Html, Node};

use crate::parse::collapse_whitespace;

/// Lead-in spoken before every narration script.
pub const NARRATION_PREFIX: &str = "Here's a summary of the notes: ";

/// Scripts shorter than this many characters are read nearly in full.
pub const SHORT_NOTE_CHARS: usize = 5000;

const SHORT_NOTE_TAKE: usize = 4500;
const LONG_NOTE_INTRO: usize = 1000;

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre",
    "table", "tr", "td", "th", "hr",
];

// record separator; cannot appear in parsed text content we care about
const BLOCK_BREAK: char = '\u{1e}';

/// Convert note markup to plain text, one block per paragraph.
///
/// Blocks are separated by a blank line and whitespace inside each block is
/// collapsed.
pub fn plain_text(html: &str) -> String {
    blocks(html).join("\n\n")
}

/// Convert note markup to a single line of text.
pub fn flat_text(html: &str) -> String {
    blocks(html).join(" ")
}

/// Text of every `h1`-`h6` element in document order.
pub fn heading_texts(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Derive a script suitable for text-to-speech from a note body.
///
/// Short notes are read from the start, capped at 4500 characters. Longer
/// notes are condensed to their opening 1000 characters followed by the
/// section headings.
pub fn narration_script(body_html: &str) -> String {
    let text = flat_text(body_html);

    if text.chars().count() < SHORT_NOTE_CHARS {
        return format!("{NARRATION_PREFIX}{}", take_chars(&text, SHORT_NOTE_TAKE));
    }

    let headings = heading_texts(body_html).join(". ");
    format!(
        "{NARRATION_PREFIX}{}... The key points covered are: {headings}",
        take_chars(&text, LONG_NOTE_INTRO)
    )
}

/// Count words in plain text.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().filter(|w| w.chars().any(char::is_alphanumeric)).count()
}

fn blocks(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    push_text(fragment.root_element(), &mut raw);

    raw.split(BLOCK_BREAK).map(collapse_whitespace).filter(|block| !block.is_empty()).collect()
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if el.name() == "br" {
                    out.push(' ');
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&el.name());
                if block {
                    out.push(BLOCK_BREAK);
                }
                push_text(child, out);
                if block {
                    out.push(BLOCK_BREAK);
                }
            }
            _ => {}
        }
    }
}

fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
