use crate::note::NoteDocument;

/// Configuration for Markdown export
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Include TOML frontmatter with the note's title, source and metrics
    pub include_frontmatter: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { include_frontmatter: true }
    }
}

/// Convert a note to Markdown with optional frontmatter
pub fn convert_to_markdown(note: &NoteDocument, config: &MarkdownConfig) -> String {
    let mut output = String::new();

    if config.include_frontmatter {
        output.push_str(&generate_frontmatter(note));
        output.push('\n');
    }

    output.push_str(html_to_markdown(&note.body_html).trim());
    output.push('\n');
    output
}

/// Generate TOML frontmatter for a note
fn generate_frontmatter(note: &NoteDocument) -> String {
    let mut frontmatter = String::from("+++");

    frontmatter.push_str(&format!("\ntitle = {}", toml_escape_string(&note.title)));
    frontmatter.push_str(&format!("\nsource = {}", toml_escape_string(&note.source_url)));
    frontmatter.push_str(&format!("\norigin = \"{}\"", note.origin.as_str()));

    if let Some(site) = &note.metadata.site_name {
        frontmatter.push_str(&format!("\nsite = {}", toml_escape_string(site)));
    }

    if let Some(excerpt) = &note.metadata.excerpt {
        frontmatter.push_str(&format!("\nexcerpt = {}", toml_escape_string(excerpt)));
    }

    frontmatter.push_str(&format!("\nword_count = {}", note.word_count));
    frontmatter.push_str(&format!("\nreading_time_minutes = {:.1}", note.reading_time));
    frontmatter.push_str("\n+++\n");

    frontmatter
}

/// Escape a string for TOML format
fn toml_escape_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
}

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| crate::narration::plain_text(html))
}

/// Plain text stands in for Markdown when the markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> String {
    crate::narration::plain_text(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::note::NoteOrigin;

    fn note(body: &str) -> NoteDocument {
        let metadata = Metadata { site_name: Some("Test Site".to_string()), ..Default::default() };
        NoteDocument::new("Test \"Quoted\" Title", body, "https://example.com/a", NoteOrigin::Fallback, metadata)
    }

    #[test]
    fn test_frontmatter_generation() {
        let frontmatter = generate_frontmatter(&note("<p>one two three</p>"));
        assert!(frontmatter.starts_with("+++\n"));
        assert!(frontmatter.contains("title = \"Test \\\"Quoted\\\" Title\""));
        assert!(frontmatter.contains("source = \"https://example.com/a\""));
        assert!(frontmatter.contains("origin = \"fallback\""));
        assert!(frontmatter.contains("site = \"Test Site\""));
        assert!(frontmatter.contains("word_count = 3"));
        assert!(frontmatter.ends_with("+++\n"));
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_markdown_body() {
        let markdown = convert_to_markdown(
            &note("<h1>Title</h1><p>This is a <strong>paragraph</strong>.</p><ul><li>Item</li></ul>"),
            &MarkdownConfig { include_frontmatter: false },
        );
        assert!(markdown.starts_with("# Title"));
        assert!(markdown.contains("**paragraph**"));
        assert!(markdown.contains("Item"));
        assert!(!markdown.contains("+++"));
    }

    #[test]
    fn test_toml_escape() {
        assert_eq!(toml_escape_string("plain"), "\"plain\"");
        assert_eq!(toml_escape_string("a\\b\nc"), "\"a\\\\b\\nc\"");
    }
}
