//! Removal of non-content nodes before the document is parsed.
//!
//! Sanitizing is a single streaming pass with `lol_html`: every node matched
//! by the exclusion list is deleted together with its content. Matching is
//! order-independent and a document without matches comes back unchanged.

use regex::Regex;
use tracing::{debug, warn};

/// Elements that never carry article content.
pub const EXCLUDED_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "svg",
    "img",
    "picture",
    "video",
    "audio",
    "iframe",
    "canvas",
    "embed",
    "object",
    "nav",
    "header",
    "footer",
    "aside",
    "form",
    "button",
    "input",
    "select",
    "textarea",
    "dialog",
    r#"[role="banner"]"#,
    r#"[role="navigation"]"#,
    r#"[role="complementary"]"#,
];

/// Class-name segments associated with ads, cookie banners, newsletters,
/// popups, modals, sidebars and comment sections.
pub const DEFAULT_CLASS_PATTERNS: &[&str] = &[
    r"ads?",
    r"advert\w*",
    r"sponsor\w*",
    r"promo\w*",
    r"cookie\w*",
    r"consent",
    r"gdpr",
    r"newsletter\w*",
    r"subscribe",
    r"popup",
    r"modal",
    r"overlay",
    r"sidebar",
    r"comments?",
    r"disqus",
];

/// Class names describing page state rather than a container's purpose,
/// such as `has-sidebar`, `with-comments`, `ad-free` or `modal-open`.
const STATE_MODIFIER_PATTERN: &str =
    r"(?i)^(?:has|with|no|is|show|hide)[-_]|[-_](?:free|open|active|visible|enabled|disabled|less)$";

/// Elements kept regardless of their class, as they hold the main content.
fn is_content_landmark(el: &lol_html::html_content::Element) -> bool {
    matches!(el.tag_name().as_str(), "html" | "body" | "article" | "main")
        || el.get_attribute("role").is_some_and(|role| role.eq_ignore_ascii_case("main"))
}

/// Configuration for HTML sanitizing
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Regex fragments matched against whole `-`/`_` separated segments of each class name
    pub class_patterns: Vec<String>,
    /// Additional CSS selectors to delete
    pub extra_selectors: Vec<String>,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            class_patterns: DEFAULT_CLASS_PATTERNS.iter().map(|p| p.to_string()).collect(),
            extra_selectors: Vec::new(),
            remove_comments: true,
        }
    }
}

impl SanitizeConfig {
    /// Compiles the class patterns into a single segment-anchored regex.
    ///
    /// Returns `None` when there are no patterns or they do not compile.
    fn class_regex(&self) -> Option<Regex> {
        if self.class_patterns.is_empty() {
            return None;
        }

        let pattern = format!(r"(?i)(?:^|[-_])(?:{})(?:[-_]|$)", self.class_patterns.join("|"));
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "ignoring invalid class patterns");
                None
            }
        }
    }
}

/// Strip scripts, navigation, forms, media and ad-like containers from HTML.
///
/// Class patterns never remove `html`, `body`, `article`, `main` or
/// `[role=main]`, and state classes like `has-sidebar` never trigger
/// removal, so a layout wrapper does not take the article with it.
pub fn sanitize_html(html: &str, config: &SanitizeConfig) -> String {
    let class_regex = config.class_regex();
    let state_regex = Regex::new(STATE_MODIFIER_PATTERN).ok();

    let selectors: Vec<&str> = EXCLUDED_SELECTORS
        .iter()
        .copied()
        .chain(config.extra_selectors.iter().map(String::as_str))
        .filter(|selector| match selector.parse::<lol_html::Selector>() {
            Ok(_) => true,
            Err(e) => {
                warn!(selector, error = %e, "skipping unsupported selector");
                false
            }
        })
        .collect();

    let mut handlers = Vec::with_capacity(selectors.len() + 1);
    for selector in selectors {
        handlers.push(lol_html::element!(selector, |el| {
            el.remove();
            Ok(())
        }));
    }

    if let Some(re) = class_regex.as_ref() {
        let state_regex = state_regex.as_ref();
        handlers.push(lol_html::element!("[class]", move |el| {
            if is_content_landmark(el) {
                return Ok(());
            }

            let is_state = |name: &str| state_regex.is_some_and(|state| state.is_match(name));
            if let Some(class) = el.get_attribute("class")
                && class.split_whitespace().any(|name| !is_state(name) && re.is_match(name))
            {
                el.remove();
            }
            Ok(())
        }));
    }

    let document_handlers = if config.remove_comments {
        vec![lol_html::doc_comments!(|c| {
            c.remove();
            Ok(())
        })]
    } else {
        Vec::new()
    };

    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: handlers,
            document_content_handlers: document_handlers,
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if let Err(e) = rewriter.write(html.as_bytes()) {
        debug!(error = %e, "sanitizer write failed, keeping original markup");
        return html.to_string();
    }

    if let Err(e) = rewriter.end() {
        debug!(error = %e, "sanitizer end failed, keeping original markup");
        return html.to_string();
    }

    if output.is_empty() && !html.is_empty() {
        return html.to_string();
    }

    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_scripts_and_media() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <img src="photo.jpg" alt="photo">
                    <video src="clip.mp4"></video>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = sanitize_html(html, &SanitizeConfig::default());
        assert!(!result.contains("<script"));
        assert!(!result.contains("alert"), "Script content should be removed");
        assert!(!result.contains("color:red"), "Style content should be removed");
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("<iframe"));
        assert!(!result.contains("rect"));
        assert!(!result.contains("photo.jpg"));
        assert!(!result.contains("clip.mp4"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_removes_landmarks_and_forms() {
        let html = r#"
            <body>
                <nav><a href="/">Home</a></nav>
                <div role="banner">Site banner</div>
                <div role="navigation">Menu links</div>
                <div role="complementary">Related reading</div>
                <aside>Aside text</aside>
                <form><input name="q"><button>Search</button></form>
                <footer>Copyright</footer>
                <p>Body text stays</p>
            </body>
        "#;

        let result = sanitize_html(html, &SanitizeConfig::default());
        for gone in ["Home", "Site banner", "Menu links", "Related reading", "Aside text", "Search", "Copyright"] {
            assert!(!result.contains(gone), "{gone} should be removed");
        }
        assert!(result.contains("Body text stays"));
    }

    #[test]
    fn test_removes_class_patterns() {
        let html = r#"
            <body>
                <div class="ad-slot">Buy now</div>
                <div class="cookie-banner">We use cookies</div>
                <div class="newsletter_signup">Subscribe today</div>
                <div class="modal">Popup body</div>
                <div class="left sidebar">Sidebar links</div>
                <section class="comments">Reader comments</section>
                <div class="loader heading">Keep me</div>
                <div class="post-body">Keep me too</div>
            </body>
        "#;

        let result = sanitize_html(html, &SanitizeConfig::default());
        for gone in ["Buy now", "We use cookies", "Subscribe today", "Popup body", "Sidebar links", "Reader comments"] {
            assert!(!result.contains(gone), "{gone} should be removed");
        }
        assert!(result.contains("Keep me"));
        assert!(result.contains("Keep me too"));
    }

    #[test]
    fn test_body_class_is_never_removed() {
        let html = r#"<html class="modal-open"><body class="has-sidebar"><p>Still here</p></body></html>"#;
        let result = sanitize_html(html, &SanitizeConfig::default());
        assert!(result.contains("Still here"));
    }

    #[test]
    fn test_layout_wrapper_keeps_article() {
        let text = "Long form article text about river ecology. ".repeat(20);
        let html = format!(
            r#"<body><div class="layout has-sidebar"><article><p>{text}</p></article></div>
            <div class="page with-comments ad-free"><p>Wrapper text</p></div>
            <div class="sidebar">Side links</div></body>"#
        );

        let result = sanitize_html(&html, &SanitizeConfig::default());
        assert!(result.contains("river ecology"));
        assert!(result.contains("Wrapper text"));
        assert!(!result.contains("Side links"));
    }

    #[test]
    fn test_landmarks_survive_class_patterns() {
        let html = r#"<body><article class="post sponsored">Sponsored story</article>
            <main class="ads-layout">Main body</main><div role="main" class="popup-host">Role main</div></body>"#;

        let result = sanitize_html(html, &SanitizeConfig::default());
        for kept in ["Sponsored story", "Main body", "Role main"] {
            assert!(result.contains(kept), "{kept} should be kept");
        }
    }

    #[test]
    fn test_removes_comments() {
        let html = "<body><!-- hidden note --><p>Visible content</p></body>";
        let result = sanitize_html(html, &SanitizeConfig::default());
        assert!(!result.contains("hidden note"));
        assert!(result.contains("Visible content"));

        let kept = sanitize_html(html, &SanitizeConfig { remove_comments: false, ..Default::default() });
        assert!(kept.contains("hidden note"));
    }

    #[test]
    fn test_extra_selectors_and_invalid_ones() {
        let html = r#"<body><div class="byline">By someone</div><p>Article text</p></body>"#;
        let config = SanitizeConfig {
            extra_selectors: vec![".byline".to_string(), "[[broken".to_string()],
            ..Default::default()
        };

        let result = sanitize_html(html, &config);
        assert!(!result.contains("By someone"));
        assert!(result.contains("Article text"));
    }

    #[test]
    fn test_no_matches_is_noop() {
        let html = "<html><body><p>Plain paragraph</p></body></html>";
        assert_eq!(sanitize_html(html, &SanitizeConfig::default()), html);
    }

    #[test]
    fn test_empty_patterns_disable_class_filter() {
        let html = r#"<body><div class="sidebar">Side</div></body>"#;
        let config = SanitizeConfig { class_patterns: Vec::new(), ..Default::default() };
        assert!(sanitize_html(html, &config).contains("Side"));
    }
}
