//! HTML to plain-text extraction.
//!
//! Pages are reduced to readable text: `<script>`, `<style>` and comments
//! are dropped, block-level tags become line breaks, the common entities
//! are decoded, and whitespace is collapsed. The page title (or first
//! `<h1>`) names the document; a "Feast day: ..." phrase, when present,
//! supplies the feast day.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub name: String,
    pub feast_day: String,
    pub source_url: String,
    pub text: String,
}

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

lazy_regex!(SCRIPT_RE, r"(?is)<script\b.*?</script\s*>");
lazy_regex!(STYLE_RE, r"(?is)<style\b.*?</style\s*>");
lazy_regex!(COMMENT_RE, r"(?s)<!--.*?-->");
lazy_regex!(TAG_RE, r"(?s)<\s*/?\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>");
lazy_regex!(ENTITY_RE, r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);");
lazy_regex!(TITLE_RE, r"(?is)<title[^>]*>(.*?)</title\s*>");
lazy_regex!(H1_RE, r"(?is)<h1[^>]*>(.*?)</h1\s*>");
lazy_regex!(FEAST_RE, r"(?i)\bfeast(?:\s+day)?\s*[:\-]\s*([^\n.;]{1,80})");

const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "tr", "td", "th", "table", "h1", "h2", "h3", "h4", "h5",
    "h6", "section", "article", "header", "footer", "blockquote", "dd", "dt", "hr", "title",
];

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    let Some(re) = ENTITY_RE.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "ndash" => Some('–'),
            "mdash" => Some('\u{2014}'),
            "rsquo" | "lsquo" => Some('\''),
            "rdquo" | "ldquo" => Some('"'),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Reduce an HTML page to plain text, one block per line.
pub fn strip_html(html: &str) -> String {
    let text = replace_all(&SCRIPT_RE, html, " ");
    let text = replace_all(&STYLE_RE, &text, " ");
    let text = replace_all(&COMMENT_RE, &text, " ");

    let text = match TAG_RE.as_ref() {
        Some(re) => re
            .replace_all(&text, |caps: &Captures| {
                let tag = caps[1].to_ascii_lowercase();
                if BLOCK_TAGS.contains(&tag.as_str()) {
                    "\n"
                } else {
                    " "
                }
            })
            .into_owned(),
        None => text,
    };

    collapse_whitespace(&decode_entities(&text))
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_capture(re: &LazyLock<Option<Regex>>, html: &str) -> Option<String> {
    let caps = re.as_ref()?.captures(html)?;
    let inner = strip_html(caps.get(1)?.as_str());
    let inner = inner.split_whitespace().collect::<Vec<_>>().join(" ");
    (!inner.is_empty()).then_some(inner)
}

/// The page `<title>`, or its first `<h1>`.
pub fn extract_title(html: &str) -> Option<String> {
    first_capture(&TITLE_RE, html).or_else(|| first_capture(&H1_RE, html))
}

/// A "Feast day: ..." or "Feast: ..." phrase in extracted text.
pub fn extract_feast_day(text: &str) -> Option<String> {
    let caps = FEAST_RE.as_ref()?.captures(text)?;
    let day = caps.get(1)?.as_str().trim();
    (!day.is_empty()).then(|| day.to_string())
}

/// Extract a document from a fetched page. Pages with no text yield `None`.
pub fn extract_document(html: &str, source_url: &str) -> Option<RawDocument> {
    let text = strip_html(html);
    if text.is_empty() {
        return None;
    }
    Some(RawDocument {
        name: extract_title(html).unwrap_or_default(),
        feast_day: extract_feast_day(&text).unwrap_or_default(),
        source_url: source_url.to_string(),
        text,
    })
}

/// Archive name for a source: the last path segment up to its first `.`.
///
/// `https://www.orthodoxchristian.info/pages/Saints.html` becomes `Saints`.
pub fn source_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let stem = segment.split('.').next().unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | ':') { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "index".into()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head>
          <title>Saint Anthony the Great &amp; the Desert</title>
          <style>body { color: red; }</style>
          <script>var tracking = 1;</script>
        </head>
        <body>
          <!-- navigation -->
          <h1>Anthony the Great</h1>
          <p>Feast day: January 17</p>
          <p>Anthony was born in Egypt   around 251.<br>He withdrew to the desert.</p>
        </body>
        </html>
    "#;

    #[test]
    fn strip_html_drops_markup_and_code() {
        let text = strip_html(PAGE);
        assert!(text.contains("Anthony was born in Egypt around 251."));
        assert!(text.contains("He withdrew to the desert."));
        assert!(!text.contains('<'));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("navigation"));
    }

    #[test]
    fn block_tags_become_lines() {
        let text = strip_html("<p>first</p><p>second</p>inline<b>bold</b>");
        assert_eq!(text, "first\nsecond\ninline bold");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(
            decode_entities("Cyril &amp; Methodius &#8211; &#x41;&nbsp;&bogus;"),
            "Cyril & Methodius – A &bogus;"
        );
    }

    #[test]
    fn title_falls_back_to_h1() {
        assert_eq!(
            extract_title(PAGE).as_deref(),
            Some("Saint Anthony the Great & the Desert")
        );
        assert_eq!(
            extract_title("<body><h1> Saint <em>Nino</em> </h1></body>").as_deref(),
            Some("Saint Nino")
        );
        assert!(extract_title("<p>no heading</p>").is_none());
    }

    #[test]
    fn feast_day_is_found() {
        assert_eq!(
            extract_feast_day("Feast day: January 17\nMore text").as_deref(),
            Some("January 17")
        );
        assert_eq!(
            extract_feast_day("Commemorated. Feast - December 6. Bishop of Myra").as_deref(),
            Some("December 6")
        );
        assert!(extract_feast_day("No commemoration here").is_none());
    }

    #[test]
    fn document_from_page() {
        let doc = extract_document(PAGE, "https://example.org/anthony.html").unwrap();
        assert_eq!(doc.name, "Saint Anthony the Great & the Desert");
        assert_eq!(doc.feast_day, "January 17");
        assert_eq!(doc.source_url, "https://example.org/anthony.html");
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(extract_document("<html><script>x()</script></html>", "u").is_none());
    }

    #[test]
    fn source_names() {
        assert_eq!(
            source_name("https://www.orthodoxchristian.info/pages/Saints.html"),
            "Saints"
        );
        assert_eq!(
            source_name("https://orthodoxwiki.org/Category:Saints"),
            "Category:Saints"
        );
        assert_eq!(source_name("https://example.org/lives/?page=2"), "lives");
        assert_eq!(source_name("https://example.org/"), "example");
    }
}
