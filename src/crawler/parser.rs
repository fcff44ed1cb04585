//! HTML parser for extracting links
//!
//! Extraction is deliberately raw: every `<a href>` value is returned exactly
//! as written, in document order. Resolution, normalization and filtering are
//! the crawl task's job.

use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Raw href values of every anchor, in document order
    pub links: Vec<String>,
}

/// Parses HTML content and extracts the anchor hrefs
///
/// html5ever recovers from malformed markup, so parsing itself never fails.
///
/// # Example
///
/// ```
/// use link_ripple::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.links, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_hrefs(&document),
    }
}

/// Extracts the href of every `<a>` element in document order
fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Convenience function for extracting just the links from HTML
pub fn extract_links(html: &str) -> Vec<String> {
    parse_html(html).links
}
