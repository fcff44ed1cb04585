use super::normalize::normalize;
use url::{ParseError, Url};

/// Base used only to parse relative references; never fetched
const REFERENCE_BASE: &str = "http://reference.invalid/";

/// What the crawler should do with a link found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Carries a fragment; skipped entirely
    Fragment,
    /// Sitemap or robots resource; never checked or recursed into
    Sitemap,
    /// Same host as the page it was found on
    Internal,
    /// Different host; checked and recorded but never crawled
    External,
    /// Could not be parsed or resolved
    Invalid,
}

/// Parses a link that may be either an absolute URL or a relative reference
fn parse_reference(link: &str) -> Option<Url> {
    match Url::parse(link) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(REFERENCE_BASE).ok()?.join(link).ok()
        }
        Err(_) => None,
    }
}

/// Returns true if the link parses and carries a non-empty fragment
///
/// This matches `#section` as well as `/page#section`.
pub fn is_fragment_only(link: &str) -> bool {
    parse_reference(link)
        .and_then(|url| url.fragment().map(|f| !f.is_empty()))
        .unwrap_or(false)
}

/// Returns true if `link` points at exactly the same host (and port) as `base`
///
/// Relative links are interpreted against `base` and therefore share its host.
/// Subdomains do not match: `blog.example.com` is not `example.com`. An
/// explicit default port is the same as none (`http://example.com:80/` is
/// `http://example.com/`), matching how both normalize to one registry key.
pub fn is_same_domain(link: &str, base: &Url) -> bool {
    let Some(base_host) = base.host_str() else {
        return false;
    };

    match base.join(link) {
        Ok(url) => url.host_str() == Some(base_host) && url.port() == base.port(),
        Err(_) => false,
    }
}

/// Returns true for sitemap and robots resources
pub fn is_sitemap_like(link: &str) -> bool {
    let lower = link.to_lowercase();
    lower.contains("sitemap") || lower.ends_with(".xml") || lower.ends_with("robots.txt")
}

/// Classifies a raw link found on the page at `base`
pub fn classify(link: &str, base: &Url) -> LinkKind {
    if is_fragment_only(link) {
        return LinkKind::Fragment;
    }

    if base.join(link).is_err() {
        return LinkKind::Invalid;
    }

    if is_sitemap_like(&normalize(link, base)) {
        LinkKind::Sitemap
    } else if is_same_domain(link, base) {
        LinkKind::Internal
    } else {
        LinkKind::External
    }
}
