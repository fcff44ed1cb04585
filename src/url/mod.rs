//! URL handling module for Link-Ripple
//!
//! This module provides link resolution and normalization into canonical
//! dedup keys, plus the classification rules deciding which links are
//! skipped, checked, or crawled.

mod classify;
mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use classify::{classify, is_fragment_only, is_same_domain, is_sitemap_like, LinkKind};
pub use normalize::{normalize, resolve, strip_fragment_and_tracking};

/// Parses and validates the seed URL a crawl starts from
///
/// The seed must be an absolute `http` or `https` URL with a host.
///
/// # Examples
///
/// ```
/// use link_ripple::url::parse_seed;
///
/// assert!(parse_seed("https://example.com/").is_ok());
/// assert!(parse_seed("example.com").is_err());
/// assert!(parse_seed("ftp://example.com/").is_err());
/// ```
pub fn parse_seed(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(seed.to_string()));
    }

    Ok(url)
}
