use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
];

/// Resolves a link against a base URL
///
/// Handles absolute links, scheme-relative links (`//host/path`) and relative
/// paths. A link that cannot be resolved is returned unchanged.
///
/// # Examples
///
/// ```
/// use link_ripple::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// assert_eq!(resolve("guide", &base), "https://example.com/docs/guide");
/// assert_eq!(resolve("//cdn.example.com/a", &base), "https://cdn.example.com/a");
/// ```
pub fn resolve(link: &str, base: &Url) -> String {
    match base.join(link) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Failed to resolve {} against {}: {}", link, base, e);
            link.to_string()
        }
    }
}

/// Removes the fragment and tracking parameters from an absolute URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; if it does not parse, return it unchanged
/// 2. Remove the fragment (everything after #)
/// 3. Remove tracking query parameters
/// 4. Sort remaining query parameters by key and re-encode them
/// 5. Remove an empty query string (trailing ?)
pub fn strip_fragment_and_tracking(absolute: &str) -> String {
    let mut url = match Url::parse(absolute) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Leaving unparseable URL {} as is: {}", absolute, e);
            return absolute.to_string();
        }
    };

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url.to_string()
}

/// Produces the canonical key for `link` as seen from `base`
///
/// `normalize(normalize(x, b), b) == normalize(x, b)` for every input.
///
/// # Examples
///
/// ```
/// use link_ripple::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("http://example.com/").unwrap();
/// assert_eq!(
///     normalize("/a?utm_source=news&b=2#top", &base),
///     "http://example.com/a?b=2"
/// );
/// ```
pub fn normalize(link: &str, base: &Url) -> String {
    strip_fragment_and_tracking(&resolve(link, base))
}

/// Filters out tracking parameters and sorts the rest by key
///
/// The sort is stable so repeated keys keep their original relative order.
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}
