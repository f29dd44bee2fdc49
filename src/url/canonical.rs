use crate::UrlError;
use url::{ParseError, Url};

/// Query parameters that carry tracking noise rather than identity
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Canonicalizes an absolute listing URL
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require http or https (the scheme is kept as given)
/// 3. Lowercase the host
/// 4. Collapse empty path segments and drop the trailing slash (except root)
/// 5. Drop the fragment
/// 6. Drop tracking query parameters and sort the rest by key
/// 7. Drop an empty query string
///
/// # Examples
///
/// ```
/// use gig_crawler::url::canonicalize_url;
///
/// let url = canonicalize_url("https://WWW.Wishket.com/project/142399/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.wishket.com/project/142399");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Produces the dedup key for a scraped listing URL
///
/// Absolute http(s) URLs are canonicalized. Strings that are not absolute
/// URLs at all (e.g. `a.com/1`) are kept, trimmed, as the key. Absolute URLs
/// with another scheme are rejected.
pub fn canonical_listing_key(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("empty URL".to_string()));
    }

    match Url::parse(trimmed) {
        Ok(_) => canonicalize_url(trimmed).map(String::from),
        Err(ParseError::RelativeUrlWithoutBase) => Ok(trimmed.to_string()),
        Err(e) => Err(UrlError::Parse(e.to_string())),
    }
}

/// Collapses empty segments and strips the trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
