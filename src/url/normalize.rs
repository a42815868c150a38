use crate::UrlError;
use url::Url;

/// Link schemes that never point at a crawlable resource
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a URL according to Site-Mirror's dedup rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host
/// 4. Remove fragment (everything after #)
/// 5. Strip trailing slashes, including the root slash
///
/// Host lowercasing and dot-segment removal come from the URL parser itself.
/// Query strings are kept verbatim.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use site_mirror::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/page/#top").unwrap();
/// assert_eq!(url, "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

/// Resolves an href found on `base` into a normalized absolute URL
///
/// Returns None for links that should be ignored:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links (same page anchors)
/// - empty hrefs, unparsable URLs and non-HTTP(S) results
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if IGNORED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let joined = base.join(href).ok()?;
    finish(joined).ok()
}

/// Prefixes `https://` onto a bare start address such as `example.com`
pub fn with_default_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn finish(mut url: Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    // `/page` and `/page/` collapse to the same resource
    Ok(url.as_str().trim_end_matches('/').to_string())
}
