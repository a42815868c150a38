/// Marker preceding the timestamp in an archive capture address
const CAPTURE_MARKER: &str = "web.archive.org/web/";

/// Extracts the original address from a capture address
///
/// `https://web.archive.org/web/20190101000000/https://example.com/page`
/// yields `https://example.com/page`. The timestamp may carry a modifier such
/// as `id_`. Returns None when the input is not a capture address.
///
/// # Example
///
/// ```
/// use site_mirror::archive::clean_archive_url;
///
/// let original = clean_archive_url("https://web.archive.org/web/2019/http://example.com/a");
/// assert_eq!(original.as_deref(), Some("http://example.com/a"));
/// ```
pub fn clean_archive_url(address: &str) -> Option<String> {
    let address = address.trim();
    let scheme_end = address.find("://")?;
    if !matches!(&address[..scheme_end], "http" | "https") {
        return None;
    }

    let rest = address[scheme_end + 3..].strip_prefix(CAPTURE_MARKER)?;
    let (timestamp, original) = rest.split_once('/')?;

    let digits = timestamp.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '_');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if !(original.starts_with("http://") || original.starts_with("https://")) {
        return None;
    }

    let original = original
        .split(char::is_whitespace)
        .next()
        .unwrap_or(original);
    Some(original.to_string())
}
