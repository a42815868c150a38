//! Deterministic mapping from URLs to mirror file paths
//!
//! Layout: `<output_dir>/<subfolder>/<host_with_underscores>/<url path>`.

use crate::UrlError;
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Leaf file name used for directory-like URLs
pub const INDEX_FILE: &str = "index.html";

/// File names longer than this are replaced by a hashed name
const MAX_FILE_NAME_BYTES: usize = 200;

/// Extensions longer than this are not carried over to hashed names
const MAX_KEPT_EXTENSION_BYTES: usize = 16;

/// Maps a URL to its local file path under a content subfolder
///
/// The mapping is a pure function of its inputs:
/// - the host becomes one directory with dots replaced by underscores (an
///   explicit port is appended as `_<port>`)
/// - each path segment is percent-decoded and becomes a nested directory
/// - `.` and `..` segments are dropped so nothing escapes `output_dir`
/// - an empty path or an extensionless last segment gets an `index.html` leaf
/// - query strings are ignored
///
/// # Arguments
///
/// * `output_dir` - Root of the mirror
/// * `subfolder` - Content class folder such as `web` or `pdf`
/// * `url` - The original URL, never an archive address
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the file to write
/// * `Err(UrlError)` - The URL does not parse or has no host
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use site_mirror::content::local_path;
///
/// let path = local_path(Path::new("out"), "web", "https://example.com/docs/intro").unwrap();
/// assert_eq!(path, Path::new("out/web/example_com/docs/intro/index.html"));
/// ```
pub fn local_path(output_dir: &Path, subfolder: &str, url: &str) -> Result<PathBuf, UrlError> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;
    let host = parsed.host_str().ok_or(UrlError::MissingDomain)?;

    let mut domain_folder = host.replace('.', "_");
    if let Some(port) = parsed.port() {
        domain_folder.push_str(&format!("_{}", port));
    }

    let mut segments: Vec<String> = parsed
        .path()
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..")
        .map(|segment| segment.replace(['/', '\\'], "_"))
        .collect();

    let needs_index = segments
        .last()
        .map_or(true, |last| Path::new(last).extension().is_none());
    if needs_index {
        segments.push(INDEX_FILE.to_string());
    }

    if let Some(last) = segments.last_mut() {
        if last.len() > MAX_FILE_NAME_BYTES {
            *last = hashed_file_name(url, last);
        }
    }

    let mut path = output_dir.join(subfolder).join(domain_folder);
    for segment in segments {
        path.push(segment);
    }
    Ok(path)
}

/// Maps a URL to the path of its extracted-text sidecar
///
/// The sidecar mirrors the `web` layout under `subfolder` with the file
/// extension swapped for `extension` (given with or without the leading dot).
pub fn sidecar_path(
    output_dir: &Path,
    subfolder: &str,
    url: &str,
    extension: &str,
) -> Result<PathBuf, UrlError> {
    let path = local_path(output_dir, subfolder, url)?;
    Ok(path.with_extension(extension.trim_start_matches('.')))
}

fn hashed_file_name(url: &str, original: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= MAX_KEPT_EXTENSION_BYTES)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    format!("long_{}{}", &digest[..16], extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out() -> &'static Path {
        Path::new("/mirror")
    }

    #[test]
    fn test_root_maps_to_index() {
        let path = local_path(out(), "web", "https://example.com").unwrap();
        assert_eq!(path, Path::new("/mirror/web/example_com/index.html"));

        let path = local_path(out(), "web", "https://example.com/").unwrap();
        assert_eq!(path, Path::new("/mirror/web/example_com/index.html"));
    }

    #[test]
    fn test_extensionless_path_gets_index_leaf() {
        let path = local_path(out(), "web", "https://www.example.com/about/team").unwrap();
        assert_eq!(
            path,
            Path::new("/mirror/web/www_example_com/about/team/index.html")
        );
    }

    #[test]
    fn test_file_path_kept() {
        let path = local_path(out(), "pdf", "https://example.com/files/doc.pdf").unwrap();
        assert_eq!(path, Path::new("/mirror/pdf/example_com/files/doc.pdf"));
    }

    #[test]
    fn test_query_ignored() {
        let path = local_path(out(), "web", "https://example.com/page.html?x=1").unwrap();
        assert_eq!(path, Path::new("/mirror/web/example_com/page.html"));
    }

    #[test]
    fn test_port_appended_to_domain_folder() {
        let path = local_path(out(), "web", "http://127.0.0.1:8080/a.html").unwrap();
        assert_eq!(path, Path::new("/mirror/web/127_0_0_1_8080/a.html"));
    }

    #[test]
    fn test_percent_decoded_segments() {
        let path = local_path(out(), "docs", "https://example.com/my%20file.docx").unwrap();
        assert_eq!(path, Path::new("/mirror/docs/example_com/my file.docx"));
    }

    #[test]
    fn test_cannot_escape_output_dir() {
        let path = local_path(out(), "web", "https://example.com/%2e%2e/%2e%2e/etc/passwd.txt")
            .unwrap();
        assert!(path.starts_with("/mirror/web/example_com"));

        let path = local_path(out(), "web", "https://example.com/a%2F..%2Fb.html").unwrap();
        assert!(path.starts_with("/mirror/web/example_com"));
    }

    #[test]
    fn test_path_determinism() {
        let url = "https://example.com/a/b/c.png";
        assert_eq!(
            local_path(out(), "media", url).unwrap(),
            local_path(out(), "media", url).unwrap()
        );
    }

    #[test]
    fn test_long_file_name_is_hashed() {
        let long_name = "x".repeat(300);
        let url = format!("https://example.com/dir/{}.html", long_name);
        let path = local_path(out(), "web", &url).unwrap();

        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("long_"));
        assert!(file_name.ends_with(".html"));
        assert_eq!(path.parent().unwrap(), Path::new("/mirror/web/example_com/dir"));
        assert_eq!(path, local_path(out(), "web", &url).unwrap());
    }

    #[test]
    fn test_sidecar_path_swaps_extension() {
        let path = sidecar_path(out(), "text", "https://example.com/about", ".txt").unwrap();
        assert_eq!(path, Path::new("/mirror/text/example_com/about/index.txt"));

        let path = sidecar_path(out(), "text", "https://example.com/a.htm", "md").unwrap();
        assert_eq!(path, Path::new("/mirror/text/example_com/a.md"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(local_path(out(), "web", "not a url").is_err());
    }
}
