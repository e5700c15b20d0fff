//! Request path normalization
//!
//! Turns the raw request path into a clean rooted path (`/a/b`) that can be
//! joined onto the root without escaping it, and back into a URL path for
//! redirects and listing links.

use crate::error::ServeError;
use std::path::{Path, PathBuf};

/// Decode `%XX` escapes
///
/// Malformed escapes, decoded NUL bytes and non-UTF-8 results are rejected.
pub fn percent_decode(raw: &str) -> Result<String, ServeError> {
    if !escapes_well_formed(raw) {
        return Err(ServeError::BadRequest("invalid percent-encoding in path"));
    }

    let bytes = urlencoding::decode_binary(raw.as_bytes());
    if bytes.contains(&0) {
        return Err(ServeError::BadRequest("NUL byte in path"));
    }
    String::from_utf8(bytes.into_owned())
        .map_err(|_| ServeError::BadRequest("path is not valid UTF-8"))
}

/// Every `%` must introduce two hex digits; the decoder itself passes
/// stray ones through unchanged
fn escapes_well_formed(raw: &str) -> bool {
    raw.split('%').skip(1).all(|rest| {
        rest.as_bytes()
            .get(..2)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

/// Lexically clean a path as if rooted at `/`
///
/// Collapses repeated slashes, `.` and `..`; `..` at the root stays at the
/// root. The result always starts with `/` and never ends with one, except
/// for the root itself.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Join a cleaned path onto the root directory
pub fn join_root(root: &Path, clean: &str) -> PathBuf {
    clean
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Percent-encode a path for use in a URL, segment by segment
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/a%20b/c").unwrap(), "/a b/c");
        assert_eq!(percent_decode("/%E2%9C%93").unwrap(), "/\u{2713}");
        assert_eq!(percent_decode("/plain").unwrap(), "/plain");
    }

    #[test]
    fn test_percent_decode_rejects_bad_input() {
        for raw in ["/%zz", "/%4", "/a%", "/%%41", "/a%00b", "/%ff%fe"] {
            assert!(
                matches!(percent_decode(raw), Err(ServeError::BadRequest(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/a/b/"), "/a/b");
        assert_eq!(clean_path("//a///b"), "/a/b");
        assert_eq!(clean_path("/a/./b/../c"), "/a/c");
        assert_eq!(clean_path("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("/a/../../.."), "/");
    }

    #[test]
    fn test_decoded_traversal_is_cleaned() {
        let decoded = percent_decode("/%2e%2e/%2e%2e%2fetc/passwd").unwrap();
        assert_eq!(clean_path(&decoded), "/etc/passwd");
    }

    #[test]
    fn test_join_root() {
        let root = Path::new("/srv/www");
        assert_eq!(join_root(root, "/"), PathBuf::from("/srv/www"));
        assert_eq!(join_root(root, "/a/b.txt"), PathBuf::from("/srv/www/a/b.txt"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("/a b/c#d?.txt"), "/a%20b/c%23d%3F.txt");
        assert_eq!(encode_path("/\u{2713}"), "/%E2%9C%93");
        assert_eq!(encode_path("/"), "/");
        assert_eq!(encode_path("/a&b/"), "/a%26b/");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'"),
            "&lt;a href=&#34;x&#34;&gt;&amp;&#39;"
        );
    }
}
