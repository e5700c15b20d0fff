//! MIME type detection module
//!
//! Returns the Content-Type for a file from its extension, falling back to
//! sniffing the first bytes of content when the extension is unknown.

/// Number of leading bytes inspected by [`sniff_content_type`]
pub const SNIFF_LEN: usize = 512;

/// Content-Type used when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type based on file extension (case-insensitive)
///
/// # Examples
/// ```
/// use dirserve::http::mime::content_type_for_extension;
/// assert_eq!(content_type_for_extension(Some("html")), Some("text/html; charset=utf-8"));
/// assert_eq!(content_type_for_extension(Some("MP4")), Some("video/mp4"));
/// assert_eq!(content_type_for_extension(None), None);
/// ```
pub fn content_type_for_extension(extension: Option<&str>) -> Option<&'static str> {
    let ext = extension?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",

        // JavaScript/WASM
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(content_type)
}

/// HTML tags recognised at the start of a document, upper-cased
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Exact binary signatures
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/gzip"),
    (b"\x00asm", "application/wasm"),
];

/// Guess a Content-Type from the leading bytes of a file
///
/// Only the first [`SNIFF_LEN`] bytes are considered.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let first_non_ws = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | 0x0c | b'\r' | b' '))
        .unwrap_or(data.len());
    let trimmed = &data[first_non_ws..];

    if HTML_TAGS.iter().any(|tag| is_html_tag(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(&(_, content_type)) = SIGNATURES.iter().find(|(sig, _)| data.starts_with(sig)) {
        return content_type;
    }
    if data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP" {
        return "image/webp";
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        "text/plain; charset=utf-8"
    }
}

/// Tag must be followed by a space or `>` to count
fn is_html_tag(data: &[u8], tag: &[u8]) -> bool {
    data.len() > tag.len()
        && data[..tag.len()].eq_ignore_ascii_case(tag)
        && matches!(data[tag.len()], b' ' | b'>')
}

const fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(
            content_type_for_extension(Some("html")),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(
            content_type_for_extension(Some("css")),
            Some("text/css; charset=utf-8")
        );
        assert_eq!(content_type_for_extension(Some("json")), Some("application/json"));
        assert_eq!(content_type_for_extension(Some("PNG")), Some("image/png"));
        assert_eq!(content_type_for_extension(Some("mp4")), Some("video/mp4"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for_extension(Some("xyz")), None);
        assert_eq!(content_type_for_extension(None), None);
    }

    #[test]
    fn test_sniff_html() {
        assert_eq!(
            sniff_content_type(b"  \n<!doctype html><p>hi"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            sniff_content_type(b"<html>"),
            "text/html; charset=utf-8"
        );
        // "<a" needs a terminator to be a tag
        assert_eq!(sniff_content_type(b"<abc"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff_content_type(b"%PDF-1.7 ..."), "application/pdf");
        assert_eq!(
            sniff_content_type(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR"),
            "image/png"
        );
        assert_eq!(sniff_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff_content_type(b"<?xml version=\"1.0\"?>"), "text/xml; charset=utf-8");
    }

    #[test]
    fn test_sniff_text_and_binary() {
        assert_eq!(
            sniff_content_type(b"just some words\n"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(sniff_content_type(b""), "text/plain; charset=utf-8");
        assert_eq!(sniff_content_type(b"\x00\x01\x02\x03"), OCTET_STREAM);
    }
}
