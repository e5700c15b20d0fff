//! HTTP Range request parsing module
//!
//! Range header parsing for resumable downloads, compliant with RFC 7233.

/// One satisfiable byte range, already clamped to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position
    pub start: u64,
    /// Number of bytes, never zero
    pub length: u64,
}

impl ByteRange {
    /// Last byte position (inclusive)
    #[inline]
    pub const fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    /// `Content-Range` header value
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end())
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// One or more satisfiable ranges, in request order
    Satisfiable(Vec<ByteRange>),
    /// Well-formed, but no range overlaps the file - 416 with `bytes */size`
    NotSatisfiable,
    /// Foreign unit or broken syntax - 416
    Invalid,
    /// No Range header, or nothing to satisfy (serve full content)
    None,
}

/// Parse HTTP Range header (bytes unit)
///
/// Supported formats, comma separated:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// Any other unit or a range spec that does not parse makes the whole header
/// invalid. Empty specs are skipped, so `bytes=` asks for nothing and the
/// full body is served. Ranges starting past the end of the file are
/// dropped; if nothing remains the header is not satisfiable. Ranges that
/// together ask for more bytes than the file holds are ignored, the whole
/// file is cheaper to send.
///
/// # Examples
/// ```
/// use dirserve::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeParseResult::Satisfiable(_)));
///
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(header) = range_header.map(str::trim) else {
        return RangeParseResult::None;
    };
    if header.is_empty() {
        return RangeParseResult::None;
    }

    let Some(specs) = header.strip_prefix("bytes=") else {
        return RangeParseResult::Invalid;
    };

    let mut ranges = Vec::new();
    let mut no_overlap = false;
    for spec in specs.split(',') {
        let spec = spec.trim();
        if spec.is_empty() {
            continue;
        }

        let Some((start_str, end_str)) = spec.split_once('-') else {
            return RangeParseResult::Invalid;
        };
        let (start_str, end_str) = (start_str.trim(), end_str.trim());

        let parsed = if start_str.is_empty() {
            // Suffix range: "-500" means last 500 bytes
            parse_suffix_range(end_str, file_size)
        } else {
            parse_standard_range(start_str, end_str, file_size)
        };

        match parsed {
            Spec::Malformed => return RangeParseResult::Invalid,
            Spec::NoOverlap => no_overlap = true,
            Spec::Range(range) => ranges.push(range),
        }
    }

    if ranges.is_empty() {
        return if no_overlap {
            RangeParseResult::NotSatisfiable
        } else {
            RangeParseResult::None
        };
    }

    let requested: u64 = ranges.iter().map(|r| r.length).sum();
    if requested > file_size {
        return RangeParseResult::None;
    }

    RangeParseResult::Satisfiable(ranges)
}

enum Spec {
    Range(ByteRange),
    NoOverlap,
    Malformed,
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> Spec {
    let Some(suffix) = parse_position(suffix_str) else {
        return Spec::Malformed;
    };

    if suffix == 0 || file_size == 0 {
        return Spec::NoOverlap;
    }

    // Suffix larger than file is valid, just return whole file as range
    let length = suffix.min(file_size);
    Spec::Range(ByteRange {
        start: file_size - length,
        length,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: u64) -> Spec {
    let Some(start) = parse_position(start_str) else {
        return Spec::Malformed;
    };

    // Start beyond file size does not overlap, whatever the end says
    if start >= file_size {
        return Spec::NoOverlap;
    }

    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        match parse_position(end_str) {
            Some(e) if e >= start => e.min(file_size - 1),
            _ => return Spec::Malformed,
        }
    };

    Spec::Range(ByteRange {
        start,
        length: end - start + 1,
    })
}

/// Digits only; `u64::from_str` would also accept a leading `+`
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(header: &str, size: u64) -> ByteRange {
        match parse_range_header(Some(header), size) {
            RangeParseResult::Satisfiable(ranges) if ranges.len() == 1 => ranges[0],
            other => panic!("Expected one range for {header}, got {other:?}"),
        }
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::None);
    }

    #[test]
    fn test_standard_range() {
        let r = single("bytes=0-9", 100);
        assert_eq!(r.start, 0);
        assert_eq!(r.length, 10);
        assert_eq!(r.end(), 9);
        assert_eq!(r.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_open_range() {
        let r = single("bytes=50-", 100);
        assert_eq!(r.start, 50);
        assert_eq!(r.end(), 99);
        assert_eq!(r.length, 50);
    }

    #[test]
    fn test_end_clamped() {
        let r = single("bytes=90-500", 100);
        assert_eq!(r.end(), 99);
    }

    #[test]
    fn test_suffix_range() {
        let r = single("bytes=-20", 100);
        assert_eq!(r.start, 80);
        assert_eq!(r.end(), 99);

        let whole = single("bytes=-500", 100);
        assert_eq!(whole.start, 0);
        assert_eq!(whole.length, 100);
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-"), 0),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_invalid_format() {
        for header in [
            "bytes=a-b",
            "bytes=abc",
            "bytes=5",
            "bytes=9-3",
            "bytes=+1-2",
            "bytes=-",
            "bytes=0-1,x",
            "items=0-1",
        ] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::Invalid,
                "{header}"
            );
        }
    }

    #[test]
    fn test_empty_spec_list_serves_everything() {
        for header in ["", "  ", "bytes=", "bytes=,", "bytes= , "] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::None,
                "{header:?}"
            );
        }
    }

    #[test]
    fn test_start_past_end_wins_over_bad_end() {
        assert_eq!(
            parse_range_header(Some("bytes=200-5"), 100),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_multiple_ranges() {
        match parse_range_header(Some("bytes=0-9, 20-29, 500-600"), 100) {
            RangeParseResult::Satisfiable(ranges) => {
                assert_eq!(
                    ranges,
                    vec![
                        ByteRange { start: 0, length: 10 },
                        ByteRange { start: 20, length: 10 },
                    ]
                );
            }
            other => panic!("Expected Satisfiable, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_multi_range_ignored() {
        assert_eq!(
            parse_range_header(Some("bytes=0-99,0-99"), 100),
            RangeParseResult::None
        );
    }
}
