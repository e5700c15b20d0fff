//! HTTP cache control module
//!
//! Provides `ETag` generation and conditional request handling
//! (RFC 7232 precondition order).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Generate a strong `ETag` from file metadata
///
/// Content is never hashed: the tag changes whenever the modification time
/// or the size does.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"65a1f0c2-1c"`
pub fn generate_etag(modified: Option<SystemTime>, size: u64) -> String {
    let secs = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("\"{secs:x}-{size:x}\"")
}

/// Truncate to whole seconds; HTTP dates have no finer resolution
pub fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Modification time worth advertising; the epoch means "unknown"
pub fn last_modified(modified: Option<SystemTime>) -> Option<SystemTime> {
    modified
        .map(truncate_to_seconds)
        .filter(|m| *m != UNIX_EPOCH)
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak tags: `W/"abc123"` (weak comparison)
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag.strip_prefix("W/").unwrap_or(etag)
        })
    })
}

/// `If-Match` uses strong comparison: weak tags never match
fn check_strong_match(if_match: &str, etag: &str) -> bool {
    if etag.starts_with("W/") {
        return false;
    }
    if_match
        .split(',')
        .map(str::trim)
        .any(|e| e == "*" || e == etag)
}

/// Conditional headers carried by a request
#[derive(Debug, Default, Clone)]
pub struct Conditionals {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_unmodified_since: Option<String>,
    pub if_range: Option<String>,
}

/// Outcome of evaluating the preconditions against the current file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the resource
    Proceed,
    /// 304 Not Modified
    NotModified,
    /// 412 Precondition Failed
    Failed,
}

impl Conditionals {
    /// Evaluate `If-Match`, `If-Unmodified-Since`, `If-None-Match` and
    /// `If-Modified-Since` in that order
    ///
    /// `If-Modified-Since` is only consulted when `If-None-Match` is absent.
    /// Unparseable dates are ignored.
    pub fn evaluate(
        &self,
        is_get_or_head: bool,
        etag: &str,
        modified: Option<SystemTime>,
    ) -> Precondition {
        if let Some(if_match) = self.if_match.as_deref() {
            if !check_strong_match(if_match, etag) {
                return Precondition::Failed;
            }
        } else if let (Some(since), Some(modified)) =
            (self.if_unmodified_since.as_deref(), last_modified(modified))
        {
            if let Ok(since) = httpdate::parse_http_date(since) {
                if modified > since {
                    return Precondition::Failed;
                }
            }
        }

        if self.if_none_match.is_some() {
            if check_etag_match(self.if_none_match.as_deref(), etag) {
                return if is_get_or_head {
                    Precondition::NotModified
                } else {
                    Precondition::Failed
                };
            }
            return Precondition::Proceed;
        }

        if is_get_or_head {
            if let (Some(since), Some(modified)) =
                (self.if_modified_since.as_deref(), last_modified(modified))
            {
                if let Ok(since) = httpdate::parse_http_date(since) {
                    if modified <= since {
                        return Precondition::NotModified;
                    }
                }
            }
        }

        Precondition::Proceed
    }

    /// Whether a `Range` header may be honored under `If-Range`
    ///
    /// An entity tag must match strongly; a date must equal the
    /// modification time exactly.
    pub fn range_allowed(&self, etag: &str, modified: Option<SystemTime>) -> bool {
        let Some(if_range) = self.if_range.as_deref().map(str::trim) else {
            return true;
        };

        if if_range.starts_with('"') || if_range.starts_with("W/") {
            return !if_range.starts_with("W/") && if_range == etag;
        }

        match (httpdate::parse_http_date(if_range), last_modified(modified)) {
            (Ok(date), Some(modified)) => date == modified,
            _ => false,
        }
    }
}
