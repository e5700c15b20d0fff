//! Static file serving module
//!
//! Resolves request paths below the root directory, serves index files and
//! directory listings, and answers file requests with validators,
//! conditional responses and byte ranges.

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::listing;
use crate::handler::path;
use crate::handler::router::RequestContext;
use crate::http::cache::{self, Precondition};
use crate::http::mime;
use crate::http::range::{ByteRange, RangeParseResult};
use crate::http::{self as proto, ResponseBody, ResponseWriter, Segment};
use crate::logger;
use hyper::body::Bytes;
use hyper::header;
use hyper::{Response, StatusCode};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;

/// Serve the file or directory a request path points to
pub async fn serve(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    let decoded = path::percent_decode(ctx.path)?;
    let clean = path::clean_path(&decoded);

    // "/docs/index.html" is only reachable as "/docs/"
    if let Some(dir) = index_parent(&decoded, &state.config.index_files) {
        let target = redirect_target(&dir_url(&path::clean_path(dir)), ctx.query);
        return Ok(proto::build_redirect_response(&target, ctx.is_head));
    }

    let requested = path::join_root(state.root(), &clean);
    let (resolved, metadata) = resolve_within(state.root(), &requested, ctx.path).await?;

    if metadata.is_dir() {
        if !decoded.ends_with('/') {
            let target = redirect_target(&dir_url(&clean), ctx.query);
            return Ok(proto::build_redirect_response(&target, ctx.is_head));
        }
        return serve_directory(ctx, state, &clean, &resolved).await;
    }

    if !metadata.is_file() {
        // Sockets, FIFOs and devices are never served
        return Err(ServeError::NotFound);
    }

    if decoded.ends_with('/') {
        let target = redirect_target(&clean, ctx.query);
        return Ok(proto::build_redirect_response(&target, ctx.is_head));
    }

    let file = File::open(&resolved).await?;
    serve_file(ctx, &requested, file, &metadata).await
}

/// Directory part of a path whose last segment names an index file
fn index_parent<'a>(decoded: &'a str, index_files: &[String]) -> Option<&'a str> {
    let (dir, last) = decoded.rsplit_once('/')?;
    index_files.iter().any(|name| name == last).then_some(dir)
}

/// URL path of a directory: the cleaned path with one trailing slash
fn dir_url(clean: &str) -> String {
    format!("{}/", clean.trim_end_matches('/'))
}

/// Redirect target built from a cleaned path, never from raw input
fn redirect_target(clean: &str, query: Option<&str>) -> String {
    let mut target = path::encode_path(clean);
    if let Some(q) = query {
        target.push('?');
        target.push_str(q);
    }
    target
}

/// Canonicalize `requested` and make sure it is still below `root`
///
/// Symlinks are followed; a target outside the root is reported as missing.
async fn resolve_within(
    root: &Path,
    requested: &Path,
    raw_path: &str,
) -> Result<(PathBuf, std::fs::Metadata), ServeError> {
    let resolved = fs::canonicalize(requested).await?;
    if !resolved.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {raw_path} -> {}",
            resolved.display()
        ));
        return Err(ServeError::NotFound);
    }

    let metadata = fs::metadata(&resolved).await?;
    Ok((resolved, metadata))
}

/// Serve an index file if one exists, otherwise list the directory
///
/// An index file that cannot be resolved or opened is skipped like a
/// missing one.
async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    clean: &str,
    dir: &Path,
) -> Result<Response<ResponseBody>, ServeError> {
    for name in &state.config.index_files {
        let requested = dir.join(name);
        let Ok((resolved, metadata)) = resolve_within(state.root(), &requested, ctx.path).await
        else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        if let Ok(file) = File::open(&resolved).await {
            return serve_file(ctx, &requested, file, &metadata).await;
        }
    }

    if !state.config.directory_listing {
        return Err(ServeError::Forbidden);
    }

    let entries = listing::read_entries(dir).await?;
    Ok(proto::build_html_response(
        listing::render(&dir_url(clean), &entries),
        ctx.is_head,
    ))
}

/// Serve an opened regular file
///
/// `requested` is the path as named in the URL and decides the content
/// type; symlinks may give the opened file a different name.
async fn serve_file(
    ctx: &RequestContext<'_>,
    requested: &Path,
    mut file: File,
    metadata: &std::fs::Metadata,
) -> Result<Response<ResponseBody>, ServeError> {
    let size = metadata.len();
    let modified = metadata.modified().ok();
    let etag = cache::generate_etag(modified, size);
    let last_modified = cache::last_modified(modified).map(httpdate::fmt_http_date);

    match ctx.conditionals.evaluate(true, &etag, modified) {
        Precondition::NotModified => {
            return Ok(proto::build_304_response(&etag, last_modified.as_deref()));
        }
        Precondition::Failed => {
            return Ok(proto::build_error_response(
                StatusCode::PRECONDITION_FAILED,
                ctx.is_head,
            ));
        }
        Precondition::Proceed => {}
    }

    let content_type = detect_content_type(requested, &mut file, size).await?;

    let ranges = if ctx.conditionals.range_allowed(&etag, modified) {
        proto::parse_range_header(ctx.range.as_deref(), size)
    } else {
        RangeParseResult::None
    };

    let mut writer = ResponseWriter::new(ctx.is_head)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, &etag);
    if let Some(lm) = &last_modified {
        writer = writer.header(header::LAST_MODIFIED, lm);
    }

    let response = match ranges {
        RangeParseResult::NotSatisfiable => proto::build_416_response(size, ctx.is_head),
        RangeParseResult::Invalid => {
            proto::build_error_response(StatusCode::RANGE_NOT_SATISFIABLE, ctx.is_head)
        }
        RangeParseResult::None => writer
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, size)
            .send(ResponseBody::from_file(
                file,
                [Segment::File {
                    offset: 0,
                    length: size,
                }],
            )),
        RangeParseResult::Satisfiable(ranges) => match ranges.as_slice() {
            [range] => writer
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_RANGE, range.content_range(size))
                .header(header::CONTENT_LENGTH, range.length)
                .send(ResponseBody::from_file(
                    file,
                    [Segment::File {
                        offset: range.start,
                        length: range.length,
                    }],
                )),
            _ => {
                let boundary = multipart_boundary(&etag);
                let segments = multipart_segments(&ranges, &boundary, content_type, size);
                let length: u64 = segments.iter().map(Segment::len).sum();
                writer
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/byteranges; boundary={boundary}"),
                    )
                    .header(header::CONTENT_LENGTH, length)
                    .send(ResponseBody::from_file(file, segments))
            }
        },
    };

    Ok(response)
}

/// Content type from the extension, or from the first bytes of the file
async fn detect_content_type(
    requested: &Path,
    file: &mut File,
    size: u64,
) -> Result<&'static str, ServeError> {
    let extension = requested.extension().and_then(|e| e.to_str());
    if let Some(content_type) = mime::content_type_for_extension(extension) {
        return Ok(content_type);
    }

    let limit = size.min(mime::SNIFF_LEN as u64);
    let mut head = Vec::with_capacity(mime::SNIFF_LEN);
    (&mut *file).take(limit).read_to_end(&mut head).await?;
    Ok(mime::sniff_content_type(&head))
}

/// Random boundary that cannot collide with a previous response
fn multipart_boundary(etag: &str) -> String {
    let half = || {
        let mut hasher = RandomState::new().build_hasher();
        etag.hash(&mut hasher);
        hasher.finish()
    };
    format!("{:016x}{:016x}", half(), half())
}

/// Body layout of a `multipart/byteranges` response
fn multipart_segments(
    ranges: &[ByteRange],
    boundary: &str,
    content_type: &str,
    size: u64,
) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    for (i, range) in ranges.iter().enumerate() {
        let separator = if i == 0 { "" } else { "\r\n" };
        let part_header = format!(
            "{separator}--{boundary}\r\nContent-Type: {content_type}\r\nContent-Range: {}\r\n\r\n",
            range.content_range(size)
        );
        segments.push(Segment::Bytes(Bytes::from(part_header)));
        segments.push(Segment::File {
            offset: range.start,
            length: range.length,
        });
    }
    segments.push(Segment::Bytes(Bytes::from(format!("\r\n--{boundary}--\r\n"))));
    segments
}
