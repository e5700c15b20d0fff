//! Streaming response body
//!
//! A body is a queue of segments: in-memory chunks and windows of an open
//! file. File windows are read lazily in [`CHUNK_SIZE`] pieces as hyper
//! polls for frames, so memory use does not grow with file size. Dropping
//! the body (e.g. on client disconnect) closes the file and stops reading.

use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::collections::VecDeque;
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

/// Largest frame produced from a file window
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Piece of a response body
#[derive(Debug)]
pub enum Segment {
    Bytes(Bytes),
    /// `length` bytes of the body's file starting at `offset`
    File { offset: u64, length: u64 },
}

impl Segment {
    /// Number of body bytes this segment produces
    pub fn len(&self) -> u64 {
        match self {
            Self::Bytes(b) => b.len() as u64,
            Self::File { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
enum ReadState {
    Idle,
    Seeking { remaining: u64 },
    Reading { remaining: u64 },
}

/// Response body streamed from memory and/or a file
#[derive(Debug)]
pub struct ResponseBody {
    file: Option<File>,
    segments: VecDeque<Segment>,
    state: ReadState,
    buf: Vec<u8>,
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self {
            file: None,
            segments: VecDeque::new(),
            state: ReadState::Idle,
            buf: Vec::new(),
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let mut body = Self::empty();
        body.segments.push_back(Segment::Bytes(data.into()));
        body
    }

    /// Body made of `segments`; `File` segments read from `file`
    pub fn from_file(file: File, segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            file: Some(file),
            segments: segments.into_iter().collect(),
            state: ReadState::Idle,
            buf: Vec::new(),
        }
    }

    /// Exact number of bytes still to be produced
    pub fn remaining(&self) -> u64 {
        let in_flight = match self.state {
            ReadState::Idle => 0,
            ReadState::Seeking { remaining } | ReadState::Reading { remaining } => remaining,
        };
        in_flight + self.segments.iter().map(Segment::len).sum::<u64>()
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            match this.state {
                ReadState::Idle => match this.segments.pop_front() {
                    None => return Poll::Ready(None),
                    Some(Segment::Bytes(data)) => {
                        if !data.is_empty() {
                            return Poll::Ready(Some(Ok(Frame::data(data))));
                        }
                    }
                    Some(Segment::File { offset, length }) => {
                        if length == 0 {
                            continue;
                        }
                        let Some(file) = this.file.as_mut() else {
                            return Poll::Ready(Some(Err(io::Error::other(
                                "file segment without a file",
                            ))));
                        };
                        if let Err(e) = Pin::new(file).start_seek(SeekFrom::Start(offset)) {
                            return Poll::Ready(Some(Err(e)));
                        }
                        this.state = ReadState::Seeking { remaining: length };
                    }
                },

                ReadState::Seeking { remaining } => {
                    let Some(file) = this.file.as_mut() else {
                        return Poll::Ready(Some(Err(io::Error::other("file closed"))));
                    };
                    if let Err(e) = ready!(Pin::new(file).poll_complete(cx)) {
                        return Poll::Ready(Some(Err(e)));
                    }
                    this.state = ReadState::Reading { remaining };
                }

                ReadState::Reading { remaining } => {
                    if remaining == 0 {
                        this.state = ReadState::Idle;
                        continue;
                    }
                    let Some(file) = this.file.as_mut() else {
                        return Poll::Ready(Some(Err(io::Error::other("file closed"))));
                    };

                    let want = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
                    this.buf.resize(want, 0);
                    let mut read_buf = ReadBuf::new(&mut this.buf);
                    if let Err(e) = ready!(Pin::new(file).poll_read(cx, &mut read_buf)) {
                        return Poll::Ready(Some(Err(e)));
                    }

                    let filled = read_buf.filled();
                    if filled.is_empty() {
                        // File shrank while being served
                        return Poll::Ready(Some(Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "file truncated during response",
                        ))));
                    }

                    let chunk = Bytes::copy_from_slice(filled);
                    this.state = ReadState::Reading {
                        remaining: remaining - chunk.len() as u64,
                    };
                    return Poll::Ready(Some(Ok(Frame::data(chunk))));
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining() == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(content: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[tokio::test]
    async fn test_bytes_body() {
        let body = ResponseBody::from_bytes("hello");
        assert_eq!(body.size_hint().exact(), Some(5));
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"hello");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let body = ResponseBody::empty();
        assert!(body.is_end_stream());
        assert!(body.collect().await.unwrap().to_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_file_windows_and_bytes() {
        let tmp = temp_file(b"0123456789");
        let file = File::open(tmp.path()).await.unwrap();
        let body = ResponseBody::from_file(
            file,
            [
                Segment::Bytes(Bytes::from_static(b"[")),
                Segment::File { offset: 7, length: 3 },
                Segment::Bytes(Bytes::from_static(b"|")),
                Segment::File { offset: 0, length: 2 },
                Segment::Bytes(Bytes::from_static(b"]")),
            ],
        );
        assert_eq!(body.size_hint().exact(), Some(8));

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"[789|01]");
    }

    #[tokio::test]
    async fn test_large_file_is_chunked() {
        let content: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let tmp = temp_file(&content);
        let file = File::open(tmp.path()).await.unwrap();
        let mut body = ResponseBody::from_file(
            file,
            [Segment::File { offset: 0, length: content.len() as u64 }],
        );

        let mut frames = 0;
        let mut received = Vec::new();
        while let Some(frame) = body.frame().await {
            let data = frame.unwrap().into_data().unwrap();
            assert!(data.len() <= CHUNK_SIZE);
            received.extend_from_slice(&data);
            frames += 1;
        }
        assert!(frames >= 3);
        assert_eq!(received, content);
    }

    #[tokio::test]
    async fn test_truncated_file_errors() {
        let tmp = temp_file(b"abc");
        let file = File::open(tmp.path()).await.unwrap();
        let body = ResponseBody::from_file(file, [Segment::File { offset: 0, length: 10 }]);
        assert!(body.collect().await.is_err());
    }
}
