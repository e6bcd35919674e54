//! Streaming `multipart/form-data` decoding
//!
//! The decoder pulls parts off any byte stream (it does not care whether the
//! bytes come from hyper, a file or a test vector) and produces an
//! [`UploadRequest`]: the text fields of the form plus exactly one file part.
//!
//! The file part is the part named `file`. Its chunks go through a
//! [`SizeGuard`] before they are buffered, so an oversized upload never holds
//! more than the limit in memory. Once the guard trips, the rest of the part
//! is drained and counted so the error can report the real size. Counting
//! stops at a fixed multiple of the limit and the size is then reported as a
//! lower bound.

use crate::limits::{SizeGuard, TooLarge};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Form field carrying the file payload
pub const FILE_FIELD: &str = "file";

/// Filename used when the file part declares none
pub const DEFAULT_FILE_NAME: &str = "upload.jpg";

/// Media type used when the file part declares none
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Maximum size of a single text field (64 KiB)
pub const MAX_FIELD_BYTES: usize = 64 * 1024;

/// Errors produced while decoding a multipart body
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Missing/invalid boundary or unparsable part
    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    /// No part named `file`
    #[error("No file uploaded (expected a multipart field named \"file\")")]
    FileMissing,

    /// The file part was present but empty
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// The file part exceeded the size ceiling
    #[error(transparent)]
    TooLarge(#[from] TooLarge),
}

impl From<multer::Error> for DecodeError {
    fn from(err: multer::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// The uploaded file
#[derive(Clone, Debug)]
pub struct UploadFile {
    /// Declared filename, or [`DEFAULT_FILE_NAME`]
    pub name: String,
    /// Declared media type, or [`DEFAULT_MEDIA_TYPE`]
    pub media_type: String,
    /// File contents, never empty
    pub payload: Bytes,
}

/// A decoded upload form
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// Text fields; for repeated names the last value wins
    pub fields: HashMap<String, String>,
    /// The single file part
    pub file: UploadFile,
}

impl UploadRequest {
    /// Value of a text field, empty if absent
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Extract the boundary from a `Content-Type` header value
pub fn parse_boundary(content_type: Option<&str>) -> Result<String, DecodeError> {
    let content_type = content_type.ok_or_else(|| {
        DecodeError::Malformed("missing Content-Type, expected multipart/form-data".to_string())
    })?;
    multer::parse_boundary(content_type).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Decode a multipart body.
///
/// Fields may appear before or after the file part. A second `file` part is
/// rejected. Parts that carry a filename under any other name are drained and
/// ignored, parts without a name likewise.
pub async fn decode<S, O, E>(
    stream: S,
    boundary: impl Into<String>,
    mut guard: SizeGuard,
) -> Result<UploadRequest, DecodeError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut fields = HashMap::new();
    let mut file: Option<UploadFile> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        let has_filename = field.file_name().is_some();

        match name.as_deref() {
            Some(FILE_FIELD) => {
                if file.is_some() {
                    return Err(DecodeError::Malformed("multiple file parts are not supported".to_string()));
                }

                let file_name = field
                    .file_name()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                let media_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    if let Err(too_large) = guard.accumulate(chunk.len()) {
                        drop(buffer);
                        return Err(drain_oversized(field, guard, too_large).await);
                    }
                    buffer.extend_from_slice(&chunk);
                }

                debug!(file_name = %file_name, media_type = %media_type, size = buffer.len(), "Decoded file part");
                file = Some(UploadFile {
                    name: file_name,
                    media_type,
                    payload: buffer.freeze(),
                });
            }
            Some(field_name) if !has_filename => {
                let field_name = field_name.to_string();
                let value = read_text(&mut field, &field_name).await?;
                fields.insert(field_name, value);
            }
            _ => {
                debug!(field = ?name, "Skipping unexpected part");
                while field.chunk().await?.is_some() {}
            }
        }
    }

    let file = file.ok_or(DecodeError::FileMissing)?;
    if file.payload.is_empty() {
        return Err(DecodeError::EmptyFile);
    }

    Ok(UploadRequest { fields, file })
}

/// Count the rest of an oversized file part without keeping it, up to
/// [`MAX_DRAIN_MULTIPLE`](crate::limits::MAX_DRAIN_MULTIPLE) times the limit
async fn drain_oversized(
    mut field: multer::Field<'static>,
    mut guard: SizeGuard,
    mut too_large: TooLarge,
) -> DecodeError {
    loop {
        if guard.drain_exhausted() {
            too_large.capped = true;
            debug!(counted = guard.total(), "Stopped counting oversized part");
            break;
        }
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = guard.accumulate(chunk.len()) {
                    too_large = e;
                }
            }
            // The ceiling was already exceeded; a transport error while
            // draining does not change the answer.
            Ok(None) | Err(_) => break,
        }
    }
    DecodeError::TooLarge(too_large)
}

async fn read_text(field: &mut multer::Field<'static>, name: &str) -> Result<String, DecodeError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buffer.len() + chunk.len() > MAX_FIELD_BYTES {
            return Err(DecodeError::Malformed(format!(
                "field \"{}\" exceeds {} bytes",
                name, MAX_FIELD_BYTES
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    String::from_utf8(buffer.to_vec())
        .map_err(|_| DecodeError::Malformed(format!("field \"{}\" is not valid UTF-8", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{DEFAULT_MAX_UPLOAD_BYTES, MAX_DRAIN_MULTIPLE};

    const BOUNDARY: &str = "X-PINBOX-BOUNDARY";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File {
            name: &'a str,
            filename: Option<&'a str>,
            content_type: Option<&'a str>,
            data: &'a [u8],
        },
    }

    fn body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
                    );
                }
                Part::File { name, filename, content_type, data } => {
                    let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", name);
                    if let Some(f) = filename {
                        disposition.push_str(&format!("; filename=\"{}\"", f));
                    }
                    out.extend_from_slice(disposition.as_bytes());
                    out.extend_from_slice(b"\r\n");
                    if let Some(ct) = content_type {
                        out.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                    }
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(data);
                    out.extend_from_slice(b"\r\n");
                }
            }
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    /// Feed the body in small chunks to exercise incremental parsing
    fn chunked(data: Vec<u8>, size: usize) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let chunks: Vec<Result<Bytes, std::io::Error>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures::stream::iter(chunks)
    }

    async fn run(parts: &[Part<'_>], limit: u64) -> Result<UploadRequest, DecodeError> {
        decode(chunked(body(parts), 7), BOUNDARY, SizeGuard::new(limit)).await
    }

    #[tokio::test]
    async fn test_fields_and_file() {
        let request = run(
            &[
                Part::Text("name", "Ada"),
                Part::File { name: "file", filename: Some("cat.png"), content_type: Some("image/png"), data: b"\x89PNG\r\n" },
                Part::Text("thoughts", "after the file"),
            ],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();

        assert_eq!(request.field("name"), "Ada");
        assert_eq!(request.field("thoughts"), "after the file");
        assert_eq!(request.field("location"), "");
        assert_eq!(request.file.name, "cat.png");
        assert_eq!(request.file.media_type, "image/png");
        assert_eq!(&request.file.payload[..], b"\x89PNG\r\n");
    }

    #[tokio::test]
    async fn test_defaults_for_missing_name_and_type() {
        let request = run(
            &[Part::File { name: "file", filename: None, content_type: None, data: b"raw" }],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();

        assert_eq!(request.file.name, DEFAULT_FILE_NAME);
        assert_eq!(request.file.media_type, DEFAULT_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_empty_filename_falls_back() {
        let request = run(
            &[Part::File { name: "file", filename: Some(""), content_type: Some("image/jpeg"), data: b"jpg" }],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        assert_eq!(request.file.name, DEFAULT_FILE_NAME);
    }

    #[tokio::test]
    async fn test_duplicate_field_last_wins() {
        let request = run(
            &[
                Part::Text("name", "first"),
                Part::Text("name", "second"),
                Part::File { name: "file", filename: Some("a.txt"), content_type: None, data: b"x" },
            ],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        assert_eq!(request.field("name"), "second");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = run(&[Part::Text("name", "Ada")], DEFAULT_MAX_UPLOAD_BYTES).await.unwrap_err();
        assert!(matches!(err, DecodeError::FileMissing));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let err = run(
            &[Part::File { name: "file", filename: Some("a.txt"), content_type: None, data: b"" }],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecodeError::EmptyFile));
    }

    #[tokio::test]
    async fn test_second_file_part_rejected() {
        let err = run(
            &[
                Part::File { name: "file", filename: Some("a.txt"), content_type: None, data: b"a" },
                Part::File { name: "file", filename: Some("b.txt"), content_type: None, data: b"b" },
            ],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_other_file_parts_ignored() {
        let request = run(
            &[
                Part::File { name: "thumbnail", filename: Some("t.png"), content_type: None, data: &[0xff, 0xfe] },
                Part::File { name: "file", filename: Some("a.txt"), content_type: None, data: b"a" },
            ],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        assert!(request.fields.is_empty());
        assert_eq!(&request.file.payload[..], b"a");
    }

    #[tokio::test]
    async fn test_oversized_file_reports_full_size() {
        let data = vec![7u8; 100];
        let err = run(
            &[Part::File { name: "file", filename: Some("big.bin"), content_type: None, data: &data }],
            40,
        )
        .await
        .unwrap_err();

        match err {
            DecodeError::TooLarge(too_large) => {
                assert_eq!(too_large.observed, 100);
                assert_eq!(too_large.limit, 40);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runaway_file_stops_counting() {
        let data = vec![7u8; 100];
        let err = run(
            &[Part::File { name: "file", filename: Some("huge.bin"), content_type: None, data: &data }],
            10,
        )
        .await
        .unwrap_err();

        match err {
            DecodeError::TooLarge(too_large) => {
                assert!(too_large.capped);
                assert!(too_large.observed > 10 * MAX_DRAIN_MULTIPLE);
                assert!(too_large.observed <= 100);
                assert!(too_large.to_string().starts_with("File too large: more than"));
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_padded_filename_is_kept() {
        let request = run(
            &[Part::File { name: "file", filename: Some(" lead.jpg "), content_type: None, data: b"jpg" }],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        assert_eq!(request.file.name, " lead.jpg ");
        assert_eq!(crate::keys::generate(1, &request.file.name), "1__lead.jpg_");
    }

    #[tokio::test]
    async fn test_blank_filename_falls_back() {
        let request = run(
            &[Part::File { name: "file", filename: Some("   "), content_type: None, data: b"jpg" }],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        assert_eq!(request.file.name, DEFAULT_FILE_NAME);
    }

    #[tokio::test]
    async fn test_file_at_limit_is_accepted() {
        let data = vec![1u8; 40];
        let request = run(
            &[Part::File { name: "file", filename: Some("ok.bin"), content_type: None, data: &data }],
            40,
        )
        .await
        .unwrap();
        assert_eq!(request.file.payload.len(), 40);
    }

    #[tokio::test]
    async fn test_oversized_text_field() {
        let long = "x".repeat(MAX_FIELD_BYTES + 1);
        let err = run(&[Part::Text("thoughts", &long)], DEFAULT_MAX_UPLOAD_BYTES).await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_malformed() {
        let mut data = body(&[Part::File { name: "file", filename: Some("a.txt"), content_type: None, data: b"abc" }]);
        data.truncate(data.len() - 20);
        let err = decode(chunked(data, 5), BOUNDARY, SizeGuard::new(DEFAULT_MAX_UPLOAD_BYTES))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_parse_boundary() {
        assert_eq!(
            parse_boundary(Some("multipart/form-data; boundary=abc123")).unwrap(),
            "abc123"
        );
        assert!(matches!(parse_boundary(None), Err(DecodeError::Malformed(_))));
        assert!(matches!(parse_boundary(Some("application/json")), Err(DecodeError::Malformed(_))));
    }
}
