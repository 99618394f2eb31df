//! Streaming `multipart/form-data` writer.
//!
//! Parts go straight into the request body of an open connection in the
//! order they are added; file contents are streamed in chunks rather than
//! buffered.
//!
//! # Example
//! ```ignore
//! let mut form = MultipartWriter::attach(&mut connection)?;
//! form.add_form_field("album", "summer").await?;
//! form.add_file_part("file", Path::new("/data/photo.jpg")).await?;
//! form.finish().await?;
//! ```

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::requestbody::BodyWriter;
use crate::http::response::HttpResponse;
use crate::urlrequest::connection::Connection;
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;

const LINE_FEED: &str = "\r\n";

/// Read size for file parts.
const FILE_CHUNK_SIZE: usize = 8 * 1024;

/// Writes boundary-framed parts into a request body.
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    writer: BodyWriter,
}

impl MultipartWriter {
    /// Bind a new writer to `connection`: sets its multipart `Content-Type`
    /// and opens its output.
    pub fn attach(connection: &mut Connection) -> Result<Self, NetError> {
        let boundary = generate_boundary();
        connection.set_request_property("Content-Type", &content_type(&boundary))?;
        let writer = connection.open_output()?;
        Ok(Self::new(writer, boundary))
    }

    pub fn new(writer: BodyWriter, boundary: String) -> Self {
        Self { boundary, writer }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Add a plain text field.
    pub async fn add_form_field(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let mut part = BytesMut::new();
        part.extend_from_slice(self.part_head(name, None, None).as_bytes());
        part.extend_from_slice(value.as_bytes());
        part.extend_from_slice(LINE_FEED.as_bytes());
        self.writer.write(part.freeze()).await
    }

    /// Add a file part named after the file's basename, streaming its bytes.
    pub async fn add_file_part(&mut self, name: &str, path: &Path) -> Result<(), NetError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file = tokio::fs::File::open(path).await.file_context(path)?;

        let head = self.part_head(name, Some(&file_name), Some(guess_content_type(path)));
        self.writer.write(Bytes::from(head)).await?;

        let mut buf = vec![0u8; FILE_CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf).await.file_context(path)?;
            if n == 0 {
                break;
            }
            self.writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
        }

        self.writer.write(Bytes::from_static(LINE_FEED.as_bytes())).await?;
        tracing::debug!(field = name, file = %file_name, "multipart file part written");
        Ok(())
    }

    /// Write the closing boundary and end the body.
    pub async fn finish(mut self) -> Result<(), NetError> {
        let closing = format!("--{}--{}", self.boundary, LINE_FEED);
        self.writer.write(Bytes::from(closing)).await?;
        self.writer.close().await
    }

    /// Fail the request instead of ending the body, so a half-written form
    /// is never sent as complete.
    pub async fn abort(self, cause: &NetError) {
        self.writer
            .abort(io::Error::new(io::ErrorKind::Other, cause.to_string()))
            .await;
    }

    fn part_head(&self, name: &str, file_name: Option<&str>, mime: Option<&str>) -> String {
        let mut head = format!("--{}{}", self.boundary, LINE_FEED);
        head.push_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        ));
        if let Some(file_name) = file_name {
            head.push_str(&format!("; filename=\"{}\"", escape_quotes(file_name)));
        }
        head.push_str(LINE_FEED);
        if let Some(mime) = mime {
            head.push_str(&format!("Content-Type: {}{}", mime, LINE_FEED));
        }
        head.push_str(LINE_FEED);
        head
    }
}

/// Send `fields` and then the optional file part over `conn` as one
/// multipart body, returning the response.
pub async fn send_form(
    mut conn: Connection,
    fields: &[(String, String)],
    file: Option<(&str, &Path)>,
) -> Result<HttpResponse, NetError> {
    let mut form = MultipartWriter::attach(&mut conn)?;

    let written = async {
        for (name, value) in fields {
            form.add_form_field(name, value).await?;
        }
        if let Some((name, path)) = file {
            form.add_file_part(name, path).await?;
        }
        Ok::<(), NetError>(())
    }
    .await;

    let written = match written {
        Ok(()) => form.finish().await,
        Err(e) => {
            form.abort(&e).await;
            Err(e)
        }
    };

    let response = conn.response().await;
    match (response, written) {
        (Ok(response), Ok(())) => Ok(response),
        // A local failure (unreadable file) outranks the abort it caused.
        (_, Err(e)) if !matches!(e, NetError::ConnectionClosed { .. }) => Err(e),
        (Err(e), _) | (Ok(_), Err(e)) => Err(e),
    }
}

/// `Content-Type` header value announcing `boundary`.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}

/// Best-effort MIME type from a file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Escape quotes and backslashes in a string.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains('\\') || s.contains('\r') || s.contains('\n') {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// Generate a boundary token unique to this builder.
fn generate_boundary() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!(
        "----nativehttp-boundary-{:016x}{:08x}{:04x}",
        nanos,
        std::process::id(),
        seq & 0xffff
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::requestbody::channel;
    use http_body_util::BodyExt;
    use std::io::Write;

    async fn collect_form<F, Fut>(build: F) -> (String, String)
    where
        F: FnOnce(MultipartWriter) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (writer, body) = channel();
        let form = MultipartWriter::new(writer, generate_boundary());
        let boundary = form.boundary().to_string();
        let consumer = async move { body.into_boxed().collect().await.unwrap().to_bytes() };
        let ((), bytes) = tokio::join!(build(form), consumer);
        (boundary, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_form_field_framing() {
        let (boundary, body) = collect_form(|mut form| async move {
            form.add_form_field("name", "value").await.unwrap();
            form.finish().await.unwrap();
        })
        .await;

        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nvalue\r\n--{b}--\r\n",
            b = boundary
        );
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_parts_keep_call_order_and_one_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"file data")
            .unwrap();

        let file_path = path.clone();
        let (boundary, body) = collect_form(|mut form| async move {
            form.add_form_field("first", "1").await.unwrap();
            form.add_file_part("upload", &file_path).await.unwrap();
            form.add_form_field("second", "2").await.unwrap();
            form.finish().await.unwrap();
        })
        .await;

        let first = body.find("name=\"first\"").unwrap();
        let upload = body.find("name=\"upload\"; filename=\"notes.txt\"").unwrap();
        let second = body.find("name=\"second\"").unwrap();
        assert!(first < upload && upload < second);
        assert!(body.contains("Content-Type: text/plain\r\n\r\nfile data\r\n"));
        assert_eq!(body.matches(&format!("--{}", boundary)).count(), 4);
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[tokio::test]
    async fn test_empty_file_has_no_content_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        let file_path = path.clone();
        let (boundary, body) = collect_form(|mut form| async move {
            form.add_file_part("file", &file_path).await.unwrap();
            form.finish().await.unwrap();
        })
        .await;

        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"empty.bin\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\r\n--{b}--\r\n",
            b = boundary
        );
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_large_file_is_streamed_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.dat");
        let payload: Vec<u8> = (0..(FILE_CHUNK_SIZE * 3 + 17))
            .map(|i| b'a' + (i % 26) as u8)
            .collect();
        std::fs::write(&path, &payload).unwrap();

        let file_path = path.clone();
        let (_, body) = collect_form(|mut form| async move {
            form.add_file_part("file", &file_path).await.unwrap();
            form.finish().await.unwrap();
        })
        .await;

        assert!(body.contains(std::str::from_utf8(&payload).unwrap()));
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let (writer, _body) = channel();
        let mut form = MultipartWriter::new(writer, generate_boundary());
        let err = form
            .add_file_part("file", Path::new("/nonexistent/nativehttp/missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::FileError { .. }));
    }

    #[test]
    fn test_boundaries_are_unique() {
        assert_ne!(generate_boundary(), generate_boundary());
        assert!(generate_boundary().starts_with("----nativehttp-boundary-"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("abc"), "multipart/form-data; boundary=abc");
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("data.json")), "application/json");
        assert_eq!(
            guess_content_type(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("normal"), "normal");
        assert_eq!(escape_quotes("with\"quote"), "with\\\"quote");
        assert_eq!(escape_quotes("with\\slash"), "with\\\\slash");
    }
}
