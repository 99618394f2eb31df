//! Responses: the streaming [`HttpResponse`] and the materialized
//! [`ResponseResult`] handed back to callers.

use crate::base::neterror::NetError;
use crate::http::bodycodec::{decode_response_body, ResponseData};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A response whose body is still on the wire.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Incoming,
    read_timeout: Option<Duration>,
    url: Url,
}

impl HttpResponse {
    pub fn from_hyper(
        resp: http::Response<Incoming>,
        url: Url,
        read_timeout: Option<Duration>,
    ) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
            read_timeout,
            url,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL, after any redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Next chunk of body data, or `None` at the end. Each read is bounded by
    /// the read timeout.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, NetError> {
        loop {
            let frame = match with_read_timeout(self.read_timeout, self.body.frame()).await? {
                None => return Ok(None),
                Some(frame) => frame?,
            };
            // Trailers carry no data.
            if let Ok(data) = frame.into_data() {
                return Ok(Some(data));
            }
        }
    }

    pub async fn bytes(mut self) -> Result<Bytes, NetError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Read the whole body and decode it by `Content-Type`.
    pub async fn into_result(self) -> Result<ResponseResult, NetError> {
        let status = self.status.as_u16();
        let headers = flatten_headers(&self.headers);
        let content_type = self.content_type().map(str::to_string);

        let body = self.bytes().await?;
        let data = decode_response_body(content_type.as_deref(), &body);
        tracing::debug!(status, bytes = body.len(), "response materialized");

        Ok(ResponseResult {
            status,
            headers,
            data,
            content_type,
        })
    }
}

/// Await `fut`, failing with `ReadTimedOut` once `limit` elapses.
pub(crate) async fn with_read_timeout<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, NetError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| NetError::ReadTimedOut),
        None => Ok(fut.await),
    }
}

/// One response header, serialized as a single-key mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl Serialize for HeaderEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

/// One entry per distinct header name, repeated values joined with `", "`.
pub fn flatten_headers(headers: &HeaderMap) -> Vec<HeaderEntry> {
    headers
        .keys()
        .map(|name| HeaderEntry {
            name: name.as_str().to_string(),
            value: headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseResult {
    pub status: u16,
    pub headers: Vec<HeaderEntry>,
    pub data: ResponseData,
    #[serde(skip)]
    pub content_type: Option<String>,
}

impl ResponseResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}
