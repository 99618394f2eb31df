//! Request bodies for POST/PUT/PATCH/DELETE.
//!
//! A body is either absent, a fully encoded buffer, or a stream fed by a
//! [`BodyWriter`] while the request is already on the wire.

use crate::base::neterror::NetError;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Body type handed to hyper.
pub type BoxedBody = UnsyncBoxBody<Bytes, io::Error>;

type FrameResult = Result<Frame<Bytes>, io::Error>;

/// Frames buffered between a writer and the connection.
const STREAM_CAPACITY: usize = 8;

/// Outbound payload of a request.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, or an unrecognised Content-Type).
    #[default]
    Empty,
    /// Fully encoded body, sent with a Content-Length.
    Bytes(Bytes),
    /// Body produced incrementally, sent chunked.
    Streaming(mpsc::Receiver<FrameResult>),
}

impl RequestBody {
    /// Convert into the boxed body type the transaction sends.
    pub fn into_boxed(self) -> BoxedBody {
        match self {
            RequestBody::Empty => Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed_unsync(),
            RequestBody::Bytes(b) => Full::new(b).map_err(|never| match never {}).boxed_unsync(),
            RequestBody::Streaming(rx) => StreamBody::new(rx).boxed_unsync(),
        }
    }

    /// Like [`into_boxed`](RequestBody::into_boxed), plus a receiver that
    /// completes once the connection has taken the last frame (or dropped
    /// the body).
    pub fn into_tracked(self) -> (BoxedBody, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let body = TrackedBody {
            inner: self.into_boxed(),
            sent: Some(tx),
        };
        (body.boxed_unsync(), rx)
    }
}

struct TrackedBody {
    inner: BoxedBody,
    sent: Option<oneshot::Sender<()>>,
}

impl TrackedBody {
    fn mark_sent(&mut self) {
        if let Some(tx) = self.sent.take() {
            let _ = tx.send(());
        }
    }
}

impl Body for TrackedBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<FrameResult>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => self.mark_sent(),
            Poll::Ready(Some(Ok(_))) if self.inner.is_end_stream() => self.mark_sent(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.mark_sent();
    }
}

/// Create a streamed body and the writer that feeds it.
pub fn channel() -> (BodyWriter, RequestBody) {
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
    (BodyWriter { tx }, RequestBody::Streaming(rx))
}

/// Write half of a streamed request body.
///
/// Dropping the writer ends the body.
#[derive(Debug)]
pub struct BodyWriter {
    tx: mpsc::Sender<FrameResult>,
}

impl BodyWriter {
    /// Queue `data` for the connection, waiting while the channel is full.
    pub async fn write(&mut self, data: Bytes) -> Result<(), NetError> {
        if data.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Ok(Frame::data(data)))
            .await
            .map_err(|_| NetError::connection_closed("connection stopped reading request body"))
    }

    /// Abort the body; the connection sees `err` and fails the request.
    pub async fn abort(mut self, err: io::Error) {
        let _ = self.tx.send(Err(err)).await;
    }

    /// Flush and end the body.
    pub async fn close(mut self) -> Result<(), NetError> {
        self.tx
            .close()
            .await
            .map_err(|_| NetError::connection_closed("request body already closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracked_body_signals_after_last_frame() {
        let (body, mut sent) = RequestBody::Bytes(Bytes::from_static(b"hello")).into_tracked();
        assert_eq!(body.size_hint().exact(), Some(5));
        assert!(sent.try_recv().is_err());

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"hello");
        assert!(sent.await.is_ok());
    }

    #[tokio::test]
    async fn test_tracked_stream_signals_only_when_closed() {
        let (mut writer, body) = channel();
        let (mut body, mut sent) = body.into_tracked();

        writer.write(Bytes::from_static(b"ab")).await.unwrap();
        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"ab"));
        assert!(sent.try_recv().is_err());

        writer.close().await.unwrap();
        assert!(body.frame().await.is_none());
        assert!(sent.await.is_ok());
    }

    #[tokio::test]
    async fn test_channel_delivers_frames_in_order() {
        let (mut writer, body) = channel();
        assert!(matches!(body, RequestBody::Streaming(_)));

        let producer = async move {
            writer.write(Bytes::from_static(b"ab")).await.unwrap();
            writer.write(Bytes::new()).await.unwrap();
            writer.write(Bytes::from_static(b"cd")).await.unwrap();
            writer.close().await.unwrap();
        };
        let consumer = async move { body.into_boxed().collect().await.unwrap().to_bytes() };

        let ((), collected) = tokio::join!(producer, consumer);
        assert_eq!(&collected[..], b"abcd");
    }

    #[tokio::test]
    async fn test_write_after_receiver_dropped_fails() {
        let (mut writer, body) = channel();
        drop(body);
        let err = writer.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_transport());
    }
}
