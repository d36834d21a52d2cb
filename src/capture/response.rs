//! Response body capture.
//!
//! [`CaptureBody`] decorates the body produced by the inner service. Status
//! and headers never pass through it: they stay in the response `Parts`,
//! which the middleware returns untouched. Only data frames are observed.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::oneshot;

use crate::capture::{BoundedBuffer, CapturedBody};

/// Pass-through body that mirrors up to `max` bytes into a side buffer.
///
/// The copy is delivered on the oneshot channel exactly once: when the
/// inner body reports its end, when it fails, or when the body is dropped
/// before that (for example because the client went away).
pub struct CaptureBody<B> {
    inner: B,
    buffer: Option<BoundedBuffer>,
    done: Option<oneshot::Sender<CapturedBody>>,
}

impl<B> CaptureBody<B> {
    /// Wrap `inner`, returning the body and the receiving end of the copy.
    pub fn new(inner: B, max: usize) -> (Self, oneshot::Receiver<CapturedBody>) {
        let (tx, rx) = oneshot::channel();
        let body = Self {
            inner,
            buffer: Some(BoundedBuffer::new(max)),
            done: Some(tx),
        };
        (body, rx)
    }

    fn complete(&mut self, read_error: Option<String>) {
        if let (Some(buffer), Some(tx)) = (self.buffer.take(), self.done.take()) {
            // The receiver may be gone if nobody is interested any more.
            let _ = tx.send(buffer.finish(read_error));
        }
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(buffer)) = (frame.data_ref(), this.buffer.as_mut()) {
                    buffer.push(data);
                }
            }
            Poll::Ready(Some(Err(e))) => {
                let message = format!("Write error: {}", e);
                this.complete(Some(message));
            }
            Poll::Ready(None) => this.complete(None),
            Poll::Pending => {}
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

impl<B> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        self.complete(None);
    }
}
