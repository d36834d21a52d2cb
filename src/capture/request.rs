//! Request body capture.
//!
//! # Responsibilities
//! - Read at most `max` bytes of the inbound body
//! - Hand the next service a fresh body over exactly the bytes read
//! - Turn read failures into a captured error instead of a failed request

use axum::body::Body;
use http_body::Body as _;
use http_body_util::BodyExt;

use crate::capture::{BoundedBuffer, CapturedBody};

/// Drain up to `max` bytes from `body`.
///
/// Returns the body to forward and the captured copy. Both contain the same
/// bytes: when the inbound body is longer than `max`, the remainder is
/// dropped and the captured copy is flagged as truncated. When reading
/// fails half-way, whatever arrived before the error is forwarded.
pub async fn read_request_body(mut body: Body, max: usize) -> (Body, CapturedBody) {
    let mut buf = BoundedBuffer::new(max);
    let mut read_error = None;

    loop {
        match body.frame().await {
            None => break,
            Some(Ok(frame)) => {
                // Trailers carry no body bytes.
                let Ok(data) = frame.into_data() else {
                    continue;
                };
                buf.push(&data);
                if buf.is_truncated() || (buf.is_full() && body.is_end_stream()) {
                    break;
                }
            }
            Some(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    captured = buf.len(),
                    "Read request body failed"
                );
                read_error = Some(format!("Read error: {}", e));
                break;
            }
        }
    }

    let captured = buf.finish(read_error);
    if captured.truncated {
        tracing::debug!(max_body_size = max, "Request body truncated to capture limit");
    }

    (Body::from(captured.bytes.clone()), captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;

    async fn collect(body: Body) -> Bytes {
        body.collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_small_body_is_captured_and_replayed() {
        let (forwarded, captured) = read_request_body(Body::from(r#"{"a":1}"#), 1024).await;

        assert_eq!(&captured.bytes[..], br#"{"a":1}"#);
        assert!(!captured.truncated);
        assert!(captured.read_error.is_none());
        assert_eq!(&collect(forwarded).await[..], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_oversized_body_is_truncated() {
        let (forwarded, captured) = read_request_body(Body::from("0123456789"), 4).await;

        assert_eq!(captured.len(), 4);
        assert!(captured.truncated);
        // The next handler sees exactly the bytes that were consumed
        assert_eq!(&collect(forwarded).await[..], b"0123");
    }

    #[tokio::test]
    async fn test_truncation_across_chunks() {
        let chunks: Vec<Result<&'static str, std::io::Error>> =
            vec![Ok("abc"), Ok("def"), Ok("ghi")];
        let body = Body::from_stream(stream::iter(chunks));

        let (forwarded, captured) = read_request_body(body, 6).await;

        assert_eq!(&captured.bytes[..], b"abcdef");
        assert!(captured.truncated);
        assert_eq!(&collect(forwarded).await[..], b"abcdef");
    }

    #[tokio::test]
    async fn test_exact_size_body_is_not_truncated() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![Ok("abc"), Ok("def")];
        let body = Body::from_stream(stream::iter(chunks));

        let (_, captured) = read_request_body(body, 6).await;

        assert_eq!(captured.len(), 6);
        assert!(!captured.truncated);
    }

    #[tokio::test]
    async fn test_empty_body() {
        let (forwarded, captured) = read_request_body(Body::empty(), 16).await;
        assert!(captured.is_empty());
        assert!(collect(forwarded).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_keeps_partial_bytes() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("par"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let (forwarded, captured) = read_request_body(body, 1024).await;

        let error = captured.read_error.as_deref().unwrap();
        assert!(error.starts_with("Read error:"));
        assert!(error.contains("peer reset"));
        assert_eq!(&collect(forwarded).await[..], b"par");
    }
}
