//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

use axum::{body::Bytes, http::HeaderMap, routing::any, Router};
use futures_util::stream;
use http_body_util::{combinators::BoxBody, BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{server::conn::http2, service::service_fn, Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use prost::Message;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use audit_relay::sink::proto::InvokeBindingRequest;
use audit_relay::AuditLayer;

/// One call received by the fake binding endpoint.
#[derive(Debug)]
pub struct BindingCall {
    pub path: String,
    pub content_type: Option<String>,
    pub request: InvokeBindingRequest,
}

/// How the fake binding endpoint answers.
#[derive(Debug, Clone, Copy)]
pub enum BindingReply {
    /// Empty `InvokeBindingResponse` followed by `grpc-status: 0`.
    Ok,
    /// Trailers-only response with the given status and a percent-encoded
    /// message.
    Fail(u32, &'static str),
}

/// Handle to a running fake binding endpoint.
pub struct FakeBinding {
    pub port: u16,
    pub calls: mpsc::UnboundedReceiver<BindingCall>,
}

impl FakeBinding {
    /// Wait for the next call, failing the test after a few seconds.
    pub async fn next_call(&mut self) -> BindingCall {
        tokio::time::timeout(Duration::from_secs(3), self.calls.recv())
            .await
            .expect("no binding call received")
            .expect("binding server stopped")
    }
}

/// Start an HTTP/2 cleartext gRPC endpoint that answers every call with
/// `reply` and reports the decoded request.
pub async fn start_fake_binding(reply: BindingReply) -> FakeBinding {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let path = req.uri().path().to_string();
                        let content_type = req
                            .headers()
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let frame = req.into_body().collect().await?.to_bytes();
                        let _ = tx.send(BindingCall {
                            path,
                            content_type,
                            request: decode_request(&frame),
                        });
                        Ok::<_, hyper::Error>(grpc_response(reply))
                    }
                });

                let _ = http2::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    FakeBinding { port, calls: rx }
}

fn grpc_response(reply: BindingReply) -> Response<BoxBody<Bytes, Infallible>> {
    let frames = match reply {
        BindingReply::Ok => {
            let mut trailers = HeaderMap::new();
            trailers.insert("grpc-status", 0u32.into());
            // Uncompressed frame around an empty message
            let message = Bytes::from_static(&[0, 0, 0, 0, 0]);
            vec![Frame::data(message), Frame::trailers(trailers)]
        }
        BindingReply::Fail(..) => Vec::new(),
    };

    let body = StreamBody::new(stream::iter(frames.into_iter().map(Ok::<_, Infallible>))).boxed();
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert("content-type", "application/grpc".parse().unwrap());
    if let BindingReply::Fail(code, message) = reply {
        headers.insert("grpc-status", code.into());
        headers.insert("grpc-message", message.parse().unwrap());
    }
    response
}

/// Strip the gRPC length prefix and decode the binding request.
pub fn decode_request(frame: &[u8]) -> InvokeBindingRequest {
    assert_eq!(frame[0], 0, "compressed frame");
    let len = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]) as usize;
    InvokeBindingRequest::decode(&frame[5..5 + len]).unwrap()
}

/// Poll `path` until it holds at least `count` lines.
pub async fn wait_for_lines(path: &Path, count: usize) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let lines: Vec<String> = std::fs::read_to_string(path)
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default();
        if lines.len() >= count || tokio::time::Instant::now() >= deadline {
            return lines;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Echo handler: returns the request body, tagged with a custom header.
pub async fn echo(headers: HeaderMap, body: Bytes) -> (HeaderMap, Bytes) {
    let mut out = HeaderMap::new();
    if let Some(ct) = headers.get("content-type") {
        out.insert("content-type", ct.clone());
    }
    out.insert("x-handler", "echo".parse().unwrap());
    (out, body)
}

/// Size of the body served by `/download`.
pub const DOWNLOAD_SIZE: usize = 64 * 1024;

/// Fixed large body, independent of the request.
pub async fn download() -> (HeaderMap, String) {
    let mut out = HeaderMap::new();
    out.insert("x-handler", "download".parse().unwrap());
    (out, "x".repeat(DOWNLOAD_SIZE))
}

/// Router that echoes every path except `/download`, optionally wrapped by
/// `layer`.
pub fn echo_app(layer: Option<AuditLayer>) -> Router {
    let router = Router::new()
        .route("/download", any(download))
        .route("/{*path}", any(echo));
    match layer {
        Some(layer) => router.layer(layer),
        None => router,
    }
}
