//! Audit interceptor.
//!
//! # Data Flow
//! ```text
//! Request
//!     → capture request body (bounded), rebuild the request with it
//!     → inner service (called exactly once)
//!     → filter on method, path and code headers
//!         skip   ─▶ response returned untouched
//!         record ─▶ wrap response body in CaptureBody (if enabled)
//!                   → background task: await copy, build record, dispatch
//! Response (same status, headers and bytes the handler produced)
//! ```
//!
//! # Design Decisions
//! - Filtering only reads request data, so it runs before the response body
//!   is wrapped; skipped transactions never pay for response capture
//! - Record construction and delivery never block the response
//! - Errors from the inner service pass through unchanged

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderValue, Request, Response};
use tower::{Layer, Service};

use crate::capture::{read_request_body, CaptureBody, CapturedBody};
use crate::config::{AuditConfig, Settings};
use crate::filter::{FilterEngine, Verdict};
use crate::record::{RecordBuilder, Transaction};
use crate::sink::SinkDispatcher;

/// Shared state of one configured interceptor.
#[derive(Debug)]
struct AuditState {
    settings: Settings,
    filter: FilterEngine,
    builder: RecordBuilder,
    dispatcher: SinkDispatcher,
}

/// Tower layer that audits the transactions of the wrapped service.
///
/// Construction never fails: invalid settings are reported through
/// `tracing` and replaced by defaults.
#[derive(Debug, Clone)]
pub struct AuditLayer {
    state: Arc<AuditState>,
}

impl AuditLayer {
    pub fn new(config: AuditConfig) -> Self {
        Self::from_settings(Settings::resolve(&config))
    }

    pub fn from_settings(settings: Settings) -> Self {
        let dispatcher = SinkDispatcher::from_settings(&settings.sinks);
        Self::with_dispatcher(settings, dispatcher)
    }

    /// Use a caller-supplied set of sinks instead of the configured ones.
    pub fn with_dispatcher(settings: Settings, dispatcher: SinkDispatcher) -> Self {
        let filter = FilterEngine::from_settings(&settings);
        let builder = RecordBuilder::new(settings.classification, settings.include_headers.clone());

        if dispatcher.is_empty() {
            tracing::warn!("No audit sinks configured; records will be dropped");
        }

        Self {
            state: Arc::new(AuditState {
                settings,
                filter,
                builder,
                dispatcher,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Service produced by [`AuditLayer`].
#[derive(Debug, Clone)]
pub struct AuditService<S> {
    inner: S,
    state: Arc<AuditState>,
}

impl<S> Service<Request<Body>> for AuditService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let method = request.method().to_string();
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            let headers = request.headers().clone();

            let (request, request_body) = if state.settings.log_request {
                let (mut parts, body) = request.into_parts();
                let (body, captured) = read_request_body(body, state.settings.max_body_size).await;
                // The forwarded body is what was captured, which may be shorter.
                if parts.headers.contains_key(CONTENT_LENGTH) {
                    parts
                        .headers
                        .insert(CONTENT_LENGTH, HeaderValue::from(captured.len()));
                }
                (Request::from_parts(parts, body), Some(captured))
            } else {
                (request, None)
            };

            let response = inner.call(request).await?;

            let (classification_code, action_code) =
                match state.filter.evaluate(&method, &path, &headers) {
                    Verdict::Record {
                        classification_code,
                        action_code,
                    } => (classification_code, action_code),
                    Verdict::Skip(reason) => {
                        tracing::debug!(method = %method, path = %path, reason = %reason, "Audit skipped");
                        return Ok(response);
                    }
                };

            let tx = Transaction {
                method,
                path,
                classification_code,
                action_code,
                request_body,
                response_body: None,
                headers,
            };

            if !state.settings.log_response {
                let record = state.builder.build(tx);
                state.dispatcher.dispatch(record);
                return Ok(response);
            }

            let (parts, body) = response.into_parts();
            let (body, copy) = CaptureBody::new(body, state.settings.max_body_size);

            tokio::spawn(async move {
                // CaptureBody sends on drop, so the sender is never lost silently.
                let captured = copy.await.unwrap_or_else(|_| CapturedBody::default());
                if let Some(error) = &captured.read_error {
                    tracing::warn!(path = %tx.path, error = %error, "Response body capture incomplete");
                }
                let record = state.builder.build(Transaction {
                    response_body: Some(captured),
                    ..tx
                });
                state.dispatcher.dispatch(record);
            });

            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}
