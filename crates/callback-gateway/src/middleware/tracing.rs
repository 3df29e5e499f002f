//! Per-request tracing span and request accounting.
//!
//! Every request runs inside a `callback_request` span carrying the method,
//! path and final status. Query strings are left out of the span since they
//! carry signatures and ciphertext.

use super::metrics::{CallbackMetrics, RequestTimer};
use axum::{body::Body, http::Request, response::Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, info_span, Instrument, Span};

/// Tracing layer that creates a span and counts each request
#[derive(Clone)]
pub struct TracingLayer {
    metrics: Arc<CallbackMetrics>,
}

impl TracingLayer {
    pub fn new(metrics: Arc<CallbackMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Arc<CallbackMetrics>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let metrics = Arc::clone(&self.metrics);

        let parent_context = extract_trace_context(&req);

        let span = info_span!(
            "callback_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            http.status_code = tracing::field::Empty,
            otel.kind = "server",
            otel.status_code = tracing::field::Empty,
        );

        if let Some(parent) = parent_context {
            span.follows_from(parent);
        }

        Box::pin(
            async move {
                let timer = RequestTimer::start();
                let result = inner.call(req).await;

                let success = match &result {
                    Ok(response) => {
                        let status = response.status();
                        let span = Span::current();
                        span.record("http.status_code", status.as_u16());
                        span.record(
                            "otel.status_code",
                            if status.is_success() { "OK" } else { "ERROR" },
                        );
                        debug!(status = status.as_u16(), "Request finished");
                        status.is_success()
                    }
                    Err(_) => {
                        Span::current().record("otel.status_code", "ERROR");
                        false
                    }
                };

                timer.finish(&metrics, success);

                result
            }
            .instrument(span),
        )
    }
}

/// Link to an upstream W3C `traceparent` when the caller sends one.
fn extract_trace_context<B>(req: &Request<B>) -> Option<Span> {
    let traceparent = req.headers().get("traceparent")?.to_str().ok()?;

    // version-trace_id-parent_id-trace_flags
    let mut parts = traceparent.split('-');
    let (_version, trace_id, parent_id, _flags) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || trace_id.len() != 32 || parent_id.len() != 16 {
        return None;
    }

    Some(info_span!(
        "parent_trace",
        trace_id = trace_id,
        parent_span_id = parent_id
    ))
}
