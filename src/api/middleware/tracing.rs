//! HTTP request/response tracing middleware.

use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

/// Span factory naming requests by their route template.
///
/// Recording `/api/links/{id}` rather than the concrete URI keeps span names
/// low-cardinality; the concrete URI is still attached as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("unmatched");

        tracing::info_span!(
            "request",
            method = %request.method(),
            route,
            uri = %request.uri(),
        )
    }
}

/// Creates a tracing middleware for HTTP requests.
///
/// Opens an `INFO` span per request with method, route template and URI, logs
/// request start at `DEBUG`, and the response status with latency in
/// milliseconds at `INFO`. 5xx responses are additionally reported as failures.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=POST route=/api/links uri=/api/links}: finished processing request latency=12 ms status=201
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
