//! `x-request-id` handling: generation, exposure to handlers and tracing,
//! and echoing into failure envelopes.

use std::time::Instant;

use axum::http::{header, HeaderName, HeaderValue, Request};
use axum::{body::Body, middleware::Next, response::Response};
use serde_json::Value;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::TraceLayer;
use tracing::field::{display, Empty};

pub const HEADER: &str = "x-request-id";

pub fn header_name() -> HeaderName {
    HeaderName::from_static(HEADER)
}

/// Failure bodies larger than this are passed through untouched.
const MAX_STAMPED_BODY: usize = 64 * 1024;

/// Request id of the current request, available as an axum `Extension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentRequestId(pub String);

/// Generates ids for requests that arrive without one.
#[derive(Clone, Copy, Default)]
pub struct NanoRequestId;

impl MakeRequestId for NanoRequestId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&nanoid::nanoid!())
            .ok()
            .map(RequestId::new)
    }
}

fn id_of<B>(req: &Request<B>) -> Option<&str> {
    req.headers().get(HEADER).and_then(|v| v.to_str().ok())
}

/// Span wrapping every request; `status` and `latency_ms` are filled by
/// [`expose_request_id`] once the response is ready.
#[allow(clippy::type_complexity)]
pub fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = id_of(req).unwrap_or("n/a"),
            status = Empty,
            latency_ms = Empty
        )
    })
}

/// Inserts [`CurrentRequestId`] for handlers and completes the request span.
pub async fn expose_request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = id_of(&req).unwrap_or("n/a").to_owned();
    req.extensions_mut().insert(CurrentRequestId(id));

    let started = Instant::now();
    let resp = next.run(req).await;

    let span = tracing::Span::current();
    span.record("status", resp.status().as_u16());
    span.record("latency_ms", display(started.elapsed().as_millis()));
    resp
}

/// Writes the request id into `requestId` of JSON bodies with `success: false`.
pub async fn stamp_failure_envelopes(req: Request<Body>, next: Next) -> Response {
    let id = id_of(&req).map(str::to_owned);
    let resp = next.run(req).await;

    let Some(id) = id else { return resp };
    let json = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if !json || resp.status().is_success() {
        return resp;
    }

    let (mut parts, body) = resp.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_STAMPED_BODY).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(%error, "could not buffer failure body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let Ok(Value::Object(mut envelope)) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    if envelope.get("success") != Some(&Value::Bool(false)) {
        return Response::from_parts(parts, Body::from(bytes));
    }
    envelope.insert("requestId".to_owned(), Value::String(id));

    match serde_json::to_vec(&envelope) {
        Ok(buf) => {
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(buf.len()));
            Response::from_parts(parts, Body::from(buf))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}
