//! Request ids and the root request span.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::time::Instant;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";
const TRACE_ID: &str = "x-trace-id";

/// Longest client-supplied id that is reused as-is.
const MAX_INBOUND_ID_LEN: usize = 64;

/// Id of the current request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Reuse a well-formed client `x-request-id` so load balancer and server logs line up.
fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let id = headers.get(REQUEST_ID)?.to_str().ok()?.trim();
    let well_formed = !id.is_empty()
        && id.len() <= MAX_INBOUND_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    well_formed.then(|| id.to_string())
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// Opens the `http_request` span, tags it with the request id and returns both the request
/// id and the OpenTelemetry trace id as response headers.
#[tracing::instrument(
    name = "http_request",
    skip_all,
    fields(
        http.method = %req.method(),
        http.route = %crate::metrics::sanitize_path(req.uri().path()),
        otel.kind = "server",
        http.response.status_code = tracing::field::Empty,
        request_id = tracing::field::Empty,
    )
)]
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let span = Span::current();
    let started = Instant::now();

    let request_id =
        inbound_request_id(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    span.record("request_id", request_id.as_str());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    let status = response.status();
    span.record("http.response.status_code", status.as_u16());
    tracing::info!(
        status = status.as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );

    let trace_id = span.context().span().span_context().trace_id().to_string();
    let headers = response.headers_mut();
    set_header(headers, REQUEST_ID, &request_id);
    set_header(headers, TRACE_ID, &trace_id);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn well_formed_client_ids_are_reused() {
        assert_eq!(
            inbound_request_id(&headers_with("lb-7f3a_01")).as_deref(),
            Some("lb-7f3a_01")
        );
    }

    #[test]
    fn odd_client_ids_are_replaced() {
        assert_eq!(inbound_request_id(&headers_with("a b")), None);
        assert_eq!(inbound_request_id(&headers_with(&"x".repeat(65))), None);
        assert_eq!(inbound_request_id(&HeaderMap::new()), None);
    }
}
