//! Per-request HTTP metrics.

use crate::metrics::{
    sanitize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
    HTTP_REQUEST_SIZE_BYTES,
};
use axum::{extract::Request, http::header, middleware::Next, response::Response};
use std::time::Instant;

/// Decrements the in-flight gauge when dropped, including when the client disconnects
/// and the handler future is cancelled.
struct InFlight {
    labels: [String; 2],
}

impl InFlight {
    fn enter(method: &str, route: &str) -> Self {
        let labels = [method.to_string(), route.to_string()];
        HTTP_REQUESTS_IN_FLIGHT
            .with_label_values(&[&labels[0], &labels[1]])
            .inc();
        Self { labels }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT
            .with_label_values(&[&self.labels[0], &self.labels[1]])
            .dec();
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    // ids in paths would explode label cardinality
    let route = sanitize_path(req.uri().path());

    let body_size = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok());
    if let Some(size) = body_size {
        HTTP_REQUEST_SIZE_BYTES
            .with_label_values(&[&method, &route])
            .observe(size);
    }

    let _in_flight = InFlight::enter(&method, &route);
    let started = Instant::now();
    let response = next.run(req).await;

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &route])
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &route, response.status().as_str()])
        .inc();

    response
}
