//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range request parameters, detected before any store access.
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Well-formed reference to an item that does not exist or is sold out.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing-store connectivity or query failure. Never retried at this layer.
    #[error("Store failure: {0}")]
    Store(#[from] sqlx::Error),

    /// Rejected ingestion batch (malformed CSV row, unknown tag, duplicate id).
    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadInput(_) => "bad_input",
            Error::NotFound(_) => "not_found",
            Error::Store(_) => "store_failure",
            Error::Ingest(_) => "ingest",
            Error::Internal(_) | Error::Other(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadInput(_) | Error::Ingest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Store(_) | Error::Internal(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<catalog_geo::Error> for Error {
    fn from(e: catalog_geo::Error) -> Self {
        Error::BadInput(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        match e.position() {
            Some(pos) => Error::Ingest(format!("line {}: {}", pos.line(), e)),
            None => Error::Ingest(e.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::info!(error = %self, kind = self.kind(), "Request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
