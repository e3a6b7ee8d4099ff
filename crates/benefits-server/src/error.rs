use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use benefits_core::error::{CatalogError, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("config error: {0}")]
    Config(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// A catalog failure on its way out of an HTTP handler.
///
/// `summary` is the client-facing sentence for the failing operation; the
/// underlying error is attached as `message`.
#[derive(Debug)]
pub struct ApiError {
    pub err: CatalogError,
    pub summary: &'static str,
}

impl ApiError {
    pub fn new(err: CatalogError, summary: &'static str) -> Self {
        Self { err, summary }
    }
}

pub fn status_for(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Source(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.err);
        let body = match &self.err {
            CatalogError::Validation(message) => {
                warn!(error = %self.err, "rejected request");
                ErrorBody {
                    success: false,
                    error: capitalize(message),
                    message: None,
                }
            }
            CatalogError::NotFound(_) => ErrorBody {
                success: false,
                error: "Benefit not found".to_string(),
                message: None,
            },
            CatalogError::Source(source) => {
                error!(error = %source, fetch = source.is_fetch(), "{}", self.summary);
                ErrorBody {
                    success: false,
                    error: self.summary.to_string(),
                    message: Some(source.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
