//! Error types for the sift server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sift_pdf::ExtractError;
use sift_report::ReportError;
use sift_search::SearchError;
use thiserror::Error;
use tracing::{error, warn};

use crate::summary::SummaryError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Could not read PDF: {0}")]
    DocumentParse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid search term: {0}")]
    InvalidSearchTerm(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::DocumentParse(detail) => {
                warn!("Rejected upload: {}", detail);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "DOCUMENT_PARSE_ERROR",
                    "The uploaded file could not be read as a PDF".to_string(),
                )
            }
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::InvalidSearchTerm(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_SEARCH_TERM", msg.clone())
            }
            ServerError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExtractError> for ServerError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::DocumentParse(msg) => ServerError::DocumentParse(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<SearchError> for ServerError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidLengthTerm(_) => ServerError::InvalidSearchTerm(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<ReportError> for ServerError {
    fn from(err: ReportError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<SummaryError> for ServerError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::NoText => ServerError::InvalidRequest(err.to_string()),
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        ServerError::InvalidRequest(err.body_text())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("Worker task failed: {}", err))
    }
}
