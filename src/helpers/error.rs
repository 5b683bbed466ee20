use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use crate::discovery::query::SearchInputError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    InvalidSearch(#[from] SearchInputError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("This restaurant is already in the selected list")]
    AlreadyInList,

    #[error("{0}")]
    NotConfigured(&'static str),

    #[error("Upstream error: {0}")]
    Integration(#[from] anyhow::Error),
}

impl AppError {
    /// Log a failed storage or integration call and hide its details from the caller.
    pub fn upstream(action: &str, e: anyhow::Error) -> Self {
        warn!("Something went wrong {} due to: {:#}", action, e);
        AppError::Integration(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidSearch(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": e.to_string(), "reason": e.reason_code() }),
            ),
            AppError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string() }),
            ),
            AppError::AlreadyInList => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string() }),
            ),
            AppError::NotConfigured(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            // upstream details stay in the logs
            AppError::Integration(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "An error occurred while processing your request, please try again" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
