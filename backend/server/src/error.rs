use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bank::BankError;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad-json")]
    MalformedPayload,

    #[error("bad-args")]
    BadArgs,

    #[error("Species not found: {0}")]
    SpeciesNotFound(String),

    #[error("too-fast")]
    TooFast,

    #[error("Environment misconfigured: {0}")]
    Config(String),

    #[error("Bank error: {0}")]
    Bank(#[from] BankError),

    #[error("Log error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {rejection}");

        AppError::BadArgs
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload | AppError::BadArgs => StatusCode::BAD_REQUEST,
            AppError::SpeciesNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TooFast => StatusCode::TOO_MANY_REQUESTS,
            AppError::Config { .. }
            | AppError::Bank { .. }
            | AppError::Io { .. }
            | AppError::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "ok": false, "err": self.to_string() }))).into_response()
    }
}
