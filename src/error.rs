use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Too many requests. Please try again later.")]
    RateLimitExceeded,

    #[error("CAPTCHA verification failed")]
    CaptchaFailed,

    #[error("{0}")]
    FileRejected(String),

    #[error("Resume upload failed: {0}")]
    UploadFailed(String),

    #[error("Failed to persist application: {0}")]
    Persistence(String),

    /// Never surfaced to a client; the pipeline logs and drops it.
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request too large")]
    PayloadTooLarge,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Invalid query: {0}")]
    QueryValidation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::CaptchaFailed
            | Error::FileRejected(_)
            | Error::BadRequest(_)
            | Error::QueryValidation(_)
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_)
            | Error::UploadFailed(_)
            | Error::Persistence(_)
            | Error::Notification(_)
            | Error::Database(_)
            | Error::Reqwest(_)
            | Error::Io(_)
            | Error::Anyhow(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self {
            Error::Validation(msg)
            | Error::FileRejected(msg)
            | Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::NotFound(msg) => msg.clone(),
            Error::QueryValidation(err) => err.to_string(),
            Error::Json(_) => "Invalid request body".to_string(),
            Error::RateLimitExceeded
            | Error::CaptchaFailed
            | Error::MethodNotAllowed
            | Error::PayloadTooLarge => self.to_string(),
            other => {
                tracing::error!(error = %other, "request failed");
                GENERIC_FAILURE.to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
