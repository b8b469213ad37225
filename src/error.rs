use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    RepositoryNotFound(String),

    #[error("GitHub API error: {0}")]
    UpstreamApi(String),

    #[error("Checkout failed: {0}")]
    Checkout(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Rate limit exceeded: {limit} per {window_secs} seconds")]
    RateLimitExceeded {
        limit: u32,
        window_secs: u64,
        retry_after_secs: u64,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get a sanitized error message safe for logging
    /// Filters out potentially sensitive information
    pub fn log_safe(&self) -> String {
        match self {
            // HTTP errors might contain internal URLs or authentication info
            Error::Http(_) => "External HTTP request failed".to_string(),

            // Clone failures can echo credentials embedded in remote URLs
            Error::Checkout(msg) | Error::Internal(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("password")
                    || lower.contains("secret")
                    || lower.contains("token")
                    || lower.contains('@')
                {
                    "Operation failed (details redacted)".to_string()
                } else {
                    self.to_string()
                }
            }

            Error::Io(_) => "File system operation failed".to_string(),

            Error::InvalidUrl(_)
            | Error::RepositoryNotFound(_)
            | Error::UpstreamApi(_)
            | Error::Analysis(_)
            | Error::RateLimitExceeded { .. }
            | Error::Config(_)
            | Error::Validation(_) => self.to_string(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::Validation(_)
                | Error::RepositoryNotFound(_)
                | Error::RateLimitExceeded { .. }
        )
    }
}

// Implement IntoResponse for API error handling
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::warn!("Request rejected: {}", self.log_safe());
        } else {
            tracing::error!("Request error: {}", self.log_safe());
        }

        let (status, error_message) = match &self {
            Error::InvalidUrl(_) | Error::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::RepositoryNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::RateLimitExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Error::UpstreamApi(_) | Error::Http(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch branches from GitHub".to_string(),
            ),
            Error::Checkout(_) | Error::Analysis(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to analyze repository".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();

        if let Error::RateLimitExceeded {
            retry_after_secs, ..
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
