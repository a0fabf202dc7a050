use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// History or catalog source could not be reached or queried
    #[error("{source_name} unavailable: {message}")]
    UnavailableSource {
        source_name: &'static str,
        message: String,
    },

    /// Embedding or classification call failed
    #[error("{provider} provider failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        AppError::UnavailableSource {
            source_name,
            message: message.into(),
        }
    }

    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        AppError::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Name of the external dependency that failed, if any
    pub fn dependency(&self) -> Option<&str> {
        match self {
            AppError::UnavailableSource { source_name, .. } => Some(*source_name),
            AppError::Provider { provider, .. } => Some(*provider),
            AppError::Cache(_) => Some("cache"),
            AppError::HttpClient(_) | AppError::ExternalApi(_) => Some("external_api"),
            AppError::Timeout(_) | AppError::InvalidInput(_) | AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnavailableSource { .. }
            | AppError::Provider { .. }
            | AppError::ExternalApi(_)
            | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "dependency": self.dependency(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
