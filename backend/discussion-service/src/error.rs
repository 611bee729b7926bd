/// Error types for Discussion Service
///
/// Every failure is rendered with the same envelope as successful responses:
/// `{"data": {}, "error": "<message>"}`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use uuid::Uuid;

/// Result type for discussion-service operations
pub type Result<T> = std::result::Result<T, AppError>;

pub const DEFAULT_INTERNAL_ERROR_MESSAGE: &str = "We are facing a problem with the subsystem";
pub const MISSING_CATEGORY_ERROR_MESSAGE: &str =
    "The category is not existing, please verify the information";
pub const AUTHENTICATION_NEEDED_MESSAGE: &str =
    "You need to be logged in in order to publish on forum";

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or path failed validation
    #[error("{0}")]
    Validation(String),

    /// Discourse rejected the parameters (422, 429 or an `errors` payload)
    #[error("{0}")]
    ForumRequest(String),

    /// Discourse answered 5xx or could not be reached
    #[error("discourse unavailable: {0}")]
    ForumUnavailable(String),

    /// Discourse refused our API key
    #[error("discourse authentication failed: {0}")]
    ForumAuthentication(String),

    /// Discourse could not find the requested category
    #[error("discourse resource unavailable")]
    ResourceUnavailable,

    #[error("Topic creation failed. Category for asset {0} is missing")]
    MissingCategory(Uuid),

    #[error("{}", AUTHENTICATION_NEEDED_MESSAGE)]
    AuthenticationNeeded,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// asset-management or auth service failure
    #[error("{service} service error: {message}")]
    UpstreamService {
        service: &'static str,
        message: String,
    },

    /// Kafka publish failure
    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message exposed to API clients. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ForumUnavailable(_) | AppError::ForumAuthentication(_) => {
                DEFAULT_INTERNAL_ERROR_MESSAGE.to_string()
            }
            AppError::ResourceUnavailable => MISSING_CATEGORY_ERROR_MESSAGE.to_string(),
            AppError::UpstreamService { service, .. } => {
                format!("Could not call {} service", service)
            }
            other => other.to_string(),
        }
    }

    /// Validation error reporting only the first failing field of `precedence`.
    pub fn first_invalid_field(errors: validator::ValidationErrors, precedence: &[&str]) -> Self {
        let message = {
            let field_errors = errors.field_errors();
            precedence
                .iter()
                .filter_map(|field| field_errors.get(*field))
                .flat_map(|errs| errs.iter())
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        };

        match message {
            Some(message) => AppError::Validation(message),
            None => errors.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::ForumRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationNeeded | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ResourceUnavailable | AppError::MissingCategory(_) => StatusCode::NOT_FOUND,
            AppError::ForumUnavailable(_)
            | AppError::ForumAuthentication(_)
            | AppError::UpstreamService { .. } => StatusCode::BAD_GATEWAY,
            AppError::Messaging(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "data": {},
            "error": self.public_message(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ForumUnavailable(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}
