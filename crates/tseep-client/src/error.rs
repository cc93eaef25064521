//! HTTP error types.

use thiserror::Error;

use tseep_core::QuizError;

/// Errors that can occur when talking to the assessment API.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An unauthenticated request (login, register) was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The access token was rejected and could not be refreshed. The session
    /// has been cleared.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl HttpError {
    /// Returns `true` if the session is gone and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, HttpError::SessionExpired(_))
    }
}

impl From<HttpError> for QuizError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::SessionExpired(reason) => QuizError::Auth(reason),
            HttpError::Unauthorized(message) => QuizError::Api {
                status: 401,
                message,
            },
            HttpError::ApiError { status, message } => QuizError::Api { status, message },
            HttpError::Timeout(secs) => QuizError::Network(format!("timed out after {secs}s")),
            HttpError::NetworkError(message) => QuizError::Network(message),
            HttpError::Decode(message) => QuizError::Decode(message),
            HttpError::Config(message) => QuizError::Network(message),
        }
    }
}
