//! Error taxonomy for the assessment client.
//!
//! Defined in `tseep-core` so the navigator and feedback submitter can
//! classify failures (local validation, network, expired session) without
//! knowing which HTTP stack produced them.

use thiserror::Error;

/// Input rejected locally. Never reaches the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// "Next" was pressed with nothing selected.
    #[error("select an answer before continuing")]
    NoAnswerSelected,

    /// The option is not one of the current question's options.
    #[error("'{0}' is not an option for this question")]
    UnknownOption(String),

    /// No question is loaded to select an answer for.
    #[error("no question is loaded")]
    NoQuestionLoaded,

    /// Question index outside `1..=total`.
    #[error("question {index} is out of range (1..={total})")]
    IndexOutOfRange { index: u32, total: u32 },

    /// Feedback submitted without a rating.
    #[error("a rating is required")]
    MissingRating,

    /// Rating outside `1..=5`.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    /// A required form field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Mobile number does not have the expected shape.
    #[error("invalid mobile number: {0}")]
    InvalidMobileNumber(&'static str),

    /// Email address does not look like one.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password is shorter than the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Errors surfaced by the navigator, the feedback submitter and the API.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Local validation failed; no request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be delivered or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The session is gone and could not be refreshed. The user must log in again.
    #[error("session expired: {0}")]
    Auth(String),

    /// Another submission from the same instance is still in flight.
    #[error("a request is already in progress")]
    Busy,

    /// The quiz has been completed; no further navigation is possible.
    #[error("the quiz is already completed")]
    Completed,

    /// The question count has not been loaded yet.
    #[error("questions have not been loaded")]
    NotLoaded,

    /// The server returned an empty question set.
    #[error("the quiz has no questions")]
    EmptyQuiz,

    /// The session could not be read from or written to disk.
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Coarse classification used by front ends to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Show the message, block the action.
    Validation,
    /// Show the message, offer a retry.
    Network,
    /// Drop the session and go back to login.
    Auth,
    /// Action not allowed in the current state.
    State,
}

impl QuizError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizError::Validation(_) => ErrorKind::Validation,
            QuizError::Network(_) | QuizError::Api { .. } | QuizError::Decode(_) => {
                ErrorKind::Network
            }
            QuizError::Auth(_) => ErrorKind::Auth,
            QuizError::Busy
            | QuizError::Completed
            | QuizError::NotLoaded
            | QuizError::EmptyQuiz
            | QuizError::Storage(_) => ErrorKind::State,
        }
    }

    /// Returns `true` if the user may retry the same action unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuizError::Network(_) | QuizError::Api { .. } | QuizError::Decode(_) | QuizError::Busy
        )
    }

    /// Returns `true` if the session was cleared and the user must log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, QuizError::Auth(_))
    }
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;
