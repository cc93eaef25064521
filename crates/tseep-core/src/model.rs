//! Core data model types for tseep.
//!
//! Sessions, questions, answers, feedback and the registration/login forms,
//! together with the local validation rules applied before anything is sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Minimum password length accepted by the login and registration forms.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Length of a mobile number on the login form.
pub const MOBILE_NUMBER_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated user session.
///
/// This is the single persisted schema: `userId`, `accessToken` and an
/// optional `refreshToken`. Custom `Debug` masks both tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            refresh_token: None,
            issued_at: Utc::now(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// A copy of this session carrying a freshly issued access token.
    ///
    /// A rotated refresh token replaces the old one; `None` keeps it.
    pub fn refreshed(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            user_id: self.user_id.clone(),
            access_token,
            refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
            issued_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"***")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***"),
            )
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Questions and answers
// ---------------------------------------------------------------------------

/// A single quiz question. Immutable once fetched.
///
/// The server also sends the correct answer; it is deliberately not part of
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// 1-based position in the quiz.
    pub index: u32,
    pub prompt: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Option by 1-based position, as shown to the user.
    pub fn option(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// The answer chosen for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub user_id: String,
    pub index: u32,
    pub selected_option: String,
}

/// Where the user currently is in the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// Always within `1..=total_questions`.
    pub current_index: u32,
    pub total_questions: u32,
    /// Reset to `None` on every index change.
    pub selected_answer: Option<String>,
}

/// One cell of the question grid shown next to the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub index: u32,
    pub answered: bool,
    pub current: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Default maximum score displayed next to the total.
pub const DEFAULT_MAX_SCORE: u32 = 50;

/// A scored answer returned by the results endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    #[serde(default)]
    pub score: f64,
    /// Whatever else the server attaches (question index, selected answer, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScoredAnswer {
    pub fn index(&self) -> Option<u64> {
        self.extra.get("index").and_then(|v| v.as_u64())
    }
}

/// Totals shown on the completion screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_score: f64,
    pub max_score: u32,
    pub answers: Vec<ScoredAnswer>,
}

impl ResultSummary {
    pub fn new(answers: Vec<ScoredAnswer>, max_score: u32) -> Self {
        let total_score = answers.iter().map(|a| a.score).sum();
        Self {
            total_score,
            max_score,
            answers,
        }
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.total_score, self.max_score)
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Satisfaction rating, 1 (very dissatisfied) to 5 (very satisfied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Dissatisfied",
            2 => "Dissatisfied",
            3 => "Neutral",
            4 => "Satisfied",
            _ => "Very Satisfied",
        }
    }

    /// Every rating in ascending order.
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// A submitted feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub user_id: String,
    pub rating: Rating,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Login and registration forms
// ---------------------------------------------------------------------------

/// Login form: mobile number and password.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub mobile_no: String,
    pub password: String,
}

impl Credentials {
    pub fn new(mobile_no: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mobile_no: mobile_no.into(),
            password: password.into(),
        }
    }

    /// Mobile number must be exactly ten digits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mobile_no.is_empty() {
            return Err(ValidationError::MissingField("mobile number"));
        }
        if self.mobile_no.len() != MOBILE_NUMBER_LEN || !is_digits(&self.mobile_no) {
            return Err(ValidationError::InvalidMobileNumber("expected 10 digits"));
        }
        validate_password(&self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("mobile_no", &self.mobile_no)
            .field("password", &"***")
            .finish()
    }
}

/// Current occupation, asked for on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Student,
    Employee,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Student => write!(f, "student"),
            UserStatus::Employee => write!(f, "employee"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserStatus::Student),
            "employee" => Ok(UserStatus::Employee),
            other => Err(format!(
                "unknown status: '{other}' (expected student or employee)"
            )),
        }
    }
}

/// Registration form.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub status: UserStatus,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if !looks_like_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.mobile_no.is_empty() {
            return Err(ValidationError::MissingField("mobile number"));
        }
        if !is_digits(&self.mobile_no) {
            return Err(ValidationError::InvalidMobileNumber("must be numeric"));
        }
        validate_password(&self.password)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("mobile_no", &self.mobile_no)
            .field("status", &self.status)
            .field("password", &"***")
            .finish()
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}
