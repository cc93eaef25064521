//! Seams between the quiz logic and the outside world.
//!
//! `AssessmentApi` is implemented by the HTTP client in `tseep-client` (and by
//! [`MockApi`](crate::mock::MockApi) in tests); `SessionStore` by the stores in
//! [`session`](crate::session).

use async_trait::async_trait;

use crate::error::{QuizError, Result};
use crate::model::{AnswerSubmission, FeedbackEntry, Question, ScoredAnswer, Session};

// ---------------------------------------------------------------------------
// Remote API
// ---------------------------------------------------------------------------

/// The authenticated part of the assessment service.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// Every question in the quiz. Used to derive the question count.
    async fn list_questions(&self) -> Result<Vec<Question>>;

    /// One question by 1-based index.
    async fn question(&self, index: u32) -> Result<Question>;

    /// Record the answer for one question.
    async fn submit_answer(&self, submission: &AnswerSubmission) -> Result<()>;

    /// Scored answers for a user.
    async fn results(&self, user_id: &str) -> Result<Vec<ScoredAnswer>>;

    /// Post feedback; returns the server's acknowledgement message.
    async fn submit_feedback(&self, entry: &FeedbackEntry) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Session persistence
// ---------------------------------------------------------------------------

/// Holds the current session.
///
/// Implementations replace the whole session at once so a reader never sees
/// a new access token paired with a stale user.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Session>;

    fn save(&self, session: &Session) -> Result<()>;

    /// Drop the session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Option<String> {
        self.load().map(|s| s.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().and_then(|s| s.refresh_token)
    }

    fn user_id(&self) -> Option<String> {
        self.load().map(|s| s.user_id)
    }

    /// Replace the access token (and optionally the refresh token) of the
    /// current session.
    fn update_tokens(&self, access_token: String, refresh_token: Option<String>) -> Result<()> {
        let session = self
            .load()
            .ok_or_else(|| QuizError::Auth("no active session".into()))?;
        self.save(&session.refreshed(access_token, refresh_token))
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Notified when the session is irrecoverably lost and the user has to log in
/// again.
pub trait SessionObserver: Send + Sync {
    fn on_session_expired(&self, reason: &str);
}

/// No-op session observer.
pub struct NoopSessionObserver;

impl SessionObserver for NoopSessionObserver {
    fn on_session_expired(&self, _: &str) {}
}

/// Navigator progress callbacks, used by front ends to re-render.
pub trait NavigatorObserver: Send + Sync {
    fn on_question_loaded(&self, question: &Question, total: u32);
    fn on_answer_submitted(&self, submission: &AnswerSubmission);
    fn on_completed(&self, total: u32);
    fn on_error(&self, error: &QuizError);
}

/// No-op navigator observer.
pub struct NoopObserver;

impl NavigatorObserver for NoopObserver {
    fn on_question_loaded(&self, _: &Question, _: u32) {}
    fn on_answer_submitted(&self, _: &AnswerSubmission) {}
    fn on_completed(&self, _: u32) {}
    fn on_error(&self, _: &QuizError) {}
}
