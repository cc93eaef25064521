//! Post-test feedback form.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, instrument, warn};

use crate::error::{QuizError, Result, ValidationError};
use crate::model::{FeedbackEntry, Rating};
use crate::navigator::InFlight;
use crate::traits::{AssessmentApi, SessionStore};

/// What the user has entered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub rating: Option<Rating>,
    pub comment: String,
}

/// Collects a rating and comment and posts them once.
///
/// The draft survives a failed submission so the user can retry. The server
/// does not deduplicate, so a retry after a lost response may post twice.
pub struct FeedbackSubmitter {
    user_id: String,
    api: Arc<dyn AssessmentApi>,
    draft: Mutex<FeedbackDraft>,
    in_flight: AtomicBool,
}

impl FeedbackSubmitter {
    pub fn new(api: Arc<dyn AssessmentApi>, session: &dyn SessionStore) -> Result<Self> {
        let user_id = session
            .user_id()
            .ok_or_else(|| QuizError::Auth("not logged in".into()))?;
        Ok(Self {
            user_id,
            api,
            draft: Mutex::new(FeedbackDraft::default()),
            in_flight: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FeedbackDraft> {
        self.draft.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_rating(&self, value: u8) -> Result<Rating> {
        let rating = Rating::try_from(value)?;
        self.lock().rating = Some(rating);
        Ok(rating)
    }

    pub fn clear_rating(&self) {
        self.lock().rating = None;
    }

    pub fn set_comment(&self, comment: impl Into<String>) {
        self.lock().comment = comment.into();
    }

    pub fn draft(&self) -> FeedbackDraft {
        self.lock().clone()
    }

    /// Post the draft and return the server's acknowledgement.
    ///
    /// Without a rating nothing is sent.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<String> {
        let entry = {
            let draft = self.lock();
            let rating = draft.rating.ok_or(ValidationError::MissingRating)?;
            FeedbackEntry {
                user_id: self.user_id.clone(),
                rating,
                comment: draft.comment.clone(),
            }
        };

        let in_flight = InFlight::acquire(&self.in_flight)?;
        let outcome = self.api.submit_feedback(&entry).await;
        drop(in_flight);

        match outcome {
            Ok(message) => {
                info!(rating = entry.rating.value(), "feedback submitted");
                *self.lock() = FeedbackDraft::default();
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "feedback submission failed, draft kept");
                Err(e)
            }
        }
    }
}
