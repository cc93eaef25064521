//! Session, navigation and feedback logic for tseep.
//!
//! This crate defines the data model, the error taxonomy, the seams to the
//! remote API and session storage, and the two stateful components a front
//! end drives: the question navigator and the feedback submitter.

pub mod error;
pub mod feedback;
pub mod mock;
pub mod model;
pub mod navigator;
pub mod session;
pub mod traits;

pub use error::{ErrorKind, QuizError, ValidationError};
pub use feedback::{FeedbackDraft, FeedbackSubmitter};
pub use navigator::{Advance, NavigatorConfig, Phase, QuestionNavigator};
pub use session::{FileSessionStore, MemorySessionStore};
pub use traits::{AssessmentApi, NavigatorObserver, SessionObserver, SessionStore};
