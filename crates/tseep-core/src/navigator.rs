//! Question navigator.
//!
//! Tracks progress through the ordered question set: which question is on
//! screen, which option is selected, which indices have been answered. All
//! remote calls go through an [`AssessmentApi`].
//!
//! Phases:
//!
//! ```text
//! Unloaded --load_total_count--> Active --submit last--> Completed
//!                                  |
//!                                  +--auth failure--> Expired
//! ```
//!
//! Methods take `&self` so the navigator can be shared with a UI task. A
//! submission holds an in-flight flag; a second submit or a jump issued while
//! it is outstanding fails with [`QuizError::Busy`] without touching the
//! network.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{QuizError, Result, ValidationError};
use crate::model::{AnswerSubmission, GridCell, NavigationState, Question};
use crate::traits::{AssessmentApi, NavigatorObserver, NoopObserver, SessionStore};

/// Navigator options.
#[derive(Debug, Clone, Default)]
pub struct NavigatorConfig {
    /// Keep fetched questions keyed by index instead of re-fetching on every
    /// visit. The cache is dropped when the session ends.
    pub cache_questions: bool,
}

/// Lifecycle of a navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The question count has not been fetched yet.
    Unloaded,
    /// Questions are being answered.
    Active,
    /// The last question was submitted. Terminal.
    Completed,
    /// The session was lost. Terminal; the user must log in again.
    Expired,
}

/// Outcome of a successful [`QuestionNavigator::submit_and_advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to this index.
    Next(u32),
    /// That was the last question.
    Completed,
}

struct NavigatorInner {
    phase: Phase,
    current_index: u32,
    total: u32,
    selected: Option<String>,
    question: Option<Question>,
    answered: BTreeSet<u32>,
    cache: HashMap<u32, Question>,
}

impl NavigatorInner {
    fn check_active(&self) -> Result<()> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Unloaded => Err(QuizError::NotLoaded),
            Phase::Completed => Err(QuizError::Completed),
            Phase::Expired => Err(QuizError::Auth("session expired".into())),
        }
    }

    fn check_range(&self, index: u32) -> Result<()> {
        if (1..=self.total).contains(&index) {
            Ok(())
        } else {
            Err(ValidationError::IndexOutOfRange {
                index,
                total: self.total,
            }
            .into())
        }
    }

    fn move_to(&mut self, index: u32) {
        if self.current_index != index {
            self.current_index = index;
            self.selected = None;
            self.question = None;
        }
    }
}

/// Clears the in-flight flag when dropped.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| QuizError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequential navigation over a quiz.
pub struct QuestionNavigator {
    id: Uuid,
    user_id: String,
    api: Arc<dyn AssessmentApi>,
    observer: Arc<dyn NavigatorObserver>,
    config: NavigatorConfig,
    inner: Mutex<NavigatorInner>,
    in_flight: AtomicBool,
}

impl QuestionNavigator {
    /// Create a navigator for the user of the current session.
    pub fn new(
        api: Arc<dyn AssessmentApi>,
        session: &dyn SessionStore,
        config: NavigatorConfig,
    ) -> Result<Self> {
        let user_id = session
            .user_id()
            .ok_or_else(|| QuizError::Auth("not logged in".into()))?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            api,
            observer: Arc::new(NoopObserver),
            config,
            inner: Mutex::new(NavigatorInner {
                phase: Phase::Unloaded,
                current_index: 1,
                total: 0,
                selected: None,
                question: None,
                answered: BTreeSet::new(),
                cache: HashMap::new(),
            }),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn NavigatorObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn lock(&self) -> MutexGuard<'_, NavigatorInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a failed remote call. Auth failures end the navigator.
    fn fail(&self, error: QuizError) -> QuizError {
        if error.is_auth() {
            let mut inner = self.lock();
            inner.phase = Phase::Expired;
            inner.question = None;
            inner.selected = None;
            inner.cache.clear();
            warn!(navigator = %self.id, "session lost, navigation stopped");
        } else {
            warn!(navigator = %self.id, error = %error, "request failed");
        }
        self.observer.on_error(&error);
        error
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Fetch the question list once to learn how many questions there are.
    ///
    /// On failure the navigator stays where it was and the call can simply be
    /// repeated.
    #[instrument(skip(self), fields(navigator = %self.id))]
    pub async fn load_total_count(&self) -> Result<u32> {
        {
            let inner = self.lock();
            match inner.phase {
                Phase::Completed => return Err(QuizError::Completed),
                Phase::Expired => return Err(QuizError::Auth("session expired".into())),
                Phase::Unloaded | Phase::Active => {}
            }
        }

        let questions = self.api.list_questions().await.map_err(|e| self.fail(e))?;
        let total = u32::try_from(questions.len())
            .map_err(|_| QuizError::Decode("question list too long".into()))?;
        if total == 0 {
            let err = QuizError::EmptyQuiz;
            self.observer.on_error(&err);
            return Err(err);
        }

        let mut inner = self.lock();
        inner.total = total;
        match inner.phase {
            Phase::Unloaded => {
                inner.phase = Phase::Active;
                inner.current_index = 1;
                inner.selected = None;
                inner.question = None;
            }
            _ => {
                let clamped = inner.current_index.clamp(1, total);
                inner.move_to(clamped);
            }
        }
        if self.config.cache_questions {
            for q in questions {
                inner.cache.insert(q.index, q);
            }
        }
        debug!(total, "question count loaded");
        Ok(total)
    }

    /// Load the count and the first question.
    pub async fn start(&self) -> Result<Question> {
        self.load_total_count().await?;
        self.reload().await
    }

    /// Fetch the question at `index`.
    ///
    /// Every visit fetches again unless the cache is enabled. If `index` is
    /// the current index the question becomes the one on screen.
    #[instrument(skip(self), fields(navigator = %self.id))]
    pub async fn load_question(&self, index: u32) -> Result<Question> {
        let total = {
            let mut inner = self.lock();
            inner.check_active()?;
            inner.check_range(index)?;
            if let Some(hit) = inner.cache.get(&index).cloned() {
                debug!(index, "question served from cache");
                if inner.current_index == index {
                    inner.question = Some(hit.clone());
                }
                let total = inner.total;
                drop(inner);
                self.observer.on_question_loaded(&hit, total);
                return Ok(hit);
            }
            inner.total
        };

        let question = self.api.question(index).await.map_err(|e| self.fail(e))?;

        {
            let mut inner = self.lock();
            if inner.phase == Phase::Active && inner.current_index == index {
                inner.question = Some(question.clone());
            }
            if self.config.cache_questions && inner.phase == Phase::Active {
                inner.cache.insert(index, question.clone());
            }
        }
        self.observer.on_question_loaded(&question, total);
        Ok(question)
    }

    /// Load the current question again, e.g. after a failed fetch.
    pub async fn reload(&self) -> Result<Question> {
        let index = self.lock().current_index;
        self.load_question(index).await
    }

    // -----------------------------------------------------------------------
    // Answering
    // -----------------------------------------------------------------------

    /// Select an option of the current question.
    ///
    /// An option that is not among the question's options leaves the current
    /// selection untouched.
    pub fn select_answer(&self, option: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.check_active()?;
        let question = inner
            .question
            .as_ref()
            .ok_or(ValidationError::NoQuestionLoaded)?;
        if !question.has_option(option) {
            return Err(ValidationError::UnknownOption(option.to_string()).into());
        }
        inner.selected = Some(option.to_string());
        Ok(())
    }

    /// Select an option by its 1-based position on screen.
    pub fn select_position(&self, position: usize) -> Result<String> {
        let option = {
            let inner = self.lock();
            inner.check_active()?;
            let question = inner
                .question
                .as_ref()
                .ok_or(ValidationError::NoQuestionLoaded)?;
            question
                .option(position)
                .ok_or_else(|| ValidationError::UnknownOption(position.to_string()))?
                .to_string()
        };
        self.select_answer(&option)?;
        Ok(option)
    }

    /// Submit the selected answer for the current question and move on.
    ///
    /// Without a selection nothing is sent. If the submission fails the
    /// navigator stays on the same question with the selection kept. After the
    /// last question the navigator is completed. If the session is lost while
    /// fetching the next question the auth error is returned even though the
    /// answer was recorded.
    #[instrument(skip(self), fields(navigator = %self.id))]
    pub async fn submit_and_advance(&self) -> Result<Advance> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;

        let submission = {
            let inner = self.lock();
            inner.check_active()?;
            let selected = inner
                .selected
                .clone()
                .ok_or(ValidationError::NoAnswerSelected)?;
            AnswerSubmission {
                user_id: self.user_id.clone(),
                index: inner.current_index,
                selected_option: selected,
            }
        };

        self.api
            .submit_answer(&submission)
            .await
            .map_err(|e| self.fail(e))?;
        debug!(index = submission.index, "answer submitted");
        self.observer.on_answer_submitted(&submission);

        let (advance, total) = {
            let mut inner = self.lock();
            inner.check_active()?;
            inner.answered.insert(submission.index);
            if inner.current_index >= inner.total {
                inner.phase = Phase::Completed;
                inner.selected = None;
                inner.question = None;
                (Advance::Completed, inner.total)
            } else {
                let next = inner.current_index + 1;
                inner.move_to(next);
                (Advance::Next(next), inner.total)
            }
        };

        match advance {
            Advance::Completed => {
                info!(total, "quiz completed");
                self.observer.on_completed(total);
            }
            Advance::Next(next) => {
                // The answer is recorded; a failed fetch here is recovered with `reload`.
                match self.load_question(next).await {
                    Ok(_) => {}
                    Err(e) if e.is_auth() => return Err(e),
                    Err(e) => debug!(index = next, error = %e, "next question not loaded"),
                }
            }
        }
        Ok(advance)
    }

    /// Jump straight to `index`. Earlier questions need not be answered.
    #[instrument(skip(self), fields(navigator = %self.id))]
    pub async fn go_to(&self, index: u32) -> Result<Question> {
        if self.in_flight.load(Ordering::Acquire) {
            return Err(QuizError::Busy);
        }
        {
            let mut inner = self.lock();
            inner.check_active()?;
            inner.check_range(index)?;
            inner.move_to(index);
        }
        self.load_question(index).await
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    /// Navigation state, once the question count is known.
    pub fn state(&self) -> Option<NavigationState> {
        let inner = self.lock();
        (inner.phase != Phase::Unloaded).then(|| NavigationState {
            current_index: inner.current_index,
            total_questions: inner.total,
            selected_answer: inner.selected.clone(),
        })
    }

    pub fn current_question(&self) -> Option<Question> {
        self.lock().question.clone()
    }

    pub fn answered_count(&self) -> usize {
        self.lock().answered.len()
    }

    /// One cell per question for the sidebar grid.
    pub fn question_grid(&self) -> Vec<GridCell> {
        let inner = self.lock();
        (1..=inner.total)
            .map(|index| GridCell {
                index,
                answered: inner.answered.contains(&index),
                current: inner.phase == Phase::Active && index == inner.current_index,
            })
            .collect()
    }

    /// Drop every cached question.
    pub fn invalidate_cache(&self) {
        self.lock().cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, MockCall, MockFailure};
    use crate::model::Session;
    use crate::session::MemorySessionStore;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.events()
                .iter()
                .filter(|e| e.starts_with(prefix))
                .count()
        }
    }

    impl NavigatorObserver for RecordingObserver {
        fn on_question_loaded(&self, question: &Question, total: u32) {
            self.events
                .lock()
                .unwrap()
                .push(format!("loaded {}/{}", question.index, total));
        }
        fn on_answer_submitted(&self, submission: &AnswerSubmission) {
            self.events
                .lock()
                .unwrap()
                .push(format!("submitted {}", submission.index));
        }
        fn on_completed(&self, total: u32) {
            self.events
                .lock()
                .unwrap()
                .push(format!("completed {total}"));
        }
        fn on_error(&self, error: &QuizError) {
            self.events.lock().unwrap().push(format!("error {error}"));
        }
    }

    fn session() -> MemorySessionStore {
        MemorySessionStore::with_session(Session::new("user-1", "token"))
    }

    fn navigator(api: &Arc<MockApi>) -> QuestionNavigator {
        QuestionNavigator::new(api.clone(), &session(), NavigatorConfig::default()).unwrap()
    }

    async fn started(count: u32) -> (Arc<MockApi>, QuestionNavigator) {
        let api = Arc::new(MockApi::with_question_count(count));
        let nav = navigator(&api);
        nav.start().await.unwrap();
        (api, nav)
    }

    #[test]
    fn requires_a_session() {
        let api = Arc::new(MockApi::with_question_count(1));
        let err = QuestionNavigator::new(api, &MemorySessionStore::new(), NavigatorConfig::default())
            .err()
            .unwrap();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn start_loads_count_and_first_question() {
        let (api, nav) = started(3).await;
        assert_eq!(nav.phase(), Phase::Active);
        assert_eq!(
            nav.state(),
            Some(NavigationState {
                current_index: 1,
                total_questions: 3,
                selected_answer: None,
            })
        );
        assert_eq!(nav.current_question().unwrap().id, "q1");
        assert_eq!(api.call_count(MockCall::ListQuestions), 1);
        assert_eq!(api.question_requests(), vec![1]);
    }

    #[tokio::test]
    async fn operations_before_loading_are_rejected() {
        let api = Arc::new(MockApi::with_question_count(2));
        let nav = navigator(&api);
        assert!(nav.state().is_none());
        assert!(matches!(nav.go_to(1).await, Err(QuizError::NotLoaded)));
        assert!(matches!(
            nav.submit_and_advance().await,
            Err(QuizError::NotLoaded)
        ));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn submit_without_selection_makes_no_call() {
        let (api, nav) = started(3).await;
        let err = nav.submit_and_advance().await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Validation(ValidationError::NoAnswerSelected)
        ));
        assert_eq!(api.call_count(MockCall::SubmitAnswer), 0);
        assert_eq!(nav.state().unwrap().current_index, 1);
    }

    #[tokio::test]
    async fn answers_three_questions_then_completes_once() {
        let api = Arc::new(MockApi::with_question_count(3));
        let observer = Arc::new(RecordingObserver::default());
        let nav = navigator(&api).with_observer(observer.clone());
        nav.start().await.unwrap();

        nav.select_answer("A").unwrap();
        assert_eq!(nav.submit_and_advance().await.unwrap(), Advance::Next(2));
        assert_eq!(nav.state().unwrap().selected_answer, None);
        nav.select_answer("B").unwrap();
        assert_eq!(nav.submit_and_advance().await.unwrap(), Advance::Next(3));
        nav.select_answer("C").unwrap();
        assert_eq!(nav.submit_and_advance().await.unwrap(), Advance::Completed);

        let submitted: Vec<(u32, String)> = api
            .submissions()
            .into_iter()
            .map(|s| (s.index, s.selected_option))
            .collect();
        assert_eq!(
            submitted,
            vec![(1, "A".into()), (2, "B".into()), (3, "C".into())]
        );
        assert!(api.submissions().iter().all(|s| s.user_id == "user-1"));
        assert!(nav.is_completed());
        assert_eq!(observer.count("completed"), 1);

        assert!(matches!(
            nav.submit_and_advance().await,
            Err(QuizError::Completed)
        ));
        assert!(matches!(nav.go_to(1).await, Err(QuizError::Completed)));
        assert_eq!(observer.count("completed"), 1);
        assert_eq!(api.call_count(MockCall::SubmitAnswer), 3);
    }

    #[tokio::test]
    async fn failed_submit_stays_on_question() {
        let (api, nav) = started(2).await;
        nav.select_answer("D").unwrap();
        api.fail_next(MockCall::SubmitAnswer, MockFailure::Network);

        let err = nav.submit_and_advance().await.unwrap_err();
        assert!(err.is_retryable());
        let state = nav.state().unwrap();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.selected_answer.as_deref(), Some("D"));
        assert!(api.submissions().is_empty());

        assert_eq!(nav.submit_and_advance().await.unwrap(), Advance::Next(2));
        assert_eq!(api.submissions().len(), 1);
    }

    #[tokio::test]
    async fn unknown_option_leaves_selection_alone() {
        let (_api, nav) = started(2).await;
        nav.select_answer("B").unwrap();
        let err = nav.select_answer("Z").unwrap_err();
        assert!(matches!(
            err,
            QuizError::Validation(ValidationError::UnknownOption(_))
        ));
        assert_eq!(nav.state().unwrap().selected_answer.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn select_by_position() {
        let (_api, nav) = started(1).await;
        assert_eq!(nav.select_position(3).unwrap(), "C");
        assert_eq!(nav.state().unwrap().selected_answer.as_deref(), Some("C"));
        assert!(nav.select_position(0).is_err());
        assert!(nav.select_position(5).is_err());
        assert_eq!(nav.state().unwrap().selected_answer.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn go_to_refetches_and_resets_selection() {
        let (api, nav) = started(4).await;
        nav.select_answer("A").unwrap();

        let q = nav.go_to(3).await.unwrap();
        assert_eq!(q.index, 3);
        let state = nav.state().unwrap();
        assert_eq!(state.current_index, 3);
        assert_eq!(state.selected_answer, None);

        nav.go_to(1).await.unwrap();
        nav.go_to(3).await.unwrap();
        assert_eq!(api.question_requests(), vec![1, 3, 1, 3]);
    }

    #[tokio::test]
    async fn go_to_out_of_range_is_rejected() {
        let (api, nav) = started(3).await;
        for index in [0, 4, 100] {
            let err = nav.go_to(index).await.unwrap_err();
            assert!(matches!(
                err,
                QuizError::Validation(ValidationError::IndexOutOfRange { .. })
            ));
        }
        assert_eq!(nav.state().unwrap().current_index, 1);
        assert_eq!(api.question_requests(), vec![1]);
    }

    #[tokio::test]
    async fn index_stays_in_bounds_for_any_sequence() {
        for total in 1..=6u32 {
            let (_api, nav) = started(total).await;
            // Small LCG so the sequence is deterministic.
            let mut seed: u32 = 0x2545_f491 ^ total;
            for _ in 0..60 {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let roll = (seed >> 16) % 4;
                match roll {
                    0 => {
                        let _ = nav.go_to((seed >> 8) % (total + 2)).await;
                    }
                    1 => {
                        let _ = nav.select_position(((seed >> 4) % 5) as usize);
                    }
                    _ => {
                        let _ = nav.submit_and_advance().await;
                    }
                }
                if nav.is_completed() {
                    break;
                }
                let state = nav.state().unwrap();
                assert!((1..=total).contains(&state.current_index));
                assert_eq!(state.total_questions, total);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submit_is_rejected() {
        let api = Arc::new(MockApi::with_question_count(3).with_delay(Duration::from_millis(50)));
        let nav = navigator(&api);
        nav.start().await.unwrap();
        nav.select_answer("A").unwrap();

        let (first, second) = tokio::join!(nav.submit_and_advance(), nav.submit_and_advance());
        assert_eq!(first.unwrap(), Advance::Next(2));
        assert!(matches!(second, Err(QuizError::Busy)));
        assert_eq!(api.call_count(MockCall::SubmitAnswer), 1);
        assert_eq!(nav.state().unwrap().current_index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn jump_during_submit_is_rejected() {
        let api = Arc::new(MockApi::with_question_count(3).with_delay(Duration::from_millis(50)));
        let nav = navigator(&api);
        nav.start().await.unwrap();
        nav.select_answer("A").unwrap();

        let (submitted, jumped) = tokio::join!(nav.submit_and_advance(), nav.go_to(3));
        assert_eq!(submitted.unwrap(), Advance::Next(2));
        assert!(matches!(jumped, Err(QuizError::Busy)));
    }

    #[tokio::test]
    async fn auth_failure_expires_navigator() {
        let api = Arc::new(MockApi::with_question_count(3));
        let nav = QuestionNavigator::new(
            api.clone(),
            &session(),
            NavigatorConfig {
                cache_questions: true,
            },
        )
        .unwrap();
        nav.start().await.unwrap();
        nav.select_answer("A").unwrap();
        api.fail_next(MockCall::SubmitAnswer, MockFailure::Auth);

        assert!(nav.submit_and_advance().await.unwrap_err().is_auth());
        assert_eq!(nav.phase(), Phase::Expired);
        assert!(nav.current_question().is_none());

        let calls = api.total_calls();
        assert!(nav.go_to(2).await.unwrap_err().is_auth());
        assert!(nav.load_total_count().await.unwrap_err().is_auth());
        assert_eq!(api.total_calls(), calls);
    }

    #[tokio::test]
    async fn auth_failure_loading_next_question_is_returned() {
        let (api, nav) = started(3).await;
        nav.select_answer("A").unwrap();
        api.fail_next(MockCall::Question, MockFailure::Auth);

        assert!(nav.submit_and_advance().await.unwrap_err().is_auth());
        assert_eq!(nav.phase(), Phase::Expired);
        assert_eq!(api.submissions().len(), 1);
        assert!(nav.current_question().is_none());
        assert!(nav.reload().await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn cache_avoids_refetching() {
        let api = Arc::new(MockApi::with_question_count(3));
        let nav = QuestionNavigator::new(
            api.clone(),
            &session(),
            NavigatorConfig {
                cache_questions: true,
            },
        )
        .unwrap();
        nav.start().await.unwrap();
        nav.go_to(2).await.unwrap();
        nav.go_to(1).await.unwrap();
        assert!(api.question_requests().is_empty());
        assert_eq!(nav.current_question().unwrap().index, 1);

        nav.invalidate_cache();
        nav.go_to(2).await.unwrap();
        assert_eq!(api.question_requests(), vec![2]);
    }

    #[tokio::test]
    async fn empty_quiz_is_an_error() {
        let api = Arc::new(MockApi::new(vec![]));
        let nav = navigator(&api);
        assert!(matches!(
            nav.load_total_count().await,
            Err(QuizError::EmptyQuiz)
        ));
        assert_eq!(nav.phase(), Phase::Unloaded);
    }

    #[tokio::test]
    async fn count_failure_can_be_retried() {
        let api = Arc::new(MockApi::with_question_count(2));
        let observer = Arc::new(RecordingObserver::default());
        let nav = navigator(&api).with_observer(observer.clone());
        api.fail_next(MockCall::ListQuestions, MockFailure::Network);

        assert!(nav.load_total_count().await.unwrap_err().is_retryable());
        assert_eq!(nav.phase(), Phase::Unloaded);
        assert_eq!(observer.count("error"), 1);

        assert_eq!(nav.load_total_count().await.unwrap(), 2);
        assert_eq!(nav.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn next_question_failure_is_recovered_by_reload() {
        let (api, nav) = started(2).await;
        nav.select_answer("A").unwrap();
        api.fail_next(MockCall::Question, MockFailure::Api(502));

        assert_eq!(nav.submit_and_advance().await.unwrap(), Advance::Next(2));
        assert!(nav.current_question().is_none());
        assert_eq!(nav.state().unwrap().current_index, 2);

        assert_eq!(nav.reload().await.unwrap().index, 2);
        assert_eq!(nav.current_question().unwrap().index, 2);
    }

    #[tokio::test]
    async fn grid_tracks_answered_and_current() {
        let (_api, nav) = started(3).await;
        nav.select_answer("A").unwrap();
        nav.submit_and_advance().await.unwrap();

        let grid = nav.question_grid();
        assert_eq!(grid.len(), 3);
        assert!(grid[0].answered && !grid[0].current);
        assert!(!grid[1].answered && grid[1].current);
        assert!(!grid[2].answered && !grid[2].current);
        assert_eq!(nav.answered_count(), 1);
    }

    #[tokio::test]
    async fn observer_sees_loads_and_submissions() {
        let api = Arc::new(MockApi::with_question_count(2));
        let observer = Arc::new(RecordingObserver::default());
        let nav = navigator(&api).with_observer(observer.clone());
        nav.start().await.unwrap();
        nav.select_answer("B").unwrap();
        nav.submit_and_advance().await.unwrap();

        assert_eq!(
            observer.events(),
            vec!["loaded 1/2", "submitted 1", "loaded 2/2"]
        );
    }
}
