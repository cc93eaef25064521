//! Scripted in-process API for testing the navigator and feedback flow
//! without a server.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{QuizError, Result};
use crate::model::{AnswerSubmission, FeedbackEntry, Question, ScoredAnswer};
use crate::traits::AssessmentApi;

/// Which API operation a call or scripted failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    ListQuestions,
    Question,
    SubmitAnswer,
    Results,
    SubmitFeedback,
}

/// A failure to inject into the next call of some operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Network,
    Auth,
    Api(u16),
}

impl MockFailure {
    fn to_error(self) -> QuizError {
        match self {
            MockFailure::Network => QuizError::Network("connection refused".into()),
            MockFailure::Auth => QuizError::Auth("refresh token rejected".into()),
            MockFailure::Api(status) => QuizError::Api {
                status,
                message: "scripted failure".into(),
            },
        }
    }
}

/// A mock assessment API backed by a fixed question list.
pub struct MockApi {
    questions: Vec<Question>,
    results: Vec<ScoredAnswer>,
    acknowledgement: String,
    /// Applied to every call before it completes.
    delay: Option<Duration>,
    failures: Mutex<HashMap<MockCall, VecDeque<MockFailure>>>,
    calls: Mutex<Vec<(MockCall, Option<u32>)>>,
    submissions: Mutex<Vec<AnswerSubmission>>,
    feedback: Mutex<Vec<FeedbackEntry>>,
}

impl MockApi {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            results: Vec::new(),
            acknowledgement: "Feedback submitted successfully".to_string(),
            delay: None,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
        }
    }

    /// `count` questions, each with options "A" through "D".
    pub fn with_question_count(count: u32) -> Self {
        Self::new((1..=count).map(sample_question).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_results(mut self, results: Vec<ScoredAnswer>) -> Self {
        self.results = results;
        self
    }

    pub fn with_acknowledgement(mut self, message: &str) -> Self {
        self.acknowledgement = message.to_string();
        self
    }

    /// Make the next call of `call` fail. Failures queue up in order.
    pub fn fail_next(&self, call: MockCall, failure: MockFailure) {
        self.failures
            .lock()
            .unwrap()
            .entry(call)
            .or_default()
            .push_back(failure);
    }

    pub fn call_count(&self, call: MockCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == call)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Indices passed to `question`, in call order.
    pub fn question_requests(&self) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(c, index)| (*c == MockCall::Question).then_some(*index).flatten())
            .collect()
    }

    /// Successfully recorded answer submissions.
    pub fn submissions(&self) -> Vec<AnswerSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    /// Successfully recorded feedback entries.
    pub fn feedback(&self) -> Vec<FeedbackEntry> {
        self.feedback.lock().unwrap().clone()
    }

    async fn enter(&self, call: MockCall, index: Option<u32>) -> Result<()> {
        self.calls.lock().unwrap().push((call, index));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }
}

/// Question `index` with options "A" through "D".
pub fn sample_question(index: u32) -> Question {
    Question {
        id: format!("q{index}"),
        index,
        prompt: format!("Question {index}"),
        options: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
    }
}

#[async_trait]
impl AssessmentApi for MockApi {
    async fn list_questions(&self) -> Result<Vec<Question>> {
        self.enter(MockCall::ListQuestions, None).await?;
        Ok(self.questions.clone())
    }

    async fn question(&self, index: u32) -> Result<Question> {
        self.enter(MockCall::Question, Some(index)).await?;
        self.questions
            .iter()
            .find(|q| q.index == index)
            .cloned()
            .ok_or_else(|| QuizError::Api {
                status: 404,
                message: format!("question {index} not found"),
            })
    }

    async fn submit_answer(&self, submission: &AnswerSubmission) -> Result<()> {
        self.enter(MockCall::SubmitAnswer, Some(submission.index))
            .await?;
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }

    async fn results(&self, _user_id: &str) -> Result<Vec<ScoredAnswer>> {
        self.enter(MockCall::Results, None).await?;
        Ok(self.results.clone())
    }

    async fn submit_feedback(&self, entry: &FeedbackEntry) -> Result<String> {
        self.enter(MockCall::SubmitFeedback, None).await?;
        self.feedback.lock().unwrap().push(entry.clone());
        Ok(self.acknowledgement.clone())
    }
}
