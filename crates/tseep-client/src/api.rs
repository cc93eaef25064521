//! Typed client for the assessment service endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use tseep_core::error::{QuizError, Result};
use tseep_core::model::{
    AnswerSubmission, Credentials, FeedbackEntry, Question, Registration, ScoredAnswer, Session,
};
use tseep_core::traits::{AssessmentApi, SessionObserver, SessionStore};

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::http::{decode, ApiRequest, AuthenticatedClient};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const QUESTIONS_PATH: &str = "/api/question/get-questions";
pub const QUESTION_PATH: &str = "/api/question/get-question";
pub const SUBMIT_ANSWERS_PATH: &str = "/api/anwser/submit-answers";
pub const RESULT_PATH: &str = "/api/anwser/get-result";
pub const FEEDBACK_PATH: &str = "/api/feedback/submit";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<LoginUser>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct LoginUser {
    #[serde(rename = "_id", alias = "id")]
    id: String,
}

impl LoginResponse {
    fn into_session(self) -> Option<Session> {
        let user_id = self.user.map(|u| u.id).or(self.user_id)?;
        let mut session = Session::new(user_id, self.access_token);
        session.refresh_token = self.refresh_token;
        Some(session)
    }
}

#[derive(Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// A question as the server sends it. `correctAnswer` is not read.
#[derive(Deserialize)]
struct WireQuestion {
    #[serde(rename = "_id", alias = "id", default)]
    id: String,
    #[serde(default)]
    index: Option<u32>,
    #[serde(alias = "prompt", alias = "text")]
    question: String,
    #[serde(default)]
    options: Vec<String>,
}

impl WireQuestion {
    fn into_question(self, fallback_index: u32) -> Question {
        let index = self.index.unwrap_or(fallback_index);
        Question {
            id: if self.id.is_empty() {
                format!("q{index}")
            } else {
                self.id
            },
            index,
            prompt: self.question,
            options: self.options,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionEnvelope {
    Wrapped { question: WireQuestion },
    Bare(WireQuestion),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionListEnvelope {
    Wrapped { questions: Vec<WireQuestion> },
    Bare(Vec<WireQuestion>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultEnvelope {
    Wrapped { result: Vec<ScoredAnswer> },
    Bare(Vec<ScoredAnswer>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswersBody<'a> {
    user_id: &'a str,
    answers: [AnswerBody<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerBody<'a> {
    index: u32,
    selected_answer: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackBody<'a> {
    rating: u8,
    user_id: &'a str,
    comment: &'a str,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The assessment service: authentication plus the [`AssessmentApi`].
pub struct TseepClient {
    http: AuthenticatedClient,
}

impl TseepClient {
    pub fn new(http: AuthenticatedClient) -> Self {
        Self { http }
    }

    pub fn from_config(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
    ) -> std::result::Result<Self, HttpError> {
        let http = AuthenticatedClient::new(&config.base_url, Some(config.timeout_secs), session)?;
        Ok(Self::new(http))
    }

    /// Observer told when the session is cleared after a failed refresh.
    pub fn with_observer(self, observer: Arc<dyn SessionObserver>) -> Self {
        Self::new(self.http.with_observer(observer))
    }

    pub fn http(&self) -> &AuthenticatedClient {
        &self.http
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.http.session()
    }

    /// Log in and store the resulting session.
    #[instrument(skip(self, credentials), fields(mobile_no = %credentials.mobile_no))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;

        let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
        let response = self.http.send_public(request).await?;
        let body: LoginResponse = decode(response).await?;

        let session = body
            .into_session()
            .ok_or_else(|| QuizError::Decode("login response has no user id".into()))?;

        self.session().save(&session)?;
        info!(user_id = %session.user_id, "logged in");
        Ok(session)
    }

    /// Create an account and return the server's message.
    ///
    /// If the response also carries tokens the session is stored, otherwise
    /// the user still has to log in.
    #[instrument(skip(self, registration), fields(mobile_no = %registration.mobile_no))]
    pub async fn register(&self, registration: &Registration) -> Result<String> {
        registration.validate()?;

        let request = ApiRequest::post(REGISTER_PATH).json(registration)?;
        let response = self.http.send_public(request).await?;
        let body: serde_json::Value = decode(response).await.unwrap_or_default();

        if let Ok(login) = serde_json::from_value::<LoginResponse>(body.clone()) {
            if let Some(session) = login.into_session() {
                self.session().save(&session)?;
                info!(user_id = %session.user_id, "registered and logged in");
            }
        }

        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Registration successful")
            .to_string())
    }

    /// Drop the stored session.
    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        info!("logged out");
        Ok(())
    }
}

#[async_trait]
impl AssessmentApi for TseepClient {
    async fn list_questions(&self) -> Result<Vec<Question>> {
        let envelope: QuestionListEnvelope =
            self.http.request_json(ApiRequest::get(QUESTIONS_PATH)).await?;
        let wire = match envelope {
            QuestionListEnvelope::Wrapped { questions } => questions,
            QuestionListEnvelope::Bare(questions) => questions,
        };
        Ok(wire
            .into_iter()
            .zip(1u32..)
            .map(|(q, position)| q.into_question(position))
            .collect())
    }

    async fn question(&self, index: u32) -> Result<Question> {
        let envelope: QuestionEnvelope = self
            .http
            .request_json(ApiRequest::get(format!("{QUESTION_PATH}/{index}")))
            .await?;
        let wire = match envelope {
            QuestionEnvelope::Wrapped { question } => question,
            QuestionEnvelope::Bare(question) => question,
        };
        Ok(wire.into_question(index))
    }

    async fn submit_answer(&self, submission: &AnswerSubmission) -> Result<()> {
        let body = SubmitAnswersBody {
            user_id: &submission.user_id,
            answers: [AnswerBody {
                index: submission.index,
                selected_answer: &submission.selected_option,
            }],
        };
        self.http
            .request(ApiRequest::post(SUBMIT_ANSWERS_PATH).json(&body)?)
            .await?;
        Ok(())
    }

    async fn results(&self, user_id: &str) -> Result<Vec<ScoredAnswer>> {
        let envelope: ResultEnvelope = self
            .http
            .request_json(ApiRequest::get(format!("{RESULT_PATH}/{user_id}")))
            .await?;
        Ok(match envelope {
            ResultEnvelope::Wrapped { result } => result,
            ResultEnvelope::Bare(result) => result,
        })
    }

    async fn submit_feedback(&self, entry: &FeedbackEntry) -> Result<String> {
        let body = FeedbackBody {
            rating: entry.rating.value(),
            user_id: &entry.user_id,
            comment: &entry.comment,
        };
        let response = self
            .http
            .request(ApiRequest::post(FEEDBACK_PATH).json(&body)?)
            .await?;
        let body: MessageResponse = decode(response).await.unwrap_or_default();
        Ok(body
            .message
            .unwrap_or_else(|| "Feedback submitted".to_string()))
    }
}
