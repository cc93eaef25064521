//! Authenticated HTTP client.
//!
//! Every request carries `Authorization: Bearer <access token>` taken from
//! the session store. When the server answers 401 the client refreshes the
//! access token once and re-issues the request once with the new token. If
//! the refresh fails, or the retried request is rejected again, the session
//! is cleared and the [`SessionObserver`] is told to send the user back to
//! login. There is never more than one refresh and one retry per request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use tseep_core::traits::{NoopSessionObserver, SessionObserver, SessionStore};

use crate::error::HttpError;

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/api/refresh";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A request relative to the API base URL.
///
/// Kept as plain data so the same request can be re-issued after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body)
            .map_err(|e| HttpError::Decode(format!("failed to encode request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Add a header. `Authorization` is ignored; it always comes from the
    /// session store.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// HTTP client bound to one API base URL and one session store.
pub struct AuthenticatedClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
    session: Arc<dyn SessionStore>,
    observer: Arc<dyn SessionObserver>,
}

impl AuthenticatedClient {
    pub fn new(
        base_url: &str,
        timeout_secs: Option<u64>,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, HttpError> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
            session,
            observer: Arc::new(NoopSessionObserver),
        })
    }

    /// Observer told when the session is cleared after a failed refresh.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout(self.timeout_secs)
        } else {
            HttpError::NetworkError(e.to_string())
        }
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, HttpError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header(ACCEPT, "application/json");

        for (name, value) in &request.headers {
            if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| self.transport_error(e))
    }

    /// Send a request with the session's access token, refreshing and
    /// retrying once on 401.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, request: ApiRequest) -> Result<Response, HttpError> {
        let token = self.session.access_token();
        let response = self.send(&request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!("access token rejected, refreshing");
        let new_token = self.refresh().await?;

        let retried = self.send(&request, Some(&new_token)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            let body = retried.text().await.unwrap_or_default();
            return Err(self.expire(format!(
                "request rejected after token refresh: {}",
                error_message(&body)
            )));
        }
        check_status(retried).await
    }

    /// Like [`request`](Self::request), decoding the JSON body.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, HttpError> {
        decode(self.request(request).await?).await
    }

    /// Send a request without credentials and without the refresh policy.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_public(&self, request: ApiRequest) -> Result<Response, HttpError> {
        let response = self.send(&request, None).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Unauthorized(error_message(&body)));
        }
        check_status(response).await
    }

    /// Exchange the refresh token for a new access token and store it.
    ///
    /// Any failure clears the session.
    async fn refresh(&self) -> Result<String, HttpError> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(self.expire("no refresh token available".into()));
        };

        let response = match self
            .client
            .post(self.url(REFRESH_PATH))
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(self.expire(format!("refresh request failed: {e}"))),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(self.expire(format!("refresh rejected (HTTP {})", status.as_u16())));
        }

        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return Err(self.expire(format!("malformed refresh response: {e}"))),
        };

        if let Err(e) = self
            .session
            .update_tokens(body.access_token.clone(), body.refresh_token)
        {
            return Err(self.expire(format!("could not store refreshed token: {e}")));
        }
        info!("access token refreshed");
        Ok(body.access_token)
    }

    /// Clear the session and signal the redirect to login.
    fn expire(&self, reason: String) -> HttpError {
        warn!(reason = %reason, "session expired, clearing stored credentials");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "failed to clear session");
        }
        self.observer.on_session_expired(&reason);
        HttpError::SessionExpired(reason)
    }
}

async fn check_status(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpError::ApiError {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Decode a JSON response body.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HttpError> {
    let text = response
        .text()
        .await
        .map_err(|e| HttpError::NetworkError(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()))
}

/// Prefer the `message` (or `error`) field of a JSON error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
