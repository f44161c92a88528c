//! Backend REST API seam.

use crate::{
    ChatSession, CreatedSession, OnboardingRequest, PreferencesUpdate, StateError, StateResult,
    UserPreferences,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, error};
use url::Url;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Remote source of truth for preferences and sessions.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/preferences`
    async fn get_preferences(&self) -> StateResult<UserPreferences>;

    /// `POST /api/preferences`; the response is the full, authoritative record.
    async fn update_preferences(&self, update: &PreferencesUpdate) -> StateResult<UserPreferences>;

    /// `POST /api/onboarding`
    async fn complete_onboarding(&self, request: &OnboardingRequest)
        -> StateResult<UserPreferences>;

    /// `GET /api/sessions`, in backend order.
    async fn list_sessions(&self) -> StateResult<Vec<ChatSession>>;

    /// `POST /api/sessions`, returning the new session id.
    async fn create_session(&self) -> StateResult<i64>;

    /// `DELETE /api/sessions/{id}`
    async fn delete_session(&self, id: i64) -> StateResult<()>;
}

/// [`Backend`] over HTTP with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the API rooted at `base_url` (e.g., `http://localhost:8000`).
    pub fn new(base_url: &Url) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Parse and validate `base_url` first.
    pub fn from_url_str(base_url: &str) -> StateResult<Self> {
        let url = Url::parse(base_url).map_err(|e| StateError::InvalidUrl(format!("{base_url}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::new(&url)),
            other => Err(StateError::InvalidUrl(format!(
                "{base_url}: unsupported scheme {other:?}"
            ))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Turn a non-2xx response into [`StateError::Api`] without logging the raw body.
    async fn check(response: reqwest::Response, action: &str) -> StateResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        error!(status = %status, body_summary = %body_summary, "Failed to {}", action);
        Err(StateError::Api {
            status: status.as_u16(),
            message: format!("Failed to {action} ({body_summary})"),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> StateResult<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_preferences(&self) -> StateResult<UserPreferences> {
        let url = self.api_url("preferences");
        debug!(url = %url, "Fetching preferences");

        let response = self.http_client.get(&url).send().await?;
        let response = Self::check(response, "fetch preferences").await?;
        Self::read_json(response).await
    }

    async fn update_preferences(&self, update: &PreferencesUpdate) -> StateResult<UserPreferences> {
        let url = self.api_url("preferences");
        debug!(url = %url, "Updating preferences");

        let response = self.http_client.post(&url).json(update).send().await?;
        let response = Self::check(response, "update preferences").await?;
        Self::read_json(response).await
    }

    async fn complete_onboarding(
        &self,
        request: &OnboardingRequest,
    ) -> StateResult<UserPreferences> {
        let url = self.api_url("onboarding");
        debug!(url = %url, theme = %request.theme, "Completing onboarding");

        let response = self.http_client.post(&url).json(request).send().await?;
        let response = Self::check(response, "complete onboarding").await?;
        Self::read_json(response).await
    }

    async fn list_sessions(&self) -> StateResult<Vec<ChatSession>> {
        let url = self.api_url("sessions");
        debug!(url = %url, "Fetching sessions");

        let response = self.http_client.get(&url).send().await?;
        let response = Self::check(response, "fetch sessions").await?;
        let sessions: Vec<ChatSession> = Self::read_json(response).await?;
        debug!("Fetched {} sessions", sessions.len());
        Ok(sessions)
    }

    async fn create_session(&self) -> StateResult<i64> {
        let url = self.api_url("sessions");
        debug!(url = %url, "Creating session");

        let response = self.http_client.post(&url).send().await?;
        let response = Self::check(response, "create session").await?;
        let created: CreatedSession = Self::read_json(response).await?;
        created
            .id
            .ok_or_else(|| StateError::UnexpectedResponse("session id missing".to_string()))
    }

    async fn delete_session(&self, id: i64) -> StateResult<()> {
        let url = self.api_url(&format!("sessions/{id}"));
        debug!(url = %url, "Deleting session");

        let response = self.http_client.delete(&url).send().await?;
        Self::check(response, "delete session").await?;
        Ok(())
    }
}
