//! HTTP access to the hosted journal workflows.

use std::time::Duration;

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use web_time::Instant;

use crate::config::ApiConfig;
use crate::error::{ConfigError, RemoteError};
use crate::payload::{
    DataResponse, JournalPayload, LoginRequest, MediaUpload, PersistResponse, RegisterRequest,
    UserResponse, error_message, rejected,
};
use crate::record::{Journal, User};
use crate::store::JournalStore;

/// Body the workflows send alongside a non-2xx status, when they send one.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Client for the user, journal and media workflows.
#[derive(Debug, Clone)]
pub struct FlavorClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl FlavorClient {
    pub fn new(config: ApiConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self { http, config })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, RemoteError> {
        let url = self.config.endpoints.register.clone();
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        let response: UserResponse = self
            .send(Method::POST, url, Some(&body), self.config.request_timeout)
            .await?;
        match (response.success, response.user) {
            (true, Some(user)) => {
                tracing::info!(user = %user.id, "registered");
                Ok(user)
            }
            (_, _) => Err(rejected(response.error, "Registration failed")),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, RemoteError> {
        let url = self.config.endpoints.login.clone();
        let body = LoginRequest { email, password };
        let response: UserResponse = self
            .send(Method::POST, url, Some(&body), self.config.request_timeout)
            .await?;
        match (response.success, response.user) {
            (true, Some(user)) => {
                tracing::info!(user = %user.id, "logged in");
                Ok(user)
            }
            (_, _) => Err(rejected(response.error, "Login failed")),
        }
    }

    /// All journals, or only those of `user_id`.
    pub async fn list_journals(&self, user_id: Option<&str>) -> Result<Vec<Journal>, RemoteError> {
        let mut url = self.config.endpoints.journal_list.clone();
        if let Some(user_id) = user_id {
            url.query_pairs_mut().append_pair("userId", user_id);
        }
        let response: DataResponse<Vec<Journal>> = self
            .send::<(), _>(Method::GET, url, None, self.config.request_timeout)
            .await?;
        if !response.success {
            return Err(rejected(response.error, "Failed to fetch journals"));
        }
        Ok(response.data.unwrap_or_default())
    }

    pub async fn get_journal(&self, id: &str, user_id: &str) -> Result<Journal, RemoteError> {
        let mut url = self.config.endpoints.journal_get.clone();
        url.query_pairs_mut()
            .append_pair("id", id)
            .append_pair("userId", user_id);
        let response: DataResponse<Journal> = self
            .send::<(), _>(Method::GET, url, None, self.config.request_timeout)
            .await?;
        match (response.success, response.data) {
            (true, Some(journal)) => Ok(journal),
            (_, _) => Err(rejected(response.error, "Journal not found")),
        }
    }

    /// Delete a journal together with all of its media.
    pub async fn delete_journal(&self, id: &str, user_id: &str) -> Result<(), RemoteError> {
        let mut url = self.config.endpoints.journal_delete.clone();
        url.query_pairs_mut()
            .append_pair("id", id)
            .append_pair("userId", user_id);
        let response: DataResponse<serde_json::Value> = self
            .send::<(), _>(Method::DELETE, url, None, self.config.request_timeout)
            .await?;
        if !response.success {
            return Err(rejected(response.error, "Failed to delete journal"));
        }
        tracing::info!(journal = %id, "journal deleted");
        Ok(())
    }

    /// Add one file directly to an existing journal.
    pub async fn upload_media(&self, upload: &MediaUpload) -> Result<(), RemoteError> {
        let url = self.config.endpoints.media_upload.clone();
        let response: DataResponse<serde_json::Value> = self
            .send(Method::POST, url, Some(upload), self.config.upload_timeout)
            .await?;
        if !response.success {
            return Err(rejected(response.error, "Failed to upload media"));
        }
        tracing::info!(
            journal = %upload.journal_id,
            kind = %upload.media_type,
            file = %upload.file.file_name,
            "media uploaded"
        );
        Ok(())
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let started = Instant::now();
        // Signed trigger URLs carry a secret in the query string.
        let display_url = format!("{}{}", url.origin().ascii_serialization(), url.path());

        let mut request = self
            .http
            .request(method.clone(), url)
            .timeout(timeout)
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = async {
            let response = request.send().await.map_err(|source| RemoteError::Transport {
                url: display_url.clone(),
                source,
            })?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|source| RemoteError::Transport {
                    url: display_url.clone(),
                    source,
                })?;

            if !status.is_success() {
                let message = serde_json::from_slice::<ErrorBody>(&bytes)
                    .ok()
                    .and_then(|body| body.error)
                    .filter(|error| !error.is_null())
                    .map(error_message);
                return Err(match message {
                    Some(message) => RemoteError::Rejected(message),
                    None => RemoteError::Status {
                        url: display_url.clone(),
                        status,
                    },
                });
            }

            serde_json::from_slice::<T>(&bytes).map_err(|source| RemoteError::Decode {
                url: display_url.clone(),
                source,
            })
        }
        .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(url = %display_url, %method, duration_ms, "api call succeeded"),
            Err(e) => tracing::warn!(
                url = %display_url,
                %method,
                duration_ms,
                error = %e,
                "api call failed"
            ),
        }
        result
    }
}

impl JournalStore for FlavorClient {
    async fn create_journal(
        &self,
        payload: &JournalPayload,
    ) -> Result<PersistResponse, RemoteError> {
        let url = self.config.endpoints.journal_create.clone();
        self.send(Method::POST, url, Some(payload), self.config.upload_timeout)
            .await
    }

    async fn update_journal(
        &self,
        payload: &JournalPayload,
    ) -> Result<PersistResponse, RemoteError> {
        let url = self.config.endpoints.journal_update.clone();
        self.send(Method::PUT, url, Some(payload), self.config.upload_timeout)
            .await
    }
}
