//! Android Publisher API (v3) client
//!
//! Thin reqwest wrapper over the edits endpoints used by the uploader.

use crate::core::artifact::Artifact;
use crate::core::config::PublishConfig;
use crate::core::error::PublishError;
use crate::core::traits::{Apk, AppEdit, PublishingService, Track};
use crate::security::credentials::ServiceAccountKey;
use crate::security::token_manager::AccessTokenManager;
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// Google API error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Authenticated client for the Android Publisher API
pub struct AndroidPublisherClient {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
    upload_base_url: String,
}

impl AndroidPublisherClient {
    pub fn new(
        http: reqwest::Client,
        token: SecretString,
        base_url: &str,
        upload_base_url: &str,
    ) -> Self {
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_base_url: upload_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate with the service account and build a client for `config`
    pub async fn connect(
        config: &PublishConfig,
        key: &ServiceAccountKey,
    ) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("play-publisher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::NetworkError {
                operation: "client.build".to_string(),
                message: e.to_string(),
            })?;

        let access_token = AccessTokenManager::new(http.clone()).fetch_token(key).await?;
        debug!(expires_at = %access_token.expires_at, "authenticated with service account");

        Ok(Self::new(
            http,
            access_token.token,
            config.api_base_url(),
            config.upload_base_url(),
        ))
    }

    fn edits_url(&self, package_name: &str) -> String {
        format!(
            "{}/androidpublisher/v3/applications/{}/edits",
            self.base_url, package_name
        )
    }

    fn edit_url(&self, package_name: &str, edit_id: &str) -> String {
        format!("{}/{}", self.edits_url(package_name), edit_id)
    }

    fn upload_url(&self, package_name: &str, edit_id: &str) -> String {
        format!(
            "{}/upload/androidpublisher/v3/applications/{}/edits/{}/apks?uploadType=media",
            self.upload_base_url, package_name, edit_id
        )
    }

    /// Send an authorized request and return the successful response
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, PublishError> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| PublishError::NetworkError {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "response received");

        if status.is_success() {
            return Ok(response);
        }

        match response.text().await {
            Ok(body) => Err(api_error(operation, status.as_u16(), &body)),
            Err(e) => Err(PublishError::ApiError {
                operation: operation.to_string(),
                status: status.as_u16(),
                message: format!("failed to read error body: {}", e),
            }),
        }
    }

    /// POST with an explicit zero length; Google answers 411 to body-less POSTs without one
    fn post_empty(&self, url: String) -> RequestBuilder {
        self.http.post(url).header(CONTENT_LENGTH, "0")
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, PublishError> {
        let response = self.send(operation, request).await?;
        response.json::<T>().await.map_err(|e| PublishError::NetworkError {
            operation: operation.to_string(),
            message: format!("invalid response body: {}", e),
        })
    }
}

/// Map a non-2xx response to `ApiError`, preferring Google's error message
fn api_error(operation: &str, status: u16, body: &str) -> PublishError {
    let message = match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.status, envelope.error.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => "unknown error".to_string(),
        },
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    };

    PublishError::ApiError {
        operation: operation.to_string(),
        status,
        message,
    }
}

#[async_trait]
impl PublishingService for AndroidPublisherClient {
    async fn insert_edit(&self, package_name: &str) -> Result<AppEdit, PublishError> {
        let request = self
            .http
            .post(self.edits_url(package_name))
            .json(&serde_json::json!({}));
        self.send_json("edits.insert", request).await
    }

    async fn upload_apk(
        &self,
        package_name: &str,
        edit_id: &str,
        artifact: &Artifact,
    ) -> Result<Apk, PublishError> {
        let io_error = |source: std::io::Error| PublishError::IoError {
            path: artifact.path.clone(),
            source,
        };
        let file = tokio::fs::File::open(&artifact.path).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();

        let request = self
            .http
            .post(self.upload_url(package_name, edit_id))
            .header(CONTENT_TYPE, APK_MIME_TYPE)
            .header(CONTENT_LENGTH, length)
            .body(Body::from(file));
        self.send_json("edits.apks.upload", request).await
    }

    async fn update_track(
        &self,
        package_name: &str,
        edit_id: &str,
        track: &Track,
    ) -> Result<Track, PublishError> {
        let url = format!("{}/tracks/{}", self.edit_url(package_name, edit_id), track.track);
        let request = self.http.put(url).json(track);
        self.send_json("edits.tracks.update", request).await
    }

    async fn validate_edit(
        &self,
        package_name: &str,
        edit_id: &str,
    ) -> Result<AppEdit, PublishError> {
        let url = format!("{}:validate", self.edit_url(package_name, edit_id));
        self.send_json("edits.validate", self.post_empty(url)).await
    }

    async fn commit_edit(&self, package_name: &str, edit_id: &str) -> Result<AppEdit, PublishError> {
        let url = format!("{}:commit", self.edit_url(package_name, edit_id));
        self.send_json("edits.commit", self.post_empty(url)).await
    }

    async fn delete_edit(&self, package_name: &str, edit_id: &str) -> Result<(), PublishError> {
        let url = self.edit_url(package_name, edit_id);
        self.send("edits.delete", self.http.delete(url)).await?;
        Ok(())
    }
}
