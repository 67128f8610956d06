//! Configuration structures and types for play-publisher
//!
//! This module provides type-safe configuration management with serde support.
//! Every field is optional so that partial layers (file, environment, CLI) can
//! be merged; the accessors resolve the effective value with its default.

use serde::{Deserialize, Serialize};

use crate::core::artifact::DEFAULT_ARTIFACT_PATTERN;

/// Package published when nothing else is configured
pub const DEFAULT_PACKAGE_NAME: &str = "com.example.android.architecture.blueprints.todoapp";

/// Service account key file read when nothing else is configured
pub const DEFAULT_CREDENTIALS_PATH: &str = "nlp.json";

/// Environment variable that may hold the service account JSON itself
pub const DEFAULT_CREDENTIALS_ENV: &str = "apkservice";

/// Android Publisher API host
pub const DEFAULT_API_BASE_URL: &str = "https://androidpublisher.googleapis.com";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Schema version (required)
    pub version: String,

    /// Application id of the target app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    /// Where the service account key comes from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,

    /// Glob pattern locating the APK, relative to the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Release track to assign the upload to (no assignment when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,

    /// Remote endpoint overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,
}

/// Service account key location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    /// Path of the JSON key file, relative to the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Environment variable holding the JSON key (takes precedence when set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Host for media uploads (defaults to `base_url`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_base_url: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            package_name: None,
            credentials: None,
            artifact: None,
            track: None,
            api: None,
        }
    }
}

impl PublishConfig {
    /// Empty override layer; its blank `version` leaves the lower layers' value in place
    pub fn overrides() -> Self {
        Self {
            version: String::new(),
            ..Default::default()
        }
    }

    pub fn package_name(&self) -> &str {
        self.package_name.as_deref().unwrap_or(DEFAULT_PACKAGE_NAME)
    }

    pub fn credentials_path(&self) -> &str {
        self.credentials
            .as_ref()
            .and_then(|c| c.path.as_deref())
            .unwrap_or(DEFAULT_CREDENTIALS_PATH)
    }

    pub fn credentials_env(&self) -> &str {
        self.credentials
            .as_ref()
            .and_then(|c| c.env.as_deref())
            .unwrap_or(DEFAULT_CREDENTIALS_ENV)
    }

    pub fn artifact_pattern(&self) -> &str {
        self.artifact.as_deref().unwrap_or(DEFAULT_ARTIFACT_PATTERN)
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref().filter(|t| !t.is_empty())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn upload_base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|a| a.upload_base_url.as_deref())
            .unwrap_or_else(|| self.api_base_url())
    }

    /// Fully spelled-out configuration, as written by `init`
    pub fn template() -> Self {
        Self {
            version: "1.0".to_string(),
            package_name: Some(DEFAULT_PACKAGE_NAME.to_string()),
            credentials: Some(CredentialsConfig {
                path: Some(DEFAULT_CREDENTIALS_PATH.to_string()),
                env: Some(DEFAULT_CREDENTIALS_ENV.to_string()),
            }),
            artifact: Some(DEFAULT_ARTIFACT_PATTERN.to_string()),
            track: None,
            api: None,
        }
    }
}
