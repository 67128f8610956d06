//! Configuration file loader for play-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".play-publish.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Tracks built into Google Play; custom closed-testing tracks are also allowed
const KNOWN_TRACKS: &[&str] = &["internal", "alpha", "beta", "production"];

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublishConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "credentials.path")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.play-publish.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let mut configs: Vec<PublishConfig> = vec![PublishConfig::default()];

        if let Some(project_config) = Self::load_project_config(&options.project_path).await? {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged_config = Self::merge_configs(configs);

        Self::expand_env_vars(merged_config, &options.env)
    }

    /// Load project configuration from ./.play-publish.yaml
    async fn load_project_config(
        project_path: &Path,
    ) -> Result<Option<PublishConfig>, PublishError> {
        let config_path = project_path.join(CONFIG_FILENAME);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "no project config file");
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path).await.map_err(|e| {
            PublishError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
            PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        debug!(path = %config_path.display(), "loaded project config");
        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublishConfig> {
        let mut config = PublishConfig::overrides();
        let mut has_changes = false;

        if let Some(package_name) = env.get("PLAY_PACKAGE_NAME") {
            config.package_name = Some(package_name.clone());
            has_changes = true;
        }

        if let Some(path) = env.get("PLAY_CREDENTIALS_PATH") {
            config.credentials = Some(CredentialsConfig {
                path: Some(path.clone()),
                env: None,
            });
            has_changes = true;
        }

        if let Some(artifact) = env.get("PLAY_ARTIFACT") {
            config.artifact = Some(artifact.clone());
            has_changes = true;
        }

        if let Some(track) = env.get("PLAY_TRACK") {
            config.track = Some(track.clone());
            has_changes = true;
        }

        if let Some(base_url) = env.get("PLAY_API_BASE_URL") {
            config.api = Some(ApiConfig {
                base_url: Some(base_url.clone()),
                upload_base_url: None,
            });
            has_changes = true;
        }

        if has_changes { Some(config) } else { None }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.package_name.is_some() {
            target.package_name = source.package_name;
        }

        if let Some(source_credentials) = source.credentials {
            let target_credentials = target.credentials.get_or_insert_with(Default::default);
            if source_credentials.path.is_some() {
                target_credentials.path = source_credentials.path;
            }
            if source_credentials.env.is_some() {
                target_credentials.env = source_credentials.env;
            }
        }

        if source.artifact.is_some() {
            target.artifact = source.artifact;
        }

        if source.track.is_some() {
            target.track = source.track;
        }

        if let Some(source_api) = source.api {
            let target_api = target.api.get_or_insert_with(Default::default);
            if source_api.base_url.is_some() {
                target_api.base_url = source_api.base_url;
            }
            if source_api.upload_base_url.is_some() {
                target_api.upload_base_url = source_api.upload_base_url;
            }
        }
    }

    /// Expand ${VAR} references in every string field
    fn expand_env_vars(
        mut config: PublishConfig,
        env: &HashMap<String, String>,
    ) -> Result<PublishConfig, PublishError> {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| PublishError::ConfigError(format!("Invalid pattern: {}", e)))?;

        let expand = |value: &mut Option<String>| -> Result<(), PublishError> {
            if let Some(input) = value.as_deref() {
                *value = Some(Self::expand_string(input, env, &env_var_regex)?);
            }
            Ok(())
        };

        expand(&mut config.package_name)?;
        expand(&mut config.artifact)?;
        expand(&mut config.track)?;
        if let Some(credentials) = &mut config.credentials {
            expand(&mut credentials.path)?;
        }
        if let Some(api) = &mut config.api {
            expand(&mut api.base_url)?;
            expand(&mut api.upload_base_url)?;
        }

        Ok(config)
    }

    /// Expand environment variables in a single string
    fn expand_string(
        input: &str,
        env: &HashMap<String, String>,
        env_var_regex: &Regex,
    ) -> Result<String, PublishError> {
        let mut result = input.to_string();

        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];
            let value = env.get(var_name).ok_or_else(|| {
                PublishError::ConfigError(format!("Environment variable {} not found", var_name))
            })?;
            result = result.replace(&format!("${{{}}}", var_name), value);
        }

        Ok(result)
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        if let Some(message) = Self::check_package_name(config.package_name()) {
            errors.push(ConfigValidationError {
                field: "packageName".to_string(),
                message,
            });
        }

        if config.artifact_pattern().trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "artifact".to_string(),
                message: "Artifact pattern must not be empty".to_string(),
            });
        }

        if let Some(track) = config.track()
            && !KNOWN_TRACKS.contains(&track)
        {
            warnings.push(ConfigValidationWarning {
                field: "track".to_string(),
                message: format!("Custom track: {}", track),
                suggestion: Some(format!("Built-in tracks are {}", KNOWN_TRACKS.join(", "))),
            });
        }

        let base_url = config.api_base_url();
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            errors.push(ConfigValidationError {
                field: "api.baseUrl".to_string(),
                message: format!("Not an http(s) URL: {}", base_url),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Android application id rules: two or more dot-separated segments,
    /// each starting with a letter and made of `[A-Za-z0-9_]`
    fn check_package_name(name: &str) -> Option<String> {
        if name.is_empty() {
            return Some("Package name is required".to_string());
        }

        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 2 {
            return Some(format!(
                "Package name must have at least two segments: {}",
                name
            ));
        }

        for segment in segments {
            let mut chars = segment.chars();
            let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
            if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Some(format!("Invalid package name segment '{}' in {}", segment, name));
            }
        }

        None
    }
}
