//! Error handling for APK publishing
//!
//! This module provides the error types for every step of the upload flow,
//! with recovery guidance, using the thiserror crate.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Google Play publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Credential errors
    #[error("認証情報ファイルが見つかりません: {}", path.display())]
    CredentialsNotFound { path: PathBuf },

    #[error("認証情報が不正です: {message}")]
    CredentialsInvalid { message: String },

    #[error("認証に失敗しました: {message}")]
    AuthenticationFailed { message: String },

    // Artifact errors
    #[error("アーティファクトが見つかりません: {pattern}")]
    ArtifactNotFound { pattern: String },

    #[error("複数のアーティファクトが一致しました: {pattern} ({} 件)", candidates.len())]
    AmbiguousArtifact {
        pattern: String,
        candidates: Vec<PathBuf>,
    },

    #[error("アーティファクトのパターンが不正です: {pattern}: {message}")]
    InvalidArtifactPattern { pattern: String, message: String },

    // Remote errors
    #[error("[{operation}] APIエラー (HTTP {status}): {message}")]
    ApiError {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("[{operation}] ネットワークエラーが発生しました: {message}")]
    NetworkError { operation: String, message: String },

    // Local errors
    #[error("設定エラー: {0}")]
    ConfigError(String),

    #[error("ファイル操作に失敗しました: {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::CredentialsNotFound { .. } => vec![
                "サービスアカウントのJSONキーのパスを確認してください",
                "--credentials オプションまたは PLAY_CREDENTIALS_PATH で指定できます",
                "環境変数 apkservice にJSONキーを設定することもできます",
            ],
            Self::CredentialsInvalid { .. } => vec![
                "Google Cloud Console で発行したサービスアカウントキーか確認してください",
                "JSONファイルが破損していないか確認してください",
            ],
            Self::AuthenticationFailed { .. } => vec![
                "サービスアカウントが有効か確認してください",
                "Play Console でサービスアカウントに権限が付与されているか確認してください",
                "システム時刻が正しいか確認してください",
            ],
            Self::ArtifactNotFound { .. } => vec![
                "リリースビルドを実行してください（例: ./gradlew assembleRelease）",
                "--artifact オプションでAPKのパスを指定してください",
            ],
            Self::AmbiguousArtifact { .. } => {
                vec!["アップロードするAPKを1つに絞り込むパターンを指定してください"]
            }
            Self::InvalidArtifactPattern { .. } => {
                vec!["globパターンの構文を確認してください（例: app/build/outputs/apk/release/*.apk）"]
            }
            Self::ApiError { status, .. } => match status {
                401 | 403 => vec![
                    "Play Console でサービスアカウントの権限を確認してください",
                    "パッケージ名が正しいか確認してください",
                ],
                404 => vec![
                    "パッケージ名が正しいか確認してください",
                    "アプリが Play Console に登録済みか確認してください",
                ],
                _ => vec![
                    "エラーメッセージを確認してください",
                    "versionCode が既存のリリースと重複していないか確認してください",
                ],
            },
            Self::NetworkError { .. } => vec![
                "インターネット接続を確認してください",
                "しばらく待ってから再実行してください",
            ],
            Self::ConfigError(_) => vec![".play-publish.yaml の内容を確認してください"],
            Self::IoError { .. } => vec!["ファイルのパスと権限を確認してください"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialsNotFound { .. } => "CREDENTIALS_NOT_FOUND",
            Self::CredentialsInvalid { .. } => "CREDENTIALS_INVALID",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::AmbiguousArtifact { .. } => "AMBIGUOUS_ARTIFACT",
            Self::InvalidArtifactPattern { .. } => "INVALID_ARTIFACT_PATTERN",
            Self::ApiError { .. } => "API_ERROR",
            Self::NetworkError { .. } => "NETWORK_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::IoError { .. } => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_not_found_error() {
        let error = PublishError::CredentialsNotFound {
            path: PathBuf::from("nlp.json"),
        };

        assert_eq!(error.code(), "CREDENTIALS_NOT_FOUND");
        assert!(error.to_string().contains("nlp.json"));
        assert!(error.suggested_actions().len() >= 3);
    }

    #[test]
    fn test_ambiguous_artifact_counts_candidates() {
        let error = PublishError::AmbiguousArtifact {
            pattern: "*.apk".to_string(),
            candidates: vec![PathBuf::from("a.apk"), PathBuf::from("b.apk")],
        };

        assert_eq!(error.code(), "AMBIGUOUS_ARTIFACT");
        assert!(error.to_string().contains("2 件"));
    }

    #[test]
    fn test_api_error_display() {
        let error = PublishError::ApiError {
            operation: "edits.commit".to_string(),
            status: 400,
            message: "APK specifies a version code that has already been used.".to_string(),
        };

        let display = error.to_string();
        assert!(display.contains("edits.commit"));
        assert!(display.contains("400"));
        assert!(display.contains("already been used"));
    }

    #[test]
    fn test_api_error_actions_depend_on_status() {
        let forbidden = PublishError::ApiError {
            operation: "edits.insert".to_string(),
            status: 403,
            message: "forbidden".to_string(),
        };
        let not_found = PublishError::ApiError {
            operation: "edits.insert".to_string(),
            status: 404,
            message: "not found".to_string(),
        };

        assert!(forbidden.suggested_actions().iter().any(|a| a.contains("権限")));
        assert!(not_found.suggested_actions().iter().any(|a| a.contains("登録済み")));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let error = PublishError::IoError {
            path: PathBuf::from("app.apk"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(error.code(), "IO_ERROR");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_network_error_code() {
        let error = PublishError::NetworkError {
            operation: "edits.apks.upload".to_string(),
            message: "connection reset".to_string(),
        };

        assert_eq!(error.code(), "NETWORK_ERROR");
        assert!(error.to_string().contains("connection reset"));
    }
}
