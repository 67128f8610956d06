//! APK Publisher - sequencing of the Google Play upload
//!
//! Drives one edit session from creation to commit:
//! - Edit creation for the package
//! - APK upload into that edit
//! - Optional track assignment of the uploaded version code
//! - Commit (or validate and discard, in dry-run mode)
//!
//! The first failing call aborts the run. Nothing is retried and no clean-up
//! call is attempted; an abandoned edit expires on the server.

use crate::core::artifact::Artifact;
use crate::core::error::PublishError;
use crate::core::traits::{PublishingService, Track};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub package_name: String,
    pub artifact: Artifact,
    /// Track to assign the uploaded version code to
    pub track: Option<String>,
    /// Validate and discard the edit instead of committing it
    pub dry_run: bool,
}

/// Final state of the edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishState {
    Committed,
    Validated,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "COMMITTED",
            Self::Validated => "VALIDATED",
        }
    }
}

/// Publishing report returned after a successful run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub package_name: String,
    pub edit_id: String,
    pub version_code: i64,
    pub track: Option<String>,
    pub artifact: PathBuf,
    pub sha256: Option<String>,
    pub state: PublishState,
    pub published_at: Option<DateTime<Utc>>,
    /// Milliseconds
    pub duration: u64,
}

/// Orchestrates one upload against a `PublishingService`
pub struct ApkPublisher<S: PublishingService> {
    service: S,
}

impl<S: PublishingService> ApkPublisher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Run the edit lifecycle for `request`
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishReport, PublishError> {
        let start_time = Instant::now();
        let package_name = request.package_name.as_str();

        // 1. Open the edit
        let edit = self.service.insert_edit(package_name).await?;
        info!(package = package_name, edit_id = %edit.id, "edit created");

        // 2. Upload into that edit
        let apk = self
            .service
            .upload_apk(package_name, &edit.id, &request.artifact)
            .await?;
        info!(
            package = package_name,
            edit_id = %edit.id,
            version_code = apk.version_code,
            artifact = %request.artifact.path.display(),
            "apk uploaded"
        );

        // 3. Track assignment
        if let Some(track_name) = request.track.as_deref() {
            let track = Track::completed(track_name, &[apk.version_code]);
            self.service
                .update_track(package_name, &edit.id, &track)
                .await?;
            info!(
                package = package_name,
                edit_id = %edit.id,
                track = track_name,
                version_code = apk.version_code,
                "track updated"
            );
        }

        // 4. Commit, or validate and discard
        let state = if request.dry_run {
            self.service.validate_edit(package_name, &edit.id).await?;
            self.service.delete_edit(package_name, &edit.id).await?;
            info!(package = package_name, edit_id = %edit.id, "edit validated and discarded");
            PublishState::Validated
        } else {
            self.service.commit_edit(package_name, &edit.id).await?;
            info!(package = package_name, edit_id = %edit.id, "edit committed");
            PublishState::Committed
        };

        Ok(PublishReport {
            package_name: package_name.to_string(),
            edit_id: edit.id,
            version_code: apk.version_code,
            track: request.track.clone(),
            artifact: request.artifact.path.clone(),
            sha256: apk.binary.sha256,
            published_at: (state == PublishState::Committed).then(Utc::now),
            state,
            duration: start_time.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{Apk, ApkBinary, AppEdit};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PACKAGE: &str = "com.example.android.architecture.blueprints.todoapp";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Insert(String),
        Upload(String, String, PathBuf),
        UpdateTrack(String, String, Track),
        Validate(String, String),
        Commit(String, String),
        Delete(String, String),
    }

    /// Records every call; fails the named operation when asked to
    #[derive(Default)]
    struct RecordingService {
        calls: Mutex<Vec<Call>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingService {
        fn failing_on(operation: &'static str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(operation),
            }
        }

        fn record(&self, operation: &str, call: Call) -> Result<(), PublishError> {
            self.calls.lock().unwrap().push(call);
            if self.fail_on == Some(operation) {
                return Err(PublishError::ApiError {
                    operation: operation.to_string(),
                    status: 500,
                    message: "backend error".to_string(),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PublishingService for RecordingService {
        async fn insert_edit(&self, package_name: &str) -> Result<AppEdit, PublishError> {
            self.record("edits.insert", Call::Insert(package_name.to_string()))?;
            Ok(AppEdit {
                id: "edit-42".to_string(),
                expiry_time_seconds: Some("1900000000".to_string()),
            })
        }

        async fn upload_apk(
            &self,
            package_name: &str,
            edit_id: &str,
            artifact: &Artifact,
        ) -> Result<Apk, PublishError> {
            self.record(
                "edits.apks.upload",
                Call::Upload(
                    package_name.to_string(),
                    edit_id.to_string(),
                    artifact.path.clone(),
                ),
            )?;
            Ok(Apk {
                version_code: 7,
                binary: ApkBinary {
                    sha1: None,
                    sha256: Some("abc123".to_string()),
                },
            })
        }

        async fn update_track(
            &self,
            package_name: &str,
            edit_id: &str,
            track: &Track,
        ) -> Result<Track, PublishError> {
            self.record(
                "edits.tracks.update",
                Call::UpdateTrack(package_name.to_string(), edit_id.to_string(), track.clone()),
            )?;
            Ok(track.clone())
        }

        async fn validate_edit(
            &self,
            package_name: &str,
            edit_id: &str,
        ) -> Result<AppEdit, PublishError> {
            self.record(
                "edits.validate",
                Call::Validate(package_name.to_string(), edit_id.to_string()),
            )?;
            Ok(AppEdit {
                id: edit_id.to_string(),
                expiry_time_seconds: None,
            })
        }

        async fn commit_edit(
            &self,
            package_name: &str,
            edit_id: &str,
        ) -> Result<AppEdit, PublishError> {
            self.record(
                "edits.commit",
                Call::Commit(package_name.to_string(), edit_id.to_string()),
            )?;
            Ok(AppEdit {
                id: edit_id.to_string(),
                expiry_time_seconds: None,
            })
        }

        async fn delete_edit(&self, package_name: &str, edit_id: &str) -> Result<(), PublishError> {
            self.record(
                "edits.delete",
                Call::Delete(package_name.to_string(), edit_id.to_string()),
            )
        }
    }

    fn request() -> PublishRequest {
        PublishRequest {
            package_name: PACKAGE.to_string(),
            artifact: Artifact {
                path: PathBuf::from("app/build/outputs/apk/release/app-release.apk"),
                size: 1024,
            },
            track: None,
            dry_run: false,
        }
    }

    fn apk_path() -> PathBuf {
        PathBuf::from("app/build/outputs/apk/release/app-release.apk")
    }

    #[tokio::test]
    async fn test_publish_calls_insert_upload_commit_in_order() {
        let publisher = ApkPublisher::new(RecordingService::default());

        let report = publisher.publish(&request()).await.unwrap();

        assert_eq!(
            publisher.service.calls(),
            vec![
                Call::Insert(PACKAGE.to_string()),
                Call::Upload(PACKAGE.to_string(), "edit-42".to_string(), apk_path()),
                Call::Commit(PACKAGE.to_string(), "edit-42".to_string()),
            ]
        );
        assert_eq!(report.state, PublishState::Committed);
        assert_eq!(report.edit_id, "edit-42");
        assert_eq!(report.version_code, 7);
        assert_eq!(report.sha256.as_deref(), Some("abc123"));
        assert!(report.published_at.is_some());
    }

    #[tokio::test]
    async fn test_track_is_updated_between_upload_and_commit() {
        let publisher = ApkPublisher::new(RecordingService::default());
        let mut request = request();
        request.track = Some("alpha".to_string());

        let report = publisher.publish(&request).await.unwrap();

        let calls = publisher.service.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[2],
            Call::UpdateTrack(
                PACKAGE.to_string(),
                "edit-42".to_string(),
                Track::completed("alpha", &[7])
            )
        );
        assert_eq!(calls[3], Call::Commit(PACKAGE.to_string(), "edit-42".to_string()));
        assert_eq!(report.track.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_dry_run_validates_and_discards_without_commit() {
        let publisher = ApkPublisher::new(RecordingService::default());
        let mut request = request();
        request.dry_run = true;

        let report = publisher.publish(&request).await.unwrap();

        let calls = publisher.service.calls();
        assert_eq!(
            &calls[2..],
            &[
                Call::Validate(PACKAGE.to_string(), "edit-42".to_string()),
                Call::Delete(PACKAGE.to_string(), "edit-42".to_string()),
            ]
        );
        assert!(!calls.iter().any(|c| matches!(c, Call::Commit(..))));
        assert_eq!(report.state, PublishState::Validated);
        assert!(report.published_at.is_none());
    }

    #[tokio::test]
    async fn test_insert_failure_stops_the_run() {
        let publisher = ApkPublisher::new(RecordingService::failing_on("edits.insert"));

        let err = publisher.publish(&request()).await.unwrap_err();

        assert_eq!(err.code(), "API_ERROR");
        assert_eq!(publisher.service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_is_fatal_without_clean_up() {
        let publisher = ApkPublisher::new(RecordingService::failing_on("edits.apks.upload"));

        let err = publisher.publish(&request()).await.unwrap_err();

        assert!(err.to_string().contains("edits.apks.upload"));
        let calls = publisher.service.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls
            .iter()
            .any(|c| matches!(c, Call::Commit(..) | Call::Delete(..))));
    }

    #[tokio::test]
    async fn test_commit_failure_is_returned() {
        let publisher = ApkPublisher::new(RecordingService::failing_on("edits.commit"));

        let err = publisher.publish(&request()).await.unwrap_err();

        assert!(err.to_string().contains("edits.commit"));
        assert_eq!(publisher.service.calls().len(), 3);
    }

    #[test]
    fn test_report_serialization() {
        let report = PublishReport {
            package_name: PACKAGE.to_string(),
            edit_id: "edit-42".to_string(),
            version_code: 7,
            track: None,
            artifact: apk_path(),
            sha256: None,
            state: PublishState::Validated,
            published_at: None,
            duration: 12,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "VALIDATED");
        assert_eq!(json["editId"], "edit-42");
        assert_eq!(json["versionCode"], 7);
        assert_eq!(PublishState::Committed.as_str(), "COMMITTED");
    }
}
