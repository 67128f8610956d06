//! Core traits and types for Google Play publishing
//!
//! This module defines the remote resources exchanged with the Android
//! Publisher API and the `PublishingService` seam the orchestrator drives.

use crate::core::artifact::Artifact;
use crate::core::error::PublishError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Edit session
// ============================================================================

/// Server-side staging transaction for a Play release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEdit {
    pub id: String,
    /// Seconds since epoch, encoded as a string by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time_seconds: Option<String>,
}

// ============================================================================
// APK upload
// ============================================================================

/// Digests reported by the server for an uploaded binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkBinary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// An APK accepted into an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apk {
    pub version_code: i64,
    #[serde(default)]
    pub binary: ApkBinary,
}

// ============================================================================
// Tracks
// ============================================================================

/// Rollout status of a track release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    Draft,
    InProgress,
    Halted,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    pub status: ReleaseStatus,
    /// int64 values, encoded as strings by the API
    pub version_codes: Vec<String>,
}

/// A release track ("internal", "alpha", "beta", "production", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

impl Track {
    /// Track carrying a single completed release of the given version codes
    pub fn completed(track: &str, version_codes: &[i64]) -> Self {
        Self {
            track: track.to_string(),
            releases: vec![TrackRelease {
                status: ReleaseStatus::Completed,
                version_codes: version_codes.iter().map(|v| v.to_string()).collect(),
            }],
        }
    }
}

// ============================================================================
// Publishing Service Trait
// ============================================================================

/// Remote surface of the publishing platform consumed by the uploader
///
/// Every call is scoped to one package; all calls after `insert_edit` carry
/// the edit id it returned.
#[async_trait]
pub trait PublishingService: Send + Sync {
    /// Open a new edit session for the package
    async fn insert_edit(&self, package_name: &str) -> Result<AppEdit, PublishError>;

    /// Upload an APK into an open edit
    async fn upload_apk(
        &self,
        package_name: &str,
        edit_id: &str,
        artifact: &Artifact,
    ) -> Result<Apk, PublishError>;

    /// Replace the releases of a track inside an open edit
    async fn update_track(
        &self,
        package_name: &str,
        edit_id: &str,
        track: &Track,
    ) -> Result<Track, PublishError>;

    /// Ask the server to check the edit without committing it
    async fn validate_edit(&self, package_name: &str, edit_id: &str)
    -> Result<AppEdit, PublishError>;

    /// Commit the edit, publishing its changes
    async fn commit_edit(&self, package_name: &str, edit_id: &str) -> Result<AppEdit, PublishError>;

    /// Discard the edit
    async fn delete_edit(&self, package_name: &str, edit_id: &str) -> Result<(), PublishError>;
}
