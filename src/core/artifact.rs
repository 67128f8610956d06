//! Build artifact lookup
//!
//! Resolves the glob pattern pointing at the release APK to exactly one file.

use crate::core::error::PublishError;
use std::path::{Path, PathBuf};

/// Default location of the Gradle release output
pub const DEFAULT_ARTIFACT_PATTERN: &str = "app/build/outputs/apk/release/*.apk";

/// A binary application package on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Human readable size (e.g. "1.2 MB")
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} B", self.size)
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

/// Resolve `pattern` to a single regular file
///
/// Relative patterns are taken relative to `base_dir`, whose own path is
/// matched literally. No match is an `ArtifactNotFound`, several matches an
/// `AmbiguousArtifact`.
pub fn resolve_artifact(pattern: &str, base_dir: &Path) -> Result<Artifact, PublishError> {
    let full_pattern = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        PathBuf::from(glob::Pattern::escape(&base_dir.to_string_lossy())).join(pattern)
    };
    let full_pattern = full_pattern.to_string_lossy();

    let entries = glob::glob(&full_pattern).map_err(|e| PublishError::InvalidArtifactPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    candidates.sort();

    let path = match candidates.len() {
        0 => {
            return Err(PublishError::ArtifactNotFound {
                pattern: pattern.to_string(),
            });
        }
        1 => candidates.remove(0),
        _ => {
            return Err(PublishError::AmbiguousArtifact {
                pattern: pattern.to_string(),
                candidates,
            });
        }
    };

    let metadata = std::fs::metadata(&path).map_err(|source| PublishError::IoError {
        path: path.clone(),
        source,
    })?;

    Ok(Artifact {
        path,
        size: metadata.len(),
    })
}
