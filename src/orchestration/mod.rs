//! Orchestration layer for APK publishing
//!
//! This module sequences the remote calls of one upload.

pub mod apk_publisher;

pub use apk_publisher::{ApkPublisher, PublishReport, PublishRequest, PublishState};
