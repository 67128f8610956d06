pub mod core;
pub mod logging;
pub mod orchestration;
pub mod play;
pub mod security;

pub use self::core::*;
pub use orchestration::{ApkPublisher, PublishReport, PublishRequest, PublishState};
pub use play::AndroidPublisherClient;
pub use security::{AccessTokenManager, CredentialSource, ServiceAccountKey};
