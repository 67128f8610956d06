pub mod credentials;
pub mod token_manager;

pub use credentials::{CredentialSource, ServiceAccountKey};
pub use token_manager::{AccessToken, AccessTokenManager};
