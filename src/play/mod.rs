//! Google Play remote surface

pub mod client;

pub use client::AndroidPublisherClient;
