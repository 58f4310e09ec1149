//! Credential handling for the proxy route.

pub mod credentials;

pub use credentials::{ProxyConfig, SecretString};
