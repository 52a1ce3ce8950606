//! Centralized error types for the pixelwx display component.
//!
//! This module provides a typed error hierarchy that:
//! - Separates fatal startup errors (configuration) from recoverable
//!   per-fetch errors
//! - Provides user-friendly messages suitable for host UI display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level plugin error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PluginError {
    /// Returns a user-friendly message suitable for display by the host.
    pub fn user_message(&self) -> &'static str {
        match self {
            PluginError::Config(e) => e.user_message(),
            PluginError::Fetch(e) => e.user_message(),
            PluginError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Configuration errors.
///
/// All of these are fatal at startup: the plugin must refuse to activate
/// rather than run with a broken configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing or placeholder OpenWeatherMap API key")]
    MissingApiKey,

    #[error("No display modes enabled")]
    NoModesEnabled,

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingApiKey => "Weather API key is not configured. Check settings.",
            ConfigError::NoModesEnabled => "Enable at least one weather display mode.",
            ConfigError::InvalidLocation(_) => "Weather location is invalid. Check settings.",
            ConfigError::Parse(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Errors from a single weather fetch attempt.
///
/// All variants are recoverable: the cached snapshot survives them and the
/// scheduler retries on its backoff-extended interval. Variants carry
/// rendered strings rather than source errors so the cache can retain the
/// last error for external observers.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connectivity, timeout, or server-side failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider rejected the credential.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The provider answered with an unexpected payload shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "Unable to reach the weather service.",
            FetchError::Auth(_) => "Weather API key was rejected. Check settings.",
            FetchError::MalformedResponse(_) => "Weather service sent an unexpected response.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_fetch_error(self) -> FetchError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            FetchError::Network("request timed out".to_string())
        } else if self.is_connect() {
            FetchError::Network(format!("connection failed: {}", self))
        } else if self.is_decode() {
            FetchError::MalformedResponse(self.to_string())
        } else if let Some(status) = self.status() {
            match status.as_u16() {
                401 | 403 => FetchError::Auth(format!("provider returned {}", status)),
                _ => FetchError::Network(format!("provider returned {}", status)),
            }
        } else {
            FetchError::Network(self.to_string())
        }
    }
}
