//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP resolver errors
    #[error("IP resolver error: {0}")]
    Resolver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required settings that were not provided
    #[error("Missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<String>),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The provider answered an update with an error payload
    #[error("Update of {record} rejected: {payload}")]
    Rejected {
        /// Record the update was issued for
        record: String,
        /// Raw response body as returned by the provider
        payload: String,
    },
}

impl Error {
    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rejected-update error carrying the provider's raw payload
    pub fn rejected(record: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Rejected {
            record: record.into(),
            payload: payload.into(),
        }
    }

    /// The text reported to operators for a failed update.
    ///
    /// Rejections report the provider payload verbatim, everything else
    /// falls back to the display form.
    pub fn report_payload(&self) -> String {
        match self {
            Self::Rejected { payload, .. } => payload.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_lists_every_key() {
        let err = Error::MissingSettings(vec!["CF_EMAIL".to_string(), "CF_ZONE".to_string()]);
        assert_eq!(err.to_string(), "Missing required settings: CF_EMAIL, CF_ZONE");
    }

    #[test]
    fn test_report_payload_keeps_raw_body() {
        let body = r#"{"success":false,"errors":[{"code":81057}]}"#;
        let err = Error::rejected("a.example.com", body);
        assert_eq!(err.report_payload(), body);

        let err = Error::rate_limited("Status: 429");
        assert_eq!(err.report_payload(), "Rate limited: Status: 429");
    }
}
