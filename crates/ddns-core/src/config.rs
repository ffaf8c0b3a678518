//! Configuration types for the DDNS system
//!
//! Settings are resolved from a key lookup. The daemon uses the process
//! environment; tests inject their own lookup closure.
//!
//! | Key                      | Required | Default                          |
//! |--------------------------|----------|----------------------------------|
//! | `CF_EMAIL`               | yes      |                                  |
//! | `CF_TOKEN`               | yes      |                                  |
//! | `CF_ZONE`                | yes      |                                  |
//! | `CF_SUBDOMAINS`          | yes      |                                  |
//! | `DC_WEBHOOK`             | no       |                                  |
//! | `DC_TAG`                 | no       |                                  |
//! | `DDNS_INTERVAL_MINUTES`  | no       | 30 (at most 10080)               |
//! | `DDNS_UPDATE_DELAY_MS`   | no       | 200                              |
//! | `DDNS_IP_URL`            | no       | `https://checkip.amazonaws.com`  |
//! | `DDNS_HTTP_TIMEOUT_SECS` | no       | 30                               |
//!
//! A blank value, or the literal placeholder `default`, counts as unset.

use crate::error::{Error, Result};
use std::time::Duration;

/// Environment keys understood by [`Settings::from_lookup`]
pub mod keys {
    pub const EMAIL: &str = "CF_EMAIL";
    pub const TOKEN: &str = "CF_TOKEN";
    pub const ZONE: &str = "CF_ZONE";
    pub const SUBDOMAINS: &str = "CF_SUBDOMAINS";
    pub const WEBHOOK: &str = "DC_WEBHOOK";
    pub const TAG: &str = "DC_TAG";
    pub const INTERVAL_MINUTES: &str = "DDNS_INTERVAL_MINUTES";
    pub const UPDATE_DELAY_MS: &str = "DDNS_UPDATE_DELAY_MS";
    pub const IP_URL: &str = "DDNS_IP_URL";
    pub const HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
}

/// Default reconciliation interval (minutes)
pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;

/// Longest accepted reconciliation interval (one week, in minutes)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Default spacing between provider update calls (milliseconds)
pub const DEFAULT_UPDATE_DELAY_MS: u64 = 200;

/// Default public IP endpoint
pub const DEFAULT_IP_URL: &str = "https://checkip.amazonaws.com";

/// Default timeout for outbound HTTP calls (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Value shipped in container templates for keys the operator did not fill in
const PLACEHOLDER_VALUE: &str = "default";

/// Provider account credentials
///
/// The Debug implementation intentionally does NOT expose the API token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail, sent as `X-Auth-Email`
    pub email: String,
    /// API key, sent as `X-Auth-Key`
    /// ⚠️ NEVER log this value
    pub api_token: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_token: api_token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

/// Notification channel settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Discord webhook URL
    pub webhook_url: Option<String>,
    /// Discord user id mentioned on warnings and errors
    pub mention_tag: Option<String>,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<REDACTED>"))
            .field("mention_tag", &self.mention_tag)
            .finish()
    }
}

/// Validated process settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Provider credentials
    pub credentials: Credentials,

    /// DNS zone identifier
    pub zone_id: String,

    /// Subdomains to keep pointed at the public IP, in configuration order
    pub subdomains: Vec<String>,

    /// Notification channel
    pub notify: NotifyConfig,

    /// Time between reconciliation cycles
    pub interval: Duration,

    /// Minimum spacing between provider update calls
    pub update_delay: Duration,

    /// Public IP endpoint
    pub ip_url: String,

    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    ///
    /// All missing required keys are reported together in
    /// [`Error::MissingSettings`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(normalize);

        let email = get(keys::EMAIL);
        let api_token = get(keys::TOKEN);
        let zone_id = get(keys::ZONE);
        let subdomains = get(keys::SUBDOMAINS)
            .map(|raw| parse_subdomains(&raw))
            .unwrap_or_default();

        let mut missing = Vec::new();
        if email.is_none() {
            missing.push(keys::EMAIL.to_string());
        }
        if api_token.is_none() {
            missing.push(keys::TOKEN.to_string());
        }
        if zone_id.is_none() {
            missing.push(keys::ZONE.to_string());
        }
        if subdomains.is_empty() {
            missing.push(keys::SUBDOMAINS.to_string());
        }

        let (Some(email), Some(api_token), Some(zone_id)) = (email, api_token, zone_id) else {
            return Err(Error::MissingSettings(missing));
        };
        if !missing.is_empty() {
            return Err(Error::MissingSettings(missing));
        }

        let interval_minutes =
            parse_number(keys::INTERVAL_MINUTES, get(keys::INTERVAL_MINUTES), DEFAULT_INTERVAL_MINUTES)?;
        if interval_minutes == 0 {
            return Err(Error::config(format!(
                "{} must be at least 1 minute",
                keys::INTERVAL_MINUTES
            )));
        }
        let interval_secs = interval_minutes
            .checked_mul(60)
            .filter(|_| interval_minutes <= MAX_INTERVAL_MINUTES)
            .ok_or_else(|| {
                Error::config(format!(
                    "{} must be at most {} minutes. Got: {}",
                    keys::INTERVAL_MINUTES,
                    MAX_INTERVAL_MINUTES,
                    interval_minutes
                ))
            })?;

        let update_delay_ms =
            parse_number(keys::UPDATE_DELAY_MS, get(keys::UPDATE_DELAY_MS), DEFAULT_UPDATE_DELAY_MS)?;

        let http_timeout_secs = parse_number(
            keys::HTTP_TIMEOUT_SECS,
            get(keys::HTTP_TIMEOUT_SECS),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        if http_timeout_secs == 0 {
            return Err(Error::config(format!(
                "{} must be at least 1 second",
                keys::HTTP_TIMEOUT_SECS
            )));
        }

        let ip_url = get(keys::IP_URL).unwrap_or_else(|| DEFAULT_IP_URL.to_string());
        if !ip_url.starts_with("https://") && !ip_url.starts_with("http://") {
            return Err(Error::config(format!(
                "{} must use HTTP or HTTPS scheme. Got: {}",
                keys::IP_URL,
                ip_url
            )));
        }

        Ok(Self {
            credentials: Credentials::new(email, api_token),
            zone_id,
            subdomains,
            notify: NotifyConfig {
                webhook_url: get(keys::WEBHOOK),
                mention_tag: get(keys::TAG),
            },
            interval: Duration::from_secs(interval_secs),
            update_delay: Duration::from_millis(update_delay_ms),
            ip_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Engine view of these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.zone_id.clone(), self.subdomains.clone())
    }

    /// Reconciliation interval in whole minutes
    pub fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }
}

/// The part of the settings the reconciliation engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// DNS zone identifier
    pub zone_id: String,
    /// Subdomains to track
    pub subdomains: Vec<String>,
}

impl EngineConfig {
    pub fn new<I, S>(zone_id: impl Into<String>, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zone_id: zone_id.into(),
            subdomains: subdomains.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("Zone id cannot be empty"));
        }
        if self.subdomains.is_empty() {
            return Err(Error::config("No subdomains configured"));
        }
        if self.subdomains.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::config("Subdomain names cannot be empty"));
        }
        Ok(())
    }
}

/// Split a comma separated subdomain list
///
/// Entries are trimmed, empty entries dropped, and duplicates removed while
/// keeping the first occurrence.
pub fn parse_subdomains(raw: &str) -> Vec<String> {
    let mut subdomains: Vec<String> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !subdomains.iter().any(|known| known == entry) {
            subdomains.push(entry.to_string());
        }
    }
    subdomains
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER_VALUE {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(key: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::config(format!("{} must be a non-negative integer. Got: {}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            (keys::EMAIL, "ops@example.com"),
            (keys::TOKEN, "cf-secret-key"),
            (keys::ZONE, "zone-123"),
            (keys::SUBDOMAINS, "a.example.com, b.example.com"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(lookup(&required())).unwrap();

        assert_eq!(settings.zone_id, "zone-123");
        assert_eq!(settings.subdomains, vec!["a.example.com", "b.example.com"]);
        assert_eq!(settings.interval, Duration::from_secs(30 * 60));
        assert_eq!(settings.interval_minutes(), 30);
        assert_eq!(settings.update_delay, Duration::from_millis(200));
        assert_eq!(settings.ip_url, DEFAULT_IP_URL);
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
        assert_eq!(settings.notify, NotifyConfig::default());
    }

    #[test]
    fn test_all_missing_keys_reported_together() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();

        match err {
            Error::MissingSettings(missing) => {
                assert_eq!(missing, vec!["CF_EMAIL", "CF_TOKEN", "CF_ZONE", "CF_SUBDOMAINS"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_subdomain_list_counts_as_missing() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != keys::SUBDOMAINS);
        pairs.push((keys::SUBDOMAINS, " , ,"));

        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, Error::MissingSettings(ref m) if m == &vec!["CF_SUBDOMAINS".to_string()]));
    }

    #[test]
    fn test_placeholder_value_treated_as_unset() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != keys::ZONE);
        pairs.push((keys::ZONE, "default"));
        pairs.push((keys::WEBHOOK, "default"));

        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, Error::MissingSettings(ref m) if m == &vec!["CF_ZONE".to_string()]));
    }

    #[test]
    fn test_optional_notify_settings() {
        let mut pairs = required();
        pairs.push((keys::WEBHOOK, "https://discord.com/api/webhooks/1/abc"));
        pairs.push((keys::TAG, "268362677313601536"));

        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            settings.notify.webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/1/abc")
        );
        assert_eq!(settings.notify.mention_tag.as_deref(), Some("268362677313601536"));
    }

    #[test]
    fn test_numeric_overrides_and_validation() {
        let mut pairs = required();
        pairs.push((keys::INTERVAL_MINUTES, "5"));
        pairs.push((keys::UPDATE_DELAY_MS, "0"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(300));
        assert_eq!(settings.update_delay, Duration::ZERO);

        let mut pairs = required();
        pairs.push((keys::INTERVAL_MINUTES, "0"));
        assert!(matches!(Settings::from_lookup(lookup(&pairs)), Err(Error::Config(_))));

        let mut pairs = required();
        pairs.push((keys::UPDATE_DELAY_MS, "fast"));
        assert!(matches!(Settings::from_lookup(lookup(&pairs)), Err(Error::Config(_))));
    }

    #[test]
    fn test_interval_upper_bound() {
        let mut pairs = required();
        pairs.push((keys::INTERVAL_MINUTES, "10080"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(settings.interval_minutes(), MAX_INTERVAL_MINUTES);

        for raw in ["10081", "307445734561825861", "18446744073709551615"] {
            let mut pairs = required();
            pairs.push((keys::INTERVAL_MINUTES, raw));
            match Settings::from_lookup(lookup(&pairs)) {
                Err(Error::Config(message)) => {
                    assert!(message.contains(keys::INTERVAL_MINUTES), "{}", message)
                }
                other => panic!("{} was accepted: {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_ip_url_scheme_checked() {
        let mut pairs = required();
        pairs.push((keys::IP_URL, "ftp://checkip.example"));
        assert!(matches!(Settings::from_lookup(lookup(&pairs)), Err(Error::Config(_))));
    }

    #[test]
    fn test_engine_config_validation() {
        let settings = Settings::from_lookup(lookup(&required())).unwrap();
        let config = settings.engine_config();
        assert_eq!(config.zone_id, "zone-123");
        assert!(config.validate().is_ok());

        assert!(EngineConfig::new("", ["a.example.com"]).validate().is_err());
        assert!(EngineConfig::new("zone", Vec::<String>::new()).validate().is_err());
        assert!(EngineConfig::new("zone", [" "]).validate().is_err());
    }

    #[test]
    fn test_parse_subdomains_trims_and_dedups() {
        let parsed = parse_subdomains(" a.example.com,b.example.com ,,a.example.com, c.example.com ");
        assert_eq!(parsed, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }

    #[test]
    fn test_secrets_not_exposed_in_debug() {
        let mut pairs = required();
        pairs.push((keys::WEBHOOK, "https://discord.com/api/webhooks/1/secret-hook"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();

        let debug_str = format!("{:?}", settings);
        assert!(!debug_str.contains("cf-secret-key"));
        assert!(!debug_str.contains("secret-hook"));
        assert!(debug_str.contains("ops@example.com"));
    }
}
