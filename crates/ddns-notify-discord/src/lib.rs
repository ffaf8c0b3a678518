// # Discord Webhook Notifier
//
// This crate provides a `Notifier` that posts every notification to a
// Discord channel through an incoming webhook.
//
// ## Rendering
//
// One notification becomes one webhook message with a single embed:
//
// - title: the level (`INFO`, `WARNING`, `ERROR`)
// - description: the notification context
// - color: green / yellow / red by level
// - fields: the detail list, packed by `payload::distribute_into_fields`
// - footer: the local send time
//
// WARNING and ERROR notifications mention the configured user.
//
// ## Delivery
//
// Best effort. Every notification is also written to the local log, and a
// failed POST is logged with `tracing::error!` and dropped. Nothing is
// retried and nothing is fed back into the notifier.
//
// ## Security
//
// The webhook URL embeds a secret token. It NEVER appears in logs or
// `Debug` output.

pub mod payload;

use async_trait::async_trait;
use ddns_core::config::NotifyConfig;
use ddns_core::traits::notifier::log_notification;
use ddns_core::{Error, Notification, Notifier, Result};
use payload::{Embed, Footer, WebhookMessage, distribute_into_fields, level_color, level_mentions};
use std::time::Duration;

/// Name the webhook posts under unless overridden
pub const DEFAULT_USERNAME: &str = "ddns";

/// Footer timestamp layout (`dd.MM.yyyy, HH:mm:ss`)
const FOOTER_TIME_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

/// Discord webhook notifier
pub struct DiscordNotifier {
    /// Webhook URL
    /// ⚠️ NEVER log this value
    webhook_url: String,

    /// User id mentioned on warnings and errors
    mention_tag: Option<String>,

    /// Display name of the webhook author
    username: String,

    /// Avatar of the webhook author, also used as footer icon
    avatar_url: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

// Custom Debug implementation that hides the webhook URL
impl std::fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("webhook_url", &"<REDACTED>")
            .field("mention_tag", &self.mention_tag)
            .field("username", &self.username)
            .finish()
    }
}

impl DiscordNotifier {
    /// Create a notifier posting to `webhook_url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is not http(s) or the HTTP client
    /// cannot be built.
    pub fn new(
        webhook_url: impl Into<String>,
        mention_tag: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let webhook_url = webhook_url.into();
        if !(webhook_url.starts_with("https://") || webhook_url.starts_with("http://")) {
            return Err(Error::config("Discord webhook URL must be http(s)"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            webhook_url,
            mention_tag: mention_tag.filter(|tag| !tag.trim().is_empty()),
            username: DEFAULT_USERNAME.to_string(),
            avatar_url: None,
            client,
        })
    }

    /// Build from notification settings
    ///
    /// Returns `Ok(None)` when no webhook is configured.
    pub fn from_config(config: &NotifyConfig, timeout: Duration) -> Result<Option<Self>> {
        match &config.webhook_url {
            Some(url) => Self::new(url.clone(), config.mention_tag.clone(), timeout).map(Some),
            None => Ok(None),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Render a notification as a webhook body
    pub fn render(&self, notification: &Notification) -> WebhookMessage {
        let sent_at = chrono::Local::now().format(FOOTER_TIME_FORMAT);

        let content = match &self.mention_tag {
            Some(tag) if level_mentions(notification.level) => Some(format!("<@{}>", tag)),
            _ => None,
        };

        WebhookMessage {
            content,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            tts: false,
            embeds: vec![Embed {
                title: notification.level.as_str().to_string(),
                description: notification.context.clone(),
                color: level_color(notification.level),
                footer: Footer {
                    text: format!("This message was sent on {}", sent_at),
                    icon_url: self.avatar_url.clone(),
                },
                fields: distribute_into_fields(&notification.details),
            }],
        }
    }

    async fn deliver(&self, message: &WebhookMessage) -> std::result::Result<(), String> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            // Strip the URL, it carries the webhook token
            .map_err(|e| format!("request failed: {}", e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(format!("Discord answered {}: {}", status, body))
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notification: Notification) {
        log_notification(&notification);

        let message = self.render(&notification);
        if let Err(e) = self.deliver(&message).await {
            tracing::error!("Discord notification could not be delivered: {}", e);
        }
    }
}
