// # Notifier Trait
//
// Defines the interface for reporting lifecycle events and errors to an
// operator-facing channel.
//
// ## Implementations
//
// - `TracingNotifier` (this module): local log only
// - Discord webhook: `ddns-notify-discord` crate
//
// ## Contract
//
// The engine never sends one message per record. It hands the sink a
// context line plus an ordered list of affected names and moves on.
// Delivery is best effort: `notify` cannot fail from the caller's point of
// view.

use async_trait::async_trait;
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

impl NotifyLevel {
    /// Upper-case label used in rendered messages
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyLevel::Info => "INFO",
            NotifyLevel::Warning => "WARNING",
            NotifyLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leveled message with optional ordered details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotifyLevel,
    pub context: String,
    pub details: Vec<String>,
}

impl Notification {
    pub fn new(level: NotifyLevel, context: impl Into<String>) -> Self {
        Self {
            level,
            context: context.into(),
            details: Vec::new(),
        }
    }

    pub fn info(context: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Info, context)
    }

    pub fn warning(context: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Warning, context)
    }

    pub fn error(context: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Error, context)
    }

    /// Attach the ordered detail list
    pub fn with_details<I, S>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details = details.into_iter().map(Into::into).collect();
        self
    }

    /// Render as a plain-text block: the context line, then one numbered
    /// line per detail.
    pub fn render_plain(&self) -> String {
        let mut message = self.context.clone();
        for (i, detail) in self.details.iter().enumerate() {
            message.push_str(&format!("\n {}. {}", i, detail));
        }
        message
    }
}

/// Trait for notification sinks
///
/// Implementations must swallow their own delivery failures (log locally
/// and return). A sink error must never abort a reconciliation cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification, best effort
    async fn notify(&self, notification: Notification);
}

/// Write a notification to the local log at the matching level
pub fn log_notification(notification: &Notification) {
    let message = notification.render_plain();
    match notification.level {
        NotifyLevel::Info => tracing::info!("{}", message),
        NotifyLevel::Warning => tracing::warn!("{}", message),
        NotifyLevel::Error => tracing::error!("{}", message),
    }
}

/// Log-only sink, used when no external channel is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        log_notification(&notification);
    }
}
