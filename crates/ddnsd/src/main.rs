// # ddnsd - Cloudflare dynamic DNS daemon
//
// This daemon is a thin wiring layer. All reconciliation logic lives in
// ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the resolver, provider and notifier
// 4. Running the engine on a fixed interval until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Provider (required)
// - `CF_EMAIL`: Cloudflare account e-mail
// - `CF_TOKEN`: Cloudflare API key
// - `CF_ZONE`: Zone id
// - `CF_SUBDOMAINS`: Comma-separated list of A records to manage
//
// ### Notifications (optional)
// - `DC_WEBHOOK`: Discord webhook URL
// - `DC_TAG`: Discord user id mentioned on warnings and errors
//
// ### Tuning (optional)
// - `DDNS_INTERVAL_MINUTES`: Minutes between cycles (default 30)
// - `DDNS_UPDATE_DELAY_MS`: Spacing between record updates (default 200)
// - `DDNS_IP_URL`: Public IP endpoint (default https://checkip.amazonaws.com)
// - `DDNS_HTTP_TIMEOUT_SECS`: Timeout of every HTTP call (default 30)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export CF_EMAIL=ops@example.com
// export CF_TOKEN=your_key
// export CF_ZONE=023e105f4ecef8ad9ca31a8372d0c353
// export CF_SUBDOMAINS=example.com,www.example.com
// export DC_WEBHOOK=https://discord.com/api/webhooks/...
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::config::keys;
use ddns_core::{Error, Notification, Notifier, ReconcileEngine, Settings, TracingNotifier};
use ddns_ip_http::HttpIpResolver;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Log level environment key
const LOG_LEVEL_KEY: &str = "DDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let raw_level = env::var(LOG_LEVEL_KEY).unwrap_or_else(|_| "info".to_string());
    let Some(log_level) = parse_log_level(&raw_level) else {
        eprintln!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_KEY, raw_level
        );
        return DdnsExitCode::ConfigError.into();
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(Error::MissingSettings(missing)) => {
            for key in &missing {
                error!("Missing required setting: {}", key);
            }
            error!("Not starting: {} required setting(s) missing", missing.len());
            return DdnsExitCode::ConfigError.into();
        }
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if settings.notify.webhook_url.is_none() {
        warn!("{} is not set, notifications go to the log only", keys::WEBHOOK);
    }
    if settings.notify.mention_tag.is_none() {
        warn!("{} is not set, warnings and errors mention nobody", keys::TAG);
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: {} subdomain(s) in zone {}, every {} minute(s)",
        settings.subdomains.len(),
        settings.zone_id,
        settings.interval_minutes()
    );

    let notifier = match build_notifier(&settings) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("Failed to set up notifications: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let engine = match build_engine(&settings, notifier.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to set up engine: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(settings, engine, notifier).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Map `DDNS_LOG_LEVEL` onto a tracing level
fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Discord when a webhook is configured, the local log otherwise
fn build_notifier(settings: &Settings) -> ddns_core::Result<Arc<dyn Notifier>> {
    #[cfg(feature = "discord")]
    {
        if let Some(discord) = ddns_notify_discord::DiscordNotifier::from_config(
            &settings.notify,
            settings.http_timeout,
        )? {
            info!("Notifications go to Discord");
            return Ok(Arc::new(discord));
        }
    }

    #[cfg(not(feature = "discord"))]
    {
        if settings.notify.webhook_url.is_some() {
            warn!("Built without the discord feature, ignoring {}", keys::WEBHOOK);
        }
    }

    Ok(Arc::new(TracingNotifier))
}

fn build_engine(
    settings: &Settings,
    notifier: Arc<dyn Notifier>,
) -> ddns_core::Result<ReconcileEngine> {
    let resolver = HttpIpResolver::new(settings.ip_url.clone(), settings.http_timeout)?;
    let provider = CloudflareProvider::new(settings.credentials.clone(), settings.http_timeout)?
        .with_update_delay(settings.update_delay);

    ReconcileEngine::new(
        Box::new(resolver),
        Box::new(provider),
        notifier,
        settings.engine_config(),
    )
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(
    settings: Settings,
    mut engine: ReconcileEngine,
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    let shutdown = shutdown_signal()?;

    notifier
        .notify(
            Notification::info(format!(
                "Started: Updating {} DNS-Records in an Interval of {} Minutes, following subdomains have been detected",
                settings.subdomains.len(),
                settings.interval_minutes()
            ))
            .with_details(settings.subdomains.clone()),
        )
        .await;

    let cycles = engine.run_every(settings.interval, shutdown).await;

    info!("Shutting down daemon after {} cycle(s)", cycles);
    Ok(())
}

/// Resolve once SIGTERM or SIGINT arrives
///
/// Handlers are installed eagerly so a signal during the first cycle is not
/// lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", received);
    })
}

/// Resolve once CTRL-C arrives
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_log_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdnsExitCode::CleanShutdown as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }

    fn settings(webhook: Option<&str>) -> Settings {
        Settings::from_lookup(|key| match key {
            "CF_EMAIL" => Some("ops@example.com".to_string()),
            "CF_TOKEN" => Some("key-123".to_string()),
            "CF_ZONE" => Some("zone-1".to_string()),
            "CF_SUBDOMAINS" => Some("a.example.com, b.example.com".to_string()),
            "DC_WEBHOOK" => webhook.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_build_engine_tracks_every_subdomain() {
        let engine = build_engine(&settings(None), Arc::new(TracingNotifier)).unwrap();

        assert_eq!(engine.records().names(), vec!["a.example.com", "b.example.com"]);
        assert!(!engine.is_bootstrapped());
    }

    #[test]
    fn test_build_notifier_without_webhook() {
        assert!(build_notifier(&settings(None)).is_ok());
    }

    #[cfg(feature = "discord")]
    #[test]
    fn test_build_notifier_rejects_bad_webhook() {
        assert!(build_notifier(&settings(Some("not-a-url"))).is_err());
    }
}
