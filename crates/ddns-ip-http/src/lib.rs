// # HTTP IP Resolver
//
// This crate discovers the host's public IPv4 address by asking a
// plain-text "what is my IP" service (https://checkip.amazonaws.com by
// default).
//
// ## Behaviour
//
// - One GET per `resolve()` call, no caching: the engine decides how often
//   to ask
// - The first line of the body, trimmed, must parse as an IPv4 address
// - Anything else (non-2xx, transport error, IPv6, garbage) is an
//   `Error::Resolver`, which makes the engine skip the cycle

use ddns_core::config::DEFAULT_IP_URL;
use ddns_core::traits::IpResolver;
use ddns_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default request timeout for the resolver
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based public IPv4 resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver for `url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is not http(s) or the HTTP client
    /// cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "IP resolver URL must be http(s): {}",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Resolver against the default endpoint
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_IP_URL, DEFAULT_TIMEOUT)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::resolver(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::resolver(format!(
                "{} answered with HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolver(format!("Failed to read response: {}", e)))?;

        let ip = parse_ipv4(&body)?;
        tracing::trace!("Resolved public IP {} via {}", ip, self.url);
        Ok(ip)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}

/// Parse the first line of a checkip-style body
pub fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let line = body.lines().next().unwrap_or_default().trim();

    line.parse::<Ipv4Addr>()
        .map_err(|_| Error::resolver(format!("Not an IPv4 address: {:?}", line)))
}
