// # IP Resolver Trait
//
// Defines the interface for discovering the current public IPv4 address.
//
// ## Implementations
//
// - HTTP plain-text endpoint: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public address: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP resolver implementations
///
/// A resolver answers one question per call: "what is our public IPv4
/// address right now?". It holds no cache and makes no decisions; the
/// engine compares the answer against its own state.
///
/// # Failure
///
/// Any failure (transport, non-2xx status, unparsable body, non-IPv4
/// answer) is returned as an error. The engine treats it as transient and
/// skips the cycle.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging (e.g., "http")
    fn resolver_name(&self) -> &'static str;
}
