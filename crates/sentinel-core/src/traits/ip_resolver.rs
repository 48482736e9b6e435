// # IP Resolver Trait
//
// Defines the interface for determining the caller's current public IP.
//
// ## Implementations
//
// - HTTP provider chain: `sentinel-ip-http` crate
// - Test doubles: scripted resolvers in contract tests
//
// ## Usage
//
// ```rust,ignore
// use sentinel_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP resolution
///
/// A resolver performs one resolution attempt per call. Retry policy is
/// owned by the [`Scheduler`](crate::Scheduler): a failed call is simply
/// retried on the next scheduled tick, never inside `resolve()` itself.
///
/// Implementations must be thread-safe and usable across async tasks, and
/// must bound every network request with a short timeout so a tick can
/// never block indefinitely.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current public IP
    /// - `Err(Error)`: If every available provider failed
    async fn resolve(&self) -> Result<IpAddr, crate::Error>;
}
