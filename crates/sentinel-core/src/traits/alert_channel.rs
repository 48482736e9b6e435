// # Alert Channel Trait
//
// Defines the interface for outbound notification delivery.
//
// ## Implementations
//
// - Discord webhook: `sentinel-notify` crate
// - Pushover: `sentinel-notify` crate
//
// A channel is a single-shot delivery mechanism. All fan-out decisions
// (enabled flags, event subscriptions, credential presence) are owned by
// the [`Notifier`](crate::Notifier); a channel only knows how to talk to
// its service and report success or failure.
//
// ## Task Spawning Rules
//
// Channel implementations must not spawn tasks or retry internally. A
// failed delivery is reported to the notifier, logged, and dropped; the
// next IP change produces a fresh delivery attempt.

use async_trait::async_trait;

use crate::config::ChannelCredentials;

/// Trait for notification channel implementations
///
/// # Contract
///
/// `deliver` performs exactly one outbound request and maps the service's
/// success contract (Discord: HTTP 204, Pushover: HTTP 200) onto
/// `Ok`/`Err`. Any non-matching status, network error, or timeout is an
/// error; the notifier logs it and continues with sibling channels.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Stable channel name (e.g. "discord", "pushover")
    fn channel_name(&self) -> &'static str;

    /// Deliver one notification to the backing service
    async fn deliver(&self, title: &str, body: &str) -> Result<(), crate::Error>;
}

/// Helper trait for constructing channels from credentials
///
/// Channels are rebuilt from the current credentials on every dispatch,
/// so configuration changes take effect without restarting anything and
/// test deliveries can run against ad-hoc credentials.
pub trait ChannelFactory: Send + Sync {
    /// Create an AlertChannel instance from credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn AlertChannel>)`: Ready-to-use channel
    /// - `Err(Error)`: Credentials are empty or of the wrong shape
    fn create(&self, credentials: &ChannelCredentials) -> Result<Box<dyn AlertChannel>, crate::Error>;
}
