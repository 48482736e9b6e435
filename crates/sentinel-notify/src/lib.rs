// # Notification Channels
//
// This crate provides the outbound notification channel implementations
// for the IP Sentinel system.
//
// ## Channels
//
// - **Discord**: webhook POST carrying a single embed, success is HTTP 204
// - **Pushover**: form POST to the messages API, success is HTTP 200
//
// ## Architectural Constraints
//
// Channels are isolated, stateless, and single-shot:
//
// - One HTTP request per delivery, bounded by a 10 second timeout
// - Full error propagation to the notifier (no retry, no backoff here)
// - No background tasks, no access to stored configuration
// - Credentials never appear in logs or Debug output

pub mod discord;
pub mod pushover;

pub use discord::{DiscordChannel, DiscordFactory};
pub use pushover::{PushoverChannel, PushoverFactory};

use sentinel_core::{ChannelRegistry, CHANNEL_DISCORD, CHANNEL_PUSHOVER};

/// Register both channels with a registry
pub fn register(registry: &ChannelRegistry) {
    registry.register(CHANNEL_DISCORD, Box::new(DiscordFactory));
    registry.register(CHANNEL_PUSHOVER, Box::new(PushoverFactory));
}

/// Shared delivery timeout for both services
pub(crate) const DELIVERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_installs_both_channels() {
        let registry = ChannelRegistry::new();
        register(&registry);

        assert!(registry.has_channel("discord"));
        assert!(registry.has_channel("pushover"));
    }
}
