//! Plugin-based channel registry
//!
//! The registry allows notification channels to be registered dynamically
//! at runtime, avoiding hardcoded if-else chains in the notifier.
//!
//! ## Registration
//!
//! Implementations should register themselves during initialization:
//!
//! ```rust,ignore
//! // In the sentinel-notify crate
//! pub fn register(registry: &ChannelRegistry) {
//!     registry.register("discord", Box::new(DiscordFactory));
//!     registry.register("pushover", Box::new(PushoverFactory));
//! }
//! ```

use crate::config::ChannelCredentials;
use crate::error::{Error, Result};
use crate::traits::{AlertChannel, ChannelFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Registry mapping channel names to factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ChannelRegistry {
    factories: RwLock<HashMap<String, Box<dyn ChannelFactory>>>,
}

impl ChannelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel factory
    ///
    /// # Parameters
    ///
    /// - `name`: Channel name (e.g. "discord", "pushover")
    /// - `factory`: Factory object for creating channel instances
    pub fn register(&self, name: impl Into<String>, factory: Box<dyn ChannelFactory>) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap();
        factories.insert(name, factory);
    }

    /// Create a channel from credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn AlertChannel>)`: Created channel instance
    /// - `Err(Error)`: If the name is not registered or creation fails
    pub fn create(
        &self,
        name: &str,
        credentials: &ChannelCredentials,
    ) -> Result<Box<dyn AlertChannel>> {
        let factories = self.factories.read().unwrap();

        let factory = factories
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown notification channel: {}", name)))?;

        factory.create(credentials)
    }

    /// Check if a channel name is registered
    pub fn has_channel(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap();
        factories.contains_key(name)
    }

    /// List all registered channel names
    pub fn list_channels(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap();
        factories.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockChannelFactory;

    impl ChannelFactory for MockChannelFactory {
        fn create(&self, _credentials: &ChannelCredentials) -> Result<Box<dyn AlertChannel>> {
            Err(Error::config("Mock channel not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ChannelRegistry::new();

        // Initially empty
        assert!(!registry.has_channel("mock"));

        // Register
        registry.register("mock", Box::new(MockChannelFactory));

        // Now present
        assert!(registry.has_channel("mock"));
        assert!(registry.list_channels().contains(&"mock".to_string()));
    }

    #[test]
    fn test_unknown_channel_is_an_error() {
        let registry = ChannelRegistry::new();
        let credentials = ChannelCredentials::Discord {
            webhook_url: "https://example.invalid/hook".to_string(),
        };
        assert!(registry.create("nope", &credentials).is_err());
    }
}
