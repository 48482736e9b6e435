//! Notification fan-out
//!
//! The Notifier owns the persisted [`NotificationConfig`] and dispatches
//! one event to every channel that is enabled, subscribed to the event,
//! and fully credentialed. Channels are rebuilt from the current
//! credentials on each dispatch via the [`ChannelRegistry`], so config
//! changes apply immediately and test deliveries can use ad-hoc
//! credentials without touching stored state.
//!
//! ## Failure Isolation
//!
//! A channel's delivery failure is caught and logged; it never aborts
//! delivery attempts to sibling channels, and never propagates into the
//! scheduling tick that triggered it.

use std::net::IpAddr;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ChannelCredentials, NotificationConfig, EVENT_IP_CHANGE};
use crate::error::Result;
use crate::persist;
use crate::registry::ChannelRegistry;

/// Channel name for Discord webhooks
pub const CHANNEL_DISCORD: &str = "discord";

/// Channel name for Pushover
pub const CHANNEL_PUSHOVER: &str = "pushover";

/// Outbound notification dispatcher
pub struct Notifier {
    path: PathBuf,
    config: RwLock<NotificationConfig>,
    channels: ChannelRegistry,
}

impl Notifier {
    /// Load the notifier from `notifications.json`
    ///
    /// A missing file yields defaults (everything disabled); a corrupt
    /// file is logged and also falls back to defaults rather than taking
    /// the daemon down.
    pub async fn load(path: impl Into<PathBuf>, channels: ChannelRegistry) -> Self {
        let path = path.into();

        let config = match persist::read_json::<NotificationConfig>(&path).await {
            Ok(Some(config)) => config,
            Ok(None) => NotificationConfig::default(),
            Err(e) => {
                warn!("Failed to load notification config: {}; using defaults", e);
                NotificationConfig::default()
            }
        };

        Self {
            path,
            config: RwLock::new(config),
            channels,
        }
    }

    /// Snapshot of the current configuration
    pub async fn config(&self) -> NotificationConfig {
        self.config.read().await.clone()
    }

    /// Enable or disable verbose dispatch logging
    pub async fn set_debug(&self, enabled: bool) -> Result<()> {
        {
            let mut config = self.config.write().await;
            config.debug = enabled;
        }
        self.persist().await
    }

    /// Replace the Discord channel settings
    pub async fn configure_discord(
        &self,
        enabled: bool,
        webhook_url: String,
        events: Vec<String>,
    ) -> Result<()> {
        {
            let mut config = self.config.write().await;
            config.discord.enabled = enabled;
            config.discord.webhook_url = webhook_url;
            config.discord.events = events;
        }
        self.persist().await
    }

    /// Replace the Pushover channel settings
    pub async fn configure_pushover(
        &self,
        enabled: bool,
        user_key: String,
        api_token: String,
        events: Vec<String>,
    ) -> Result<()> {
        {
            let mut config = self.config.write().await;
            config.pushover.enabled = enabled;
            config.pushover.user_key = user_key;
            config.pushover.api_token = api_token;
            config.pushover.events = events;
        }
        self.persist().await
    }

    /// Notify all eligible channels of an IP change
    pub async fn notify_ip_change(&self, new_ip: IpAddr) -> bool {
        let body = format!("Your public IP address has changed to: {}", new_ip);
        self.notify(EVENT_IP_CHANGE, "IP Address Changed", &body)
            .await
    }

    /// Dispatch one event to every eligible channel
    ///
    /// A channel fires only if it is enabled, subscribed to `event`, and
    /// its credentials are non-empty. Returns true if at least one
    /// channel delivered successfully.
    pub async fn notify(&self, event: &str, title: &str, body: &str) -> bool {
        let config = self.config.read().await.clone();
        let mut delivered = false;

        if config.discord.enabled && config.discord.events.iter().any(|e| e == event) {
            match config.discord.credentials() {
                Some(credentials) => {
                    delivered |= self
                        .dispatch(CHANNEL_DISCORD, &credentials, title, body, config.debug)
                        .await;
                }
                None => self.trace(
                    config.debug,
                    "Discord channel enabled but webhook URL is empty, skipping",
                ),
            }
        } else {
            self.trace(
                config.debug,
                "Discord channel disabled or not subscribed, skipping",
            );
        }

        if config.pushover.enabled && config.pushover.events.iter().any(|e| e == event) {
            match config.pushover.credentials() {
                Some(credentials) => {
                    delivered |= self
                        .dispatch(CHANNEL_PUSHOVER, &credentials, title, body, config.debug)
                        .await;
                }
                None => self.trace(
                    config.debug,
                    "Pushover channel enabled but credentials are incomplete, skipping",
                ),
            }
        } else {
            self.trace(
                config.debug,
                "Pushover channel disabled or not subscribed, skipping",
            );
        }

        delivered
    }

    /// Send a canned test message to one named channel
    ///
    /// Uses `override_credentials` when supplied, otherwise the stored
    /// credentials for that channel. Stored configuration is never
    /// mutated by a test delivery.
    pub async fn test_channel(
        &self,
        channel: &str,
        override_credentials: Option<ChannelCredentials>,
    ) -> bool {
        let config = self.config.read().await.clone();

        let credentials = match override_credentials {
            Some(credentials) => Some(credentials),
            None => match channel {
                CHANNEL_DISCORD => config.discord.credentials(),
                CHANNEL_PUSHOVER => config.pushover.credentials(),
                _ => None,
            },
        };

        let Some(credentials) = credentials else {
            warn!("No credentials available for test delivery to {}", channel);
            return false;
        };

        let body = format!(
            "This is a test notification from IP Sentinel for {}.",
            channel
        );
        self.dispatch(channel, &credentials, "Test Notification", &body, config.debug)
            .await
    }

    async fn dispatch(
        &self,
        name: &str,
        credentials: &ChannelCredentials,
        title: &str,
        body: &str,
        debug: bool,
    ) -> bool {
        let channel = match self.channels.create(name, credentials) {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Failed to build {} channel: {}", name, e);
                return false;
            }
        };

        match channel.deliver(title, body).await {
            Ok(()) => {
                self.trace(debug, &format!("{} notification sent successfully", name));
                true
            }
            Err(e) => {
                warn!("{} delivery failed: {}", name, e);
                false
            }
        }
    }

    fn trace(&self, debug: bool, message: &str) {
        if debug {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    async fn persist(&self) -> Result<()> {
        let config = self.config.read().await.clone();
        persist::write_json_atomic(&self.path, &config).await
    }
}
