//! Discord webhook channel
//!
//! Delivers one notification as a single embed via an incoming webhook.
//! Discord acknowledges a successful webhook execution with HTTP 204 and
//! no body; anything else is a delivery failure.

use async_trait::async_trait;
use sentinel_core::config::ChannelCredentials;
use sentinel_core::traits::{AlertChannel, ChannelFactory};
use sentinel_core::{Error, Result};
use serde_json::json;

use crate::DELIVERY_TIMEOUT;

/// Embed accent color (Discord blue)
const EMBED_COLOR: u32 = 3_447_003;

/// Discord webhook channel
///
/// # Security
///
/// The webhook URL embeds a secret token and is never logged; the Debug
/// implementation redacts it.
pub struct DiscordChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DiscordChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordChannel")
            .field("webhook_url", &"<REDACTED>")
            .finish()
    }
}

impl DiscordChannel {
    /// Create a channel for the given webhook URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AlertChannel for DiscordChannel {
    fn channel_name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, title: &str, body: &str) -> Result<()> {
        let payload = json!({
            "embeds": [{
                "title": title,
                "description": body,
                "color": EMBED_COLOR,
            }]
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notification("discord", format!("Request failed: {}", e)))?;

        // Webhook executions answer 204 No Content on success
        if response.status() != reqwest::StatusCode::NO_CONTENT {
            return Err(Error::notification(
                "discord",
                format!("Unexpected status: {}", response.status()),
            ));
        }

        Ok(())
    }
}

/// Factory for creating Discord channels
pub struct DiscordFactory;

impl ChannelFactory for DiscordFactory {
    fn create(&self, credentials: &ChannelCredentials) -> Result<Box<dyn AlertChannel>> {
        match credentials {
            ChannelCredentials::Discord { webhook_url } => {
                if webhook_url.is_empty() {
                    return Err(Error::config("Discord webhook URL cannot be empty"));
                }
                Ok(Box::new(DiscordChannel::new(webhook_url.clone())))
            }
            _ => Err(Error::config("Invalid credentials for Discord channel")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = DiscordFactory;

        let credentials = ChannelCredentials::Discord {
            webhook_url: "https://discord.com/api/webhooks/1/token".to_string(),
        };
        assert!(factory.create(&credentials).is_ok());
    }

    #[test]
    fn test_factory_rejects_empty_or_mismatched_credentials() {
        let factory = DiscordFactory;

        let empty = ChannelCredentials::Discord {
            webhook_url: String::new(),
        };
        assert!(factory.create(&empty).is_err());

        let mismatched = ChannelCredentials::Pushover {
            user_key: "user".to_string(),
            api_token: "token".to_string(),
        };
        assert!(factory.create(&mismatched).is_err());
    }

    #[test]
    fn test_debug_redacts_webhook_url() {
        let channel = DiscordChannel::new("https://discord.com/api/webhooks/1/secret");
        let output = format!("{:?}", channel);
        assert!(!output.contains("secret"));
    }
}
