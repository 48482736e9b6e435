//! Pushover channel
//!
//! Delivers one notification as a form POST against the Pushover messages
//! API. Success is HTTP 200; anything else is a delivery failure.

use async_trait::async_trait;
use sentinel_core::config::ChannelCredentials;
use sentinel_core::traits::{AlertChannel, ChannelFactory};
use sentinel_core::{Error, Result};

use crate::DELIVERY_TIMEOUT;

/// Pushover messages endpoint
const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover channel
///
/// # Security
///
/// The user key and API token are never logged; the Debug implementation
/// redacts both.
pub struct PushoverChannel {
    user_key: String,
    api_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for PushoverChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverChannel")
            .field("user_key", &"<REDACTED>")
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

impl PushoverChannel {
    /// Create a channel for the given user key and application token
    pub fn new(user_key: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            api_token: api_token.into(),
            client: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AlertChannel for PushoverChannel {
    fn channel_name(&self) -> &'static str {
        "pushover"
    }

    async fn deliver(&self, title: &str, body: &str) -> Result<()> {
        let params = [
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title),
            ("message", body),
            ("priority", "0"),
        ];

        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::notification("pushover", format!("Request failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::notification(
                "pushover",
                format!("Unexpected status: {}", response.status()),
            ));
        }

        Ok(())
    }
}

/// Factory for creating Pushover channels
pub struct PushoverFactory;

impl ChannelFactory for PushoverFactory {
    fn create(&self, credentials: &ChannelCredentials) -> Result<Box<dyn AlertChannel>> {
        match credentials {
            ChannelCredentials::Pushover {
                user_key,
                api_token,
            } => {
                if user_key.is_empty() || api_token.is_empty() {
                    return Err(Error::config("Pushover credentials cannot be empty"));
                }
                Ok(Box::new(PushoverChannel::new(
                    user_key.clone(),
                    api_token.clone(),
                )))
            }
            _ => Err(Error::config("Invalid credentials for Pushover channel")),
        }
    }
}
