//! Configuration types for the IP Sentinel system
//!
//! This module defines the persisted configuration structures: the cron
//! schedule and the per-channel notification settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default monitoring cadence: every 5 minutes
pub const DEFAULT_SCHEDULE: &str = "*/5 * * * *";

/// Event name fired when the public IP changes
pub const EVENT_IP_CHANGE: &str = "ip_change";

/// Persisted cron schedule (schedule_config.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 5-field cron expression
    pub schedule: String,

    /// When the schedule was last modified
    pub last_updated: DateTime<Utc>,
}

impl ScheduleConfig {
    /// Create a schedule config stamped with the current time
    pub fn new(schedule: impl Into<String>) -> Self {
        Self {
            schedule: schedule.into(),
            last_updated: Utc::now(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEDULE)
    }
}

/// Persisted notification settings (notifications.json)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Raise per-channel dispatch decisions to info-level logging
    #[serde(default)]
    pub debug: bool,

    /// Discord webhook channel
    #[serde(default)]
    pub discord: DiscordSettings,

    /// Pushover channel
    #[serde(default)]
    pub pushover: PushoverSettings,
}

/// Discord channel settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub webhook_url: String,

    /// Event names this channel is subscribed to
    #[serde(default)]
    pub events: Vec<String>,
}

/// Pushover channel settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushoverSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub user_key: String,

    #[serde(default)]
    pub api_token: String,

    /// Event names this channel is subscribed to
    #[serde(default)]
    pub events: Vec<String>,
}

impl DiscordSettings {
    /// Credentials for delivery, or `None` when the webhook URL is empty
    pub fn credentials(&self) -> Option<ChannelCredentials> {
        if self.webhook_url.is_empty() {
            None
        } else {
            Some(ChannelCredentials::Discord {
                webhook_url: self.webhook_url.clone(),
            })
        }
    }
}

impl PushoverSettings {
    /// Credentials for delivery, or `None` when either field is empty
    pub fn credentials(&self) -> Option<ChannelCredentials> {
        if self.user_key.is_empty() || self.api_token.is_empty() {
            None
        } else {
            Some(ChannelCredentials::Pushover {
                user_key: self.user_key.clone(),
                api_token: self.api_token.clone(),
            })
        }
    }
}

/// Credentials handed to a channel factory at delivery time
///
/// Carried by value so test deliveries can use ad-hoc credentials without
/// touching the stored configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCredentials {
    /// Discord webhook
    Discord {
        /// Full webhook URL
        webhook_url: String,
    },

    /// Pushover application
    Pushover {
        /// Recipient user key
        user_key: String,
        /// Application API token
        api_token: String,
    },
}
