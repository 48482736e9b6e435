// # sentinel-core
//
// Core library for the IP Sentinel monitoring system.
//
// ## Architecture Overview
//
// This library provides the core functionality for public IP monitoring:
// - **IpResolver**: Trait for resolving the current public IP
// - **AlertChannel**: Trait for delivering outbound notifications
// - **ChangeStore**: Persistence for the IP snapshot and change log
// - **Monitor**: Turns one resolution attempt into a point-in-time status
// - **Notifier**: Fan-out of events to configured channels
// - **Scheduler**: Cron-driven background loop invoking the monitor
// - **ChannelRegistry**: Plugin-based registry for notification channels
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Typed Results**: Failures cross boundaries as values, never panics
// 3. **Plugin-Based**: Channels are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Crash Tolerance**: Persistence failures degrade, they never stop monitoring

pub mod config;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod traits;

mod persist;

// Re-export core types for convenience
pub use config::{
    ChannelCredentials, DiscordSettings, NotificationConfig, PushoverSettings, ScheduleConfig,
    DEFAULT_SCHEDULE, EVENT_IP_CHANGE,
};
pub use error::{Error, Result};
pub use monitor::{CheckStatus, Monitor, StatusKind};
pub use notifier::{Notifier, CHANNEL_DISCORD, CHANNEL_PUSHOVER};
pub use registry::ChannelRegistry;
pub use scheduler::{ScheduleInfo, Scheduler};
pub use store::{ChangeStore, IpRecord};
pub use traits::{AlertChannel, ChannelFactory, IpResolver};
