//! Core traits for the IP Sentinel system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Resolve the current public IP address
//! - [`AlertChannel`]: Deliver an outbound notification to one service

pub mod alert_channel;
pub mod ip_resolver;

pub use alert_channel::{AlertChannel, ChannelFactory};
pub use ip_resolver::IpResolver;
