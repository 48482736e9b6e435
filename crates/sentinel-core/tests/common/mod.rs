//! Test doubles and common utilities for contract tests
//!
//! These doubles script the two side-effecting seams (resolution and
//! notification delivery) so contract tests can drive the monitor,
//! notifier, and scheduler deterministically without any network.
#![allow(dead_code)]

use sentinel_core::config::{ChannelCredentials, EVENT_IP_CHANGE};
use sentinel_core::error::{Error, Result};
use sentinel_core::traits::{AlertChannel, ChannelFactory, IpResolver};
use sentinel_core::{ChannelRegistry, Notifier};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A resolver that replays a fixed script of IPs, then fails
pub struct ScriptedResolver {
    script: Mutex<VecDeque<IpAddr>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(ips: &[&str]) -> Self {
        Self {
            script: Mutex::new(ips.iter().map(|s| s.parse().unwrap()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Handle to the call counter that survives moving the resolver
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::resolution("scripted resolver exhausted"))
    }
}

/// A resolver for which every provider always fails
pub struct FailingResolver;

#[async_trait::async_trait]
impl IpResolver for FailingResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        Err(Error::resolution("all IP providers failed"))
    }
}

/// One recorded delivery attempt that succeeded
#[derive(Debug, Clone)]
pub struct Delivery {
    pub channel: &'static str,
    pub title: String,
    pub body: String,
}

struct RecordingChannel {
    name: &'static str,
    log: Arc<Mutex<Vec<Delivery>>>,
    fail: bool,
}

#[async_trait::async_trait]
impl AlertChannel for RecordingChannel {
    fn channel_name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, title: &str, body: &str) -> Result<()> {
        if self.fail {
            return Err(Error::notification(self.name, "scripted delivery failure"));
        }

        self.log.lock().unwrap().push(Delivery {
            channel: self.name,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Factory producing recording channels that share one delivery log
pub struct RecordingFactory {
    name: &'static str,
    log: Arc<Mutex<Vec<Delivery>>>,
    fail: bool,
}

impl ChannelFactory for RecordingFactory {
    fn create(&self, _credentials: &ChannelCredentials) -> Result<Box<dyn AlertChannel>> {
        Ok(Box::new(RecordingChannel {
            name: self.name,
            log: self.log.clone(),
            fail: self.fail,
        }))
    }
}

/// Registry with recording "discord" and "pushover" channels
pub fn recording_registry() -> (ChannelRegistry, Arc<Mutex<Vec<Delivery>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ChannelRegistry::new();
    registry.register(
        "discord",
        Box::new(RecordingFactory {
            name: "discord",
            log: log.clone(),
            fail: false,
        }),
    );
    registry.register(
        "pushover",
        Box::new(RecordingFactory {
            name: "pushover",
            log: log.clone(),
            fail: false,
        }),
    );
    (registry, log)
}

/// Registry where Discord always fails delivery and Pushover records
pub fn registry_with_failing_discord() -> (ChannelRegistry, Arc<Mutex<Vec<Delivery>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ChannelRegistry::new();
    registry.register(
        "discord",
        Box::new(RecordingFactory {
            name: "discord",
            log: log.clone(),
            fail: true,
        }),
    );
    registry.register(
        "pushover",
        Box::new(RecordingFactory {
            name: "pushover",
            log: log.clone(),
            fail: false,
        }),
    );
    (registry, log)
}

/// Notifier persisted inside `dir`
pub async fn notifier_in(dir: &Path, registry: ChannelRegistry) -> Notifier {
    Notifier::load(dir.join("notifications.json"), registry).await
}

/// Subscribe the named channel to `ip_change` with non-empty credentials
pub async fn enable_channel(notifier: &Notifier, channel: &str) {
    match channel {
        "discord" => notifier
            .configure_discord(
                true,
                "https://discord.example/webhook".to_string(),
                vec![EVENT_IP_CHANGE.to_string()],
            )
            .await
            .unwrap(),
        "pushover" => notifier
            .configure_pushover(
                true,
                "user-key".to_string(),
                "api-token".to_string(),
                vec![EVENT_IP_CHANGE.to_string()],
            )
            .await
            .unwrap(),
        other => panic!("unknown channel {other}"),
    }
}
