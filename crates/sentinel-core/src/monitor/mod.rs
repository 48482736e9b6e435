//! IP change monitor
//!
//! The Monitor composes one [`IpResolver`](crate::IpResolver) with the
//! [`ChangeStore`](crate::ChangeStore) and turns a single resolution
//! attempt into a point-in-time status.
//!
//! ## Check Flow
//!
//! 1. Resolve the public IP (one network call, short timeout)
//! 2. Compare against the cached last-known IP
//! 3. On change: persist the snapshot, append one log entry
//! 4. On no change: classify how long the IP has been stable
//!
//! A check never fails across the boundary: resolution failure becomes a
//! status of `error`, and persistence failures are logged and swallowed so
//! monitoring survives a full disk or a read-only volume.

use chrono::{Duration, Local};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::ChangeStore;
use crate::traits::IpResolver;

/// Outcome classification of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The IP differs from the stored one; the change was recorded
    Changed,
    /// The IP matches the stored one
    Unchanged,
    /// The IP matches but changed less than a couple of minutes ago
    RecentChange,
    /// Resolution failed; nothing was mutated
    Error,
}

/// Transient result of one check
///
/// Derived per call from the snapshot and the change log; never persisted
/// as its own entity.
#[derive(Debug, Clone, Serialize)]
pub struct CheckStatus {
    /// Outcome classification
    pub status: StatusKind,

    /// Human-readable summary
    pub message: String,

    /// The resolved IP (absent when resolution failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
}

impl CheckStatus {
    fn error() -> Self {
        Self {
            status: StatusKind::Error,
            message: "Failed to get IP".to_string(),
            ip: None,
        }
    }
}

/// Public IP monitor
///
/// Thread-safe: the cached current IP sits behind a RwLock, and the
/// compare-and-record section holds the write guard across persistence so
/// two concurrent checks can never both record the same transition.
pub struct Monitor {
    resolver: Box<dyn IpResolver>,
    store: ChangeStore,
    current: RwLock<Option<IpAddr>>,
}

impl Monitor {
    /// Create a monitor, seeding the cached IP from the store
    ///
    /// A snapshot read failure is logged and treated as "no previous IP";
    /// the first successful check then records a change and re-creates it.
    pub async fn new(resolver: Box<dyn IpResolver>, store: ChangeStore) -> Self {
        let current = match store.load_last_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Failed to load last known IP: {}", e);
                None
            }
        };

        Self {
            resolver,
            store,
            current: RwLock::new(current),
        }
    }

    /// The cached last-known IP, if any
    pub async fn current_ip(&self) -> Option<IpAddr> {
        *self.current.read().await
    }

    /// Change history lines, oldest first
    pub async fn history(&self) -> Result<Vec<String>> {
        self.store.history().await
    }

    /// Perform one check
    ///
    /// Performs at most one network resolution and, on change, exactly one
    /// log append and one snapshot save.
    pub async fn check(&self) -> CheckStatus {
        let new_ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("IP resolution failed: {}", e);
                return CheckStatus::error();
            }
        };

        let mut current = self.current.write().await;

        if *current != Some(new_ip) {
            *current = Some(new_ip);

            if let Err(e) = self.store.save_ip(new_ip).await {
                warn!("Failed to persist IP snapshot: {}", e);
            }
            if let Err(e) = self.store.append_change(new_ip).await {
                warn!("Failed to append change log entry: {}", e);
            }

            let message = format!("IP changed to: {}", new_ip);
            info!("{}", message);

            return CheckStatus {
                status: StatusKind::Changed,
                message,
                ip: Some(new_ip),
            };
        }

        drop(current);

        let last_change = match self.store.last_change_time().await {
            Ok(at) => at,
            Err(e) => {
                warn!("Failed to read last change time: {}", e);
                None
            }
        };

        let (status, message) = match last_change {
            None => (
                StatusKind::Unchanged,
                "No previous IP changes recorded".to_string(),
            ),
            Some(at) => classify_stability(Local::now().naive_local() - at),
        };

        CheckStatus {
            status,
            message,
            ip: Some(new_ip),
        }
    }

    /// Clear the change history and re-baseline to a freshly resolved IP
    ///
    /// The explicit reset path: the log is truncated and the snapshot is
    /// rewritten without appending a change entry, so the next check sees
    /// the fresh IP as "unchanged". If resolution fails the log stays
    /// cleared and the stale baseline remains.
    pub async fn rebaseline(&self) -> Result<Option<IpAddr>> {
        self.store.clear_log().await?;

        match self.resolver.resolve().await {
            Ok(ip) => {
                let mut current = self.current.write().await;
                *current = Some(ip);
                self.store.save_ip(ip).await?;
                info!("Change history cleared, re-baselined to {}", ip);
                Ok(Some(ip))
            }
            Err(e) => {
                warn!("History cleared but re-baseline resolution failed: {}", e);
                Ok(None)
            }
        }
    }
}

/// Bucket an elapsed duration into the largest applicable unit
///
/// Precedence is evaluated top to bottom, first match wins. The residual
/// seconds are computed within the current day so a multi-day gap always
/// reports through the days branches regardless of leftover hours.
fn classify_stability(elapsed: Duration) -> (StatusKind, String) {
    let days = elapsed.num_days();
    let residual_secs = elapsed.num_seconds() - days * 86_400;

    if days > 1 {
        (
            StatusKind::Unchanged,
            format!("IP unchanged for {} days", days),
        )
    } else if days == 1 {
        (StatusKind::Unchanged, "IP unchanged for 1 day".to_string())
    } else if residual_secs >= 3_600 {
        let hours = residual_secs / 3_600;
        (
            StatusKind::Unchanged,
            format!("IP unchanged for {} hour{}", hours, if hours > 1 { "s" } else { "" }),
        )
    } else if residual_secs > 60 {
        let minutes = residual_secs / 60;
        (
            StatusKind::Unchanged,
            format!(
                "IP unchanged for {} minute{}",
                minutes,
                if minutes > 1 { "s" } else { "" }
            ),
        )
    } else {
        (StatusKind::RecentChange, "IP changed recently".to_string())
    }
}
