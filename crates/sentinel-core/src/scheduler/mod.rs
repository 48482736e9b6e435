//! Cron-driven monitoring loop
//!
//! The Scheduler owns the persisted [`ScheduleConfig`], the single live
//! background loop, and the wiring from a `changed` check result to the
//! notifier.
//!
//! ## Loop Shape
//!
//! The loop polls a fine-grained interval (10 s) for "now >= next wake
//! time". When a tick fires it invokes the monitor exactly once, fires the
//! `ip_change` notification on a change, and recomputes the next wake time
//! from the cron expression evaluated at *now*, never from the previous
//! deadline. A tick missed during a long pause is therefore skipped, not
//! replayed late, and ticks can never pile up.
//!
//! ## Lifecycle
//!
//! - `start()` is idempotent: a second call while running is a no-op
//! - `stop()` signals the loop and blocks until the task has exited
//! - Reconfiguration validates first, persists, then restarts a running
//!   loop so the new cadence applies without overlap or a missed adoption
//!
//! Unexpected errors inside the loop body are caught, logged, and followed
//! by a long back-off sleep; only `stop()` or process exit ends the loop.

use chrono::{DateTime, Local};
use cron::Schedule;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::{ScheduleConfig, DEFAULT_SCHEDULE};
use crate::error::{Error, Result};
use crate::monitor::{Monitor, StatusKind};
use crate::notifier::Notifier;
use crate::persist;

/// How often the loop checks whether the next wake time has arrived
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Sleep after an unexpected loop error before resuming polling
const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Snapshot of the scheduler state for the control surface
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleInfo {
    /// Active 5-field cron expression
    pub schedule: String,

    /// Next computed fire time, if the loop is armed
    pub next_run: Option<DateTime<Local>>,

    /// Whether the background loop is running
    pub running: bool,
}

#[derive(Debug)]
struct ScheduleState {
    schedule: String,
    next_run: Option<DateTime<Local>>,
    running: bool,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Background scheduler for the monitoring loop
pub struct Scheduler {
    monitor: Arc<Monitor>,
    notifier: Arc<Notifier>,
    config_path: PathBuf,
    state: Arc<RwLock<ScheduleState>>,
    running_loop: Mutex<Option<RunningLoop>>,
}

impl Scheduler {
    /// Load the scheduler from `schedule_config.json`
    ///
    /// An absent file, a corrupt file, or a persisted expression that no
    /// longer validates all fall back to the default cadence (every 5
    /// minutes); the fallback is logged, never fatal.
    pub async fn load(
        monitor: Arc<Monitor>,
        notifier: Arc<Notifier>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        let config_path = config_path.into();

        let schedule = match persist::read_json::<ScheduleConfig>(&config_path).await {
            Ok(Some(config)) => {
                if parse_expression(&config.schedule).is_ok() {
                    config.schedule
                } else {
                    warn!(
                        "Persisted schedule '{}' is invalid, using default",
                        config.schedule
                    );
                    DEFAULT_SCHEDULE.to_string()
                }
            }
            Ok(None) => DEFAULT_SCHEDULE.to_string(),
            Err(e) => {
                warn!("Failed to load schedule config: {}; using default", e);
                DEFAULT_SCHEDULE.to_string()
            }
        };

        Self {
            monitor,
            notifier,
            config_path,
            state: Arc::new(RwLock::new(ScheduleState {
                schedule,
                next_run: None,
                running: false,
            })),
            running_loop: Mutex::new(None),
        }
    }

    /// Start the background loop
    ///
    /// A no-op when a loop is already active; only one loop can ever run.
    pub async fn start(&self) {
        let mut slot = self.running_loop.lock().await;
        if slot.is_some() {
            debug!("Scheduler already running, ignoring start");
            return;
        }

        let expression = self.state.read().await.schedule.clone();
        let schedule = match parse_expression(&expression) {
            Ok(schedule) => schedule,
            Err(e) => {
                // The stored expression is validated on every mutation, so
                // this only fires if the invariant was broken externally.
                error!("Cannot start scheduler with '{}': {}", expression, e);
                return;
            }
        };

        let next_wake = schedule.after(&Local::now()).next();
        {
            let mut state = self.state.write().await;
            state.running = true;
            state.next_run = next_wake;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let monitor = self.monitor.clone();
        let notifier = self.notifier.clone();
        let state = self.state.clone();

        info!(
            "Starting scheduler with '{}' (next run: {:?})",
            expression, next_wake
        );

        let handle = tokio::spawn(async move {
            run_loop(schedule, next_wake, monitor, notifier, state, shutdown_rx).await;
        });

        *slot = Some(RunningLoop {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Stop the background loop
    ///
    /// Signals the loop and waits for the task to exit before returning;
    /// the signal is observed within one poll interval. An in-flight tick
    /// is allowed to finish.
    pub async fn stop(&self) {
        let running = {
            let mut slot = self.running_loop.lock().await;
            slot.take()
        };

        if let Some(running) = running {
            let _ = running.shutdown.send(true);
            if let Err(e) = running.handle.await {
                error!("Scheduler task join failed: {}", e);
            }
        }

        let mut state = self.state.write().await;
        state.running = false;
        state.next_run = None;
    }

    /// Whether the background loop is currently active
    pub async fn is_running(&self) -> bool {
        self.running_loop.lock().await.is_some()
    }

    /// Current schedule, next fire time, and running flag
    pub async fn schedule_info(&self) -> ScheduleInfo {
        let state = self.state.read().await;
        ScheduleInfo {
            schedule: state.schedule.clone(),
            next_run: state.next_run,
            running: state.running,
        }
    }

    /// Replace the cron expression
    ///
    /// The new expression is validated first; invalid input is rejected
    /// with [`Error::Config`] and the prior schedule stays untouched on
    /// disk, in memory, and in the running loop. On success the config is
    /// persisted and a running loop is restarted so the new cadence takes
    /// effect without overlapping loops.
    pub async fn set_cron(&self, expression: &str) -> Result<()> {
        let expression = expression.trim();
        let schedule = parse_expression(expression)?;

        {
            let mut state = self.state.write().await;
            state.schedule = expression.to_string();
            state.next_run = schedule.after(&Local::now()).next();
        }

        if let Err(e) = self.persist().await {
            warn!("Failed to persist schedule config: {}", e);
        }

        let was_running = self.running_loop.lock().await.is_some();
        if was_running {
            self.stop().await;
            self.start().await;
        }

        info!("Schedule updated to '{}'", expression);
        Ok(())
    }

    /// Replace the schedule with a fixed interval in seconds
    ///
    /// The interval is mapped onto the closest cron expression; anything
    /// under a minute runs every minute.
    pub async fn set_interval(&self, interval_seconds: u64) -> Result<()> {
        self.set_cron(&interval_to_cron(interval_seconds)).await
    }

    async fn persist(&self) -> Result<()> {
        let config = ScheduleConfig::new(self.state.read().await.schedule.clone());
        persist::write_json_atomic(&self.config_path, &config).await
    }
}

async fn run_loop(
    schedule: Schedule,
    mut next_wake: Option<DateTime<Local>>,
    monitor: Arc<Monitor>,
    notifier: Arc<Notifier>,
    state: Arc<RwLock<ScheduleState>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = time::sleep(POLL_INTERVAL) => {}
        }

        let now = Local::now();
        match next_wake {
            Some(due) if now >= due => {
                if let Err(e) = run_tick(&monitor, &notifier).await {
                    error!("Scheduler tick failed: {}", e);
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = time::sleep(ERROR_BACKOFF) => {}
                    }
                }

                // Recompute from now so a long pause skips missed ticks
                // instead of replaying them late.
                next_wake = schedule.after(&Local::now()).next();
                state.write().await.next_run = next_wake;
            }
            Some(_) => {}
            None => {
                error!("Cron schedule yielded no upcoming fire time");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = time::sleep(ERROR_BACKOFF) => {}
                }
                next_wake = schedule.after(&Local::now()).next();
                state.write().await.next_run = next_wake;
            }
        }
    }

    info!("Scheduler loop stopped");
}

/// One scheduled tick: check once, notify iff the IP changed
pub(crate) async fn run_tick(monitor: &Monitor, notifier: &Notifier) -> Result<()> {
    let status = monitor.check().await;
    debug!("Tick completed: {}", status.message);

    if status.status == StatusKind::Changed {
        if let Some(ip) = status.ip {
            notifier.notify_ip_change(ip).await;
        }
    }

    Ok(())
}

/// Parse and validate a 5-field cron expression
///
/// The `cron` crate works on 6/7-field expressions with a leading seconds
/// field, so a fixed `0` seconds field is prefixed before parsing. The
/// public contract stays strictly 5-field; anything else is rejected.
pub(crate) fn parse_expression(expression: &str) -> Result<Schedule> {
    let expression = expression.trim();
    if expression.split_whitespace().count() != 5 {
        return Err(Error::config(format!(
            "Invalid cron expression '{}': expected 5 fields",
            expression
        )));
    }

    Schedule::from_str(&format!("0 {}", expression))
        .map_err(|e| Error::config(format!("Invalid cron expression '{}': {}", expression, e)))
}

/// Map an interval in seconds onto a cron expression
pub(crate) fn interval_to_cron(interval_seconds: u64) -> String {
    if interval_seconds >= 3_600 {
        let hours = interval_seconds / 3_600;
        if hours == 1 {
            "0 * * * *".to_string()
        } else {
            format!("0 */{} * * *", hours)
        }
    } else if interval_seconds >= 60 {
        let minutes = interval_seconds / 60;
        if minutes == 1 {
            "* * * * *".to_string()
        } else {
            format!("*/{} * * * *", minutes)
        }
    } else {
        "* * * * *".to_string()
    }
}
