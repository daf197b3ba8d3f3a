//! Connection event monitor: resolve → subscribe → detect → lock.
//!
//! Everything runs on the caller's thread. Each disconnect is handled to
//! completion, including the whole lock cascade, before the next line is read.
//! The run ends when the signal stream closes; there is no restart.

use crate::address::{BusObjectPath, HardwareAddress};
use crate::config::Config;
use crate::detector::detect_disconnects;
use crate::error::{MonitorError, ResolveError};
use crate::lock::{CommandRunner, LockTrigger, SystemRunner};
use crate::resolver::{resolve, CommandLister, DeviceLister, MatchMode};
use crate::stream::{DbusMonitorSource, SignalSource};
use chrono::{DateTime, Utc};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSummary {
    pub path: BusObjectPath,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub lines_read: u64,
    pub disconnects: u64,
    pub locks_succeeded: u64,
    pub locks_failed: u64,
}

pub struct Monitor<L, S, R> {
    address: HardwareAddress,
    adapter: String,
    match_mode: MatchMode,
    lister: L,
    source: S,
    trigger: LockTrigger<R>,
}

pub type SystemMonitor = Monitor<CommandLister, DbusMonitorSource, SystemRunner>;

impl SystemMonitor {
    /// Monitor backed by the real lister, `dbus-monitor`, and lock commands.
    pub fn from_config(config: &Config) -> Self {
        Monitor::new(
            config,
            CommandLister::new(config.lister.clone()),
            DbusMonitorSource::new(config.monitor.clone()),
            SystemRunner,
        )
    }
}

impl<L, S, R> Monitor<L, S, R>
where
    L: DeviceLister,
    S: SignalSource,
    R: CommandRunner,
{
    pub fn new(config: &Config, lister: L, source: S, runner: R) -> Self {
        Self {
            address: config.address.clone(),
            adapter: config.adapter.clone(),
            match_mode: config.match_mode,
            lister,
            source,
            trigger: LockTrigger::new(runner, config.lock_commands.clone()),
        }
    }

    /// Resolves the device path, logging why resolution failed.
    pub fn resolve(&self) -> Result<BusObjectPath, ResolveError> {
        info!(address = %self.address, "Looking up Bluetooth device");
        resolve(&self.lister, &self.address, &self.adapter, self.match_mode).map_err(|err| {
            match &err {
                ResolveError::Lister { .. } => error!(
                    severity = "critical",
                    error = %err,
                    "Could not run the device lister"
                ),
                ResolveError::NotFound { .. } => error!(
                    severity = "critical",
                    error = %err,
                    "Device not listed; check the address and that it is paired"
                ),
            }
            err
        })
    }

    pub fn run(&self) -> Result<MonitorSummary, MonitorError> {
        let path = self.resolve()?;
        let started_at = Utc::now();

        let lines = self.source.subscribe(&path).map_err(|err| {
            error!(severity = "critical", error = %err, "Could not start the signal monitor");
            err
        })?;
        info!(
            address = %self.address,
            path = %path,
            outcome = "success",
            "Monitoring device connection"
        );

        let mut disconnects = detect_disconnects(lines);
        let mut count: u64 = 0;
        let mut locks_succeeded: u64 = 0;
        let mut locks_failed: u64 = 0;

        while disconnects.next().is_some() {
            count = count.saturating_add(1);
            error!(
                severity = "critical",
                address = %self.address,
                "Bluetooth device disconnected; locking screen"
            );
            if self.trigger.attempt().succeeded() {
                locks_succeeded = locks_succeeded.saturating_add(1);
            } else {
                locks_failed = locks_failed.saturating_add(1);
            }
        }

        let summary = MonitorSummary {
            path,
            started_at,
            ended_at: Utc::now(),
            lines_read: disconnects.lines_read(),
            disconnects: count,
            locks_succeeded,
            locks_failed,
        };
        info!(
            path = %summary.path,
            lines = summary.lines_read,
            disconnects = summary.disconnects,
            locks_succeeded = summary.locks_succeeded,
            locks_failed = summary.locks_failed,
            duration_secs = (summary.ended_at - summary.started_at).num_seconds(),
            "Signal stream ended; monitoring stopped"
        );
        Ok(summary)
    }
}
