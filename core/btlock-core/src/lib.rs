//! # btlock-core
//!
//! Watches one paired Bluetooth device on the system bus and locks the screen
//! when it disconnects.
//!
//! ## Pipeline
//!
//! ```text
//! address ─resolve─▶ object path ─subscribe─▶ lines ─detect─▶ disconnects ─▶ lock cascade
//! ```
//!
//! - **Synchronous**: one thread of control, no async runtime.
//! - **Collaborators behind traits**: [`DeviceLister`], [`SignalSource`] and
//!   [`CommandRunner`] have command-backed implementations and can be swapped
//!   for canned doubles.
//! - **Logging**: the library only emits `tracing` events; installing a
//!   subscriber is up to the caller.
//!
//! ```rust,ignore
//! use btlock_core::{Config, Overrides, SystemMonitor};
//!
//! let config = Config::load(None, Overrides::default())?;
//! let summary = SystemMonitor::from_config(&config).run()?;
//! ```

pub mod address;
pub mod cascade;
pub mod command;
pub mod config;
pub mod detector;
pub mod error;
pub mod lock;
pub mod monitor;
pub mod resolver;
pub mod stream;

pub use address::{BusObjectPath, HardwareAddress, DEFAULT_ADAPTER};
pub use cascade::{first_success, CascadeReport};
pub use command::CommandSpec;
pub use config::{default_config_path, load_file_config, Config, FileConfig, Overrides};
pub use detector::{detect_disconnects, DetectorState, DisconnectDetector, DisconnectEvent};
pub use error::{AddressError, ConfigError, LockError, MonitorError, ResolveError};
pub use lock::{default_lock_commands, CommandRunner, LockReport, LockTrigger, SystemRunner};
pub use monitor::{Monitor, MonitorSummary, SystemMonitor};
pub use resolver::{CommandLister, DeviceLister, MatchMode};
pub use stream::{DbusMonitorSource, EventLines, LineStream, SignalSource};
