//! btlock: lock the screen when a paired Bluetooth device disconnects.
//!
//! ## Subcommands
//!
//! - `watch` (default): resolve the device, follow its `Connected` property
//!   and run the lock cascade on every disconnect
//! - `resolve`: print the device's bus object path
//! - `lock`: run the lock cascade once

mod logging;

use btlock_core::{
    load_file_config, Config, ConfigError, LockTrigger, Overrides, SystemMonitor, SystemRunner,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "btlock")]
#[command(about = "Lock the screen when a paired Bluetooth device disconnects")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/btlock/config.toml)
    #[arg(long, env = "BTLOCK_CONFIG", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Device address, e.g. 80:04:5F:73:B2:90
    #[arg(long, env = "BTLOCK_ADDRESS", value_name = "MAC", global = true)]
    address: Option<String>,

    /// Bluetooth controller the device lives under (default: hci0)
    #[arg(long, env = "BTLOCK_ADAPTER", value_name = "ID", global = true)]
    adapter: Option<String>,

    /// Match the address against whole fields of the device listing
    #[arg(long, global = true)]
    exact_match: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Monitor the device and lock the screen when it disconnects
    Watch,

    /// Print the device's bus object path and exit
    Resolve,

    /// Run the lock cascade once and exit
    Lock,
}

fn main() -> ExitCode {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    let file = match load_file_config(cli.config.as_deref()) {
        Ok(file) => file,
        Err(err) => return config_failure(&err),
    };
    let overrides = Overrides {
        address: cli.address,
        adapter: cli.adapter,
        exact_match: cli.exact_match,
    };

    // Failures below are already logged by the library.
    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => match Config::resolve(file, overrides) {
            Ok(config) => match SystemMonitor::from_config(&config).run() {
                Ok(_) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            },
            Err(err) => config_failure(&err),
        },
        Commands::Resolve => match Config::resolve(file, overrides) {
            Ok(config) => match SystemMonitor::from_config(&config).resolve() {
                Ok(path) => {
                    println!("{}", path);
                    ExitCode::SUCCESS
                }
                Err(_) => ExitCode::FAILURE,
            },
            Err(err) => config_failure(&err),
        },
        // The cascade acts on the session, so no device address is needed.
        Commands::Lock => {
            let trigger = LockTrigger::new(SystemRunner, file.lock_commands_or_default());
            if trigger.attempt().succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn config_failure(err: &ConfigError) -> ExitCode {
    tracing::error!(severity = "critical", error = %err, "Invalid configuration");
    ExitCode::FAILURE
}
