//! Screen-lock cascade.
//!
//! Mechanisms are ordered from most desktop-specific to most generic; the first
//! one that exits successfully wins. Only exit status is inspected.

use crate::cascade::first_success;
use crate::command::CommandSpec;
use crate::error::LockError;
use std::process::{Command, Stdio};
use tracing::{error, info};

/// Built-in lock mechanisms, in attempt order.
pub fn default_lock_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new(
            "dbus-send",
            [
                "--session",
                "--dest=org.gnome.ScreenSaver",
                "/org/gnome/ScreenSaver",
                "org.gnome.ScreenSaver.Lock",
            ],
        ),
        CommandSpec::new("loginctl", ["lock-sessions"]),
        CommandSpec::new("dm-tool", ["lock"]),
        CommandSpec::new("swayidle", ["timeout", "1", "loginctl lock-sessions"]),
    ]
}

pub trait CommandRunner {
    /// Runs `command` to completion; `Ok` means it exited successfully.
    fn run(&self, command: &CommandSpec) -> Result<(), LockError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), LockError> {
        // Waits for the mechanism itself, not for children that keep its stdio open.
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| LockError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(LockError::Exited {
                program: command.program.clone(),
                code: status.code(),
            })
        }
    }
}

#[derive(Debug)]
pub struct LockAttempt {
    pub command: CommandSpec,
    pub result: Result<(), LockError>,
}

#[derive(Debug)]
pub struct LockReport {
    pub attempts: Vec<LockAttempt>,
    winner: Option<usize>,
}

impl LockReport {
    pub fn succeeded(&self) -> bool {
        self.winner.is_some()
    }

    /// The mechanism that locked the screen.
    pub fn winner(&self) -> Option<&CommandSpec> {
        self.winner
            .and_then(|index| self.attempts.get(index))
            .map(|attempt| &attempt.command)
    }
}

pub struct LockTrigger<R> {
    runner: R,
    commands: Vec<CommandSpec>,
}

impl<R: CommandRunner> LockTrigger<R> {
    pub fn new(runner: R, commands: Vec<CommandSpec>) -> Self {
        Self { runner, commands }
    }

    /// Runs the cascade once. All mechanisms failing is logged, never raised.
    pub fn attempt(&self) -> LockReport {
        error!(severity = "critical", count = self.commands.len(), "Trying screen lock mechanisms");

        let cascade = first_success(&self.commands, |command| {
            info!(command = %command, "Trying lock mechanism");
            let result = self.runner.run(command);
            match &result {
                Ok(()) => info!(program = %command.program, outcome = "success", "Screen locked"),
                Err(err) => error!(program = %command.program, error = %err, "Lock mechanism failed"),
            }
            result
        });
        let cascade_winner = cascade.winner();

        let attempts: Vec<LockAttempt> = self
            .commands
            .iter()
            .zip(cascade.results)
            .map(|(command, result)| LockAttempt {
                command: command.clone(),
                result,
            })
            .collect();

        let report = LockReport {
            attempts,
            winner: cascade_winner,
        };
        if !report.succeeded() {
            error!(
                severity = "critical",
                attempts = report.attempts.len(),
                "All screen lock mechanisms failed; check the session configuration"
            );
        }
        report
    }
}
