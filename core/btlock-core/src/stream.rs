//! Line streams from the signal monitor.
//!
//! `dbus-monitor` prints each `PropertiesChanged` signal as a loosely indented
//! dump over several lines. We expose its stdout as a lazy, forward-only
//! iterator of lines that ends when the pipe closes.

use crate::address::BusObjectPath;
use crate::command::CommandSpec;
use crate::error::MonitorError;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

pub type EventLines = Box<dyn Iterator<Item = String>>;

pub trait SignalSource {
    /// Starts watching property changes on `path`.
    fn subscribe(&self, path: &BusObjectPath) -> Result<EventLines, MonitorError>;
}

/// Match rule selecting `PropertiesChanged` signals for exactly one object.
pub fn match_rule(path: &BusObjectPath) -> String {
    format!(
        "type='signal',interface='org.freedesktop.DBus.Properties',member='PropertiesChanged',path={}",
        path
    )
}

pub fn default_monitor() -> CommandSpec {
    CommandSpec::new("dbus-monitor", ["--system", "{match_rule}"])
}

/// Spawns `dbus-monitor` (or a configured stand-in). Arguments may contain
/// `{match_rule}` and `{path}` placeholders.
#[derive(Debug, Clone)]
pub struct DbusMonitorSource {
    spec: CommandSpec,
}

impl DbusMonitorSource {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl Default for DbusMonitorSource {
    fn default() -> Self {
        Self::new(default_monitor())
    }
}

impl SignalSource for DbusMonitorSource {
    fn subscribe(&self, path: &BusObjectPath) -> Result<EventLines, MonitorError> {
        let rule = match_rule(path);
        let spec = self
            .spec
            .substitute(&[("match_rule", rule.as_str()), ("path", path.as_str())]);
        debug!(command = %spec, "Starting signal monitor");

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| MonitorError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MonitorError::NoStdout {
                program: spec.program,
            });
        };

        Ok(Box::new(LineStream::from_child(child, stdout)))
    }
}

/// Iterator over the lines of a reader, optionally owning the producing child.
///
/// Invalid UTF-8 is decoded lossily. EOF or a read error ends the stream for
/// good; dropping the stream kills and reaps the child.
pub struct LineStream<R> {
    reader: R,
    child: Option<Child>,
    finished: bool,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineStream<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            child: None,
            finished: false,
            buffer: Vec::new(),
        }
    }
}

impl LineStream<BufReader<ChildStdout>> {
    pub fn from_child(child: Child, stdout: ChildStdout) -> Self {
        Self {
            reader: BufReader::new(stdout),
            child: Some(child),
            finished: false,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LineStream<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => {
                    debug!("Signal stream closed");
                    self.finished = true;
                    return None;
                }
                Ok(_) => return Some(decode_line(&self.buffer)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "Signal stream read failed; ending stream");
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

impl<R> Drop for LineStream<R> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
