//! Disconnect detection over the signal monitor's line stream.
//!
//! A `PropertiesChanged` dump names a property on one line and carries its
//! value on a later one, with nothing tying the two together:
//!
//! ```text
//! signal time=1700000000.1 sender=:1.4 -> destination=(null destination) ...
//!    string "org.bluez.Device1"
//!    array [
//!       dict entry(
//!          string "Connected"
//!          variant             boolean false
//!       )
//!    ]
//! ```
//!
//! ## State Machine
//!
//! ```text
//! any   + line names "Connected"              → Armed
//! Armed + variant line, "boolean false"       → Idle  (emit DisconnectEvent)
//! Armed + variant line, any other value       → Idle
//! Armed + any other line                      → Idle
//! Idle  + any other line                      → Idle
//! ```
//!
//! `Armed` never outlives the single line that follows the property name.

use tracing::debug;

const CONNECTED_PROPERTY: &str = "string \"Connected\"";
const VARIANT_MARKER: &str = "variant";
const FALSE_VALUE: &str = "boolean false";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectorState {
    #[default]
    Idle,
    /// The previous line named `Connected`; the next value line is its new value.
    Armed,
}

/// The monitored device just went from connected to disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectEvent;

#[derive(Debug, Default)]
pub struct DisconnectDetector {
    state: DetectorState,
}

impl DisconnectDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Advances the machine by one line.
    pub fn feed(&mut self, line: &str) -> Option<DisconnectEvent> {
        let (next, event) = transition(self.state, line);
        self.state = next;
        event
    }
}

fn transition(state: DetectorState, line: &str) -> (DetectorState, Option<DisconnectEvent>) {
    if line.contains(CONNECTED_PROPERTY) {
        return (DetectorState::Armed, None);
    }

    match state {
        DetectorState::Armed if line.contains(VARIANT_MARKER) => {
            let event = line.contains(FALSE_VALUE).then_some(DisconnectEvent);
            (DetectorState::Idle, event)
        }
        _ => (DetectorState::Idle, None),
    }
}

/// Lazily maps a line sequence to the disconnects it contains.
pub struct Disconnects<I> {
    lines: I,
    detector: DisconnectDetector,
    lines_read: u64,
}

pub fn detect_disconnects<I>(lines: I) -> Disconnects<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Disconnects {
        lines: lines.into_iter(),
        detector: DisconnectDetector::new(),
        lines_read: 0,
    }
}

impl<I> Disconnects<I> {
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn state(&self) -> DetectorState {
        self.detector.state()
    }
}

impl<I> Iterator for Disconnects<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = DisconnectEvent;

    fn next(&mut self) -> Option<DisconnectEvent> {
        for line in self.lines.by_ref() {
            let line = line.as_ref();
            self.lines_read = self.lines_read.saturating_add(1);
            debug!(line = %line, "Signal line");
            if let Some(event) = self.detector.feed(line) {
                return Some(event);
            }
        }
        None
    }
}
