//! Output Driver — pin-addressed binary outputs
//!
//! Outputs are configured once at startup and grouped into the three
//! escalation groups. A driver only moves lines; it carries no policy.
//!
//! ```text
//! trouble           ── asserted on every failed cycle
//! extended_trouble  ── latched once the outage count reaches the threshold
//! reset             ── pulsed High→Low on every threshold multiple
//! ```
//!
//! Every command is followed by a read-back that is logged and returned,
//! but never used for control decisions.

pub mod guard;
pub mod memory;
pub mod sysfs;

pub use guard::OutputGuard;
pub use memory::{Command, MemoryDriver};
pub use sysfs::{SysfsGpio, SYSFS_GPIO_ROOT};

use crate::error::OutputError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A named physical output line. Identity is the pin address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Human-readable label used in logs
    pub name: String,
    /// BCM pin number
    pub pin: u32,
}

impl Output {
    pub fn new(name: impl Into<String>, pin: u32) -> Self {
        Self {
            name: name.into(),
            pin,
        }
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.pin == other.pin
    }
}

impl Eq for Output {}

impl Hash for Output {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pin.hash(state);
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.pin)
    }
}

/// Logic level of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Parse a raw `0`/`1` line value
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(Self::High),
            "0" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> &'static str {
        match self {
            Self::High => "1",
            Self::Low => "0",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "on"),
            Self::Low => write!(f, "off"),
        }
    }
}

/// The three escalation groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputGroup {
    Trouble,
    ExtendedTrouble,
    Reset,
}

impl std::fmt::Display for OutputGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trouble => write!(f, "trouble"),
            Self::ExtendedTrouble => write!(f, "extended_trouble"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Configured outputs partitioned by group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputGroups {
    #[serde(default)]
    pub trouble: Vec<Output>,
    #[serde(default)]
    pub extended_trouble: Vec<Output>,
    #[serde(default)]
    pub reset: Vec<Output>,
}

impl OutputGroups {
    /// Outputs belonging to one group
    pub fn group(&self, group: OutputGroup) -> &[Output] {
        match group {
            OutputGroup::Trouble => &self.trouble,
            OutputGroup::ExtendedTrouble => &self.extended_trouble,
            OutputGroup::Reset => &self.reset,
        }
    }

    /// Union of every group, in trouble → extended → reset order
    pub fn all(&self) -> Vec<Output> {
        self.trouble
            .iter()
            .chain(&self.extended_trouble)
            .chain(&self.reset)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.trouble.is_empty() && self.extended_trouble.is_empty() && self.reset.is_empty()
    }
}

/// A set of addressable binary outputs.
///
/// Implementations must be serialized by the caller; the watchdog only ever
/// drives one command at a time so read-after-write ordering holds.
pub trait OutputDriver: Send {
    /// Declare every line as a digital output. Called exactly once.
    fn configure(&mut self, outputs: &[Output]) -> Result<(), OutputError>;

    /// Drive a line to `level`
    fn set(&mut self, output: &Output, level: Level) -> Result<(), OutputError>;

    /// Read the current level of a line
    fn read(&mut self, output: &Output) -> Result<Level, OutputError>;

    /// Drive every configured line Low and release it
    fn shutdown(&mut self) -> Result<(), OutputError>;

    /// Configure and log the initial state of each line
    fn setup(&mut self, outputs: &[Output]) -> Result<(), OutputError> {
        self.configure(outputs)?;
        for output in outputs {
            let present = self.read(output)?;
            tracing::debug!(output = %output, state = %present, "Output configured");
        }
        Ok(())
    }

    /// Drive a line, then read it back for the log
    fn command(&mut self, output: &Output, level: Level) -> Result<Level, OutputError> {
        self.set(output, level)?;
        let readback = self.read(output)?;
        tracing::debug!(output = %output, commanded = %level, state = %readback, "Output set");
        Ok(readback)
    }
}

impl<D: OutputDriver + ?Sized> OutputDriver for Box<D> {
    fn configure(&mut self, outputs: &[Output]) -> Result<(), OutputError> {
        (**self).configure(outputs)
    }

    fn set(&mut self, output: &Output, level: Level) -> Result<(), OutputError> {
        (**self).set(output, level)
    }

    fn read(&mut self, output: &Output) -> Result<Level, OutputError> {
        (**self).read(output)
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        (**self).shutdown()
    }
}
