//! Network Alarm — connectivity watchdog for unattended panels
//!
//! Probes a list of endpoints on a fixed cadence and drives physical
//! outputs from an escalating outage policy:
//! - **trouble** outputs on the first failed cycle
//! - **extended trouble** outputs once the outage reaches the threshold
//! - a timed **reset** pulse (e.g. power-cycling a modem) on every multiple
//!   of the threshold
//!
//! A healthy cycle clears everything and optionally pings a push monitor.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults against /sys/class/gpio
//! net-alarm
//!
//! # Run from a config file with debug logging
//! net-alarm --config /etc/net-alarm.toml --verbose
//!
//! # Bench test without touching GPIO, one cycle
//! net-alarm --dry-run --once
//! ```

pub mod config;
pub mod error;
pub mod escalation;
pub mod heartbeat;
pub mod output;
pub mod pause;
pub mod probe;
pub mod runner;
pub mod signals;
pub mod telemetry;

pub use config::AlarmConfig;
pub use error::{AlarmError, AlarmResult, ConfigError, OutputError};
pub use escalation::{CycleReport, EscalationEngine, EscalationPolicy, OutageState};
pub use output::{Level, Output, OutputDriver, OutputGroup, OutputGroups};
pub use runner::{run, Exit, RunSummary, Watchdog};
