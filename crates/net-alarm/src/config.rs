//! Static watchdog configuration
//!
//! Layering, later wins: built-in defaults, TOML file, `NET_ALARM_*`
//! environment variables, command-line flags. Loaded once at startup and
//! never reloaded.

use crate::error::ConfigError;
use crate::escalation::EscalationPolicy;
use crate::output::{Output, OutputGroups, SYSFS_GPIO_ROOT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which output driver to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Linux sysfs GPIO
    #[default]
    Sysfs,
    /// In-memory lines, no hardware
    Memory,
}

/// GPIO backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    pub backend: Backend,
    pub sysfs_root: PathBuf,
    /// Added to each BCM pin to get the sysfs line number
    pub chip_base: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sysfs,
            sysfs_root: PathBuf::from(SYSFS_GPIO_ROOT),
            chip_base: 0,
        }
    }
}

/// Top-level watchdog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmConfig {
    /// Probe targets, tried in order; all must fail to count as an outage
    pub endpoints: Vec<String>,
    /// Push monitor pinged on healthy cycles
    pub heartbeat_url: Option<String>,
    /// Seconds between cycles
    pub check_interval_secs: u64,
    /// Per-endpoint request timeout in seconds
    pub probe_timeout_secs: u64,
    /// Outage count that triggers extended trouble and reset pulses
    pub threshold: u64,
    /// Seconds the reset group stays High on a pulse
    pub reset_pulse_secs: u64,
    pub verbose: bool,
    pub outputs: OutputGroups,
    pub gpio: GpioConfig,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://www.google.com".to_string(),
                "https://www.cloudflare.com".to_string(),
            ],
            heartbeat_url: None,
            check_interval_secs: 60,
            probe_timeout_secs: 3,
            threshold: 10,
            reset_pulse_secs: 15,
            verbose: false,
            outputs: OutputGroups {
                trouble: vec![
                    Output::new("Green/Yellow LED", 17),
                    Output::new("Trouble Supervisory Zone", 22),
                ],
                extended_trouble: vec![Output::new("Red LED", 27)],
                reset: vec![Output::new("Reset Output", 23)],
            },
            gpio: GpioConfig::default(),
        }
    }
}

impl AlarmConfig {
    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Apply `NET_ALARM_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("NET_ALARM_ENDPOINTS") {
            self.endpoints = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = lookup("NET_ALARM_HEARTBEAT_URL") {
            self.heartbeat_url = (!url.trim().is_empty()).then(|| url.trim().to_string());
        }
        if let Some(v) = lookup("NET_ALARM_CHECK_INTERVAL_SECS") {
            self.check_interval_secs = parse_env("NET_ALARM_CHECK_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("NET_ALARM_PROBE_TIMEOUT_SECS") {
            self.probe_timeout_secs = parse_env("NET_ALARM_PROBE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("NET_ALARM_THRESHOLD") {
            self.threshold = parse_env("NET_ALARM_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("NET_ALARM_RESET_PULSE_SECS") {
            self.reset_pulse_secs = parse_env("NET_ALARM_RESET_PULSE_SECS", &v)?;
        }
        if let Some(v) = lookup("NET_ALARM_VERBOSE") {
            self.verbose = parse_flag("NET_ALARM_VERBOSE", &v)?;
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn reset_pulse(&self) -> Duration {
        Duration::from_secs(self.reset_pulse_secs)
    }

    pub fn policy(&self) -> Result<EscalationPolicy, ConfigError> {
        EscalationPolicy::new(self.threshold, self.reset_pulse())
    }

    /// Reject configurations the watchdog cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::invalid("at least one endpoint is required"));
        }
        if self.threshold == 0 {
            return Err(ConfigError::invalid("threshold must be at least 1"));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::invalid("check_interval_secs must be positive"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::invalid("probe_timeout_secs must be positive"));
        }
        if self.outputs.is_empty() {
            return Err(ConfigError::invalid("no outputs configured"));
        }

        let mut seen: HashMap<u32, &str> = HashMap::new();
        for output in self
            .outputs
            .trouble
            .iter()
            .chain(&self.outputs.extended_trouble)
            .chain(&self.outputs.reset)
        {
            if self.gpio.chip_base.checked_add(output.pin).is_none() {
                return Err(ConfigError::invalid(format!(
                    "pin {} overflows with chip_base {}",
                    output.pin, self.gpio.chip_base
                )));
            }
            if let Some(previous) = seen.insert(output.pin, &output.name) {
                return Err(ConfigError::invalid(format!(
                    "pin {} assigned to both '{}' and '{}'",
                    output.pin, previous, output.name
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// `true`/`false` in any case, or `1`/`0`
fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Env {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
