//! In-memory output driver
//!
//! Keeps line levels in a map and records every command. Used for
//! `--dry-run` and as the command-recording stub in tests.

use super::{Level, Output, OutputDriver};
use crate::error::OutputError;
use std::collections::{BTreeMap, BTreeSet};

/// A single recorded `set` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub pin: u32,
    pub level: Level,
}

/// Output driver that never touches hardware
#[derive(Debug, Default)]
pub struct MemoryDriver {
    levels: BTreeMap<u32, Level>,
    history: Vec<Command>,
    configured: bool,
    shut_down: bool,
    failing: BTreeSet<u32>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command on `pin` fail, as if the line were missing
    pub fn fail_on(mut self, pin: u32) -> Self {
        self.failing.insert(pin);
        self
    }

    /// Current level of a configured pin
    pub fn level(&self, pin: u32) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Every `set` call in order
    pub fn history(&self) -> &[Command] {
        &self.history
    }

    /// `set` calls on a single pin, in order
    pub fn history_for(&self, pin: u32) -> Vec<Level> {
        self.history
            .iter()
            .filter(|c| c.pin == pin)
            .map(|c| c.level)
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn check(&self, output: &Output, operation: &'static str) -> Result<(), OutputError> {
        if self.failing.contains(&output.pin) {
            return Err(OutputError::line(
                &output.name,
                output.pin,
                operation,
                std::io::Error::new(std::io::ErrorKind::NotFound, "line unavailable"),
            ));
        }
        if !self.levels.contains_key(&output.pin) {
            return Err(OutputError::NotConfigured {
                name: output.name.clone(),
                pin: output.pin,
            });
        }
        Ok(())
    }
}

impl OutputDriver for MemoryDriver {
    fn configure(&mut self, outputs: &[Output]) -> Result<(), OutputError> {
        if self.configured {
            return Err(OutputError::AlreadyConfigured);
        }
        for output in outputs {
            self.levels.insert(output.pin, Level::Low);
            self.check(output, "configure")?;
        }
        self.configured = true;
        Ok(())
    }

    fn set(&mut self, output: &Output, level: Level) -> Result<(), OutputError> {
        self.check(output, "set")?;
        self.levels.insert(output.pin, level);
        self.history.push(Command {
            pin: output.pin,
            level,
        });
        Ok(())
    }

    fn read(&mut self, output: &Output) -> Result<Level, OutputError> {
        self.check(output, "read")?;
        Ok(self.levels[&output.pin])
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        for level in self.levels.values_mut() {
            *level = Level::Low;
        }
        self.shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_before_configure_fails() {
        let mut driver = MemoryDriver::new();
        let err = driver.set(&Output::new("x", 4), Level::High).unwrap_err();
        assert!(matches!(err, OutputError::NotConfigured { pin: 4, .. }));
    }

    #[test]
    fn test_configure_twice_fails() {
        let mut driver = MemoryDriver::new();
        driver.configure(&[Output::new("x", 4)]).unwrap();
        assert!(matches!(
            driver.configure(&[Output::new("x", 4)]),
            Err(OutputError::AlreadyConfigured)
        ));
    }

    #[test]
    fn test_shutdown_drives_everything_low() {
        let mut driver = MemoryDriver::new();
        let a = Output::new("a", 1);
        let b = Output::new("b", 2);
        driver.configure(&[a.clone(), b.clone()]).unwrap();
        driver.set(&a, Level::High).unwrap();
        driver.set(&b, Level::High).unwrap();

        driver.shutdown().unwrap();

        assert!(driver.is_shut_down());
        assert_eq!(driver.level(1), Some(Level::Low));
        assert_eq!(driver.level(2), Some(Level::Low));
    }

    #[test]
    fn test_failing_pin_reports_line_error() {
        let mut driver = MemoryDriver::new().fail_on(9);
        let err = driver.configure(&[Output::new("Relay", 9)]).unwrap_err();
        assert!(err.to_string().contains("Relay (pin 9)"), "{err}");
    }
}
