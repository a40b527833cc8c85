//! Linux sysfs GPIO backend
//!
//! Drives lines through `/sys/class/gpio`: `export`, `gpioN/direction`,
//! `gpioN/value` and `unexport`. The sysfs line number is the BCM pin plus
//! `chip_base`, which is non-zero on kernels that number the SoC bank from
//! an offset.

use super::{Level, Output, OutputDriver};
use crate::error::OutputError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default sysfs GPIO root
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// sysfs-backed output driver
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    chip_base: u32,
    /// pin → (name, exported by us)
    lines: BTreeMap<u32, (String, bool)>,
    configured: bool,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>, chip_base: u32) -> Self {
        Self {
            root: root.into(),
            chip_base,
            lines: BTreeMap::new(),
            configured: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line(&self, pin: u32) -> u32 {
        self.chip_base + pin
    }

    fn line_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", self.line(pin)))
    }

    fn ensure_configured(&self, output: &Output) -> Result<(), OutputError> {
        if self.lines.contains_key(&output.pin) {
            Ok(())
        } else {
            Err(OutputError::NotConfigured {
                name: output.name.clone(),
                pin: output.pin,
            })
        }
    }

    /// Drive the line Low and unexport it if we exported it. The unexport is
    /// attempted even when the value write fails.
    fn release(&self, pin: u32, name: &str, exported: bool) -> Result<(), OutputError> {
        let lowered = fs::write(self.line_dir(pin).join("value"), Level::Low.as_raw())
            .map_err(|e| OutputError::line(name, pin, "shutdown", e));
        if exported {
            fs::write(self.root.join("unexport"), self.line(pin).to_string())
                .map_err(|e| OutputError::line(name, pin, "unexport", e))?;
        }
        lowered
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(SYSFS_GPIO_ROOT, 0)
    }
}

impl OutputDriver for SysfsGpio {
    fn configure(&mut self, outputs: &[Output]) -> Result<(), OutputError> {
        if self.configured {
            return Err(OutputError::AlreadyConfigured);
        }
        if let Err(source) = fs::metadata(&self.root) {
            return Err(OutputError::Unavailable {
                path: self.root.clone(),
                source,
            });
        }
        tracing::debug!(
            root = %self.root.display(),
            chip_base = self.chip_base,
            "Using sysfs GPIO numbering"
        );

        for output in outputs {
            if self.chip_base.checked_add(output.pin).is_none() {
                return Err(OutputError::line(
                    &output.name,
                    output.pin,
                    "export",
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("chip_base {} + pin overflows", self.chip_base),
                    ),
                ));
            }
            let dir = self.line_dir(output.pin);
            let exported = !dir.exists();
            if exported {
                fs::write(self.root.join("export"), self.line(output.pin).to_string())
                    .map_err(|e| OutputError::line(&output.name, output.pin, "export", e))?;
            }
            // tracked before direction so a half-configured line is still released
            self.lines.insert(output.pin, (output.name.clone(), exported));
            fs::write(dir.join("direction"), "out")
                .map_err(|e| OutputError::line(&output.name, output.pin, "direction", e))?;
        }
        self.configured = true;
        Ok(())
    }

    fn set(&mut self, output: &Output, level: Level) -> Result<(), OutputError> {
        self.ensure_configured(output)?;
        fs::write(self.line_dir(output.pin).join("value"), level.as_raw())
            .map_err(|e| OutputError::line(&output.name, output.pin, "set", e))
    }

    fn read(&mut self, output: &Output) -> Result<Level, OutputError> {
        self.ensure_configured(output)?;
        let raw = fs::read_to_string(self.line_dir(output.pin).join("value"))
            .map_err(|e| OutputError::line(&output.name, output.pin, "read", e))?;
        Level::from_raw(&raw).ok_or_else(|| OutputError::UnreadableState {
            name: output.name.clone(),
            pin: output.pin,
            raw: raw.trim().to_string(),
        })
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        let mut first_err = None;
        for (pin, (name, exported)) in std::mem::take(&mut self.lines) {
            if let Err(e) = self.release(pin, &name, exported) {
                tracing::warn!("Failed to release output {name} ({pin}): {e}");
                first_err.get_or_insert(e);
            }
        }
        self.configured = false;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
