//! Scoped ownership of an output driver
//!
//! `OutputGuard` runs `shutdown()` exactly once: either explicitly through
//! [`OutputGuard::release`] or on drop, so hardware is released on every
//! exit path including early returns and unwinding.

use super::{Level, Output, OutputDriver};
use crate::error::OutputError;
use std::ops::{Deref, DerefMut};

pub struct OutputGuard<D: OutputDriver> {
    driver: D,
    released: bool,
}

impl<D: OutputDriver> OutputGuard<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            released: false,
        }
    }

    /// Shut the driver down now and report the outcome
    pub fn release(&mut self) -> Result<(), OutputError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        tracing::debug!("Releasing outputs");
        self.driver.shutdown()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<D: OutputDriver> Deref for OutputGuard<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.driver
    }
}

impl<D: OutputDriver> DerefMut for OutputGuard<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: OutputDriver> OutputDriver for OutputGuard<D> {
    fn configure(&mut self, outputs: &[Output]) -> Result<(), OutputError> {
        self.driver.configure(outputs)
    }

    fn set(&mut self, output: &Output, level: Level) -> Result<(), OutputError> {
        self.driver.set(output, level)
    }

    fn read(&mut self, output: &Output) -> Result<Level, OutputError> {
        self.driver.read(output)
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        self.release()
    }
}

impl<D: OutputDriver> Drop for OutputGuard<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!("Output cleanup failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryDriver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingDriver(Arc<AtomicUsize>);

    impl OutputDriver for CountingDriver {
        fn configure(&mut self, _: &[Output]) -> Result<(), OutputError> {
            Ok(())
        }
        fn set(&mut self, _: &Output, _: Level) -> Result<(), OutputError> {
            Ok(())
        }
        fn read(&mut self, _: &Output) -> Result<Level, OutputError> {
            Ok(Level::Low)
        }
        fn shutdown(&mut self) -> Result<(), OutputError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_drop_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _guard = OutputGuard::new(CountingDriver(count.clone()));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_is_not_repeated_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let mut guard = OutputGuard::new(CountingDriver(count.clone()));
            guard.release().unwrap();
            guard.shutdown().unwrap();
            assert!(guard.is_released());
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_delegates_commands() {
        let mut guard = OutputGuard::new(MemoryDriver::new());
        let out = Output::new("LED", 17);
        guard.setup(std::slice::from_ref(&out)).unwrap();
        guard.command(&out, Level::High).unwrap();
        assert_eq!(guard.level(17), Some(Level::High));
    }
}
