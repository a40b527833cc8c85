//! Cycle Driver
//!
//! Runs probe → engine → sleep on a fixed cadence until the shutdown future
//! completes, then releases the outputs exactly once. Cycles are strictly
//! sequential; a reset pulse delays the next probe by its full length.
//!
//! ```text
//! probe() ─▶ engine.transition() ─▶ sleep(interval) ─┐
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//!
//! signal at any point ─▶ release outputs ─▶ exit 0
//! output failure      ─▶ release outputs ─▶ exit non-zero
//! ```

use crate::config::{AlarmConfig, Backend};
use crate::error::{AlarmError, AlarmResult, OutputError};
use crate::escalation::{CycleReport, EscalationEngine};
use crate::heartbeat::{Heartbeat, HttpHeartbeat};
use crate::output::{MemoryDriver, OutputDriver, OutputGuard, SysfsGpio};
use crate::pause::{Pause, TokioPause};
use crate::probe::{HttpProber, Prober};
use crate::signals::ShutdownSignal;
use std::future::Future;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Shutdown signal received
    Interrupted,
    /// Single-cycle mode finished
    Completed,
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: Exit,
    pub cycles: u64,
    pub longest_outage: u64,
}

/// The probe-decide-act loop
pub struct Watchdog<R, D: OutputDriver, P, H> {
    prober: R,
    engine: EscalationEngine<OutputGuard<D>, P, H>,
    interval: Duration,
    cycles: u64,
}

impl<R, D, P, H> Watchdog<R, D, P, H>
where
    R: Prober,
    D: OutputDriver,
    P: Pause,
    H: Heartbeat,
{
    /// Take ownership of the outputs and configure them.
    ///
    /// If configuration fails the driver is released before returning.
    pub fn start(
        prober: R,
        engine: EscalationEngine<D, P, H>,
        interval: Duration,
    ) -> Result<Self, OutputError> {
        let engine = engine.map_driver(OutputGuard::new);
        let mut watchdog = Self {
            prober,
            engine,
            interval,
            cycles: 0,
        };
        watchdog.engine.setup()?;
        Ok(watchdog)
    }

    pub fn engine(&self) -> &EscalationEngine<OutputGuard<D>, P, H> {
        &self.engine
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One probe-decide-act pass
    pub async fn run_cycle(&mut self) -> Result<CycleReport, OutputError> {
        cycle(&self.prober, &mut self.engine, &mut self.cycles).await
    }

    /// Loop until `shutdown` completes or an output fails, then release.
    pub async fn run_until<S>(&mut self, shutdown: S) -> Result<RunSummary, OutputError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("Exiting watchdog");
                    break Ok(Exit::Interrupted);
                }
                result = cycle_then_sleep(&self.prober, &mut self.engine, &mut self.cycles, self.interval) => {
                    if let Err(e) = result {
                        tracing::error!("Output failure, stopping: {e}");
                        break Err(e);
                    }
                }
            }
        };
        self.finish(outcome)
    }

    /// Run exactly one cycle, then release. `shutdown` cuts the cycle short.
    pub async fn run_once<S>(&mut self, shutdown: S) -> Result<RunSummary, OutputError>
    where
        S: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            _ = shutdown => {
                tracing::debug!("Exiting watchdog");
                Ok(Exit::Interrupted)
            }
            result = cycle(&self.prober, &mut self.engine, &mut self.cycles) => {
                result.map(|_| Exit::Completed)
            }
        };
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: Result<Exit, OutputError>) -> Result<RunSummary, OutputError> {
        let released = self.engine.driver_mut().release();
        let exit = outcome?;
        released?;
        Ok(RunSummary {
            exit,
            cycles: self.cycles,
            longest_outage: self.engine.state().longest_outage,
        })
    }
}

async fn cycle<R, D, P, H>(
    prober: &R,
    engine: &mut EscalationEngine<OutputGuard<D>, P, H>,
    cycles: &mut u64,
) -> Result<CycleReport, OutputError>
where
    R: Prober,
    D: OutputDriver,
    P: Pause,
    H: Heartbeat,
{
    let healthy = prober.probe().await;
    let report = engine.transition(healthy).await?;
    *cycles += 1;
    tracing::debug!(
        verdict = %report.verdict,
        count = report.outage_count,
        "Cycle {} complete",
        cycles
    );
    Ok(report)
}

async fn cycle_then_sleep<R, D, P, H>(
    prober: &R,
    engine: &mut EscalationEngine<OutputGuard<D>, P, H>,
    cycles: &mut u64,
    interval: Duration,
) -> Result<(), OutputError>
where
    R: Prober,
    D: OutputDriver,
    P: Pause,
    H: Heartbeat,
{
    cycle(prober, engine, cycles).await?;
    tokio::time::sleep(interval).await;
    Ok(())
}

/// Build the configured output backend
pub fn build_driver(config: &AlarmConfig) -> Box<dyn OutputDriver> {
    match config.gpio.backend {
        Backend::Sysfs => Box::new(SysfsGpio::new(
            config.gpio.sysfs_root.clone(),
            config.gpio.chip_base,
        )),
        Backend::Memory => Box::new(MemoryDriver::new()),
    }
}

/// Run the watchdog described by `config` until interrupted.
///
/// With `once` set, a single cycle runs and the process exits.
pub async fn run(config: AlarmConfig, once: bool) -> AlarmResult<RunSummary> {
    config.validate()?;
    let policy = config.policy()?;

    let prober = HttpProber::new(config.endpoints.clone(), config.probe_timeout())?;
    let heartbeat = HttpHeartbeat::new(config.heartbeat_url.clone(), config.probe_timeout())?;
    let mut signal = ShutdownSignal::install().map_err(AlarmError::Signal)?;

    tracing::debug!(
        endpoints = ?config.endpoints,
        interval_secs = config.check_interval_secs,
        threshold = policy.threshold(),
        "Running"
    );

    let engine = EscalationEngine::new(
        policy,
        config.outputs.clone(),
        build_driver(&config),
        TokioPause,
        heartbeat,
    );
    let mut watchdog = Watchdog::start(prober, engine, config.check_interval())?;

    let summary = if once {
        watchdog.run_once(signal.recv()).await?
    } else {
        watchdog.run_until(signal.recv()).await?
    };
    Ok(summary)
}
