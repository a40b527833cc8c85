//! Escalation Engine — applies the policy to real outputs
//!
//! Owns the outage counter. Each call to [`EscalationEngine::transition`]
//! records the verdict, asks the policy for a [`CyclePlan`] and replays it
//! step by step against the output driver, the pause primitive and the
//! heartbeat. The plan is trusted; read-backs are only logged.

use super::policy::{CyclePlan, EscalationPolicy, Step, Target};
use super::state::{OutageState, OutageSummary, Verdict};
use crate::error::OutputError;
use crate::heartbeat::Heartbeat;
use crate::output::{Level, Output, OutputDriver, OutputGroups};
use crate::pause::Pause;
use serde::Serialize;

/// What a cycle did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub verdict: Verdict,
    /// Counter value after the cycle
    pub outage_count: u64,
    pub extended_trouble: bool,
    pub reset_pulsed: bool,
    /// Set on the first healthy cycle after an outage
    pub recovered: Option<OutageSummary>,
}

impl CycleReport {
    fn from_plan(plan: &CyclePlan, recovered: Option<OutageSummary>) -> Self {
        Self {
            verdict: plan.verdict,
            outage_count: plan.outage_count,
            extended_trouble: plan.asserts_extended_trouble(),
            reset_pulsed: plan.pulses_reset(),
            recovered,
        }
    }
}

/// The outage escalation state machine
pub struct EscalationEngine<D, P, H> {
    policy: EscalationPolicy,
    groups: OutputGroups,
    state: OutageState,
    driver: D,
    pause: P,
    heartbeat: H,
}

impl<D, P, H> EscalationEngine<D, P, H>
where
    D: OutputDriver,
    P: Pause,
    H: Heartbeat,
{
    pub fn new(
        policy: EscalationPolicy,
        groups: OutputGroups,
        driver: D,
        pause: P,
        heartbeat: H,
    ) -> Self {
        Self {
            policy,
            groups,
            state: OutageState::new(),
            driver,
            pause,
            heartbeat,
        }
    }

    /// Replace the counter state, e.g. to resume from a known count in tests
    pub fn with_state(mut self, state: OutageState) -> Self {
        self.state = state;
        self
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    pub fn groups(&self) -> &OutputGroups {
        &self.groups
    }

    pub fn state(&self) -> &OutageState {
        &self.state
    }

    pub fn outage_count(&self) -> u64 {
        self.state.outage_count
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Declare every configured output on the driver
    pub fn setup(&mut self) -> Result<(), OutputError> {
        tracing::debug!("Configuring outputs");
        let all = self.groups.all();
        self.driver.setup(&all)
    }

    /// Run one cycle for a probe verdict.
    ///
    /// A reset pulse holds this call for the full pulse duration. Driver
    /// errors abort the cycle and are returned; there is no partial-failure
    /// policy.
    pub async fn transition(&mut self, healthy: bool) -> Result<CycleReport, OutputError> {
        let verdict = Verdict::from(healthy);
        let recovered = match verdict {
            Verdict::Healthy => self.state.record_recovery(),
            Verdict::Unhealthy => {
                let count = self.state.record_failure();
                tracing::debug!("Connectivity outage, running count: {count}");
                None
            }
        };

        if let Some(summary) = &recovered {
            match summary.duration() {
                Some(d) => tracing::info!(
                    cycles = summary.cycles,
                    seconds = d.num_seconds(),
                    "Connectivity restored"
                ),
                None => tracing::info!(cycles = summary.cycles, "Connectivity restored"),
            }
        }

        let plan = self.policy.plan(verdict, self.state.outage_count);
        if plan.outage_count == self.policy.threshold() {
            tracing::warn!(
                threshold = self.policy.threshold(),
                "Outage threshold reached, asserting extended trouble"
            );
        }

        for step in &plan.steps {
            match *step {
                Step::Drive { target, level } => self.drive(target, level)?,
                Step::Hold(duration) => {
                    tracing::warn!(
                        count = plan.outage_count,
                        "Pulsing reset outputs for {}s",
                        duration.as_secs_f64()
                    );
                    self.pause.pause(duration).await;
                }
                Step::Heartbeat => self.heartbeat.notify().await,
            }
        }

        Ok(CycleReport::from_plan(&plan, recovered))
    }

    fn drive(&mut self, target: Target, level: Level) -> Result<(), OutputError> {
        match target {
            Target::All => {
                tracing::debug!("Set all outputs {level}");
                let all = self.groups.all();
                drive_each(&mut self.driver, &all, level)
            }
            Target::Group(group) => {
                drive_each(&mut self.driver, self.groups.group(group), level)
            }
        }
    }
}

impl<D, P, H> EscalationEngine<D, P, H> {
    /// Swap the driver for a wrapper around it, keeping all other state
    pub fn map_driver<E>(self, f: impl FnOnce(D) -> E) -> EscalationEngine<E, P, H> {
        EscalationEngine {
            policy: self.policy,
            groups: self.groups,
            state: self.state,
            driver: f(self.driver),
            pause: self.pause,
            heartbeat: self.heartbeat,
        }
    }
}

fn drive_each<D: OutputDriver>(
    driver: &mut D,
    outputs: &[Output],
    level: Level,
) -> Result<(), OutputError> {
    for output in outputs {
        driver.command(output, level)?;
    }
    Ok(())
}
