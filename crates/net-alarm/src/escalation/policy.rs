//! Escalation Policy — the pure outage → output decision
//!
//! Given the outage count *after* a verdict has been recorded, produce the
//! ordered list of steps for the cycle. No I/O happens here; the engine
//! replays the plan against the driver.
//!
//! ```text
//! healthy              all → Low, heartbeat
//! unhealthy, n < T     trouble → High
//! unhealthy, n >= T    trouble → High, extended_trouble → High
//! unhealthy, n % T = 0 ... then reset → High, hold(pulse), reset → Low
//! ```
//!
//! Extended trouble and reset are never lowered on a failed cycle. They latch
//! until the next healthy verdict clears every output at once.

use super::state::Verdict;
use crate::error::ConfigError;
use crate::output::{Level, OutputGroup};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which outputs a step addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Union of every group
    All,
    Group(OutputGroup),
}

/// One effect in a cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Drive { target: Target, level: Level },
    /// Block the cycle for the given duration
    Hold(Duration),
    /// Push to the heartbeat monitor
    Heartbeat,
}

/// Everything one cycle will do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePlan {
    pub verdict: Verdict,
    /// Counter value after this cycle
    pub outage_count: u64,
    pub steps: Vec<Step>,
}

impl CyclePlan {
    /// Whether extended trouble is asserted this cycle
    pub fn asserts_extended_trouble(&self) -> bool {
        self.drives(OutputGroup::ExtendedTrouble, Level::High)
    }

    /// Whether this cycle pulses the reset group
    pub fn pulses_reset(&self) -> bool {
        self.drives(OutputGroup::Reset, Level::High)
    }

    fn drives(&self, group: OutputGroup, level: Level) -> bool {
        self.steps.iter().any(|s| {
            *s == Step::Drive {
                target: Target::Group(group),
                level,
            }
        })
    }
}

/// Threshold and pulse timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscalationPolicy {
    threshold: u64,
    reset_pulse: Duration,
}

impl EscalationPolicy {
    /// `threshold` must be at least 1
    pub fn new(threshold: u64, reset_pulse: Duration) -> Result<Self, ConfigError> {
        if threshold == 0 {
            return Err(ConfigError::invalid("threshold must be at least 1"));
        }
        Ok(Self {
            threshold,
            reset_pulse,
        })
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn reset_pulse(&self) -> Duration {
        self.reset_pulse
    }

    /// Whether `count` lands on a threshold multiple
    pub fn is_reset_cycle(&self, count: u64) -> bool {
        count > 0 && count % self.threshold == 0
    }

    /// Plan the cycle for `verdict`, where `outage_count` is the counter
    /// value after the verdict was recorded.
    pub fn plan(&self, verdict: Verdict, outage_count: u64) -> CyclePlan {
        let steps = match verdict {
            Verdict::Healthy => vec![
                Step::Drive {
                    target: Target::All,
                    level: Level::Low,
                },
                Step::Heartbeat,
            ],
            Verdict::Unhealthy => self.outage_steps(outage_count),
        };
        CyclePlan {
            verdict,
            outage_count,
            steps,
        }
    }

    fn outage_steps(&self, count: u64) -> Vec<Step> {
        let mut steps = vec![Step::Drive {
            target: Target::Group(OutputGroup::Trouble),
            level: Level::High,
        }];

        if count >= self.threshold {
            steps.push(Step::Drive {
                target: Target::Group(OutputGroup::ExtendedTrouble),
                level: Level::High,
            });

            if self.is_reset_cycle(count) {
                steps.push(Step::Drive {
                    target: Target::Group(OutputGroup::Reset),
                    level: Level::High,
                });
                steps.push(Step::Hold(self.reset_pulse));
                steps.push(Step::Drive {
                    target: Target::Group(OutputGroup::Reset),
                    level: Level::Low,
                });
            }
        }
        steps
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            threshold: 10,
            reset_pulse: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(threshold: u64) -> EscalationPolicy {
        EscalationPolicy::new(threshold, Duration::from_secs(15)).unwrap()
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(EscalationPolicy::new(0, Duration::ZERO).is_err());
    }

    #[test]
    fn test_healthy_clears_all_then_heartbeat() {
        let plan = policy(3).plan(Verdict::Healthy, 0);
        assert_eq!(
            plan.steps,
            vec![
                Step::Drive {
                    target: Target::All,
                    level: Level::Low
                },
                Step::Heartbeat,
            ]
        );
    }

    #[test]
    fn test_below_threshold_only_trouble() {
        let p = policy(3);
        for count in 1..3 {
            let plan = p.plan(Verdict::Unhealthy, count);
            assert_eq!(
                plan.steps,
                vec![Step::Drive {
                    target: Target::Group(OutputGroup::Trouble),
                    level: Level::High
                }]
            );
            assert!(!plan.asserts_extended_trouble());
        }
    }

    #[test]
    fn test_threshold_multiple_pulses_in_order() {
        let plan = policy(3).plan(Verdict::Unhealthy, 6);
        assert_eq!(
            plan.steps,
            vec![
                Step::Drive {
                    target: Target::Group(OutputGroup::Trouble),
                    level: Level::High
                },
                Step::Drive {
                    target: Target::Group(OutputGroup::ExtendedTrouble),
                    level: Level::High
                },
                Step::Drive {
                    target: Target::Group(OutputGroup::Reset),
                    level: Level::High
                },
                Step::Hold(Duration::from_secs(15)),
                Step::Drive {
                    target: Target::Group(OutputGroup::Reset),
                    level: Level::Low
                },
            ]
        );
    }

    #[test]
    fn test_pulse_periodicity() {
        let p = policy(3);
        let pulsed: Vec<u64> = (1..=10)
            .filter(|&n| p.plan(Verdict::Unhealthy, n).pulses_reset())
            .collect();
        assert_eq!(pulsed, vec![3, 6, 9]);

        let extended: Vec<u64> = (1..=10)
            .filter(|&n| p.plan(Verdict::Unhealthy, n).asserts_extended_trouble())
            .collect();
        assert_eq!(extended, (3..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_threshold_one_pulses_every_failure() {
        let p = policy(1);
        assert!((1..=5).all(|n| p.plan(Verdict::Unhealthy, n).pulses_reset()));
    }
}
