//! Outage State — the running outage counter and its bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict from one probe pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Healthy,
    Unhealthy,
}

impl From<bool> for Verdict {
    fn from(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Phase derived from the counter relative to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutagePhase {
    /// count == 0
    Healthy,
    /// 0 < count < threshold
    Trouble,
    /// count >= threshold
    ExtendedTrouble,
}

/// Summary of an outage that just ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageSummary {
    /// Consecutive failed cycles
    pub cycles: u64,
    /// When the first failed cycle was observed
    pub started: Option<DateTime<Utc>>,
    /// When the healthy cycle was observed
    pub ended: DateTime<Utc>,
}

impl OutageSummary {
    /// Wall-clock length of the outage, if its start is known
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.started.map(|s| self.ended - s)
    }
}

/// Process-wide outage counter.
///
/// The count is 0 while the last verdict was healthy, grows by exactly one
/// per consecutive unhealthy verdict and drops straight back to 0 on the
/// first healthy one. Nothing survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageState {
    /// Consecutive unhealthy cycles
    pub outage_count: u64,
    /// First failed cycle of the current outage
    pub outage_started: Option<DateTime<Utc>>,
    /// Longest outage (in cycles) seen since start
    pub longest_outage: u64,
}

impl OutageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing count, as if that many cycles had already failed
    pub fn with_count(outage_count: u64) -> Self {
        Self {
            outage_count,
            outage_started: None,
            longest_outage: outage_count,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.outage_count == 0
    }

    pub fn phase(&self, threshold: u64) -> OutagePhase {
        match self.outage_count {
            0 => OutagePhase::Healthy,
            n if n < threshold => OutagePhase::Trouble,
            _ => OutagePhase::ExtendedTrouble,
        }
    }

    /// Record an unhealthy cycle and return the new count
    pub fn record_failure(&mut self) -> u64 {
        self.record_failure_at(Utc::now())
    }

    pub fn record_failure_at(&mut self, now: DateTime<Utc>) -> u64 {
        if self.outage_count == 0 {
            self.outage_started = Some(now);
        }
        self.outage_count = self.outage_count.saturating_add(1);
        self.longest_outage = self.longest_outage.max(self.outage_count);
        self.outage_count
    }

    /// Record a healthy cycle. Returns the outage that just ended, if any.
    pub fn record_recovery(&mut self) -> Option<OutageSummary> {
        self.record_recovery_at(Utc::now())
    }

    pub fn record_recovery_at(&mut self, now: DateTime<Utc>) -> Option<OutageSummary> {
        let cycles = std::mem::take(&mut self.outage_count);
        let started = self.outage_started.take();
        (cycles > 0).then_some(OutageSummary {
            cycles,
            started,
            ended: now,
        })
    }

    /// Apply a verdict and return the new count
    pub fn record(&mut self, verdict: Verdict) -> u64 {
        match verdict {
            Verdict::Healthy => {
                self.record_recovery();
            }
            Verdict::Unhealthy => {
                self.record_failure();
            }
        }
        self.outage_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counter_follows_verdicts() {
        let mut state = OutageState::new();
        let verdicts = [false, false, true, false, true, true, false, false, false];
        let mut expected = 0;
        for healthy in verdicts {
            let count = state.record(Verdict::from(healthy));
            expected = if healthy { 0 } else { expected + 1 };
            assert_eq!(count, expected);
        }
        assert_eq!(state.longest_outage, 3);
    }

    #[test]
    fn test_phase_grading() {
        assert_eq!(OutageState::with_count(0).phase(3), OutagePhase::Healthy);
        assert_eq!(OutageState::with_count(2).phase(3), OutagePhase::Trouble);
        assert_eq!(
            OutageState::with_count(3).phase(3),
            OutagePhase::ExtendedTrouble
        );
        assert_eq!(
            OutageState::with_count(1).phase(1),
            OutagePhase::ExtendedTrouble
        );
    }

    #[test]
    fn test_recovery_summary_carries_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 12, 3, 0).unwrap();

        let mut state = OutageState::new();
        state.record_failure_at(start);
        state.record_failure_at(start + chrono::Duration::seconds(60));
        let summary = state.record_recovery_at(end).unwrap();

        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.duration(), Some(chrono::Duration::minutes(3)));
        assert!(state.is_healthy());
        assert!(state.outage_started.is_none());
    }

    #[test]
    fn test_recovery_while_healthy_reports_nothing() {
        let mut state = OutageState::new();
        assert!(state.record_recovery().is_none());
        assert!(state.record_recovery().is_none());
        assert_eq!(state.outage_count, 0);
    }
}
