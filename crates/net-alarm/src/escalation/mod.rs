//! Outage Escalation — deterministic state machine for the alarm outputs
//!
//! Converts the per-cycle healthy/unhealthy verdict into staged output
//! transitions. No I/O decisions are made outside [`policy`]; [`engine`]
//! only replays them.
//!
//! # Escalation Ladder
//!
//! ```text
//! Healthy (count = 0) ── all outputs Low, heartbeat pushed
//!     │ failed cycle
//!     ▼
//! Trouble (0 < count < threshold)
//!     │  trouble group re-asserted High every failed cycle
//!     │
//!     ▼ count reaches threshold
//! Extended trouble (count >= threshold)
//!     │  extended_trouble latched High
//!     │  every count that is a multiple of threshold:
//!     │      reset High → hold reset_pulse → reset Low
//!     │
//!     ▼ any healthy cycle
//! Healthy — every output cleared in one step, count = 0
//! ```
//!
//! Extended trouble stays latched for the rest of the outage; only a healthy
//! verdict lowers it. The trouble group, by contrast, is driven every failed
//! cycle.

pub mod engine;
pub mod policy;
pub mod state;

pub use engine::{CycleReport, EscalationEngine};
pub use policy::{CyclePlan, EscalationPolicy, Step, Target};
pub use state::{OutagePhase, OutageState, OutageSummary, Verdict};
