//! Contained execution of agent decision logic for the Skirmish combat
//! simulation.
//!
//! Each agent's decision logic is an untrusted script defining
//! `fn decide(me, enemies, arena)`. The host loads it into an isolated
//! execution context (its own thread and script engine, no I/O, no timers,
//! no code loading), asks it for one decision per tick under a hard time
//! bound, and can replace it mid-match without interrupting the scheduler.
//!
//! # Modules
//!
//! - [`host`] -- [`AgentSandbox`]: initialize, decide, hot-swap, terminate
//! - [`context`] -- The per-agent worker thread and script engine
//! - [`containment`] -- Static scan for forbidden capabilities
//! - [`coerce`] -- Turning script output into a [`skirmish_types::Decision`]
//! - [`limits`] -- Configurable resource bounds
//! - [`stats`] -- Per-context counters
//! - [`error`] -- Load errors and decision fault classes

pub mod coerce;
pub mod containment;
pub mod context;
pub mod error;
pub mod host;
pub mod limits;
pub mod stats;

pub use coerce::{coerce_decision, coerce_output};
pub use containment::{CapabilityCategory, Finding};
pub use context::{ENTRY_ARITY, ENTRY_POINT};
pub use error::{DecisionFault, SandboxError};
pub use host::{AgentSandbox, SwapOutcome};
pub use limits::SandboxLimits;
pub use stats::{SandboxStats, SandboxStatsSnapshot};
