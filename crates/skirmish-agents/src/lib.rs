//! Action resolution for the Skirmish combat simulation.
//!
//! This crate applies an agent's chosen ability to the entity store: the
//! per-tick status mechanics that run first, the cooldown/energy gate, and
//! the closed dispatch table of ability handlers. It performs no I/O and
//! holds no state of its own.
//!
//! # Modules
//!
//! - [`actions`] -- Gate, dispatch table, strike geometry, and handlers.
//! - [`resolver`] -- [`resolve_agent`]: status tick, defend transitions,
//!   and dispatch for one agent.
//! - [`vitals`] -- Per-tick cooldown, commit, energy, burn, regen, and slow
//!   mechanics.

pub mod actions;
pub mod resolver;
pub mod vitals;

pub use actions::{ActionHandler, Rejection, handler_for, perform};
pub use resolver::{ActionOutcome, resolve_agent};
pub use vitals::apply_status_tick;
