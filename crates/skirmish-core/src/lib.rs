//! Tick scheduling and match orchestration for the Skirmish combat
//! simulation.
//!
//! This crate owns the fixed-order tick cycle that drives a match and the
//! control plane around it: where decisions come from, how a running match
//! is stopped or has its agents' logic replaced, and how a match is
//! configured.
//!
//! # Modules
//!
//! - [`tick`] -- The tick cycle ([`run_tick`]) and termination rules.
//! - [`runner`] -- The match loop with cadence, stop, and between-tick swaps.
//! - [`decision`] -- [`DecisionSource`] and its stub, scripted, and
//!   sandboxed implementations.
//! - [`control`] -- [`MatchHandle`] for stop, hot-swap, and evolution requests.
//! - [`author`] -- The code-generation collaborator trait.
//! - [`config`] -- Configuration loading from `skirmish-config.yaml` into
//!   strongly-typed structs.
//!
//! [`run_tick`]: tick::run_tick
//! [`DecisionSource`]: decision::DecisionSource
//! [`MatchHandle`]: control::MatchHandle

pub mod author;
pub mod config;
pub mod control;
pub mod decision;
pub mod runner;
pub mod tick;
