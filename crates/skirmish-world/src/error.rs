//! Error types for the `skirmish-world` crate.
//!
//! Only arena validation and tick-counter bookkeeping can fail. Everything
//! that happens inside a tick (gate failures, misses, skipped pickup
//! placements) is a policy outcome, not an error.

use skirmish_types::AgentId;

/// Errors that can occur while building or advancing the entity store.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The height field's sample count does not match its resolution.
    #[error("height field has {actual} samples, expected {expected} for resolution {resolution}")]
    HeightFieldSize {
        /// Declared samples per side.
        resolution: u32,
        /// `resolution * resolution`.
        expected: usize,
        /// Samples actually supplied.
        actual: usize,
    },

    /// The height field needs at least two samples per side.
    #[error("height field resolution {0} is too small (minimum 2)")]
    HeightFieldResolution(u32),

    /// An arena value was NaN or infinite.
    #[error("non-finite value in arena {field}")]
    NonFinite {
        /// Which part of the arena was invalid.
        field: &'static str,
    },

    /// The arena bounds have zero or negative area.
    #[error("arena bounds are degenerate")]
    DegenerateBounds,

    /// A spawn point lies outside the arena bounds.
    #[error("spawn point for {agent} lies outside the arena bounds")]
    SpawnOutOfBounds {
        /// Agent whose spawn point is invalid.
        agent: AgentId,
    },

    /// A tick was requested after the match ended.
    #[error("match already finished at tick {tick}")]
    MatchFinished {
        /// Tick on which the match ended.
        tick: u64,
    },

    /// Arithmetic overflow in a counter.
    #[error("arithmetic overflow in world counter")]
    ArithmeticOverflow,
}
