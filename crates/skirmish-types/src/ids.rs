//! Identifier types for matches, agents, and transient entities.
//!
//! A match is identified by a UUID v7 so that results arriving late from
//! asynchronous collaborators can be correlated with the match they were
//! issued for. The two combatants are a closed two-variant enum: iteration
//! order over [`AgentId::ALL`] is the deterministic resolution order used
//! everywhere in the engine (alpha before bravo).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one match (one run of the tick scheduler).
    MatchId
}

/// One of the two combatants in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Agent 0. Always resolved first.
    Alpha,
    /// Agent 1.
    Bravo,
}

impl AgentId {
    /// Both agents in deterministic resolution order.
    pub const ALL: [Self; 2] = [Self::Alpha, Self::Bravo];

    /// Zero-based slot index (alpha = 0, bravo = 1).
    pub const fn index(self) -> usize {
        match self {
            Self::Alpha => 0,
            Self::Bravo => 1,
        }
    }

    /// The opposing agent.
    pub const fn opponent(self) -> Self {
        match self {
            Self::Alpha => Self::Bravo,
            Self::Bravo => Self::Alpha,
        }
    }

    /// Lowercase name used in logs, URLs, and scripts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Bravo => "bravo",
        }
    }

    /// Parse a lowercase agent name (`alpha`/`bravo`, or `0`/`1`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpha" | "0" => Some(Self::Alpha),
            "bravo" | "1" => Some(Self::Bravo),
            _ => None,
        }
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier for a projectile, pickup, or trap.
///
/// Allocated from a per-match counter owned by the entity store, so ids are
/// reproducible across runs with identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pair of values, one per agent, addressed by [`AgentId`].
///
/// Used instead of a two-element array so per-agent state is always looked
/// up by identity rather than by raw index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerAgent<T> {
    /// Value for [`AgentId::Alpha`].
    pub alpha: T,
    /// Value for [`AgentId::Bravo`].
    pub bravo: T,
}

impl<T> PerAgent<T> {
    /// Build a pair from explicit values.
    pub const fn new(alpha: T, bravo: T) -> Self {
        Self { alpha, bravo }
    }

    /// Build a pair by calling `f` for each agent in resolution order.
    pub fn from_fn(mut f: impl FnMut(AgentId) -> T) -> Self {
        let alpha = f(AgentId::Alpha);
        let bravo = f(AgentId::Bravo);
        Self { alpha, bravo }
    }

    /// Shared reference to one agent's value.
    pub const fn get(&self, id: AgentId) -> &T {
        match id {
            AgentId::Alpha => &self.alpha,
            AgentId::Bravo => &self.bravo,
        }
    }

    /// Mutable reference to one agent's value.
    pub const fn get_mut(&mut self, id: AgentId) -> &mut T {
        match id {
            AgentId::Alpha => &mut self.alpha,
            AgentId::Bravo => &mut self.bravo,
        }
    }

    /// Mutable references to both values at once, `(id, opponent)`.
    pub const fn pair_mut(&mut self, id: AgentId) -> (&mut T, &mut T) {
        match id {
            AgentId::Alpha => (&mut self.alpha, &mut self.bravo),
            AgentId::Bravo => (&mut self.bravo, &mut self.alpha),
        }
    }

    /// Map both values through `f`.
    pub fn map<U>(&self, mut f: impl FnMut(AgentId, &T) -> U) -> PerAgent<U> {
        PerAgent {
            alpha: f(AgentId::Alpha, &self.alpha),
            bravo: f(AgentId::Bravo, &self.bravo),
        }
    }
}
