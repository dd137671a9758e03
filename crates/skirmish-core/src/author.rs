//! The code-generation collaborator.
//!
//! Decision logic is written elsewhere: a service, a model, or a directory
//! of hand-written scripts. The engine only sees the [`BotAuthor`] trait. It
//! supplies initial source plus a cosmetic style descriptor when a bot is
//! created, and revised source plus a short narrative when an agent evolves
//! mid-match. All returned text is opaque and goes through the same sandbox
//! validation as any other source.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use skirmish_types::{AgentId, MatchId};

/// Errors from the code-generation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AuthorError {
    /// No bot with this name is known.
    #[error("unknown bot `{name}`")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// The bot exists but cannot evolve.
    #[error("bot `{name}` has no evolution")]
    NoEvolution {
        /// The bot's name.
        name: String,
    },

    /// Reading the underlying store failed.
    #[error("failed to read bot source: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The collaborator could not be reached or refused the request.
    #[error("author unavailable: {reason}")]
    Unavailable {
        /// Why.
        reason: String,
    },
}

/// Initial decision logic for one bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBot {
    /// Bot name.
    pub name: String,
    /// Decision-logic source text.
    pub source: String,
    /// Opaque cosmetic descriptor handed through to renderers.
    pub style: serde_json::Value,
}

/// A mid-match request to revise one agent's logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionRequest {
    /// Match the request was issued for.
    pub match_id: MatchId,
    /// Agent to evolve.
    pub agent: AgentId,
    /// That agent's bot name.
    pub bot: String,
    /// Free-form guidance from the requester.
    #[serde(default)]
    pub instruction: String,
}

/// Revised decision logic for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evolution {
    /// Replacement source text.
    pub source: String,
    /// Short narrative of what changed.
    pub narrative: String,
}

/// Supplies decision-logic source text.
///
/// Methods return boxed futures so the trait stays object safe and can be
/// shared as `Arc<dyn BotAuthor>` between the match handle and the observer.
pub trait BotAuthor: Send + Sync {
    /// Produce the initial logic for `name`.
    fn create<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<GeneratedBot, AuthorError>>;

    /// Produce revised logic for an agent mid-match.
    fn evolve<'a>(
        &'a self,
        request: &'a EvolutionRequest,
    ) -> BoxFuture<'a, Result<Evolution, AuthorError>>;
}
