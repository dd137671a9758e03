//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! that can abort match setup or the match run.

use skirmish_core::author::AuthorError;
use skirmish_types::AgentId;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or arena file loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skirmish_core::config::ConfigError,
    },

    /// The arena was rejected by the entity store.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: skirmish_world::WorldError,
    },

    /// A bot's source could not be obtained.
    #[error("bot for {agent} unavailable: {source}")]
    Bot {
        /// The agent the bot was for.
        agent: AgentId,
        /// The underlying library error.
        source: AuthorError,
    },

    /// A sandbox refused its initial source.
    #[error("sandbox for {agent} failed to initialize: {source}")]
    Sandbox {
        /// The agent whose context failed.
        agent: AgentId,
        /// The underlying sandbox error.
        source: skirmish_sandbox::SandboxError,
    },

    /// The observer server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: skirmish_observer::ServerError,
    },

    /// The match runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: skirmish_core::runner::RunnerError,
    },
}
