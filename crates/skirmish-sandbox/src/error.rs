//! Error and fault types for the sandbox host.
//!
//! Two families, kept deliberately apart:
//!
//! - [`SandboxError`] is returned by setup and hot-swap validation. At match
//!   setup it is fatal; at swap time it becomes a rejected swap.
//! - [`DecisionFault`] classifies why a per-tick decision fell back to the
//!   neutral action. It is counted and logged, never propagated.

use crate::containment::CapabilityCategory;

/// Errors that can occur while loading or replacing decision logic.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The source references a forbidden capability.
    #[error("forbidden {category} reference `{token}`")]
    Forbidden {
        /// Capability family the token belongs to.
        category: CapabilityCategory,
        /// The offending identifier or substring.
        token: String,
    },

    /// The source exceeds the configured size limit.
    #[error("source is {size} bytes, limit is {limit}")]
    Oversized {
        /// Source length in bytes.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The script failed to compile.
    #[error("compile error: {message}")]
    Compile {
        /// Compiler message including position.
        message: String,
    },

    /// The script compiled but does not define the entry point.
    #[error("script must define `fn {name}` with {arity} parameters")]
    MissingEntryPoint {
        /// Required function name.
        name: &'static str,
        /// Required parameter count.
        arity: usize,
    },

    /// The execution context did not answer within the bound.
    #[error("sandbox did not answer within {waited_ms} ms")]
    Timeout {
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// The execution context is gone or its queue is full.
    #[error("sandbox unavailable: {reason}")]
    Unavailable {
        /// Why the request could not be delivered.
        reason: &'static str,
    },

    /// The execution context thread could not be started.
    #[error("failed to start sandbox thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a decision call produced the neutral action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionFault {
    /// No answer within the per-call bound (or the script ran past its deadline).
    Timeout,
    /// The script raised an error.
    Runtime,
    /// The script returned something that is not a decision map.
    Malformed,
    /// The request queue was full; the call was not attempted.
    Saturated,
    /// The execution context has shut down.
    Closed,
}

impl DecisionFault {
    /// Lowercase label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Runtime => "runtime",
            Self::Malformed => "malformed",
            Self::Saturated => "saturated",
            Self::Closed => "closed",
        }
    }
}

impl core::fmt::Display for DecisionFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
