//! Resource limits for one execution context.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds applied to every agent's execution context.
///
/// Loaded from the `sandbox` section of the match configuration; every
/// field has a default so the section may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    /// Per-decision bound in milliseconds (default: 30).
    pub decision_timeout_ms: u64,
    /// Bound for initialize and hot-swap in milliseconds (default: 250).
    pub swap_timeout_ms: u64,
    /// Script operations per call before it is aborted (default: 200000).
    pub max_operations: u64,
    /// Maximum function call nesting (default: 32).
    pub max_call_levels: usize,
    /// Maximum expression nesting (default: 64).
    pub max_expr_depth: usize,
    /// Maximum string length in bytes (default: 4096).
    pub max_string_size: usize,
    /// Maximum array length (default: 1024).
    pub max_array_size: usize,
    /// Maximum map size (default: 256).
    pub max_map_size: usize,
    /// Pending requests per context before calls are refused (default: 4).
    pub queue_depth: usize,
    /// Maximum accepted source size in bytes (default: 65536).
    pub max_source_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            decision_timeout_ms: 30,
            swap_timeout_ms: 250,
            max_operations: 200_000,
            max_call_levels: 32,
            max_expr_depth: 64,
            max_string_size: 4096,
            max_array_size: 1024,
            max_map_size: 256,
            queue_depth: 4,
            max_source_bytes: 64 * 1024,
        }
    }
}

impl SandboxLimits {
    /// Per-decision bound.
    pub const fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    /// Initialize / hot-swap bound.
    pub const fn swap_timeout(&self) -> Duration {
        Duration::from_millis(self.swap_timeout_ms)
    }
}
