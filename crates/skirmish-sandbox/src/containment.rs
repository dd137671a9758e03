//! Static capability scan for decision-logic source.
//!
//! Runs before any source is compiled. The scan looks for references to
//! capabilities decision logic must never reach:
//!
//! - networking (sockets, fetch-style calls, URL schemes),
//! - timers and clocks,
//! - dynamic code loading,
//! - messaging back to the host (printing, channels).
//!
//! Identifiers are matched on whole-token boundaries after lower-casing and
//! removing underscores, so `set_timeout`, `setTimeout` and `SETTIMEOUT`
//! are all caught while `fetcher_range` is not. URL schemes are matched as
//! raw substrings. The scan is conservative: a forbidden word inside a
//! string literal is still rejected.
//!
//! The script engine itself is also built without these capabilities; this
//! scan rejects early with a readable reason instead of a compile error.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SandboxError;

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Family of a forbidden capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    /// Network access.
    Networking,
    /// Timers, clocks, and sleeping.
    Timers,
    /// Evaluating or importing code at runtime.
    CodeLoading,
    /// Sending data back to the host.
    HostMessaging,
}

impl core::fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Networking => "networking",
            Self::Timers => "timer",
            Self::CodeLoading => "code-loading",
            Self::HostMessaging => "host-messaging",
        })
    }
}

/// One forbidden reference found in a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Capability family.
    pub category: CapabilityCategory,
    /// The token as it appeared in the source.
    pub token: String,
    /// Byte offset of the token.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// Pattern definitions (normalized: lowercase, no underscores)
// ---------------------------------------------------------------------------

const NETWORKING: &[&str] = &[
    "fetch",
    "xmlhttprequest",
    "websocket",
    "eventsource",
    "socket",
    "navigator",
    "sendbeacon",
];

const TIMERS: &[&str] = &[
    "settimeout",
    "setinterval",
    "setimmediate",
    "requestanimationframe",
    "timestamp",
    "sleep",
];

const CODE_LOADING: &[&str] = &[
    "eval",
    "import",
    "importscripts",
    "require",
    "function",
    "compile",
];

const HOST_MESSAGING: &[&str] = &[
    "postmessage",
    "onmessage",
    "print",
    "debug",
    "broadcastchannel",
    "messagechannel",
];

const URL_SCHEMES: &[&str] = &["http://", "https://", "ws://", "wss://"];

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// List every forbidden reference in `source`, in source order (URL
/// schemes after identifiers).
pub fn scan(source: &str) -> Vec<Finding> {
    let mut findings: Vec<Finding> = identifiers(source)
        .filter_map(|(offset, token)| {
            classify(&normalize(token)).map(|category| Finding {
                category,
                token: token.to_owned(),
                offset,
            })
        })
        .collect();

    let lower = source.to_ascii_lowercase();
    for scheme in URL_SCHEMES {
        if let Some(offset) = lower.find(scheme) {
            findings.push(Finding {
                category: CapabilityCategory::Networking,
                token: (*scheme).to_owned(),
                offset,
            });
        }
    }
    findings
}

/// Validate `source` for loading: size limit, then capability scan.
///
/// # Errors
///
/// Returns [`SandboxError::Oversized`] or [`SandboxError::Forbidden`]
/// (reporting the first finding).
pub fn check(source: &str, max_bytes: usize) -> Result<(), SandboxError> {
    if source.len() > max_bytes {
        return Err(SandboxError::Oversized {
            size: source.len(),
            limit: max_bytes,
        });
    }
    let findings = scan(source);
    if let Some(first) = findings.first() {
        warn!(
            finding_count = findings.len(),
            category = %first.category,
            token = %first.token,
            "containment: forbidden capability in decision source"
        );
        return Err(SandboxError::Forbidden {
            category: first.category,
            token: first.token.clone(),
        });
    }
    Ok(())
}

fn classify(normalized: &str) -> Option<CapabilityCategory> {
    let lists = [
        (NETWORKING, CapabilityCategory::Networking),
        (TIMERS, CapabilityCategory::Timers),
        (CODE_LOADING, CapabilityCategory::CodeLoading),
        (HOST_MESSAGING, CapabilityCategory::HostMessaging),
    ];
    lists
        .into_iter()
        .find(|(words, _)| words.contains(&normalized))
        .map(|(_, category)| category)
}

fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Iterate `(byte offset, identifier)` pairs. Identifiers start with an
/// ASCII letter or underscore and continue with letters, digits, or
/// underscores.
fn identifiers(source: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut chars = source.char_indices().peekable();
    core::iter::from_fn(move || {
        loop {
            let (start, c) = chars.next()?;
            if !(c.is_ascii_alphabetic() || c == '_') {
                continue;
            }
            let mut end = start.saturating_add(c.len_utf8());
            while let Some(&(i, n)) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    end = i.saturating_add(n.len_utf8());
                    chars.next();
                } else {
                    break;
                }
            }
            return source.get(start..end).map(|token| (start, token));
        }
    })
}
