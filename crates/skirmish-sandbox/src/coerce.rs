//! Coercion of untrusted script output into a [`Decision`].
//!
//! The script is expected to return a map:
//!
//! ```text
//! #{ move: [x, y], aim: [x, y], action: "melee" }
//! ```
//!
//! Anything that is not a map is malformed and the caller falls back to the
//! neutral decision. Inside a map every field is coerced on its own:
//! vectors may be `[x, y]` arrays or `#{x, y}` maps, non-numeric or
//! non-finite components become `0`, and the action must be one of the
//! exact lowercase ability names or it becomes `None`.
//!
//! Script values are converted to plain data one field at a time, so a
//! field holding something that is not data (a function pointer, say)
//! only loses that field.

use rhai::{Array, Dynamic, Map};
use serde_json::Value;
use skirmish_types::{Ability, Decision, Vec2};
use tracing::debug;

use crate::error::DecisionFault;

/// Nesting below which script values are not inspected. A decision needs
/// two levels (`move` then its components).
const MAX_DEPTH: usize = 4;

/// Coerce the raw value returned by a script.
///
/// # Errors
///
/// Returns [`DecisionFault::Malformed`] when `output` is not a map.
pub fn coerce_output(output: &Dynamic) -> Result<Decision, DecisionFault> {
    if !output.is_map() {
        return Err(DecisionFault::Malformed);
    }
    coerce_decision(&plain(output, 0))
}

/// Convert a script value into JSON, replacing anything that is not plain
/// data with `null` at the smallest enclosing field.
fn plain(value: &Dynamic, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return Value::Null;
    }
    let next = depth.saturating_add(1);
    if let Some(map) = value.read_lock::<Map>() {
        return Value::Object(
            map.iter()
                .map(|(key, field)| (key.to_string(), plain(field, next)))
                .collect(),
        );
    }
    if let Some(items) = value.read_lock::<Array>() {
        return Value::Array(items.iter().map(|item| plain(item, next)).collect());
    }
    rhai::serde::from_dynamic(value).unwrap_or_else(|err| {
        debug!(type_name = value.type_name(), error = %err, "coerce: dropping non-data field");
        Value::Null
    })
}

/// Coerce a script result into a decision.
///
/// # Errors
///
/// Returns [`DecisionFault::Malformed`] when `value` is not a map.
pub fn coerce_decision(value: &Value) -> Result<Decision, DecisionFault> {
    let Value::Object(map) = value else {
        return Err(DecisionFault::Malformed);
    };
    Ok(Decision {
        move_dir: coerce_vec(map.get("move")),
        aim: coerce_vec(map.get("aim")),
        action: map.get("action").and_then(Value::as_str).and_then(Ability::parse),
    })
}

fn coerce_vec(value: Option<&Value>) -> Vec2 {
    match value {
        Some(Value::Array(items)) => Vec2::new(number(items.first()), number(items.get(1))),
        Some(Value::Object(map)) => Vec2::new(number(map.get("x")), number(map.get("y"))),
        _ => Vec2::ZERO,
    }
}

fn number(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}
