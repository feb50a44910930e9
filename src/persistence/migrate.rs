//! Schema upgrades for persisted conversation records
//!
//! The first widget release stored rendered HTML instead of a transcript,
//! `{ bodyHtml, dockHtml, isOpen, currentStep }`, and no `version`. It is
//! recognised by that shape; a version-less record in the current layout
//! is left to `normalize`.

use crate::conversation::{Role, SCHEMA_VERSION};
use crate::graph::StepGraph;
use serde_json::{json, Value};

/// Upgrade a raw record to the current schema. Unknown future versions are
/// passed through for `normalize` to salvage what it can.
pub fn upgrade(raw: Value, graph: &StepGraph, now_ms: i64) -> Value {
    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or_else(|| {
            if is_v1_shape(&raw) {
                1
            } else {
                u64::from(SCHEMA_VERSION)
            }
        });
    if version < u64::from(SCHEMA_VERSION) {
        tracing::debug!(from = version, to = SCHEMA_VERSION, "Upgrading stored conversation");
        from_v1(&raw, graph, now_ms)
    } else {
        raw
    }
}

fn is_v1_shape(raw: &Value) -> bool {
    raw.get("currentStepId").is_none()
        && (raw.get("currentStep").is_some() || raw.get("bodyHtml").is_some())
}

/// The rendered HTML is dropped; the transcript restarts with the prompt
/// of the step the visitor was on.
fn from_v1(raw: &Value, graph: &StepGraph, now_ms: i64) -> Value {
    let step = graph.lookup(
        raw.get("currentStep")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );
    let is_open = raw.get("isOpen").and_then(Value::as_bool).unwrap_or(false);

    json!({
        "version": SCHEMA_VERSION,
        "isOpen": is_open,
        "currentStepId": step.id,
        "history": [
            { "role": Role::Bot, "text": step.text, "ts": now_ms }
        ],
        "navStack": [],
        "context": {},
        "flags": { "welcomed": true }
    })
}
