//! Defensive decoding of stored conversation records
//!
//! Each field is read on its own; anything missing or malformed falls back
//! to its default instead of discarding the whole record.

use crate::briefing::{Briefing, BriefingField};
use crate::calculator::clamp_word_count;
use crate::conversation::{
    ConversationContext, ConversationState, Flags, HistoryEntry, Role, UiState, SCHEMA_VERSION,
};
use crate::graph::StepId;
use serde_json::Value;
use std::collections::HashSet;

pub fn normalize(raw: &Value) -> ConversationState {
    let current_step_id = raw
        .get("currentStepId")
        .and_then(Value::as_str)
        .map_or(StepId::Start, StepId::parse_or_start);
    let history = history(raw.get("history"));
    let welcomed = raw
        .pointer("/flags/welcomed")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || !history.is_empty();

    ConversationState {
        version: SCHEMA_VERSION,
        is_open: raw.get("isOpen").and_then(Value::as_bool).unwrap_or(false),
        current_step_id,
        history,
        nav_stack: nav_stack(raw.get("navStack"), current_step_id),
        context: context(raw.get("context"), current_step_id),
        flags: Flags { welcomed },
        ui: UiState::default(),
    }
}

fn history(raw: Option<&Value>) -> Vec<HistoryEntry> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let role = match entry.get("role").and_then(Value::as_str)? {
                "bot" => Role::Bot,
                "user" => Role::User,
                _ => return None,
            };
            let text = entry.get("text").and_then(Value::as_str)?.to_string();
            let ts = entry.get("ts").and_then(Value::as_i64).unwrap_or(0);
            Some(HistoryEntry { role, text, ts })
        })
        .collect()
}

/// Known ids only, without duplicates, ending before the current step
fn nav_stack(raw: Option<&Value>, current: StepId) -> Vec<StepId> {
    let Some(ids) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    ids.iter()
        .filter_map(Value::as_str)
        .filter_map(StepId::parse)
        .take_while(|id| *id != current)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn context(raw: Option<&Value>, current: StepId) -> ConversationContext {
    let Some(raw) = raw.filter(|value| value.is_object()) else {
        return ConversationContext::default();
    };

    let word_count = raw
        .get("wordCount")
        .and_then(Value::as_u64)
        .map_or(0, |words| {
            clamp_word_count(u32::try_from(words).unwrap_or(u32::MAX))
        });

    let briefing: Briefing = raw
        .get("briefing")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(key, value)| {
                    Some((BriefingField::from_key(key)?, value.as_str()?.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    // only meaningful while the calculator is showing
    let return_to_step_id = raw
        .get("returnToStepId")
        .and_then(Value::as_str)
        .and_then(StepId::parse)
        .filter(|_| current == StepId::Rechner);

    ConversationContext {
        word_count,
        briefing_started: raw
            .get("briefingStarted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || !briefing.is_empty(),
        briefing,
        return_to_step_id,
    }
}
