//! Session persistence
//!
//! The conversation lives in a per-tab session store. A long-lived store
//! only remembers that the widget was opened before. Loading never fails:
//! unreadable records are logged and replaced by a fresh conversation.

pub mod migrate;
mod normalize;
mod store;

pub use normalize::normalize;
pub use store::{FileStore, MemoryStore};

use crate::conversation::ConversationState;
use crate::graph::StepGraph;
use crate::runtime::KeyValueStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current conversation record
pub const STATE_KEY: &str = "sc_chat_state_v2";
/// Record written by the first widget release
pub const LEGACY_STATE_KEY: &str = "sc_chat_state";
/// Long-lived "has opened the widget" marker
pub const VISITED_KEY: &str = "sc_visited";
/// Message template for the contact page
pub const HANDOFF_KEY: &str = "sc_contact_handoff";
/// Query parameter that wipes the session on page load
pub const RESET_PARAM: &str = "sc_reset";

pub const HANDOFF_SOURCE: &str = "studio-concierge";
/// Handoffs older than this are ignored by the contact page
pub const HANDOFF_MAX_AGE_MS: i64 = 10 * 60 * 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt stored value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payload picked up once by the contact page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub text: String,
    pub ts: i64,
    pub source: String,
}

pub struct Persistence<S> {
    session: S,
    local: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(session: S, local: S) -> Self {
        Self { session, local }
    }

    /// Restore the conversation, migrating older records
    pub async fn load(&self, graph: &StepGraph, now_ms: i64) -> ConversationState {
        match self.try_load(graph, now_ms).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore conversation, starting fresh");
                ConversationState::default()
            }
        }
    }

    async fn try_load(
        &self,
        graph: &StepGraph,
        now_ms: i64,
    ) -> Result<ConversationState, StoreError> {
        if let Some(raw) = self.session.get(STATE_KEY).await? {
            let value = serde_json::from_str(&raw)?;
            return Ok(normalize(&migrate::upgrade(value, graph, now_ms)));
        }

        let Some(raw) = self.session.get(LEGACY_STATE_KEY).await? else {
            return Ok(ConversationState::default());
        };
        self.session.remove(LEGACY_STATE_KEY).await?;
        let value = serde_json::from_str(&raw)?;
        let state = normalize(&migrate::upgrade(value, graph, now_ms));
        self.save(&state).await?;
        tracing::info!(step = %state.current_step_id, "Migrated legacy conversation record");
        Ok(state)
    }

    pub async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        self.session.set(STATE_KEY, &raw).await
    }

    /// Forget the conversation. The visited marker survives.
    pub async fn clear(&self) -> Result<(), StoreError> {
        for key in [STATE_KEY, LEGACY_STATE_KEY, HANDOFF_KEY] {
            self.session.remove(key).await?;
        }
        Ok(())
    }

    pub async fn has_visited(&self) -> bool {
        match self.local.get(VISITED_KEY).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read visited marker");
                false
            }
        }
    }

    pub async fn mark_visited(&self) -> Result<(), StoreError> {
        self.local.set(VISITED_KEY, "1").await
    }

    pub async fn write_handoff(&self, text: &str, now_ms: i64) -> Result<(), StoreError> {
        let handoff = Handoff {
            text: text.to_string(),
            ts: now_ms,
            source: HANDOFF_SOURCE.to_string(),
        };
        let raw = serde_json::to_string(&handoff)?;
        self.session.set(HANDOFF_KEY, &raw).await
    }

    /// Consume the handoff. Foreign or stale payloads are dropped.
    pub async fn take_handoff(&self, now_ms: i64) -> Result<Option<String>, StoreError> {
        let Some(raw) = self.session.get(HANDOFF_KEY).await? else {
            return Ok(None);
        };
        self.session.remove(HANDOFF_KEY).await?;

        let handoff: Handoff = serde_json::from_str(&raw)?;
        let fresh = now_ms.saturating_sub(handoff.ts) <= HANDOFF_MAX_AGE_MS;
        Ok((handoff.source == HANDOFF_SOURCE && fresh).then_some(handoff.text))
    }
}

/// The page URL without the reset parameter, or `None` when the URL does
/// not carry it.
pub fn strip_reset_param(url: &str) -> Option<String> {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    let (base, query) = rest.split_once('?')?;

    let mut found = false;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            let is_reset = key == RESET_PARAM;
            found |= is_reset;
            !is_reset && !pair.is_empty()
        })
        .collect();
    if !found {
        return None;
    }

    let mut clean = base.to_string();
    if !kept.is_empty() {
        clean.push('?');
        clean.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        clean.push('#');
        clean.push_str(fragment);
    }
    Some(clean)
}
