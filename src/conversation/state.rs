//! Conversation state types

use crate::briefing::Briefing;
use crate::config::{Timing, WidgetConfig};
use crate::graph::{StepGraph, StepId};
use serde::{Deserialize, Serialize};

/// Version written into every persisted record
pub const SCHEMA_VERSION: u32 = 2;

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bot,
    User,
}

/// One transcript line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    /// Unix epoch milliseconds
    pub ts: i64,
}

/// Values accumulated across the session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub word_count: u32,
    pub briefing: Briefing,
    /// Step the calculator resumes when it was opened from a sub-flow
    pub return_to_step_id: Option<StepId>,
    pub briefing_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    /// The one-time greeting has been shown
    pub welcomed: bool,
}

/// View-only state, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    /// Options are disabled while a reply is being produced
    pub options_locked: bool,
    /// Bumped on every calculator keystroke; stale timers compare against it
    pub input_generation: u64,
    /// Mirrors the long-lived "has opened the widget before" flag
    pub returning_visitor: bool,
}

/// The single mutable aggregate of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub version: u32,
    pub is_open: bool,
    pub current_step_id: StepId,
    /// Append-only transcript
    pub history: Vec<HistoryEntry>,
    /// Ancestors of the current step, innermost last
    pub nav_stack: Vec<StepId>,
    pub context: ConversationContext,
    pub flags: Flags,
    #[serde(skip)]
    pub ui: UiState,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            is_open: false,
            current_step_id: StepId::Start,
            history: Vec::new(),
            nav_stack: Vec::new(),
            context: ConversationContext::default(),
            flags: Flags::default(),
            ui: UiState::default(),
        }
    }
}

impl ConversationState {
    pub fn push(&mut self, role: Role, text: impl Into<String>, ts: i64) {
        self.history.push(HistoryEntry {
            role,
            text: text.into(),
            ts,
        });
    }

    pub fn last_bot_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Bot)
            .map(|entry| entry.text.as_str())
    }

    pub fn options_locked(&self) -> bool {
        self.ui.options_locked
    }
}

/// Immutable environment of a conversation
#[derive(Debug, Clone)]
pub struct WidgetContext {
    pub graph: StepGraph,
    pub config: WidgetConfig,
    pub timing: Timing,
}

impl WidgetContext {
    pub fn new(config: WidgetConfig, timing: Timing) -> Self {
        Self {
            graph: StepGraph::new(&config),
            config,
            timing,
        }
    }
}
