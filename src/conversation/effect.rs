//! Effects produced by state transitions

use crate::contact::Dispatch;
use crate::render::Sound;
use std::time::Duration;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Produce a bot reply. Animated replies go through the typewriter and
    /// are only committed to history once fully revealed.
    Reply { text: String, animate: bool },

    /// Open a link, mail client, dialer or anchor
    Dispatch(Dispatch),

    /// Short-lived payload picked up by the contact page
    WriteHandoff { text: String },

    /// Persist the new state
    PersistState,

    /// Persist after the debounce delay unless newer input arrives
    ScheduleFlush { delay: Duration, generation: u64 },

    /// Resume the briefing after the settle delay unless newer input arrives
    ScheduleSettle { delay: Duration, generation: u64 },

    /// Update the calculator result line without a full re-render
    ShowDuration { line: Option<String> },

    /// Wipe the conversation from the session store
    ClearStorage,

    /// Record in the long-lived store that the widget was opened
    MarkVisited,

    CopyToClipboard { value: String },

    PlaySound(Sound),

    /// Re-render the full view from state
    Render,
}

impl Effect {
    pub fn animated_reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            animate: true,
        }
    }

    pub fn instant_reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            animate: false,
        }
    }
}
