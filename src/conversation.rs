//! Conversation controller core
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{
    ConversationContext, ConversationState, Flags, HistoryEntry, Role, UiState, WidgetContext,
    SCHEMA_VERSION,
};
pub use transition::{transition, TransitionError, TransitionResult};
