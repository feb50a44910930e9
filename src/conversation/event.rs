//! Events that can occur in a conversation

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Visitor events
    Open,
    Close,
    SelectOption { index: usize },
    GoBack,
    Reset,
    WordCountInput { raw: String },
    CalculatorConfirm,
    CopyRequested { value: String },

    // Timer events
    SettleElapsed { generation: u64 },
    FlushDue { generation: u64 },

    // Render / dispatch feedback
    ReplyCommitted { text: String },
    PopupBlocked { fallback: String },
}

impl Event {
    /// Events that start a user-triggered step transition and therefore
    /// require the options to be unlocked
    pub fn is_gated(&self) -> bool {
        matches!(
            self,
            Event::SelectOption { .. } | Event::GoBack | Event::CalculatorConfirm
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Open => "open",
            Event::Close => "close",
            Event::SelectOption { .. } => "select_option",
            Event::GoBack => "go_back",
            Event::Reset => "reset",
            Event::WordCountInput { .. } => "word_count_input",
            Event::CalculatorConfirm => "calculator_confirm",
            Event::CopyRequested { .. } => "copy_requested",
            Event::SettleElapsed { .. } => "settle_elapsed",
            Event::FlushDue { .. } => "flush_due",
            Event::ReplyCommitted { .. } => "reply_committed",
            Event::PopupBlocked { .. } => "popup_blocked",
        }
    }
}
