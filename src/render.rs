//! Render engine
//!
//! `view` turns a conversation state into a complete, self-contained view
//! model. It reads nothing but its arguments, so rendering the same state
//! twice yields the same view.

pub mod markup;
pub mod typewriter;

use crate::calculator;
use crate::conversation::{ConversationState, Role, WidgetContext};
use crate::graph::StepKind;
use std::fmt::{self, Write as _};

pub use markup::to_markup;
pub use typewriter::{Playback, Typewriter};

/// Widget title shown above the per-step subtitle
pub const TITLE: &str = "Studio-Assistent";

/// Audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Click,
    MessageIn,
    Open,
}

impl Sound {
    pub fn name(self) -> &'static str {
        match self {
            Sound::Click => "click",
            Sound::MessageIn => "message-in",
            Sound::Open => "open",
        }
    }
}

/// Handle of a bubble that is still being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub label: String,
    pub enabled: bool,
}

/// How the calculator hands its value on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// "Angebot dafür anfragen" button
    Button { enabled: bool },
    /// Entered from the briefing; the flow resumes on its own
    AutoAdvance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorView {
    pub word_count: u32,
    pub result: Option<String>,
    pub confirm: ConfirmMode,
}

/// Everything the surface needs to draw the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub is_open: bool,
    pub subtitle: &'static str,
    pub messages: Vec<MessageView>,
    pub options: Vec<OptionView>,
    pub calculator: Option<CalculatorView>,
    pub avatar_url: Option<String>,
}

/// Build the view for a state
pub fn view(state: &ConversationState, ctx: &WidgetContext) -> View {
    let step = ctx.graph.get(state.current_step_id);
    let enabled = !state.options_locked();

    let messages = state
        .history
        .iter()
        .map(|entry| MessageView {
            role: entry.role,
            text: entry.text.clone(),
            html: to_markup(&entry.text),
        })
        .collect();

    let options = step
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| OptionView {
            index,
            label: option.label.clone(),
            enabled,
        })
        .collect();

    let calculator = (step.kind == StepKind::Calculator).then(|| {
        let word_count = state.context.word_count;
        CalculatorView {
            word_count,
            result: calculator::result_line(word_count),
            confirm: if state.context.return_to_step_id.is_some() {
                ConfirmMode::AutoAdvance
            } else {
                ConfirmMode::Button { enabled }
            },
        }
    });

    View {
        is_open: state.is_open,
        subtitle: step.title,
        messages,
        options,
        calculator,
        avatar_url: ctx.config.avatar_url.clone(),
    }
}

impl View {
    /// Widget markup
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<div class="sc-chat" data-open="{}">"#,
            self.is_open
        );
        out.push_str(r#"<header class="sc-header">"#);
        if let Some(url) = &self.avatar_url {
            let _ = write!(
                out,
                r#"<img class="sc-avatar" src="{}" alt="">"#,
                markup::escape_html(url)
            );
        }
        let _ = write!(
            out,
            r#"<strong>{TITLE}</strong><span class="sc-subtitle">{}</span></header>"#,
            markup::escape_html(self.subtitle)
        );

        out.push_str(r#"<div class="sc-messages">"#);
        for message in &self.messages {
            let class = match message.role {
                Role::Bot => "sc-bot",
                Role::User => "sc-user",
            };
            let _ = write!(out, r#"<div class="sc-msg {class}">{}</div>"#, message.html);
        }
        out.push_str("</div>");

        if let Some(calculator) = &self.calculator {
            out.push_str(r#"<div class="sc-calculator">"#);
            let _ = write!(
                out,
                r#"<input type="number" min="0" max="{}" value="{}">"#,
                calculator::MAX_WORDS,
                calculator.word_count
            );
            let _ = write!(
                out,
                r#"<p class="sc-duration">{}</p>"#,
                markup::escape_html(calculator.result.as_deref().unwrap_or_default())
            );
            if let ConfirmMode::Button { enabled } = calculator.confirm {
                let _ = write!(
                    out,
                    r#"<button type="button" class="sc-confirm"{}>Angebot dafür anfragen</button>"#,
                    disabled_attr(enabled)
                );
            }
            out.push_str("</div>");
        }

        out.push_str(r#"<div class="sc-options">"#);
        for option in &self.options {
            let _ = write!(
                out,
                r#"<button type="button" class="sc-option" data-index="{}"{}>{}</button>"#,
                option.index,
                disabled_attr(option.enabled),
                markup::escape_html(&option.label)
            );
        }
        out.push_str("</div></div>");
        out
    }
}

fn disabled_attr(enabled: bool) -> &'static str {
    if enabled {
        ""
    } else {
        " disabled"
    }
}
