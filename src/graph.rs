//! Step graph
//!
//! A fixed, declarative table of conversation steps. Lookups are pure and
//! never fail: unknown ids resolve to the start step.

mod steps;

use crate::briefing::{Briefing, BriefingField};
use crate::config::WidgetConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a step in the conversation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Start,
    Demos,
    Preise,
    Technik,
    Ablauf,
    Rechner,
    Nutzungsrechte,
    NutzungsrechteBeispiele,
    Kontakt,
    BriefingEinsatz,
    BriefingLaufzeit,
    BriefingTonalitaet,
    BriefingLaenge,
    BriefingDeadline,
    BriefingAussprache,
    BriefingSummary,
}

impl StepId {
    pub const ALL: [StepId; 16] = [
        StepId::Start,
        StepId::Demos,
        StepId::Preise,
        StepId::Technik,
        StepId::Ablauf,
        StepId::Rechner,
        StepId::Nutzungsrechte,
        StepId::NutzungsrechteBeispiele,
        StepId::Kontakt,
        StepId::BriefingEinsatz,
        StepId::BriefingLaufzeit,
        StepId::BriefingTonalitaet,
        StepId::BriefingLaenge,
        StepId::BriefingDeadline,
        StepId::BriefingAussprache,
        StepId::BriefingSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Start => "start",
            StepId::Demos => "demos",
            StepId::Preise => "preise",
            StepId::Technik => "technik",
            StepId::Ablauf => "ablauf",
            StepId::Rechner => "rechner",
            StepId::Nutzungsrechte => "nutzungsrechte",
            StepId::NutzungsrechteBeispiele => "nutzungsrechte-beispiele",
            StepId::Kontakt => "kontakt",
            StepId::BriefingEinsatz => "briefing-einsatz",
            StepId::BriefingLaufzeit => "briefing-laufzeit",
            StepId::BriefingTonalitaet => "briefing-tonalitaet",
            StepId::BriefingLaenge => "briefing-laenge",
            StepId::BriefingDeadline => "briefing-deadline",
            StepId::BriefingAussprache => "briefing-aussprache",
            StepId::BriefingSummary => "briefing-summary",
        }
    }

    /// Parse a wire id; `None` for anything unknown
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw)
    }

    /// Parse a wire id, falling back to the start step
    pub fn parse_or_start(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(StepId::Start)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a step is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepKind {
    #[default]
    Prompt,
    /// Shows the word-count widget alongside the options
    Calculator,
    /// Text is generated from the briefing context
    BriefingSummary,
}

/// Operation attached to an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Scroll to an in-page anchor
    Anchor { target: String },
    /// Navigate the page to another URL
    Hardlink { target: String },
    Email,
    Phone,
    Whatsapp,
    VdsLink,
    Gagenrechner,
    Form,
    Back,
    BriefingContact,
}

impl Action {
    /// Link, contact and form dispatch end the interaction; nothing is
    /// re-rendered after them.
    pub fn is_terminal(&self) -> bool {
        match self {
            Action::Anchor { .. } | Action::Back => false,
            Action::Hardlink { .. }
            | Action::Email
            | Action::Phone
            | Action::Whatsapp
            | Action::VdsLink
            | Action::Gagenrechner
            | Action::Form
            | Action::BriefingContact => true,
        }
    }
}

/// Conditional fan-out on a briefing answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub field: BriefingField,
    pub any_of: Vec<&'static str>,
    pub then: StepId,
    pub otherwise: StepId,
}

impl Branch {
    pub fn resolve(&self, briefing: &Briefing) -> StepId {
        let matched = briefing
            .get(&self.field)
            .is_some_and(|value| self.any_of.iter().any(|candidate| candidate == value));
        if matched {
            self.then
        } else {
            self.otherwise
        }
    }
}

/// Where an option leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Step(StepId),
    Branch(Branch),
}

impl Next {
    pub fn resolve(&self, briefing: &Briefing) -> StepId {
        match self {
            Next::Step(id) => *id,
            Next::Branch(branch) => branch.resolve(briefing),
        }
    }
}

/// One selectable reply of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOption {
    pub label: String,
    /// Echoed into the transcript instead of the label
    pub user_prompt: Option<String>,
    pub next: Option<Next>,
    pub action: Option<Action>,
    /// Answer written into the briefing context when selected
    pub briefing: Option<(BriefingField, String)>,
    /// Step the calculator resumes when entered through this option
    pub resume_at: Option<StepId>,
}

impl ChatOption {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            user_prompt: None,
            next: None,
            action: None,
            briefing: None,
            resume_at: None,
        }
    }

    pub fn goto(label: impl Into<String>, next: StepId) -> Self {
        Self {
            next: Some(Next::Step(next)),
            ..Self::new(label)
        }
    }

    pub fn act(label: impl Into<String>, action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::new(label)
        }
    }

    pub fn back() -> Self {
        Self::act("Zurück", Action::Back)
    }

    /// A briefing answer: the label doubles as the stored value
    pub fn answer(label: &str, field: BriefingField, next: Next) -> Self {
        Self {
            briefing: Some((field, label.to_string())),
            next: Some(next),
            ..Self::new(label)
        }
    }

    #[must_use]
    pub fn with_user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.user_prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        if let Some((_, stored)) = self.briefing.as_mut() {
            *stored = value.into();
        }
        self
    }

    #[must_use]
    pub fn resuming_at(mut self, step: StepId) -> Self {
        self.resume_at = Some(step);
        self
    }

    /// Literal utterance for the transcript
    pub fn utterance(&self) -> &str {
        self.user_prompt.as_deref().unwrap_or(&self.label)
    }
}

/// One node of the conversation graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    /// Header subtitle while the step is active
    pub title: &'static str,
    pub text: String,
    pub options: Vec<ChatOption>,
    pub kind: StepKind,
}

/// The complete step table
#[derive(Debug, Clone)]
pub struct StepGraph {
    steps: Vec<Step>,
}

impl StepGraph {
    pub fn new(config: &WidgetConfig) -> Self {
        let steps = StepId::ALL
            .into_iter()
            .map(|id| steps::build(id, config))
            .collect();
        Self { steps }
    }

    pub fn get(&self, id: StepId) -> &Step {
        &self.steps[id.index()]
    }

    /// Look up a raw id; unknown ids resolve to the start step
    pub fn lookup(&self, raw: &str) -> &Step {
        self.get(StepId::parse_or_start(raw))
    }

    pub fn start(&self) -> &Step {
        self.get(StepId::Start)
    }

    /// Opening line of a conversation
    pub fn greeting(&self, returning_visitor: bool) -> &str {
        if returning_visitor {
            steps::RETURNING_GREETING
        } else {
            &self.start().text
        }
    }
}
