//! Pure state transition function
//!
//! Given the same state, context, event and clock reading this always
//! produces the same new state and effect list. All I/O happens in the
//! executor that interprets the effects.

use super::{ConversationState, Effect, Event, Role, UiState, WidgetContext};
use crate::briefing::{summary_text, BriefingField};
use crate::calculator::{self, WORDS_PER_MINUTE};
use crate::contact;
use crate::graph::{Action, StepId, StepKind};
use crate::render::Sound;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Options are locked while a reply is being produced")]
    OptionsLocked,
    #[error("Step {step} has no option {index}")]
    UnknownOption { step: StepId, index: usize },
    #[error("Calculator is not active on step {0}")]
    CalculatorInactive(StepId),
}

/// Pure transition function
pub fn transition(
    state: &ConversationState,
    ctx: &WidgetContext,
    event: Event,
    now_ms: i64,
) -> Result<TransitionResult, TransitionError> {
    if event.is_gated() && state.options_locked() {
        return Err(TransitionError::OptionsLocked);
    }

    let next = state.clone();
    match event {
        Event::Open => Ok(open(next, ctx)),

        Event::Close => {
            let mut next = next;
            next.is_open = false;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PersistState)
                .with_effect(Effect::Render))
        }

        Event::SelectOption { index } => select_option(next, ctx, index, now_ms),

        Event::GoBack => {
            let mut next = next;
            next.ui.options_locked = true;
            let reply = go_back(&mut next, ctx);
            Ok(finish(next, vec![Effect::PersistState], Some(reply)))
        }

        Event::Reset => Ok(reset(state, ctx)),

        Event::WordCountInput { raw } => word_count_input(next, ctx, &raw),

        Event::CalculatorConfirm => calculator_confirm(next, ctx, now_ms),

        Event::CopyRequested { value } => {
            Ok(TransitionResult::new(next).with_effect(Effect::CopyToClipboard { value }))
        }

        Event::FlushDue { generation } => {
            let current = generation == next.ui.input_generation;
            Ok(TransitionResult::new(next).with_effects(current.then_some(Effect::PersistState)))
        }

        Event::SettleElapsed { generation } => Ok(settle_elapsed(next, ctx, generation, now_ms)),

        Event::ReplyCommitted { text } => {
            let mut next = next;
            next.push(Role::Bot, text, now_ms);
            next.ui.options_locked = false;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PlaySound(Sound::MessageIn))
                .with_effect(Effect::PersistState)
                .with_effect(Effect::Render))
        }

        Event::PopupBlocked { fallback } => {
            let mut next = next;
            next.ui.options_locked = true;
            let notice = format!(
                "Das Fenster konnte nicht geöffnet werden. Tippe auf die Nummer, um sie zu kopieren: {fallback}"
            );
            Ok(finish(next, vec![], Some(Effect::animated_reply(notice))))
        }
    }
}

/// Render first, then the reply, so the transcript shows the user echo
/// while the bot is typing.
fn finish(
    state: ConversationState,
    effects: Vec<Effect>,
    reply: Option<Effect>,
) -> TransitionResult {
    TransitionResult::new(state)
        .with_effects(effects)
        .with_effect(Effect::Render)
        .with_effects(reply)
}

fn open(mut state: ConversationState, ctx: &WidgetContext) -> TransitionResult {
    if state.is_open && state.flags.welcomed {
        return TransitionResult::new(state).with_effect(Effect::Render);
    }

    state.is_open = true;
    let greeting = if state.flags.welcomed {
        None
    } else {
        state.flags.welcomed = true;
        state.ui.options_locked = true;
        Some(Effect::animated_reply(
            ctx.graph.greeting(state.ui.returning_visitor),
        ))
    };
    state.ui.returning_visitor = true;

    finish(
        state,
        vec![
            Effect::PlaySound(Sound::Open),
            Effect::MarkVisited,
            Effect::PersistState,
        ],
        greeting,
    )
}

fn reset(state: &ConversationState, ctx: &WidgetContext) -> TransitionResult {
    let mut fresh = ConversationState {
        is_open: state.is_open,
        ui: UiState {
            options_locked: true,
            input_generation: state.ui.input_generation + 1,
            returning_visitor: state.ui.returning_visitor,
        },
        ..ConversationState::default()
    };
    fresh.flags.welcomed = true;
    let greeting = ctx.graph.greeting(state.ui.returning_visitor).to_string();

    finish(
        fresh,
        vec![
            Effect::ClearStorage,
            Effect::ShowDuration { line: None },
            Effect::PersistState,
        ],
        Some(Effect::animated_reply(greeting)),
    )
}

fn select_option(
    mut state: ConversationState,
    ctx: &WidgetContext,
    index: usize,
    now_ms: i64,
) -> Result<TransitionResult, TransitionError> {
    let step = ctx.graph.get(state.current_step_id);
    let option = step
        .options
        .get(index)
        .ok_or(TransitionError::UnknownOption {
            step: step.id,
            index,
        })?;

    state.push(Role::User, option.utterance(), now_ms);
    if let Some((field, value)) = &option.briefing {
        state.context.briefing.insert(*field, value.clone());
        state.context.briefing_started = true;
    }
    state.ui.options_locked = true;

    let mut effects = vec![Effect::PlaySound(Sound::Click), Effect::PersistState];

    let reply = match &option.action {
        Some(Action::Back) => Some(go_back(&mut state, ctx)),
        Some(action) => match run_action(&state, ctx, action, &mut effects) {
            Some(notice) => Some(notice),
            None => {
                if let Some(next) = &option.next {
                    let target = next.resolve(&state.context.briefing);
                    Some(enter_step(&mut state, ctx, target, false, option.resume_at))
                } else if action.is_terminal() {
                    state.ui.options_locked = false;
                    None
                } else {
                    Some(Effect::animated_reply(step_text(&state, ctx, state.current_step_id)))
                }
            }
        },
        None => match &option.next {
            Some(next) => {
                let target = next.resolve(&state.context.briefing);
                Some(enter_step(&mut state, ctx, target, false, option.resume_at))
            }
            None => {
                state.ui.options_locked = false;
                None
            }
        },
    };

    Ok(finish(state, effects, reply))
}

/// Queue the dispatch for an action. Returns the bot notice when the
/// action is not configured.
fn run_action(
    state: &ConversationState,
    ctx: &WidgetContext,
    action: &Action,
    effects: &mut Vec<Effect>,
) -> Option<Effect> {
    match contact::resolve(action, &ctx.config, &state.context) {
        Ok(resolution) => {
            if let Some(resolution) = resolution {
                if let Some(text) = resolution.handoff {
                    effects.push(Effect::WriteHandoff { text });
                }
                effects.push(Effect::Dispatch(resolution.dispatch));
            }
            None
        }
        Err(missing) => Some(Effect::animated_reply(missing.to_string())),
    }
}

/// Move to `target` and produce its prompt
fn enter_step(
    state: &mut ConversationState,
    ctx: &WidgetContext,
    target: StepId,
    skip_stack: bool,
    resume_at: Option<StepId>,
) -> Effect {
    let current = state.current_step_id;

    if let Some(pos) = state.nav_stack.iter().position(|id| *id == target) {
        state.nav_stack.truncate(pos);
    } else if target != current && !skip_stack {
        state.nav_stack.push(current);
    }

    if target == StepId::Rechner {
        if current != StepId::Rechner {
            state.context.return_to_step_id = resume_at;
        }
    } else {
        state.context.return_to_step_id = None;
    }

    if target == StepId::BriefingEinsatz && current != StepId::BriefingEinsatz {
        state.context.briefing.clear();
        state.context.briefing_started = true;
    }

    state.current_step_id = target;
    Effect::animated_reply(step_text(state, ctx, target))
}

fn go_back(state: &mut ConversationState, ctx: &WidgetContext) -> Effect {
    let resume = if state.current_step_id == StepId::Rechner {
        state.context.return_to_step_id.take()
    } else {
        None
    };

    let target = match resume {
        Some(step) => {
            if let Some(pos) = state.nav_stack.iter().position(|id| *id == step) {
                state.nav_stack.truncate(pos);
            }
            step
        }
        None => state.nav_stack.pop().unwrap_or(StepId::Start),
    };

    if target != StepId::Rechner {
        state.context.return_to_step_id = None;
    }
    state.current_step_id = target;
    Effect::instant_reply(step_text(state, ctx, target))
}

fn step_text(state: &ConversationState, ctx: &WidgetContext, id: StepId) -> String {
    let step = ctx.graph.get(id);
    match step.kind {
        StepKind::BriefingSummary => {
            summary_text(&state.context.briefing, state.context.word_count)
        }
        StepKind::Prompt | StepKind::Calculator => step.text.clone(),
    }
}

fn word_count_input(
    mut state: ConversationState,
    ctx: &WidgetContext,
    raw: &str,
) -> Result<TransitionResult, TransitionError> {
    if state.current_step_id != StepId::Rechner {
        return Err(TransitionError::CalculatorInactive(state.current_step_id));
    }

    let words = calculator::parse_word_count(raw);
    state.context.word_count = words;
    state.ui.input_generation += 1;
    let generation = state.ui.input_generation;

    let settle = (words > 0 && state.context.return_to_step_id.is_some()).then_some(
        Effect::ScheduleSettle {
            delay: ctx.timing.settle,
            generation,
        },
    );

    Ok(TransitionResult::new(state)
        .with_effect(Effect::ShowDuration {
            line: calculator::result_line(words),
        })
        .with_effect(Effect::ScheduleFlush {
            delay: ctx.timing.debounce,
            generation,
        })
        .with_effects(settle))
}

/// Auto-advance out of a calculator entered from the briefing
fn settle_elapsed(
    mut state: ConversationState,
    ctx: &WidgetContext,
    generation: u64,
    now_ms: i64,
) -> TransitionResult {
    let ready = generation == state.ui.input_generation
        && state.current_step_id == StepId::Rechner
        && !state.ui.options_locked
        && state.context.word_count > 0;
    let Some(resume) = state.context.return_to_step_id.filter(|_| ready) else {
        return TransitionResult::new(state);
    };

    let words = state.context.word_count;
    let label = calculator::duration_label(words, WORDS_PER_MINUTE);
    state.push(Role::User, format!("{words} Wörter"), now_ms);
    state.context.briefing.insert(
        BriefingField::Laenge,
        format!("{words} Wörter (ca. {label} Min)"),
    );
    state.context.briefing_started = true;
    state.ui.options_locked = true;

    let reply = enter_step(&mut state, ctx, resume, true, None);
    finish(state, vec![Effect::PersistState], Some(reply))
}

/// "Angebot dafür anfragen" below a standalone calculator
fn calculator_confirm(
    mut state: ConversationState,
    ctx: &WidgetContext,
    now_ms: i64,
) -> Result<TransitionResult, TransitionError> {
    if state.current_step_id != StepId::Rechner || state.context.return_to_step_id.is_some() {
        return Err(TransitionError::CalculatorInactive(state.current_step_id));
    }

    let words = state.context.word_count;
    let utterance = if words > 0 {
        format!("Angebot für {words} Wörter anfragen")
    } else {
        "Angebot anfragen".to_string()
    };
    state.push(Role::User, utterance, now_ms);

    let mut effects = vec![Effect::PlaySound(Sound::Click), Effect::PersistState];
    let notice = run_action(&state, ctx, &Action::Form, &mut effects);
    state.ui.options_locked = notice.is_some();
    Ok(finish(state, effects, notice))
}
