//! Property-based tests for the conversation controller
//!
//! These tests verify key invariants hold across arbitrary click sequences.

use super::*;
use crate::briefing::summary_text;
use crate::config::{Timing, WidgetConfig};
use crate::graph::StepId;
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> WidgetContext {
    WidgetContext::new(
        WidgetConfig {
            email: Some("studio@example.com".to_string()),
            ..WidgetConfig::default()
        },
        Timing::instant(),
    )
}

/// Run an event the way the executor does: replies commit immediately and
/// settle timers fire at once. Returns `None` when the event is rejected.
fn drive(
    state: &ConversationState,
    ctx: &WidgetContext,
    event: Event,
) -> Option<ConversationState> {
    let mut queue = VecDeque::from([event]);
    let mut state = state.clone();
    let mut first = true;

    while let Some(event) = queue.pop_front() {
        let result = match transition(&state, ctx, event, 0) {
            Ok(result) => result,
            Err(_) if first => return None,
            Err(_) => continue,
        };
        first = false;
        state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::Reply { text, .. } => queue.push_back(Event::ReplyCommitted { text }),
                Effect::ScheduleSettle { generation, .. } => {
                    queue.push_back(Event::SettleElapsed { generation });
                }
                _ => {}
            }
        }
    }
    Some(state)
}

fn opened(ctx: &WidgetContext) -> ConversationState {
    drive(&ConversationState::default(), ctx, Event::Open).unwrap_or_default()
}

/// Indices of options that move forward without dispatching anything
fn forward_options(state: &ConversationState, ctx: &WidgetContext) -> Vec<usize> {
    ctx.graph
        .get(state.current_step_id)
        .options
        .iter()
        .enumerate()
        .filter(|(_, o)| o.action.is_none() && o.next.is_some() && o.resume_at.is_none())
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => Just(Event::Open),
        1 => Just(Event::Close),
        4 => (0usize..8).prop_map(|index| Event::SelectOption { index }),
        2 => Just(Event::GoBack),
        1 => "[0-9]{0,5}".prop_map(|raw| Event::WordCountInput { raw }),
        1 => Just(Event::CalculatorConfirm),
        1 => (0u64..4).prop_map(|generation| Event::FlushDue { generation }),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // History only grows until reset
    #[test]
    fn prop_history_append_only(events in proptest::collection::vec(arb_event(), 0..40)) {
        let ctx = test_context();
        let mut state = opened(&ctx);

        for event in events {
            if let Some(next) = drive(&state, &ctx, event) {
                prop_assert!(next.history.len() >= state.history.len());
                prop_assert_eq!(next.history.get(..state.history.len()), Some(state.history.as_slice()));
                state = next;
            }
        }
    }

    // The stack only ever holds ancestors: no duplicates, never the current step
    #[test]
    fn prop_stack_holds_ancestors(events in proptest::collection::vec(arb_event(), 0..40)) {
        let ctx = test_context();
        let mut state = opened(&ctx);

        for event in events {
            if let Some(next) = drive(&state, &ctx, event) {
                state = next;
            }
            let unique: HashSet<StepId> = state.nav_stack.iter().copied().collect();
            prop_assert_eq!(unique.len(), state.nav_stack.len(), "stack {:?}", state.nav_stack);
            prop_assert!(!state.nav_stack.contains(&state.current_step_id));
            prop_assert!(!state.options_locked(), "lock leaked after {:?}", state.history.last());
        }
    }

    // k forward transitions without revisits followed by k backs land on start
    #[test]
    fn prop_back_unwinds_forward_walk(choices in proptest::collection::vec(any::<prop::sample::Index>(), 0..12)) {
        let ctx = test_context();
        let mut state = opened(&ctx);
        let mut visited = HashSet::from([StepId::Start]);
        let mut steps = 0;

        for choice in choices {
            let candidates = forward_options(&state, &ctx);
            if candidates.is_empty() {
                break;
            }
            let index = candidates[choice.index(candidates.len())];
            let Some(next) = drive(&state, &ctx, Event::SelectOption { index }) else {
                break;
            };
            if !visited.insert(next.current_step_id) {
                break;
            }
            state = next;
            steps += 1;
        }

        prop_assert_eq!(state.nav_stack.len(), steps);
        for _ in 0..steps {
            state = drive(&state, &ctx, Event::GoBack).unwrap_or_default();
        }
        prop_assert_eq!(state.current_step_id, StepId::Start);
        prop_assert!(state.nav_stack.is_empty());
    }

    // Same answers give the same summary, however the visitor got there
    #[test]
    fn prop_summary_independent_of_path(
        answers in proptest::collection::vec(0usize..8, 6),
        detours in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let ctx = test_context();
        let start = drive(&opened(&ctx), &ctx, Event::SelectOption { index: 2 }).unwrap_or_default();
        prop_assert_eq!(start.current_step_id, StepId::BriefingEinsatz);

        let direct = walk_briefing(&start, &ctx, &answers, &[false; 6]);
        let winding = walk_briefing(&start, &ctx, &answers, &detours);

        prop_assert_eq!(direct.current_step_id, StepId::BriefingSummary);
        prop_assert_eq!(winding.current_step_id, StepId::BriefingSummary);
        prop_assert_eq!(&direct.context.briefing, &winding.context.briefing);
        prop_assert_eq!(direct.last_bot_text(), winding.last_bot_text());
        let expected = summary_text(&direct.context.briefing, direct.context.word_count);
        prop_assert_eq!(direct.last_bot_text(), Some(expected.as_str()));
    }
}

/// Answer every briefing question with an answer option, optionally going
/// back and answering the same question again.
fn walk_briefing(
    start: &ConversationState,
    ctx: &WidgetContext,
    answers: &[usize],
    detours: &[bool],
) -> ConversationState {
    let mut state = start.clone();
    for (answer, detour) in answers.iter().zip(detours) {
        if state.current_step_id == StepId::BriefingSummary {
            break;
        }
        let candidates: Vec<usize> = ctx
            .graph
            .get(state.current_step_id)
            .options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.briefing.is_some())
            .map(|(i, _)| i)
            .collect();
        let index = candidates[answer % candidates.len()];
        let answered = drive(&state, ctx, Event::SelectOption { index }).unwrap_or_default();
        state = if *detour {
            let back = drive(&answered, ctx, Event::GoBack).unwrap_or_default();
            assert_eq!(back.current_step_id, state.current_step_id);
            drive(&back, ctx, Event::SelectOption { index }).unwrap_or_default()
        } else {
            answered
        };
    }
    state
}

#[test]
fn test_full_briefing_walk() {
    let ctx = test_context();
    let state = drive(&opened(&ctx), &ctx, Event::SelectOption { index: 2 }).unwrap_or_default();
    let state = walk_briefing(&state, &ctx, &[0; 6], &[true; 6]);

    assert_eq!(state.current_step_id, StepId::BriefingSummary);
    assert_eq!(state.context.briefing.len(), 6);
    assert!(state.context.briefing_started);
}
