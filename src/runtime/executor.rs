//! Conversation runtime executor

use super::now_ms;
use super::traits::{KeyValueStore, NavigationError, Navigator, Surface};
use crate::contact::Dispatch;
use crate::conversation::{transition, ConversationState, Effect, Event, WidgetContext};
use crate::persistence::Persistence;
use crate::render::{self, Playback, Typewriter};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// What executing one effect asks of the event loop
enum Outcome {
    Done,
    /// Feed this event back through `transition`
    FollowUp(Event),
    /// A reply was superseded; drop the rest of this event's effects
    Cancelled,
}

/// Generic conversation runtime that can work with any store, surface and
/// navigator implementation
pub struct ConversationRuntime<S, V, N>
where
    S: KeyValueStore + 'static,
    V: Surface + 'static,
    N: Navigator + 'static,
{
    ctx: Arc<WidgetContext>,
    state: ConversationState,
    persistence: Persistence<S>,
    surface: Arc<V>,
    navigator: Arc<N>,
    typewriter: Typewriter,
    /// Claimed by a handle per option click, released with the options lock
    gate: Arc<AtomicBool>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the loop ends once every handle is gone
    event_tx: mpsc::WeakSender<Event>,
    state_tx: watch::Sender<ConversationState>,
    flush_timer: Option<JoinHandle<()>>,
    settle_timer: Option<JoinHandle<()>>,
}

impl<S, V, N> ConversationRuntime<S, V, N>
where
    S: KeyValueStore + 'static,
    V: Surface + 'static,
    N: Navigator + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: Arc<WidgetContext>,
        state: ConversationState,
        persistence: Persistence<S>,
        surface: Arc<V>,
        navigator: Arc<N>,
        typewriter: Typewriter,
        gate: Arc<AtomicBool>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        state_tx: watch::Sender<ConversationState>,
    ) -> Self {
        Self {
            ctx,
            state,
            persistence,
            surface,
            navigator,
            typewriter,
            gate,
            event_rx,
            event_tx,
            state_tx,
            flush_timer: None,
            settle_timer: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(step = %self.state.current_step_id, "Starting conversation runtime");

        // Process events strictly one after another
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event).await;
        }

        self.abort_timers();
        if let Err(e) = self.persistence.save(&self.state).await {
            tracing::warn!(error = %e, "Failed to persist conversation on shutdown");
        }
        tracing::info!("Conversation runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        // Whether this event owns the gate: it claimed it, or the options
        // were locked at some point while it ran
        let mut holds_gate = event.is_gated() || self.state.ui.options_locked;

        // Follow-up events run before anything else from the queue
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            let name = current_event.name();

            // Pure state transition
            let result = match transition(&self.state, &self.ctx, current_event, now_ms()) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(event = name, error = %e, "Event rejected");
                    continue;
                }
            };

            let previous_step = self.state.current_step_id;
            self.state = result.new_state;
            if previous_step != self.state.current_step_id {
                tracing::debug!(from = %previous_step, to = %self.state.current_step_id, "Step changed");
            }
            holds_gate |= self.state.ui.options_locked;
            self.publish();

            for effect in result.effects {
                match self.execute_effect(effect).await {
                    Outcome::Done => {}
                    Outcome::FollowUp(generated) => events_to_process.push_back(generated),
                    Outcome::Cancelled => {
                        tracing::debug!(event = name, "Reply cancelled, dropping remaining effects");
                        self.state.ui.options_locked = false;
                        self.publish();
                        break;
                    }
                }
            }
        }

        // A handle may have claimed the gate for a click that is still
        // queued; only release it when this event owned the lock.
        if holds_gate {
            self.gate
                .store(self.state.ui.options_locked, Ordering::Release);
        }
    }

    async fn execute_effect(&mut self, effect: Effect) -> Outcome {
        match effect {
            Effect::Reply { text, animate } => {
                if !animate {
                    return Outcome::FollowUp(Event::ReplyCommitted { text });
                }
                match self.typewriter.play(&*self.surface, &text).await {
                    Playback::Completed => Outcome::FollowUp(Event::ReplyCommitted { text }),
                    Playback::Cancelled => Outcome::Cancelled,
                }
            }

            Effect::Dispatch(dispatch) => self.dispatch(dispatch).await,

            Effect::WriteHandoff { text } => {
                if let Err(e) = self.persistence.write_handoff(&text, now_ms()).await {
                    tracing::warn!(error = %e, "Failed to write contact handoff");
                }
                Outcome::Done
            }

            Effect::PersistState => {
                if let Err(e) = self.persistence.save(&self.state).await {
                    tracing::warn!(error = %e, "Failed to persist conversation");
                }
                Outcome::Done
            }

            Effect::ScheduleFlush { delay, generation } => {
                if let Some(timer) = self.flush_timer.take() {
                    timer.abort();
                }
                self.flush_timer = Some(self.schedule(delay, Event::FlushDue { generation }));
                Outcome::Done
            }

            Effect::ScheduleSettle { delay, generation } => {
                if let Some(timer) = self.settle_timer.take() {
                    timer.abort();
                }
                self.settle_timer =
                    Some(self.schedule(delay, Event::SettleElapsed { generation }));
                Outcome::Done
            }

            Effect::ShowDuration { line } => {
                self.surface.show_duration(line.as_deref());
                Outcome::Done
            }

            Effect::ClearStorage => {
                self.abort_timers();
                if let Err(e) = self.persistence.clear().await {
                    tracing::warn!(error = %e, "Failed to clear stored conversation");
                }
                Outcome::Done
            }

            Effect::MarkVisited => {
                if let Err(e) = self.persistence.mark_visited().await {
                    tracing::warn!(error = %e, "Failed to store visited marker");
                }
                Outcome::Done
            }

            Effect::CopyToClipboard { value } => {
                if let Err(e) = self.navigator.copy(&value).await {
                    tracing::debug!(error = %e, "Clipboard unavailable, offering manual copy");
                    self.surface.offer_manual_copy(&value);
                }
                self.surface.toast("Kopiert");
                Outcome::Done
            }

            Effect::PlaySound(sound) => {
                self.surface.play_sound(sound);
                Outcome::Done
            }

            Effect::Render => {
                self.surface.render(&render::view(&self.state, &self.ctx));
                Outcome::Done
            }
        }
    }

    async fn dispatch(&self, dispatch: Dispatch) -> Outcome {
        match self.navigator.dispatch(&dispatch).await {
            Ok(()) => {
                tracing::info!(target_url = dispatch.target(), "Dispatched");
                Outcome::Done
            }
            Err(NavigationError::PopupBlocked) => match dispatch {
                Dispatch::OpenExternal {
                    fallback_copy: Some(fallback),
                    ..
                } => Outcome::FollowUp(Event::PopupBlocked { fallback }),
                _ => {
                    tracing::warn!(target_url = dispatch.target(), "Popup blocked");
                    Outcome::Done
                }
            },
            Err(e) => {
                tracing::warn!(target_url = dispatch.target(), error = %e, "Dispatch failed");
                Outcome::Done
            }
        }
    }

    /// Deliver `event` after `delay` unless the runtime has shut down
    fn schedule(&self, delay: Duration, event: Event) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(event_tx) = event_tx.upgrade() {
                let _ = event_tx.send(event).await;
            }
        })
    }

    fn abort_timers(&mut self) {
        for timer in [self.flush_timer.take(), self.settle_timer.take()]
            .into_iter()
            .flatten()
        {
            timer.abort();
        }
    }

    /// Close the gate before anyone can observe a locked state
    fn publish(&self) {
        if self.state.ui.options_locked {
            self.gate.store(true, Ordering::Release);
        }
        self.state_tx.send_replace(self.state.clone());
    }
}
