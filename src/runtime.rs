//! Runtime for executing conversations
//!
//! One tokio task owns the conversation state and consumes events strictly
//! in order. Front ends talk to it through a cloneable [`ControllerHandle`].

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::conversation::{ConversationState, Event, WidgetContext};
use crate::persistence::{strip_reset_param, Persistence};
use crate::render::{self, Typewriter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const EVENT_QUEUE_CAPACITY: usize = 64;

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ControllerHandle {
    event_tx: mpsc::Sender<Event>,
    gate: Arc<AtomicBool>,
    typewriter: Typewriter,
    state_rx: watch::Receiver<ConversationState>,
}

impl ControllerHandle {
    async fn send(&self, event: Event) -> bool {
        let name = event.name();
        if self.event_tx.send(event).await.is_err() {
            tracing::warn!(event = name, "Conversation runtime is gone");
            return false;
        }
        true
    }

    /// Send an option-driven event unless options are locked. Two clicks
    /// racing each other cannot both pass.
    async fn send_gated(&self, event: Event) -> bool {
        if self
            .gate
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(event = event.name(), "Options locked, ignoring");
            return false;
        }
        if self.send(event).await {
            true
        } else {
            self.gate.store(false, Ordering::Release);
            false
        }
    }

    pub async fn open(&self) -> bool {
        self.send(Event::Open).await
    }

    pub async fn close(&self) -> bool {
        self.send(Event::Close).await
    }

    /// Returns `false` when the click was ignored
    pub async fn select_option(&self, index: usize) -> bool {
        self.send_gated(Event::SelectOption { index }).await
    }

    pub async fn go_back(&self) -> bool {
        self.send_gated(Event::GoBack).await
    }

    pub async fn confirm_calculator(&self) -> bool {
        self.send_gated(Event::CalculatorConfirm).await
    }

    /// Calculator keystroke
    pub async fn input_words(&self, raw: impl Into<String>) -> bool {
        self.send(Event::WordCountInput { raw: raw.into() }).await
    }

    pub async fn copy(&self, value: impl Into<String>) -> bool {
        self.send(Event::CopyRequested {
            value: value.into(),
        })
        .await
    }

    /// Start over. A reply still being typed is abandoned.
    pub async fn reset(&self) -> bool {
        self.typewriter.cancel();
        self.send(Event::Reset).await
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    /// Wait for a published state matching `predicate`
    pub async fn wait_until(
        &self,
        predicate: impl Fn(&ConversationState) -> bool,
        timeout: Duration,
    ) -> Option<ConversationState> {
        let mut state_rx = self.state_rx.clone();
        tokio::time::timeout(timeout, async move {
            state_rx
                .wait_for(|state| predicate(state))
                .await
                .ok()
                .map(|state| state.clone())
        })
        .await
        .ok()
        .flatten()
    }
}

/// Restore the conversation and start its runtime.
///
/// `page_url` is checked for the reset parameter; when present the stored
/// conversation is wiped and the address bar is cleaned up.
pub async fn launch<S, V, N>(
    ctx: WidgetContext,
    persistence: Persistence<S>,
    surface: Arc<V>,
    navigator: Arc<N>,
    page_url: Option<&str>,
) -> (ControllerHandle, JoinHandle<()>)
where
    S: KeyValueStore + 'static,
    V: Surface + 'static,
    N: Navigator + 'static,
{
    if let Some(clean_url) = page_url.and_then(strip_reset_param) {
        tracing::info!("Reset requested by page URL");
        if let Err(e) = persistence.clear().await {
            tracing::warn!(error = %e, "Failed to clear stored conversation");
        }
        if let Err(e) = navigator.replace_url(&clean_url).await {
            tracing::warn!(error = %e, "Failed to clean up page URL");
        }
    }

    let mut state = persistence.load(&ctx.graph, now_ms()).await;
    state.ui.returning_visitor = persistence.has_visited().await;
    tracing::debug!(
        step = %state.current_step_id,
        history = state.history.len(),
        returning = state.ui.returning_visitor,
        "Conversation restored"
    );

    let ctx = Arc::new(ctx);
    surface.render(&render::view(&state, &ctx));

    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let (state_tx, state_rx) = watch::channel(state.clone());
    let gate = Arc::new(AtomicBool::new(state.ui.options_locked));
    let typewriter = Typewriter::new(ctx.timing.clone());

    let runtime = ConversationRuntime::new(
        ctx,
        state,
        persistence,
        surface,
        navigator,
        typewriter.clone(),
        gate.clone(),
        event_rx,
        event_tx.downgrade(),
        state_tx,
    );
    let task = tokio::spawn(runtime.run());

    let handle = ControllerHandle {
        event_tx,
        gate,
        typewriter,
        state_rx,
    };
    (handle, task)
}
