//! Typing indicator and typewriter reveal
//!
//! A reply first shows a "typing" bubble for a randomised delay, then
//! reveals its text character by character up to a budget, and shows the
//! remainder at once. Only one playback runs at a time: starting a new one
//! cancels the previous.

use super::RowId;
use crate::config::Timing;
use crate::runtime::Surface;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Full text was revealed; the caller commits it
    Completed,
    /// Superseded or reset; nothing may be committed
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    timing: Timing,
    in_flight: Arc<Mutex<Option<(RowId, CancellationToken)>>>,
    next_row: Arc<AtomicU64>,
}

impl Typewriter {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            in_flight: Arc::new(Mutex::new(None)),
            next_row: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Cancel the playback in flight, if any
    pub fn cancel(&self) {
        let slot = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((row, token)) = slot {
            tracing::debug!(%row, "Cancelling typewriter");
            token.cancel();
        }
    }

    /// Play `text` into a new pending bubble
    pub async fn play<V: Surface + ?Sized>(&self, surface: &V, text: &str) -> Playback {
        let row = RowId(self.next_row.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((row, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }

        surface.show_pending(row);
        let outcome = self.animate(surface, row, text, &token).await;
        surface.remove_pending(row);

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(current, _)| *current == row) {
            *slot = None;
        }
        outcome
    }

    async fn animate<V: Surface + ?Sized>(
        &self,
        surface: &V,
        row: RowId,
        text: &str,
        token: &CancellationToken,
    ) -> Playback {
        if !sleep_or_cancel(self.typing_delay(), token).await {
            return Playback::Cancelled;
        }

        for (idx, c) in text.char_indices().take(self.timing.reveal_budget) {
            surface.reveal(row, text.get(..idx + c.len_utf8()).unwrap_or(text));
            if !sleep_or_cancel(self.timing.reveal_interval, token).await {
                return Playback::Cancelled;
            }
        }

        if token.is_cancelled() {
            return Playback::Cancelled;
        }
        surface.reveal(row, text);
        Playback::Completed
    }

    fn typing_delay(&self) -> Duration {
        let range = self.timing.typing_delay_ms.clone();
        if range.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(range))
    }
}

/// Sleep for `delay`; `false` when cancelled first
async fn sleep_or_cancel(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = token.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
