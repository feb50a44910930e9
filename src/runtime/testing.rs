//! Mock implementations for testing
//!
//! These mocks enable integration testing without a browser.

use super::traits::*;
use super::{launch, ControllerHandle};
use crate::config::{Timing, WidgetConfig};
use crate::contact::Dispatch;
use crate::conversation::{ConversationState, WidgetContext};
use crate::graph::StepGraph;
use crate::persistence::{MemoryStore, Persistence};
use crate::render::{RowId, Sound, View};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Recording Surface
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Render(View),
    ShowPending(RowId),
    Reveal(RowId, String),
    RemovePending(RowId),
    ShowDuration(Option<String>),
    Sound(Sound),
    Toast(String),
    ManualCopy(String),
}

/// Surface that records every call
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

#[allow(dead_code)]
impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Typing bubbles shown but not yet removed
    pub fn pending_rows(&self) -> Vec<RowId> {
        let mut open = Vec::new();
        for call in self.calls() {
            match call {
                SurfaceCall::ShowPending(row) => open.push(row),
                SurfaceCall::RemovePending(row) => open.retain(|r| *r != row),
                _ => {}
            }
        }
        open
    }

    pub fn last_view(&self) -> Option<View> {
        self.calls().into_iter().rev().find_map(|call| match call {
            SurfaceCall::Render(view) => Some(view),
            _ => None,
        })
    }

    pub fn sounds(&self) -> Vec<Sound> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Sound(sound) => Some(sound),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Toast(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn render(&self, view: &View) {
        self.record(SurfaceCall::Render(view.clone()));
    }

    fn show_pending(&self, row: RowId) {
        self.record(SurfaceCall::ShowPending(row));
    }

    fn reveal(&self, row: RowId, text: &str) {
        self.record(SurfaceCall::Reveal(row, text.to_string()));
    }

    fn remove_pending(&self, row: RowId) {
        self.record(SurfaceCall::RemovePending(row));
    }

    fn show_duration(&self, line: Option<&str>) {
        self.record(SurfaceCall::ShowDuration(line.map(str::to_string)));
    }

    fn play_sound(&self, sound: Sound) {
        self.record(SurfaceCall::Sound(sound));
    }

    fn toast(&self, message: &str) {
        self.record(SurfaceCall::Toast(message.to_string()));
    }

    fn offer_manual_copy(&self, value: &str) {
        self.record(SurfaceCall::ManualCopy(value.to_string()));
    }
}

// ============================================================================
// Mock Navigator
// ============================================================================

/// Navigator that records requests and can simulate browser refusals
#[derive(Debug, Default)]
pub struct MockNavigator {
    block_popups: bool,
    fail_clipboard: bool,
    pub dispatched: Mutex<Vec<Dispatch>>,
    pub copied: Mutex<Vec<String>>,
    pub replaced_urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn blocking_popups(mut self) -> Self {
        self.block_popups = true;
        self
    }

    #[must_use]
    pub fn failing_clipboard(mut self) -> Self {
        self.fail_clipboard = true;
        self
    }

    pub fn recorded_dispatches(&self) -> Vec<Dispatch> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn recorded_copies(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }

    pub fn recorded_urls(&self) -> Vec<String> {
        self.replaced_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for MockNavigator {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), NavigationError> {
        if self.block_popups && matches!(dispatch, Dispatch::OpenExternal { .. }) {
            return Err(NavigationError::PopupBlocked);
        }
        self.dispatched.lock().unwrap().push(dispatch.clone());
        Ok(())
    }

    async fn copy(&self, value: &str) -> Result<(), NavigationError> {
        if self.fail_clipboard {
            return Err(NavigationError::Failed("clipboard denied".to_string()));
        }
        self.copied.lock().unwrap().push(value.to_string());
        Ok(())
    }

    async fn replace_url(&self, url: &str) -> Result<(), NavigationError> {
        self.replaced_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

const WAIT: Duration = Duration::from_secs(2);

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime {
    pub handle: ControllerHandle,
    pub surface: Arc<RecordingSurface>,
    pub navigator: Arc<MockNavigator>,
    pub session: Arc<MemoryStore>,
    pub local: Arc<MemoryStore>,
    pub graph: StepGraph,
    runtime_task: tokio::task::JoinHandle<()>,
}

pub struct TestRuntimeBuilder {
    config: WidgetConfig,
    timing: Timing,
    navigator: MockNavigator,
    session: Arc<MemoryStore>,
    local: Arc<MemoryStore>,
    page_url: Option<String>,
}

#[allow(dead_code)]
impl TestRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: WidgetConfig {
                email: Some("studio@example.com".to_string()),
                phone: Some("+49 40 1234567".to_string()),
                whatsapp: Some("+49 172 1234567".to_string()),
                site_url: "https://example.com".to_string(),
                ..WidgetConfig::default()
            },
            timing: Timing::instant(),
            navigator: MockNavigator::new(),
            session: Arc::new(MemoryStore::new()),
            local: Arc::new(MemoryStore::new()),
            page_url: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: MockNavigator) -> Self {
        self.navigator = navigator;
        self
    }

    /// Reuse stores, as after a page reload
    #[must_use]
    pub fn stores(mut self, session: Arc<MemoryStore>, local: Arc<MemoryStore>) -> Self {
        self.session = session;
        self.local = local;
        self
    }

    #[must_use]
    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    pub async fn start(self) -> TestRuntime {
        let ctx = WidgetContext::new(self.config, self.timing);
        let graph = ctx.graph.clone();
        let surface = Arc::new(RecordingSurface::new());
        let navigator = Arc::new(self.navigator);
        let persistence = Persistence::new(self.session.clone(), self.local.clone());

        let (handle, task) = launch(
            ctx,
            persistence,
            surface.clone(),
            navigator.clone(),
            self.page_url.as_deref(),
        )
        .await;

        TestRuntime {
            handle,
            surface,
            navigator,
            session: self.session,
            local: self.local,
            graph,
            runtime_task: task,
        }
    }
}

impl Default for TestRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestRuntime {
    pub fn builder() -> TestRuntimeBuilder {
        TestRuntimeBuilder::new()
    }

    /// Wait for a state matching `predicate`, panicking after a timeout
    pub async fn wait_for(
        &self,
        predicate: impl Fn(&ConversationState) -> bool,
    ) -> ConversationState {
        match self.handle.wait_until(predicate, WAIT).await {
            Some(state) => state,
            None => panic!("timed out; last state: {:#?}", self.handle.snapshot()),
        }
    }

    /// Poll `check` until it holds; for side effects that trail the
    /// published state
    pub async fn eventually(&self, what: &str, check: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while !check() {
            assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Drop the handle and wait for the runtime's final save, returning
    /// the stores for a simulated reload
    pub async fn shutdown(self) -> (Arc<MemoryStore>, Arc<MemoryStore>) {
        drop(self.handle);
        let _ = self.runtime_task.await;
        (self.session, self.local)
    }

    /// Open the widget and wait for the greeting
    pub async fn open(&self) -> ConversationState {
        assert!(self.handle.open().await);
        self.wait_for(|s| s.is_open && !s.history.is_empty() && !s.options_locked())
            .await
    }

    /// Click the option with `label` on the current step
    pub async fn click(&self, label: &str) -> bool {
        let state = self.handle.snapshot();
        let index = self
            .graph
            .get(state.current_step_id)
            .options
            .iter()
            .position(|o| o.label == label)
            .unwrap_or_else(|| panic!("no option {label} on {}", state.current_step_id));
        self.handle.select_option(index).await
    }

    /// Click and wait until the history grew by `entries` and options unlock
    pub async fn click_and_settle(&self, label: &str, entries: usize) -> ConversationState {
        let before = self.handle.snapshot().history.len();
        assert!(self.click(label).await, "click on {label} was ignored");
        self.wait_for(|s| s.history.len() >= before + entries && !s.options_locked())
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::briefing::BriefingField;
    use crate::conversation::Role;
    use crate::graph::StepId;
    use crate::persistence::{HANDOFF_KEY, LEGACY_STATE_KEY, STATE_KEY, VISITED_KEY};

    #[tokio::test]
    async fn test_open_greets_and_marks_visited() {
        let rt = TestRuntime::builder().start().await;
        let state = rt.open().await;

        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].role, Role::Bot);
        rt.eventually("greeting sound", || rt.surface.sounds().len() == 2)
            .await;
        assert!(rt.local.get(VISITED_KEY).await.unwrap().is_some());
        assert!(rt.session.get(STATE_KEY).await.unwrap().is_some());
        assert_eq!(rt.surface.sounds(), vec![Sound::Open, Sound::MessageIn]);
        assert!(rt.surface.pending_rows().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_round_trip() {
        let rt = TestRuntime::builder().start().await;
        rt.open().await;

        let state = rt.click_and_settle("Preise & Buyouts", 2).await;
        assert_eq!(state.current_step_id, StepId::Preise);
        assert_eq!(state.history[1].text, "Preise & Gagen");

        rt.eventually("reply rendered", || {
            rt.surface.last_view().is_some_and(|v| v.messages.len() == 3)
        })
        .await;
        let view = rt.surface.last_view().unwrap();
        assert_eq!(view.subtitle, "Preise & Gagen");
        assert_eq!(view.messages.len(), 3);
        assert!(view.options.iter().all(|o| o.enabled));

        assert!(rt.handle.go_back().await);
        let state = rt
            .wait_for(|s| s.current_step_id == StepId::Start && !s.options_locked())
            .await;
        assert!(state.nav_stack.is_empty());
    }

    #[tokio::test]
    async fn test_clicks_while_typing_are_ignored() {
        let rt = TestRuntime::builder()
            .timing(Timing {
                typing_delay_ms: 100..=100,
                ..Timing::instant()
            })
            .start()
            .await;
        rt.open().await;

        assert!(rt.click("Kontakt").await);
        assert!(!rt.click("Kontakt").await);
        assert!(!rt.handle.go_back().await);

        let state = rt
            .wait_for(|s| s.current_step_id == StepId::Kontakt && !s.options_locked())
            .await;
        let user_lines = state.history.iter().filter(|e| e.role == Role::User).count();
        assert_eq!(user_lines, 1);
    }

    #[tokio::test]
    async fn test_clicks_during_greeting_are_ignored() {
        let rt = TestRuntime::builder()
            .timing(Timing {
                typing_delay_ms: 200..=200,
                ..Timing::instant()
            })
            .start()
            .await;

        assert!(rt.handle.open().await);
        rt.wait_for(ConversationState::options_locked).await;
        assert!(!rt.handle.select_option(5).await);
        assert!(!rt.handle.go_back().await);

        let state = rt
            .wait_for(|s| !s.history.is_empty() && !s.options_locked())
            .await;
        assert_eq!(state.current_step_id, StepId::Start);
        assert_eq!(state.history.len(), 1);

        // the gate opens again with the options
        let state = rt.click_and_settle("Kontakt", 2).await;
        assert_eq!(state.current_step_id, StepId::Kontakt);
    }

    #[tokio::test]
    async fn test_reset_greeting_blocks_clicks() {
        let rt = TestRuntime::builder()
            .timing(Timing {
                typing_delay_ms: 200..=200,
                ..Timing::instant()
            })
            .start()
            .await;
        rt.open().await;

        assert!(rt.handle.reset().await);
        rt.wait_for(|s| s.history.is_empty() && s.options_locked())
            .await;
        assert!(!rt.handle.select_option(0).await);

        let state = rt
            .wait_for(|s| s.history.len() == 1 && !s.options_locked())
            .await;
        assert_eq!(state.current_step_id, StepId::Start);
    }

    #[tokio::test]
    async fn test_missing_phone_adds_one_notice() {
        let rt = TestRuntime::builder()
            .config(WidgetConfig::default())
            .start()
            .await;
        rt.open().await;
        let before = rt.click_and_settle("Kontakt", 2).await;

        let after = rt.click_and_settle("📞 Anrufen", 2).await;
        assert_eq!(after.current_step_id, StepId::Kontakt);
        assert_eq!(after.history.len(), before.history.len() + 2);
        assert_eq!(
            after.last_bot_text(),
            Some("Bitte eine Telefonnummer im Backend hinterlegen.")
        );
        assert!(rt.navigator.recorded_dispatches().is_empty());
    }

    #[tokio::test]
    async fn test_phone_dispatch() {
        let rt = TestRuntime::builder().start().await;
        rt.open().await;
        rt.click_and_settle("Kontakt", 2).await;
        rt.click_and_settle("📞 Anrufen", 1).await;

        rt.eventually("dispatch", || !rt.navigator.recorded_dispatches().is_empty())
            .await;
        assert_eq!(
            rt.navigator.recorded_dispatches(),
            vec![Dispatch::Navigate {
                url: "tel:+49401234567".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_blocked_whatsapp_offers_number() {
        let rt = TestRuntime::builder()
            .navigator(MockNavigator::new().blocking_popups())
            .start()
            .await;
        rt.open().await;
        rt.click_and_settle("Kontakt", 2).await;

        let state = rt.click_and_settle("💬 WhatsApp", 2).await;
        let notice = state.last_bot_text().unwrap();
        assert!(notice.ends_with("+49 172 1234567"));

        rt.eventually("notice rendered", || {
            rt.surface
                .last_view()
                .is_some_and(|v| v.messages.len() == state.history.len())
        })
        .await;
        let view = rt.surface.last_view().unwrap();
        assert!(view
            .messages
            .last()
            .unwrap()
            .html
            .contains(r#"data-copy="+49 172 1234567""#));
    }

    #[tokio::test]
    async fn test_copy_confirms_even_when_clipboard_fails() {
        let rt = TestRuntime::builder()
            .navigator(MockNavigator::new().failing_clipboard())
            .start()
            .await;
        assert!(rt.handle.copy("studio@example.com").await);

        rt.eventually("toast", || !rt.surface.toasts().is_empty()).await;
        assert_eq!(rt.surface.toasts(), vec!["Kopiert".to_string()]);
        assert!(rt
            .surface
            .calls()
            .contains(&SurfaceCall::ManualCopy("studio@example.com".to_string())));
    }

    #[tokio::test]
    async fn test_briefing_with_calculator_detour() {
        let rt = TestRuntime::builder()
            .timing(Timing {
                settle: Duration::from_millis(50),
                ..Timing::instant()
            })
            .start()
            .await;
        rt.open().await;
        rt.click_and_settle("📝 Projekt-Briefing", 2).await;
        rt.click_and_settle("Social Ads / Paid", 2).await;
        let state = rt.click_and_settle("12 Monate", 2).await;
        assert_eq!(state.current_step_id, StepId::BriefingTonalitaet);
        rt.click_and_settle("Energetisch & werblich", 2).await;
        let state = rt.click_and_settle("⏱ Wortanzahl berechnen", 2).await;
        assert_eq!(state.current_step_id, StepId::Rechner);

        assert!(rt.handle.input_words("1").await);
        assert!(rt.handle.input_words("13").await);
        assert!(rt.handle.input_words("130").await);

        let state = rt
            .wait_for(|s| s.current_step_id == StepId::BriefingDeadline && !s.options_locked())
            .await;
        assert_eq!(
            state.context.briefing.get(&BriefingField::Laenge).map(String::as_str),
            Some("130 Wörter (ca. 1:00 Min)")
        );
        assert!(state
            .history
            .iter()
            .any(|e| e.role == Role::User && e.text == "130 Wörter"));

        rt.click_and_settle("Nächste Woche", 2).await;
        let state = rt.click_and_settle("Ja, schicke ich mit", 2).await;
        assert_eq!(state.current_step_id, StepId::BriefingSummary);
        let summary = state.last_bot_text().unwrap();
        assert!(summary.contains("• Laufzeit: 12 Monate"));
        assert!(summary.contains("• Wortanzahl: 130 (ca. 1:00 Min)"));

        rt.click_and_settle("✅ Briefing senden", 1).await;
        rt.eventually("dispatch", || !rt.navigator.recorded_dispatches().is_empty())
            .await;
        assert_eq!(
            rt.navigator.recorded_dispatches(),
            vec![Dispatch::Navigate {
                url: "https://example.com/kontakt/".to_string()
            }]
        );
        let handoff = rt.session.get(HANDOFF_KEY).await.unwrap().unwrap();
        assert!(handoff.contains("Laufzeit: 12 Monate"));
    }

    #[tokio::test]
    async fn test_reload_restores_conversation() {
        let rt = TestRuntime::builder().start().await;
        rt.open().await;
        let before = rt.click_and_settle("Technik Check", 2).await;
        let (session, local) = rt.shutdown().await;

        let reloaded = TestRuntime::builder()
            .stores(session, local)
            .start()
            .await;
        let restored = reloaded.handle.snapshot();
        assert_eq!(restored.current_step_id, StepId::Technik);
        assert_eq!(restored.history, before.history);
        assert!(restored.ui.returning_visitor);

        // reopening does not greet again
        reloaded.handle.open().await;
        let state = reloaded.wait_for(|s| s.is_open).await;
        assert_eq!(state.history.len(), before.history.len());
    }

    #[tokio::test]
    async fn test_legacy_record_is_restored() {
        let session = Arc::new(MemoryStore::new());
        session
            .set(
                LEGACY_STATE_KEY,
                r#"{"bodyHtml":"<p>alt</p>","isOpen":true,"currentStep":"kontakt"}"#,
            )
            .await
            .unwrap();

        let rt = TestRuntime::builder()
            .stores(session.clone(), Arc::new(MemoryStore::new()))
            .start()
            .await;
        let state = rt.handle.snapshot();
        assert_eq!(state.current_step_id, StepId::Kontakt);
        assert_eq!(state.history.len(), 1);
        assert_eq!(session.get(LEGACY_STATE_KEY).await.unwrap(), None);
        assert_eq!(rt.surface.last_view().unwrap().subtitle, "Kontakt");
    }

    #[tokio::test]
    async fn test_reset_param_wipes_session() {
        let first = TestRuntime::builder().start().await;
        first.open().await;
        first.click_and_settle("Kontakt", 2).await;
        let (session, local) = first.shutdown().await;

        let rt = TestRuntime::builder()
            .stores(session, local)
            .page_url("https://example.com/preise/?sc_reset=1#top")
            .start()
            .await;
        let state = rt.handle.snapshot();
        assert_eq!(state.current_step_id, StepId::Start);
        assert!(state.history.is_empty());
        assert!(state.ui.returning_visitor);
        assert_eq!(
            rt.navigator.recorded_urls(),
            vec!["https://example.com/preise/#top".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reset_during_typing() {
        let rt = TestRuntime::builder()
            .timing(Timing {
                typing_delay_ms: 200..=200,
                ..Timing::instant()
            })
            .start()
            .await;
        rt.open().await;
        assert!(rt.click("Kontakt").await);
        rt.wait_for(|s| s.current_step_id == StepId::Kontakt).await;

        assert!(rt.handle.reset().await);
        let state = rt
            .wait_for(|s| {
                s.current_step_id == StepId::Start && s.history.len() == 1 && !s.options_locked()
            })
            .await;
        assert_eq!(
            state.history[0].text,
            "Schön, dass Du wieder da bist! Womit machen wir heute weiter?"
        );
        assert!(!state
            .history
            .iter()
            .any(|e| e.text.starts_with("Wie möchtest Du mich kontaktieren?")));
        assert!(rt.surface.pending_rows().is_empty());
        assert!(rt.local.get(VISITED_KEY).await.unwrap().is_some());
    }
}
