//! Terminal front end
//!
//! Draws the widget as a scrolling transcript with numbered options and
//! stands in for the browser when dispatching links.

use crate::contact::Dispatch;
use crate::conversation::Role;
use crate::render::{ConfirmMode, RowId, Sound, View, TITLE};
use crate::runtime::{NavigationError, Navigator, Surface};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

const CLEAR_LINE: &str = "\r\x1b[2K";

/// Prints the conversation to stdout
pub struct TerminalSurface {
    /// Messages already on screen
    shown: Mutex<usize>,
    /// Also write the widget markup here on every render
    html_path: Option<PathBuf>,
}

impl TerminalSurface {
    pub fn new(html_path: Option<PathBuf>) -> Self {
        Self {
            shown: Mutex::new(0),
            html_path,
        }
    }

    fn print(text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl Surface for TerminalSurface {
    fn render(&self, view: &View) {
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        Self::print(&format_view(view, *shown));
        *shown = view.messages.len();

        if let Some(path) = &self.html_path {
            if let Err(e) = std::fs::write(path, view.to_html()) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write widget markup");
            }
        }
    }

    fn show_pending(&self, _row: RowId) {
        Self::print(&format!("{TITLE} tippt …"));
    }

    fn reveal(&self, _row: RowId, text: &str) {
        let flat = text.replace('\n', " ");
        Self::print(&format!("{CLEAR_LINE}{TITLE}: {flat}"));
    }

    fn remove_pending(&self, _row: RowId) {
        Self::print(CLEAR_LINE);
    }

    fn show_duration(&self, line: Option<&str>) {
        if let Some(line) = line {
            Self::print(&format!("    {line}\n"));
        }
    }

    fn play_sound(&self, sound: Sound) {
        tracing::trace!(sound = sound.name(), "Sound");
    }

    fn toast(&self, message: &str) {
        Self::print(&format!("  ({message})\n"));
    }

    fn offer_manual_copy(&self, value: &str) {
        Self::print(&format!("  Zum Kopieren: {value}\n"));
    }
}

/// Transcript lines after the first `shown` messages, then the controls.
/// A shorter transcript than `shown` means the conversation started over.
fn format_view(view: &View, shown: usize) -> String {
    let mut out = String::new();
    if !view.is_open {
        return out;
    }

    let new_messages = match view.messages.get(shown..) {
        Some(messages) => messages,
        None => {
            out.push_str("\n──── Neuer Chat ────\n");
            &view.messages[..]
        }
    };
    for message in new_messages {
        let speaker = match message.role {
            Role::Bot => TITLE,
            Role::User => "Du",
        };
        let _ = writeln!(out, "{speaker}: {}", message.text.replace('\n', "\n    "));
    }

    let _ = writeln!(out, "\n[{}]", view.subtitle);
    for option in &view.options {
        let marker = if option.enabled { ' ' } else { '·' };
        let _ = writeln!(out, " {marker}{:>2}) {}", option.index + 1, option.label);
    }
    if let Some(calculator) = &view.calculator {
        match &calculator.result {
            Some(result) => {
                let _ = writeln!(out, "    {result}");
            }
            None => out.push_str("    Wortanzahl eingeben: w <Zahl>\n"),
        }
        if let ConfirmMode::Button { enabled: true } = calculator.confirm {
            out.push_str("    ok) Angebot dafür anfragen\n");
        }
    }
    out
}

/// Prints what a browser would do
pub struct TerminalNavigator;

#[async_trait]
impl Navigator for TerminalNavigator {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), NavigationError> {
        let line = match dispatch {
            Dispatch::Navigate { url } => format!("  → {url}\n"),
            Dispatch::OpenExternal { url, .. } => format!("  → (neuer Tab) {url}\n"),
            Dispatch::ScrollTo { anchor } => format!("  → #{anchor}\n"),
        };
        TerminalSurface::print(&line);
        Ok(())
    }

    async fn copy(&self, _value: &str) -> Result<(), NavigationError> {
        Err(NavigationError::Failed("no clipboard in a terminal".to_string()))
    }

    async fn replace_url(&self, url: &str) -> Result<(), NavigationError> {
        tracing::debug!(url, "Page URL replaced");
        Ok(())
    }
}
