//! Guided-briefing context
//!
//! The briefing sub-flow collects free-text answers which end up in a
//! summary bubble and in the contact-form template. Both texts are pure
//! functions of the answers and the word count, so two visitors with the
//! same answers get byte-identical output no matter which path they took.

use crate::calculator::{duration_label, WORDS_PER_MINUTE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Shown for questions the visitor skipped with "weiß ich noch nicht"
pub const NO_VALUE: &str = "keine Angabe";

/// Briefing questions, declared in read order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefingField {
    Einsatz,
    Tonalitaet,
    Laenge,
    Laufzeit,
    Deadline,
    Aussprache,
}

impl BriefingField {
    pub const ALL: [BriefingField; 6] = [
        BriefingField::Einsatz,
        BriefingField::Tonalitaet,
        BriefingField::Laenge,
        BriefingField::Laufzeit,
        BriefingField::Deadline,
        BriefingField::Aussprache,
    ];

    /// Storage key
    pub fn key(self) -> &'static str {
        match self {
            BriefingField::Einsatz => "einsatz",
            BriefingField::Tonalitaet => "tonalitaet",
            BriefingField::Laenge => "laenge",
            BriefingField::Laufzeit => "laufzeit",
            BriefingField::Deadline => "deadline",
            BriefingField::Aussprache => "aussprache",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            BriefingField::Einsatz => "Einsatz",
            BriefingField::Tonalitaet => "Tonalität",
            BriefingField::Laenge => "Länge",
            BriefingField::Laufzeit => "Laufzeit",
            BriefingField::Deadline => "Deadline",
            BriefingField::Aussprache => "Aussprache",
        }
    }
}

/// Answers keyed by field; iteration follows read order
pub type Briefing = BTreeMap<BriefingField, String>;

fn display_value(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NO_VALUE
    } else {
        trimmed
    }
}

fn word_count_line(word_count: u32) -> Option<String> {
    (word_count > 0).then(|| {
        format!(
            "Wortanzahl: {word_count} (ca. {} Min)",
            duration_label(word_count, WORDS_PER_MINUTE)
        )
    })
}

/// Answered fields as `Label: value` lines, in read order
fn answer_lines(briefing: &Briefing, word_count: u32) -> Vec<String> {
    let mut lines: Vec<String> = briefing
        .iter()
        .map(|(field, value)| format!("{}: {}", field.label(), display_value(value)))
        .collect();
    lines.extend(word_count_line(word_count));
    lines
}

/// Text of the summary step
pub fn summary_text(briefing: &Briefing, word_count: u32) -> String {
    let lines = answer_lines(briefing, word_count);
    if lines.is_empty() {
        return "Ich habe noch keine Angaben zu Deinem Projekt. Magst Du das Briefing von vorn starten?"
            .to_string();
    }

    let mut text = String::from("Danke! Hier ist Dein Briefing im Überblick:\n");
    for line in &lines {
        let _ = writeln!(text, "• {line}");
    }
    text.push_str("\nPasst alles? Dann schick es mir direkt als Anfrage.");
    text
}

/// Message template handed to the contact form
pub fn contact_template(briefing: &Briefing, word_count: u32) -> String {
    let lines = answer_lines(briefing, word_count);
    let mut text = String::from("Hallo,\n\nich möchte eine Sprachaufnahme anfragen.");
    if !lines.is_empty() {
        text.push_str(" Mein Briefing:\n\n");
        text.push_str(&lines.join("\n"));
    }
    text.push_str("\n\nViele Grüße");
    text
}
