//! Step definitions

use super::{Action, Branch, ChatOption, Next, Step, StepId, StepKind};
use crate::briefing::BriefingField;
use crate::config::WidgetConfig;

pub(super) const RETURNING_GREETING: &str =
    "Schön, dass Du wieder da bist! Womit machen wir heute weiter?";

/// Use cases that run as paid campaigns and need a campaign duration
const CAMPAIGN_USE_CASES: [&str; 2] = ["Social Ads / Paid", "TV / Funk (Broadcast)"];

const UNDECIDED: &str = "Weiß ich noch nicht";

/// Demo categories: (label, nav link key, default path)
const DEMO_CATEGORIES: [(&str, &str, &str); 7] = [
    ("Werbung", "werbung", "/sprecher-audio-leistungen/werbesprecher/"),
    ("Webvideo", "webvideo", "/sprecher-audio-leistungen/voiceover-social-media/"),
    (
        "Telefonansage",
        "telefonansage",
        "/sprecher-audio-leistungen/telefonansagen-warteschleife-mailbox/",
    ),
    (
        "Podcast",
        "podcast",
        "/sprecher-audio-leistungen/podcast-service-editing-intro-outro-produktion/",
    ),
    ("Imagefilm", "imagefilm", "/sprecher-audio-leistungen/imagefilm-sprecher/"),
    ("Erklärvideo", "erklaervideo", "/sprecher-audio-leistungen/erklaervideo-sprecher/"),
    ("E-Learning", "elearning", "/sprecher-audio-leistungen/e-learning-sprecher/"),
];

fn step(id: StepId, title: &'static str, text: &str, options: Vec<ChatOption>) -> Step {
    Step {
        id,
        title,
        text: text.to_string(),
        options,
        kind: StepKind::Prompt,
    }
}

fn answers(field: BriefingField, labels: &[&str], next: StepId) -> Vec<ChatOption> {
    labels
        .iter()
        .map(|label| ChatOption::answer(label, field, Next::Step(next)))
        .collect()
}

fn undecided(field: BriefingField, next: StepId) -> ChatOption {
    ChatOption::answer(UNDECIDED, field, Next::Step(next)).with_value("")
}

/// Configured address and number are listed so the view can offer copy buttons
fn contact_prompt(config: &WidgetConfig) -> String {
    let mut text = String::from("Wie möchtest Du mich kontaktieren?");
    if let Some(email) = &config.email {
        text.push_str("\nE-Mail: ");
        text.push_str(email);
    }
    if let Some(phone) = &config.phone {
        text.push_str("\nTelefon: ");
        text.push_str(phone);
    }
    if config.email.is_none() && config.phone.is_none() {
        text.push_str("\nBitte E-Mail und Telefon im Backend hinterlegen.");
    }
    text
}

/// In-page `#fragment` links scroll, everything else navigates
fn demo_action(config: &WidgetConfig, key: &str, fallback_path: &str) -> Action {
    let link = config.nav_link(key, fallback_path);
    match link.strip_prefix('#') {
        Some(anchor) => Action::Anchor {
            target: anchor.to_string(),
        },
        None => Action::Hardlink { target: link },
    }
}

#[allow(clippy::too_many_lines)]
pub(super) fn build(id: StepId, config: &WidgetConfig) -> Step {
    match id {
        StepId::Start => step(
            id,
            "Hilfe-System und Tipps",
            "Moin! Ich bin Dein Studio-Assistent. Womit starten wir?",
            vec![
                ChatOption::goto("🎧 Casting & Demos", StepId::Demos),
                ChatOption::goto("Preise & Buyouts", StepId::Preise)
                    .with_user_prompt("Preise & Gagen"),
                ChatOption::goto("📝 Projekt-Briefing", StepId::BriefingEinsatz)
                    .with_user_prompt("Ich möchte ein Projekt briefen."),
                ChatOption::goto("Technik Check", StepId::Technik),
                ChatOption::goto("🔄 Ablauf einer Buchung", StepId::Ablauf),
                ChatOption::goto("Kontakt", StepId::Kontakt),
            ],
        ),

        StepId::Demos => {
            let mut options: Vec<ChatOption> = DEMO_CATEGORIES
                .iter()
                .map(|(label, key, path)| ChatOption::act(*label, demo_action(config, key, path)))
                .collect();
            options.push(ChatOption::back());
            step(id, "Casting & Demos", "Welche Kategorie interessiert Dich?", options)
        }

        StepId::Preise => step(
            id,
            "Preise & Gagen",
            "Ich arbeite transparent nach Industriestandard (VDS). Für genaue Kalkulationen nutze bitte mein Online-Tool.",
            vec![
                ChatOption::act("📄 VDS Gagenliste", Action::VdsLink),
                ChatOption::act("🧮 Zum Gagenrechner", Action::Gagenrechner),
                ChatOption::goto("Wort-Rechner", StepId::Rechner),
                ChatOption::goto("Was sind Nutzungsrechte?", StepId::Nutzungsrechte),
                ChatOption::goto("💬 Direkt anfragen", StepId::Kontakt),
                ChatOption::back(),
            ],
        ),

        StepId::Nutzungsrechte => step(
            id,
            "Nutzungsrechte",
            "Die Gage setzt sich aus Aufnahme und Nutzungsrechten (Buyout) zusammen. Das Buyout regelt, wo, wie lange und in welchem Gebiet die Aufnahme laufen darf.\n\nJe größer Reichweite und Laufzeit, desto höher das Buyout.",
            vec![
                ChatOption::goto("Beispiele zeigen", StepId::NutzungsrechteBeispiele),
                ChatOption::act("📄 VDS Gagenliste", Action::VdsLink),
                ChatOption::back(),
            ],
        ),

        StepId::NutzungsrechteBeispiele => step(
            id,
            "Nutzungsrechte",
            "Typische Nutzungen im Überblick:\n• Website / Imagefilm: meist unbefristet, oft inklusive\n• Social Ads: nach Laufzeit und Kanälen\n• TV / Funk: nach Sendegebiet und Ausstrahlungsdauer\n• E-Learning: intern oder öffentlich, nach Nutzerzahl",
            vec![
                ChatOption::goto("📝 Projekt briefen", StepId::BriefingEinsatz),
                ChatOption::goto("Kontakt", StepId::Kontakt),
                ChatOption::back(),
            ],
        ),

        StepId::Technik => step(
            id,
            "Technik Check",
            "Profi-Setup für Broadcast-Qualität: Neumann TLM 102 Mikrofon, RME Babyface Pro Interface & High-End Akustikkabine. DAW: Logic Pro X auf Mac Studio.",
            vec![
                ChatOption::act("SessionLinkPRO", Action::Form),
                ChatOption::act("SourceConnect Now", Action::Form),
                ChatOption::act("Test-File anfordern", Action::Form),
                ChatOption::goto("Kontakt", StepId::Kontakt),
                ChatOption::back(),
            ],
        ),

        StepId::Ablauf => step(
            id,
            "Ablauf einer Buchung",
            "So läuft eine Buchung bei mir ab:\n\n1. Anfrage & Skript-Check\n2. Angebot & Bestätigung\n3. Aufnahme (meist innerhalb 24h)\n4. Datenlieferung & Abnahme\n5. Rechnung & Nutzungslizenz\n\nTimeline: Vom Erstkontakt bis zur Lieferung meist in 24–48 Stunden (Express möglich).",
            vec![
                ChatOption::act("⚡ Jetzt Projekt anfragen", Action::Form),
                ChatOption::goto("📝 Projekt briefen", StepId::BriefingEinsatz),
                ChatOption::back(),
            ],
        ),

        StepId::Rechner => Step {
            kind: StepKind::Calculator,
            ..step(
                id,
                "Wort-Rechner",
                "Wort-Rechner aktiviert. Gib die Wortanzahl ein.",
                vec![
                    ChatOption::goto("Kontakt", StepId::Kontakt),
                    ChatOption::back(),
                ],
            )
        },

        StepId::Kontakt => step(
            id,
            "Kontakt",
            &contact_prompt(config),
            vec![
                ChatOption::act("📝 Formular", Action::Form),
                ChatOption::act("✉️ E-Mail", Action::Email),
                ChatOption::act("📞 Anrufen", Action::Phone),
                ChatOption::act("💬 WhatsApp", Action::Whatsapp),
                ChatOption::back(),
            ],
        ),

        StepId::BriefingEinsatz => {
            let branch = Branch {
                field: BriefingField::Einsatz,
                any_of: CAMPAIGN_USE_CASES.to_vec(),
                then: StepId::BriefingLaufzeit,
                otherwise: StepId::BriefingTonalitaet,
            };
            let mut options: Vec<ChatOption> = [
                "Social Ads / Paid",
                "TV / Funk (Broadcast)",
                "Website / Imagefilm",
                "E-Learning",
                "Telefonansage",
            ]
            .into_iter()
            .map(|label| {
                ChatOption::answer(label, BriefingField::Einsatz, Next::Branch(branch.clone()))
            })
            .collect();
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Lass uns Dein Projekt kurz umreißen. Wofür wird die Aufnahme eingesetzt?",
                options,
            )
        }

        StepId::BriefingLaufzeit => {
            let mut options = answers(
                BriefingField::Laufzeit,
                &["1 Monat", "3 Monate", "12 Monate", "Unbefristet"],
                StepId::BriefingTonalitaet,
            );
            options.push(undecided(BriefingField::Laufzeit, StepId::BriefingTonalitaet));
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Wie lange soll die Kampagne laufen?",
                options,
            )
        }

        StepId::BriefingTonalitaet => {
            let mut options = answers(
                BriefingField::Tonalitaet,
                &[
                    "Seriös & vertrauensvoll",
                    "Locker & nahbar",
                    "Energetisch & werblich",
                    "Ruhig & erklärend",
                ],
                StepId::BriefingLaenge,
            );
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Welche Tonalität schwebt Dir vor?",
                options,
            )
        }

        StepId::BriefingLaenge => {
            let mut options = answers(
                BriefingField::Laenge,
                &["Bis 30 Sekunden", "30 – 90 Sekunden", "1 – 5 Minuten", "Länger als 5 Minuten"],
                StepId::BriefingDeadline,
            );
            options.push(
                ChatOption::goto("⏱ Wortanzahl berechnen", StepId::Rechner)
                    .with_user_prompt("Ich rechne die Länge über die Wortanzahl aus.")
                    .resuming_at(StepId::BriefingDeadline),
            );
            options.push(undecided(BriefingField::Laenge, StepId::BriefingDeadline));
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Wie lang wird der Text ungefähr?",
                options,
            )
        }

        StepId::BriefingDeadline => {
            let mut options = answers(
                BriefingField::Deadline,
                &["Express (24h)", "Diese Woche", "Nächste Woche", "Flexibel"],
                StepId::BriefingAussprache,
            );
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Bis wann brauchst Du die fertige Aufnahme?",
                options,
            )
        }

        StepId::BriefingAussprache => {
            let mut options = answers(
                BriefingField::Aussprache,
                &["Ja, schicke ich mit", "Nein, alles Standard"],
                StepId::BriefingSummary,
            );
            options.push(undecided(BriefingField::Aussprache, StepId::BriefingSummary));
            options.push(ChatOption::back());
            step(
                id,
                "Projekt-Briefing",
                "Gibt es Namen oder Fachbegriffe mit besonderer Aussprache?",
                options,
            )
        }

        StepId::BriefingSummary => Step {
            kind: StepKind::BriefingSummary,
            ..step(
                id,
                "Projekt-Briefing",
                "Hier ist Dein Briefing im Überblick.",
                vec![
                    ChatOption::act("✅ Briefing senden", Action::BriefingContact),
                    ChatOption::goto("✏️ Neu beginnen", StepId::BriefingEinsatz),
                    ChatOption::goto("Zurück zum Start", StepId::Start),
                ],
            )
        },
    }
}
