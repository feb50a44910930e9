//! Contact-action dispatch
//!
//! Turns an option action into a concrete navigation request, or into a
//! "not configured" notice when the required setting is missing.

use crate::briefing::contact_template;
use crate::config::WidgetConfig;
use crate::conversation::ConversationContext;
use crate::graph::Action;
use thiserror::Error;

/// A navigation request for the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Replace the current page (links, `mailto:`, `tel:`)
    Navigate { url: String },
    /// Open a new tab; `fallback_copy` is offered when the popup is blocked
    OpenExternal {
        url: String,
        fallback_copy: Option<String>,
    },
    /// Scroll to an in-page anchor
    ScrollTo { anchor: String },
}

impl Dispatch {
    pub fn target(&self) -> &str {
        match self {
            Dispatch::Navigate { url } | Dispatch::OpenExternal { url, .. } => url,
            Dispatch::ScrollTo { anchor } => anchor,
        }
    }
}

/// Missing configuration, reported in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotConfigured {
    #[error("Bitte eine E-Mail-Adresse im Backend hinterlegen.")]
    Email,
    #[error("Bitte eine Telefonnummer im Backend hinterlegen.")]
    Phone,
    #[error("Bitte eine WhatsApp-Nummer im Backend hinterlegen.")]
    Whatsapp,
    #[error("Kein VDS-Link hinterlegt. Bitte im Backend ergänzen.")]
    VdsLink,
    #[error("Kein Gagenrechner-Link hinterlegt. Bitte im Backend ergänzen.")]
    Gagenrechner,
}

/// What to do for a dispatch action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub dispatch: Dispatch,
    /// Message template for the contact form
    pub handoff: Option<String>,
}

impl From<Dispatch> for Resolution {
    fn from(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            handoff: None,
        }
    }
}

/// Resolve a dispatch action. `Back` has no dispatch and yields `None`.
pub fn resolve(
    action: &Action,
    config: &WidgetConfig,
    context: &ConversationContext,
) -> Result<Option<Resolution>, NotConfigured> {
    let resolution = match action {
        Action::Back => return Ok(None),
        Action::Anchor { target } => Dispatch::ScrollTo {
            anchor: target.clone(),
        }
        .into(),
        Action::Hardlink { target } => Dispatch::Navigate {
            url: target.clone(),
        }
        .into(),
        Action::Email => {
            let email = config.email.as_deref().ok_or(NotConfigured::Email)?;
            Dispatch::Navigate {
                url: format!("mailto:{email}"),
            }
            .into()
        }
        Action::Phone => {
            let phone = config.phone.as_deref().ok_or(NotConfigured::Phone)?;
            let dial = dial_string(phone).ok_or(NotConfigured::Phone)?;
            Dispatch::Navigate {
                url: format!("tel:{dial}"),
            }
            .into()
        }
        Action::Whatsapp => {
            let number = config.whatsapp.as_deref().ok_or(NotConfigured::Whatsapp)?;
            let link = whatsapp_link(number).ok_or(NotConfigured::Whatsapp)?;
            Dispatch::OpenExternal {
                url: link,
                fallback_copy: Some(number.to_string()),
            }
            .into()
        }
        Action::VdsLink => Dispatch::OpenExternal {
            url: config.vds_link.clone().ok_or(NotConfigured::VdsLink)?,
            fallback_copy: None,
        }
        .into(),
        Action::Gagenrechner => Dispatch::OpenExternal {
            url: config
                .gagenrechner_link
                .clone()
                .ok_or(NotConfigured::Gagenrechner)?,
            fallback_copy: None,
        }
        .into(),
        Action::Form => {
            let has_context = !context.briefing.is_empty() || context.word_count > 0;
            Resolution {
                dispatch: contact_page(config),
                handoff: has_context
                    .then(|| contact_template(&context.briefing, context.word_count)),
            }
        }
        Action::BriefingContact => Resolution {
            dispatch: contact_page(config),
            handoff: Some(contact_template(&context.briefing, context.word_count)),
        },
    };
    Ok(Some(resolution))
}

pub fn contact_page(config: &WidgetConfig) -> Dispatch {
    Dispatch::Navigate {
        url: format!("{}/kontakt/", config.site_base()),
    }
}

/// `https://wa.me/<digits>`; `None` when the number has no digits
pub fn whatsapp_link(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("https://wa.me/{digits}"))
}

/// Phone number as used in a `tel:` URI; `None` when it has no digits
fn dial_string(phone: &str) -> Option<String> {
    let dial: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    dial.chars().any(|c| c.is_ascii_digit()).then_some(dial)
}
