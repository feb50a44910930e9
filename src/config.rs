//! Widget configuration
//!
//! Settings are supplied once by the hosting page (the localized settings
//! object of the plugin) and never change during a session.

use serde::Deserialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_VDS_LINK: &str =
    "https://www.sprecherverband.de/wp-content/uploads/2025/02/VDS_Gagenkompass_2025.pdf";
pub const DEFAULT_GAGENRECHNER_LINK: &str = "https://dev.pascal-krell.de/gagenrechner/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings injected by the hosting page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    #[serde(rename = "vdsLink")]
    pub vds_link: Option<String>,
    #[serde(rename = "gagenrechnerLink")]
    pub gagenrechner_link: Option<String>,
    /// Demo category → landing page
    pub nav_links: HashMap<String, String>,
    pub avatar_url: Option<String>,
    #[serde(rename = "siteUrl")]
    pub site_url: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            email: None,
            phone: None,
            whatsapp: None,
            vds_link: Some(DEFAULT_VDS_LINK.to_string()),
            gagenrechner_link: Some(DEFAULT_GAGENRECHNER_LINK.to_string()),
            nav_links: HashMap::new(),
            avatar_url: None,
            site_url: "/".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse the settings object emitted by the plugin
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Load from `STUDIO_CONCIERGE_SETTINGS` (a JSON file) and apply
    /// `SC_*` overrides on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("STUDIO_CONCIERGE_SETTINGS") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(email) = std::env::var("SC_EMAIL") {
            config.email = Some(email);
        }
        if let Ok(phone) = std::env::var("SC_PHONE") {
            config.phone = Some(phone);
        }
        if let Ok(whatsapp) = std::env::var("SC_WHATSAPP") {
            config.whatsapp = Some(whatsapp);
        }
        if let Ok(site_url) = std::env::var("SC_SITE_URL") {
            config.site_url = site_url;
        }

        Ok(config.sanitized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Blank strings count as "not configured"
    fn sanitized(mut self) -> Self {
        for field in [
            &mut self.email,
            &mut self.phone,
            &mut self.whatsapp,
            &mut self.vds_link,
            &mut self.gagenrechner_link,
            &mut self.avatar_url,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self.nav_links.retain(|_, url| !url.trim().is_empty());
        self
    }

    /// Resolve a demo category link, falling back to the site-relative default
    pub fn nav_link(&self, category: &str, fallback_path: &str) -> String {
        self.nav_links
            .get(category)
            .cloned()
            .unwrap_or_else(|| format!("{}{fallback_path}", self.site_base()))
    }

    /// Site URL without trailing slash
    pub fn site_base(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}

/// Animation and persistence timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Randomised "typing..." latency before a reply appears, in ms
    pub typing_delay_ms: RangeInclusive<u64>,
    /// Delay between revealed characters
    pub reveal_interval: Duration,
    /// Characters revealed by animation; the rest appears at once
    pub reveal_budget: usize,
    /// Calculator input persistence debounce
    pub debounce: Duration,
    /// Delay before a briefing calculator entry resumes the flow
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            typing_delay_ms: 450..=900,
            reveal_interval: Duration::from_millis(15),
            reveal_budget: 240,
            debounce: Duration::from_millis(400),
            settle: Duration::from_millis(900),
        }
    }
}

impl Timing {
    /// No delays at all (tests)
    pub fn instant() -> Self {
        Self {
            typing_delay_ms: 0..=0,
            reveal_interval: Duration::ZERO,
            reveal_budget: 0,
            debounce: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}
