use std::fmt;
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

use crate::promotion::{Promotion, RawPromotion};

/// Lower clamp for the visual spin length, in seconds.
pub const MIN_SPIN_SECS: f64 = 3.0;
/// Upper clamp for the visual spin length, in seconds.
pub const MAX_SPIN_SECS: f64 = 8.0;

/// Behavioral signal that arms the popup's first appearance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    #[default]
    Time,
    Scroll,
    Exit,
    FirstInteraction,
    Immediate,
}

impl TriggerKind {
    /// Parses a raw trigger value; anything unrecognized falls back to
    /// [`TriggerKind::Time`] rather than failing.
    pub fn parse_lenient(raw: &str) -> Self {
        Self::from_str(raw.trim()).unwrap_or_default()
    }
}

/// How long a "seen" record suppresses the popup for one visitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, DeserializeFromStr)]
#[serde(into = "String")]
pub enum StorageDuration {
    /// Cleared when the browsing session ends.
    Session,
    /// Absolute expiry, measured in days from the moment the popup is shown.
    Days(f64),
}

impl Default for StorageDuration {
    fn default() -> Self {
        Self::Days(1.0)
    }
}

impl fmt::Display for StorageDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Days(days) => write!(f, "{days}"),
        }
    }
}

impl From<StorageDuration> for String {
    fn from(value: StorageDuration) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Error)]
#[error("invalid storage duration: {0:?}")]
pub struct ParseStorageDurationError(String);

impl FromStr for StorageDuration {
    type Err = ParseStorageDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // The literal "0" means session-scoped, same as "session".
        if s.eq_ignore_ascii_case("session") || s == "0" {
            return Ok(Self::Session);
        }
        match s.parse::<f64>() {
            Ok(days) if days.is_finite() && days > 0.0 => Ok(Self::Days(days)),
            _ => Err(ParseStorageDurationError(s.to_string())),
        }
    }
}

/// The flat record the content-parsing collaborator hands over: every
/// recognized option as an optional raw string. Numbers stay strings here
/// because the source cells are text; normalization happens in
/// [`PopupConfig::from_raw`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawPopupConfig {
    pub trigger: Option<String>,
    pub trigger_delay: Option<String>,
    pub trigger_scroll: Option<String>,
    pub storage_duration: Option<String>,
    pub spin_duration: Option<String>,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub spin_button_text: Option<String>,
    pub no_thanks_text: Option<String>,
    pub result_headline: Option<String>,
    pub cta_button_text: Option<String>,
    pub theme: Option<String>,
    pub show_confetti: Option<String>,
}

/// Normalized, immutable popup configuration. Invalid or missing raw values
/// never fail; they substitute the documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupConfig {
    pub trigger: TriggerKind,
    pub trigger_delay_secs: f64,
    pub trigger_scroll_percent: f64,
    pub storage_duration: StorageDuration,
    pub spin_duration_secs: f64,
    pub headline: String,
    pub subheadline: String,
    pub spin_button_text: String,
    pub no_thanks_text: String,
    pub result_headline: String,
    pub cta_button_text: String,
    /// Renderer hint; the core only carries it.
    pub theme: String,
    /// Renderer hint; the core only carries it.
    pub show_confetti: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerKind::Time,
            trigger_delay_secs: 3.0,
            trigger_scroll_percent: 50.0,
            storage_duration: StorageDuration::default(),
            spin_duration_secs: 4.0,
            headline: "Spin to Win!".to_string(),
            subheadline: "One spin, one exclusive deal — just for you.".to_string(),
            spin_button_text: "Spin the Wheel".to_string(),
            no_thanks_text: "No thanks".to_string(),
            result_headline: "You won!".to_string(),
            cta_button_text: "Claim Offer".to_string(),
            theme: "purple".to_string(),
            show_confetti: true,
        }
    }
}

impl PopupConfig {
    pub fn from_raw(raw: &RawPopupConfig) -> Self {
        let mut cfg = Self::default();

        if let Some(value) = &raw.trigger {
            cfg.trigger = TriggerKind::parse_lenient(value);
        }
        if let Some(value) = &raw.trigger_delay {
            cfg.trigger_delay_secs = parse_positive(value).unwrap_or(cfg.trigger_delay_secs);
        }
        if let Some(value) = &raw.trigger_scroll {
            cfg.trigger_scroll_percent = parse_positive(value)
                .map(|p| p.clamp(0.0, 100.0))
                .unwrap_or(cfg.trigger_scroll_percent);
        }
        if let Some(value) = &raw.storage_duration {
            cfg.storage_duration =
                StorageDuration::from_str(value).unwrap_or(cfg.storage_duration);
        }
        if let Some(value) = &raw.spin_duration {
            cfg.spin_duration_secs = parse_positive(value)
                .map(|d| d.clamp(MIN_SPIN_SECS, MAX_SPIN_SECS))
                .unwrap_or(cfg.spin_duration_secs);
        }

        set_text(&mut cfg.headline, &raw.headline);
        set_text(&mut cfg.subheadline, &raw.subheadline);
        set_text(&mut cfg.spin_button_text, &raw.spin_button_text);
        set_text(&mut cfg.no_thanks_text, &raw.no_thanks_text);
        set_text(&mut cfg.result_headline, &raw.result_headline);
        set_text(&mut cfg.cta_button_text, &raw.cta_button_text);
        set_text(&mut cfg.theme, &raw.theme);

        if let Some(value) = &raw.show_confetti {
            cfg.show_confetti = value.trim() != "false";
        }

        cfg
    }

    pub fn trigger_delay_ms(&self) -> u64 {
        (self.trigger_delay_secs * 1000.0) as u64
    }

    pub fn spin_duration_ms(&self) -> u64 {
        (self.spin_duration_secs * 1000.0) as u64
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn set_text(field: &mut String, raw: &Option<String>) {
    if let Some(value) = raw {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *field = trimmed.to_string();
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// On-disk/env shape: the raw option record plus raw promotion rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PopupSource {
    pub popup: RawPopupConfig,
    pub promotions: Vec<RawPromotion>,
}

impl PopupSource {
    /// Normalizes into the typed pair the lifecycle consumes. Rows with an
    /// empty label are dropped; an empty result means the feature stays
    /// inert.
    pub fn normalize(&self) -> (PopupConfig, Vec<Promotion>) {
        let config = PopupConfig::from_raw(&self.popup);
        let promotions = self
            .promotions
            .iter()
            .filter_map(|raw| raw.normalize(&config.cta_button_text))
            .collect();
        (config, promotions)
    }
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "promo", "promo-popup").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Loads the popup source from the config file (when present) with an
/// environment-variable overlay, then normalizes it.
pub fn load_source() -> Result<(PopupConfig, Vec<Promotion>), ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("PROMO_POPUP"))
        .build()?;

    let source: PopupSource = s.try_deserialize()?;
    Ok(source.normalize())
}
