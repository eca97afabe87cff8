//! Editor core configuration.
//!
//! # Responsibility
//! - Define every tunable of the editing core with production defaults.
//! - Load partial JSON documents and validate them before use.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid configuration.
//! - Debounce timings are positive and at most one minute.
//! - Geometry values are finite; gaps and margins are non-negative.

use crate::model::card::CardType;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

const MAX_TIMING_MS: u64 = 60_000;

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub timings: DebounceTimings,
    pub anchor: AnchorConfig,
    pub menu: MenuConfig,
    /// Write pending channel values on teardown instead of dropping them.
    pub flush_on_teardown: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            timings: DebounceTimings::default(),
            anchor: AnchorConfig::default(),
            menu: MenuConfig::default(),
            flush_on_teardown: true,
        }
    }
}

/// Debounce delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceTimings {
    pub content_ms: u64,
    pub links_ms: u64,
    /// Coalescing of raw title keystrokes before the title channel.
    pub title_input_ms: u64,
    pub title_ms: u64,
    pub reconcile_ms: u64,
    pub anchor_ms: u64,
    pub image_scan_ms: u64,
}

impl Default for DebounceTimings {
    fn default() -> Self {
        Self {
            content_ms: 300,
            links_ms: 500,
            title_input_ms: 800,
            title_ms: 300,
            reconcile_ms: 300,
            anchor_ms: 50,
            image_scan_ms: 200,
        }
    }
}

impl DebounceTimings {
    pub fn content(&self) -> Duration {
        Duration::from_millis(self.content_ms)
    }

    pub fn links(&self) -> Duration {
        Duration::from_millis(self.links_ms)
    }

    pub fn title_input(&self) -> Duration {
        Duration::from_millis(self.title_input_ms)
    }

    pub fn title(&self) -> Duration {
        Duration::from_millis(self.title_ms)
    }

    pub fn reconcile(&self) -> Duration {
        Duration::from_millis(self.reconcile_ms)
    }

    pub fn anchor(&self) -> Duration {
        Duration::from_millis(self.anchor_ms)
    }

    pub fn image_scan(&self) -> Duration {
        Duration::from_millis(self.image_scan_ms)
    }

    fn entries(&self) -> [(&'static str, u64); 7] {
        [
            ("timings.content_ms", self.content_ms),
            ("timings.links_ms", self.links_ms),
            ("timings.title_input_ms", self.title_input_ms),
            ("timings.title_ms", self.title_ms),
            ("timings.reconcile_ms", self.reconcile_ms),
            ("timings.anchor_ms", self.anchor_ms),
            ("timings.image_scan_ms", self.image_scan_ms),
        ]
    }
}

/// Approximate rendered size of a floating panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSize {
    pub width: f64,
    pub height: f64,
}

/// Floating panel geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Distance between the anchor rectangle and the panel.
    pub vertical_gap: f64,
    /// Extra room kept between the panel and viewport/container edges.
    pub safety_margin: f64,
    /// Distance between the caret and a trigger menu.
    pub menu_gap: f64,
    pub toolbar: PanelSize,
    pub image_toolbar: PanelSize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            vertical_gap: 8.0,
            safety_margin: 8.0,
            menu_gap: 4.0,
            toolbar: PanelSize {
                width: 360.0,
                height: 44.0,
            },
            image_toolbar: PanelSize {
                width: 280.0,
                height: 44.0,
            },
        }
    }
}

/// Trigger menu behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Maximum card matches listed in the reference menu.
    pub reference_limit: usize,
    /// Type of cards created from the reference menu.
    pub new_card_type: CardType,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            reference_limit: 8,
            new_card_type: CardType::Fleeting,
        }
    }
}

impl EditorConfig {
    /// Parses a (possibly partial) JSON configuration and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.timings.entries() {
            if value == 0 || value > MAX_TIMING_MS {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: format!("must be within 1..={MAX_TIMING_MS} ms, got {value}"),
                });
            }
        }

        require_non_negative("anchor.vertical_gap", self.anchor.vertical_gap)?;
        require_non_negative("anchor.safety_margin", self.anchor.safety_margin)?;
        require_non_negative("anchor.menu_gap", self.anchor.menu_gap)?;
        require_panel("anchor.toolbar", self.anchor.toolbar)?;
        require_panel("anchor.image_toolbar", self.anchor.image_toolbar)?;

        if self.menu.reference_limit == 0 {
            return Err(ConfigError::InvalidField {
                field: "menu.reference_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidField {
            field,
            reason: format!("must be a finite value >= 0, got {value}"),
        });
    }
    Ok(())
}

fn require_panel(field: &'static str, size: PanelSize) -> Result<(), ConfigError> {
    let valid = |value: f64| value.is_finite() && value > 0.0;
    if !valid(size.width) || !valid(size.height) {
        return Err(ConfigError::InvalidField {
            field,
            reason: format!(
                "panel size must be positive, got {}x{}",
                size.width, size.height
            ),
        });
    }
    Ok(())
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidField { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read editor config: {err}"),
            Self::Parse(err) => write!(f, "invalid editor config: {err}"),
            Self::InvalidField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidField { .. } => None,
        }
    }
}
