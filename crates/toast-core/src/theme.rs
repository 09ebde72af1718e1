//! Visual themes
//!
//! Exactly one theme is active. Restoring the saved theme at startup is
//! silent; an explicit switch to a different theme produces a notification
//! unless it returns to the baseline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{Slot, SlotValue};

/// The available themes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Sepia,
    Contrast,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Dark, Theme::Light, Theme::Sepia, Theme::Contrast];

    /// Baseline theme; switching back to it is silent
    pub const BASELINE: Theme = Theme::Dark;

    /// Stored name
    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Sepia => "sepia",
            Theme::Contrast => "contrast",
        }
    }

    /// Human label
    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
            Theme::Sepia => "Sepia",
            Theme::Contrast => "High contrast",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown theme '{}'. Valid themes: dark, light, sepia, contrast",
                    s
                )
            })
    }
}

impl SlotValue for Theme {
    const SLOT: Slot = Slot::Theme;

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn encode(&self) -> String {
        self.name().to_string()
    }
}

/// Result of a theme request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeChange {
    /// Already active; nothing happened
    Unchanged,
    /// Switched; carries the message to show, if any
    Switched { notification: Option<String> },
}

impl ThemeChange {
    pub fn is_switched(&self) -> bool {
        matches!(self, ThemeChange::Switched { .. })
    }
}

/// Holds the active theme
#[derive(Debug, Clone, Default)]
pub struct ThemeManager {
    current: Theme,
}

impl ThemeManager {
    /// Apply a saved theme without any notification
    pub fn restore(theme: Theme) -> Self {
        debug!("Restored theme {}", theme);
        Self { current: theme }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Switch on explicit user request
    pub fn set_theme(&mut self, theme: Theme) -> ThemeChange {
        if theme == self.current {
            return ThemeChange::Unchanged;
        }
        info!("Theme {} -> {}", self.current, theme);
        self.current = theme;

        let notification =
            (theme != Theme::BASELINE).then(|| format!("{} theme enabled", theme.label()));
        ThemeChange::Switched { notification }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!(" SEPIA ".parse::<Theme>().unwrap(), Theme::Sepia);
        assert!("neon".parse::<Theme>().is_err());
    }

    #[test]
    fn test_slot_codec() {
        assert_eq!(Theme::decode("contrast"), Some(Theme::Contrast));
        assert_eq!(Theme::decode("purple"), None);
        assert_eq!(Theme::Light.encode(), "light");
        assert_eq!(Theme::default(), Theme::Dark);
    }

    #[test]
    fn test_restore_is_silent_then_same_theme_is_noop() {
        let mut manager = ThemeManager::restore(Theme::Light);
        assert_eq!(manager.current(), Theme::Light);
        assert_eq!(manager.set_theme(Theme::Light), ThemeChange::Unchanged);
    }

    #[test]
    fn test_explicit_switch_notifies() {
        let mut manager = ThemeManager::default();
        assert_eq!(
            manager.set_theme(Theme::Light),
            ThemeChange::Switched {
                notification: Some("Light theme enabled".to_string())
            }
        );
        assert_eq!(manager.current(), Theme::Light);
    }

    #[test]
    fn test_switch_to_baseline_is_silent() {
        let mut manager = ThemeManager::restore(Theme::Sepia);
        assert_eq!(
            manager.set_theme(Theme::Dark),
            ThemeChange::Switched { notification: None }
        );
        assert_eq!(manager.current(), Theme::Dark);
    }
}
