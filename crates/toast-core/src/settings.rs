//! Typography and alignment preferences
//!
//! Stored as one JSON object. Loading applies each field only when it is
//! present and readable, so a partial or partly broken object from an older
//! version still contributes whatever it can.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::storage::{Slot, SlotValue};

pub const DEFAULT_FONT_SIZE_PX: u32 = 16;
pub const DEFAULT_FONT_FAMILY: &str = "Georgia, serif";
pub const DEFAULT_LINE_SPACING: f32 = 1.6;

pub const MIN_FONT_SIZE_PX: u32 = 12;
pub const MAX_FONT_SIZE_PX: u32 = 32;
pub const MIN_LINE_SPACING: f32 = 1.0;
pub const MAX_LINE_SPACING: f32 = 3.0;

/// Errors from setting a value by name
#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Unknown setting '{0}'. Valid keys: font_size, font_family, line_spacing, text_align")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn name(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextAlign {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            "justify" => Ok(TextAlign::Justify),
            _ => Err(SettingsError::InvalidValue {
                key: "text_align",
                value: s.to_string(),
            }),
        }
    }
}

/// Editor typography
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "fontSize")]
    pub font_size_px: u32,
    pub font_family: String,
    pub line_spacing: f32,
    pub text_align: TextAlign,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size_px: DEFAULT_FONT_SIZE_PX,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            line_spacing: DEFAULT_LINE_SPACING,
            text_align: TextAlign::default(),
        }
    }
}

impl Settings {
    /// Set the font size, clamped to the supported range
    pub fn set_font_size(&mut self, px: u32) {
        self.font_size_px = px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX);
    }

    /// Set the font family; blank names are ignored
    pub fn set_font_family(&mut self, family: &str) {
        let family = family.trim();
        if !family.is_empty() {
            self.font_family = family.to_string();
        }
    }

    /// Set line spacing, clamped to the supported range
    pub fn set_line_spacing(&mut self, spacing: f32) {
        if spacing.is_finite() {
            self.line_spacing = spacing.clamp(MIN_LINE_SPACING, MAX_LINE_SPACING);
        }
    }

    /// Set a value by name (CLI `settings set`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "font_size" | "fontSize" => {
                let px = value.trim().parse().map_err(|_| SettingsError::InvalidValue {
                    key: "font_size",
                    value: value.to_string(),
                })?;
                self.set_font_size(px);
            }
            "font_family" | "fontFamily" => {
                if value.trim().is_empty() {
                    return Err(SettingsError::InvalidValue {
                        key: "font_family",
                        value: value.to_string(),
                    });
                }
                self.set_font_family(value);
            }
            "line_spacing" | "lineSpacing" => {
                let spacing: f32 =
                    value
                        .trim()
                        .parse()
                        .map_err(|_| SettingsError::InvalidValue {
                            key: "line_spacing",
                            value: value.to_string(),
                        })?;
                if !spacing.is_finite() {
                    return Err(SettingsError::InvalidValue {
                        key: "line_spacing",
                        value: value.to_string(),
                    });
                }
                self.set_line_spacing(spacing);
            }
            "text_align" | "textAlign" => {
                self.text_align = value.parse()?;
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply every readable field of a stored object over the current values
    pub fn merge_stored(&mut self, stored: &Map<String, Value>) {
        if let Some(px) = field(stored, &["fontSize", "fontSizePx"]).and_then(as_number) {
            if px >= 1.0 {
                self.set_font_size(px.round() as u32);
            }
        }
        if let Some(family) = field(stored, &["fontFamily"]).and_then(Value::as_str) {
            self.set_font_family(family);
        }
        if let Some(spacing) = field(stored, &["lineSpacing"]).and_then(as_number) {
            if spacing > 0.0 {
                self.set_line_spacing(spacing as f32);
            }
        }
        if let Some(align) = field(stored, &["textAlign"])
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
        {
            self.text_align = align;
        }
    }
}

/// First present key among `names`
fn field<'a>(stored: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| stored.get(*name))
}

/// Numbers, or numeric strings as older versions stored them
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

impl SlotValue for Settings {
    const SLOT: Slot = Slot::Settings;

    fn decode(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let stored = value.as_object()?;
        let mut settings = Settings::default();
        settings.merge_stored(stored);
        debug!("Loaded settings: {:?}", settings);
        Some(settings)
    }

    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_object_keeps_defaults() {
        let settings = Settings::decode(r#"{"fontSize": 18}"#).unwrap();
        assert_eq!(settings.font_size_px, 18);
        assert_eq!(settings.font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(settings.line_spacing, DEFAULT_LINE_SPACING);
        assert_eq!(settings.text_align, TextAlign::Left);
    }

    #[test]
    fn test_string_numbers_from_older_versions() {
        let settings =
            Settings::decode(r#"{"fontSize": "20", "lineSpacing": "2", "textAlign": "justify"}"#)
                .unwrap();
        assert_eq!(settings.font_size_px, 20);
        assert_eq!(settings.line_spacing, 2.0);
        assert_eq!(settings.text_align, TextAlign::Justify);
    }

    #[test]
    fn test_bad_field_is_ignored_alone() {
        let settings =
            Settings::decode(r#"{"fontSize": "huge", "fontFamily": "Inter", "textAlign": "diagonal"}"#)
                .unwrap();
        assert_eq!(settings.font_size_px, DEFAULT_FONT_SIZE_PX);
        assert_eq!(settings.font_family, "Inter");
        assert_eq!(settings.text_align, TextAlign::Left);
    }

    #[test]
    fn test_not_an_object_is_malformed() {
        assert!(Settings::decode("[1, 2]").is_none());
        assert!(Settings::decode("{broken").is_none());
    }

    #[test]
    fn test_encode_round_trip() {
        let mut settings = Settings::default();
        settings.set_font_size(22);
        settings.text_align = TextAlign::Center;

        let raw = settings.encode();
        assert!(raw.contains("\"fontSize\":22"));
        assert!(raw.contains("\"textAlign\":\"center\""));
        assert_eq!(Settings::decode(&raw), Some(settings));
    }

    #[test]
    fn test_clamping() {
        let mut settings = Settings::default();
        settings.set_font_size(4);
        assert_eq!(settings.font_size_px, MIN_FONT_SIZE_PX);
        settings.set_line_spacing(9.0);
        assert_eq!(settings.line_spacing, MAX_LINE_SPACING);
        settings.set_line_spacing(f32::NAN);
        assert_eq!(settings.line_spacing, MAX_LINE_SPACING);
    }

    #[test]
    fn test_set_by_name() {
        let mut settings = Settings::default();
        settings.set("font_size", "18").unwrap();
        settings.set("lineSpacing", "1.5").unwrap();
        settings.set("text_align", "Right").unwrap();
        settings.set("font_family", "Times New Roman").unwrap();

        assert_eq!(settings.font_size_px, 18);
        assert_eq!(settings.line_spacing, 1.5);
        assert_eq!(settings.text_align, TextAlign::Right);
        assert_eq!(settings.font_family, "Times New Roman");

        assert!(matches!(
            settings.set("colour", "red"),
            Err(SettingsError::UnknownKey(_))
        ));
        assert!(matches!(
            settings.set("font_size", "big"),
            Err(SettingsError::InvalidValue { key: "font_size", .. })
        ));
    }
}
