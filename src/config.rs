//! Configuration for the terminal session.
//!
//! An optional `terminal.toml` next to the resource tree tunes the look and
//! pacing without rebuilding:
//!
//! ```toml
//! # Per-character typing delay in milliseconds
//! typing_delay_ms = 1
//!
//! # Override the directory holding resources/ and resources.pak
//! # resource_dir = "/opt/mlaterm"
//!
//! [palette]
//! text = "#E0D8C4"
//! input = "#8CCAE6"
//! listing = "#CDD08D"
//!
//! [screensaver]
//! min_pause_ms = 600
//! max_pause_ms = 4000
//! blink_ms = 70
//! ```
//!
//! A missing or malformed file silently falls back to the defaults.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::style::Color;
use serde::{Deserialize, Serialize};

/// Config file name, looked up in the working directory
const CONFIG_FILE: &str = "terminal.toml";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing the resource tree and archive
    pub resource_dir: Option<PathBuf>,
    /// Per-character typing delay in milliseconds
    pub typing_delay_ms: u64,
    /// Palette overrides
    pub palette: PaletteConfig,
    /// Screensaver timing
    pub screensaver: ScreensaverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource_dir: None,
            typing_delay_ms: 1,
            palette: PaletteConfig::default(),
            screensaver: ScreensaverConfig::default(),
        }
    }
}

/// Palette overrides as `#RRGGBB` strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub text: String,
    pub input: String,
    pub listing: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            text: "#E0D8C4".to_string(),
            input: "#8CCAE6".to_string(),
            listing: "#CDD08D".to_string(),
        }
    }
}

/// Screensaver timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensaverConfig {
    /// Lower bound of the randomized pause between blinks
    pub min_pause_ms: u64,
    /// Upper bound of the randomized pause between blinks
    pub max_pause_ms: u64,
    /// Duration of each blink frame
    pub blink_ms: u64,
}

impl Default for ScreensaverConfig {
    fn default() -> Self {
        Self {
            min_pause_ms: 600,
            max_pause_ms: 4000,
            blink_ms: 70,
        }
    }
}

impl Config {
    /// Load configuration from `terminal.toml`, falling back to defaults
    pub fn load() -> Self {
        let path = PathBuf::from(CONFIG_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    /// Resolve the palette, ignoring unparseable overrides
    pub fn resolve_palette(&self) -> Palette {
        let defaults = Palette::default();
        Palette {
            text: parse_hex(&self.palette.text).unwrap_or(defaults.text),
            input: parse_hex(&self.palette.input).unwrap_or(defaults.input),
            listing: parse_hex(&self.palette.listing).unwrap_or(defaults.listing),
        }
    }
}

/// Resolved session colors
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Narration and notices
    pub text: Color,
    /// Echoed user input
    pub input: Color,
    /// File and directory listings
    pub listing: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text: Color::Rgb { r: 0xE0, g: 0xD8, b: 0xC4 },
            input: Color::Rgb { r: 0x8C, g: 0xCA, b: 0xE6 },
            listing: Color::Rgb { r: 0xCD, g: 0xD0, b: 0x8D },
        }
    }
}

/// Parse a `#RRGGBB` (or bare `RRGGBB`) color
fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb { r, g, b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(
            parse_hex("#8CCAE6"),
            Some(Color::Rgb { r: 0x8C, g: 0xCA, b: 0xE6 })
        );
        assert_eq!(
            parse_hex("000000"),
            Some(Color::Rgb { r: 0, g: 0, b: 0 })
        );
        assert_eq!(parse_hex("#xyzxyz"), None);
        assert_eq!(parse_hex("#fff"), None);
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            typing_delay_ms = 3

            [screensaver]
            min_pause_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.typing_delay(), Duration::from_millis(3));
        assert_eq!(config.screensaver.min_pause_ms, 100);
        // Unspecified sections keep their defaults
        assert_eq!(config.screensaver.blink_ms, 70);
        assert_eq!(config.palette.text, "#E0D8C4");
    }

    #[test]
    fn test_bad_palette_falls_back() {
        let mut config = Config::default();
        config.palette.input = "not-a-color".to_string();
        let palette = config.resolve_palette();

        assert_eq!(palette.input, Palette::default().input);
    }
}
