//! Responsive image configuration.
//!
//! Settings live in the `[default]` table of `responsive-image.toml`. The
//! table is treated as a flat key/value section: every value is read as a
//! string and parsed per key, so a malformed value only loses that one key
//! and the stock default stays in place.
//!
//! ## Configuration Options
//!
//! ```toml
//! [default]
//! widths = "480 800 1200 2400"  # Candidate rendition widths, ascending
//! quality = 92                  # JPEG encoding quality (1-100)
//! default_width = 1200          # Width of the image used for `src`
//! sizes = "(min-width: 60em) 50vw, 100vw"  # Optional `sizes` attribute, verbatim
//! ```
//!
//! ## Lenient Parsing
//!
//! | Key | Accepted | Malformed (ignored) |
//! |-----|----------|---------------------|
//! | `widths` | whitespace-separated, non-zero, strictly ascending integers | `"10-20"`, `"800 480"`, `"0 10"` |
//! | `quality` | unsigned integer, clamped to 1-100 | `"twelve"`, `"-5"` |
//! | `default_width` | positive integer | `"0"`, `"wide"` |
//! | `sizes` | anything | — |
//!
//! `widths` is stricter than a plain integer-list parse on purpose: lists that
//! are not strictly ascending or contain a zero are treated as malformed, so
//! width selection can rely on an ascending candidate list.
//!
//! Integer values and integer arrays are accepted as TOML scalars too
//! (`quality = 80`, `widths = [320, 640]`); they are stringified and run
//! through the same parser.

use crate::imaging::Quality;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "responsive-image.toml";

/// Name of the table holding the settings.
pub const CONFIG_SECTION: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Effective configuration for responsive image rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveImageConfig {
    /// Candidate rendition widths, ascending.
    pub widths: Vec<u32>,
    /// Encoding quality passed to the resize capability.
    pub quality: Quality,
    /// Width of the rendition used for the `src` attribute.
    pub default_width: u32,
    /// Opaque value for the `sizes` attribute.
    pub sizes: Option<String>,
}

impl Default for ResponsiveImageConfig {
    fn default() -> Self {
        Self {
            widths: vec![480, 800, 1200, 2400],
            quality: Quality::default(),
            default_width: 1200,
            sizes: None,
        }
    }
}

/// Per-key overrides parsed from a config section.
///
/// Only keys that were present *and* parsed cleanly are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub widths: Option<Vec<u32>>,
    pub quality: Option<Quality>,
    pub default_width: Option<u32>,
    pub sizes: Option<String>,
}

impl ConfigOverrides {
    /// Parse a flat key/value section, dropping malformed values.
    pub fn parse_section(section: &BTreeMap<String, String>) -> Self {
        let mut overrides = Self::default();

        if let Some(raw) = section.get("widths") {
            match parse_widths(raw) {
                Some(widths) => overrides.widths = Some(widths),
                None => warn!("ignoring malformed `widths` value {raw:?}"),
            }
        }
        if let Some(raw) = section.get("quality") {
            match raw.trim().parse::<u32>() {
                Ok(q) => overrides.quality = Some(Quality::new(q)),
                Err(_) => warn!("ignoring malformed `quality` value {raw:?}"),
            }
        }
        if let Some(raw) = section.get("default_width") {
            match raw.trim().parse::<u32>() {
                Ok(w) if w > 0 => overrides.default_width = Some(w),
                _ => warn!("ignoring malformed `default_width` value {raw:?}"),
            }
        }
        if let Some(raw) = section.get("sizes") {
            overrides.sizes = Some(raw.clone());
        }

        overrides
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer these overrides on top of `base`.
    pub fn apply(self, base: ResponsiveImageConfig) -> ResponsiveImageConfig {
        ResponsiveImageConfig {
            widths: self.widths.unwrap_or(base.widths),
            quality: self.quality.unwrap_or(base.quality),
            default_width: self.default_width.unwrap_or(base.default_width),
            sizes: self.sizes.or(base.sizes),
        }
    }
}

/// Parse a whitespace-separated, strictly ascending list of non-zero widths.
///
/// An empty or blank string is a valid empty list.
fn parse_widths(raw: &str) -> Option<Vec<u32>> {
    let widths = raw
        .split_whitespace()
        .map(|w| w.parse::<u32>().ok().filter(|&w| w > 0))
        .collect::<Option<Vec<u32>>>()?;
    if widths.windows(2).all(|pair| pair[0] < pair[1]) {
        Some(widths)
    } else {
        None
    }
}

/// Flatten a table of `doc` into string values.
///
/// Strings are kept verbatim, integers are stringified and integer arrays are
/// joined with spaces. Any other value kind is dropped with a warning. A
/// missing table yields an empty section.
pub fn section_as_strings(
    doc: &toml::Value,
    section: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let table = match doc.get(section) {
        None => return Ok(BTreeMap::new()),
        Some(toml::Value::Table(table)) => table,
        Some(_) => {
            return Err(ConfigError::Validation(format!(
                "`{section}` must be a table"
            )));
        }
    };

    let mut values = BTreeMap::new();
    for (key, value) in table {
        match value_as_string(value) {
            Some(s) => {
                values.insert(key.clone(), s);
            }
            None => warn!("ignoring `{section}.{key}`: unsupported value {value}"),
        }
    }
    Ok(values)
}

fn value_as_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| item.as_integer().map(|i| i.to_string()))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(" ")),
        _ => None,
    }
}

/// Parse config file contents into an effective configuration.
pub fn parse_config(content: &str) -> Result<ResponsiveImageConfig, ConfigError> {
    let doc: toml::Value = toml::from_str(content)?;
    let section = section_as_strings(&doc, CONFIG_SECTION)?;
    Ok(ConfigOverrides::parse_section(&section).apply(ResponsiveImageConfig::default()))
}

/// Load the configuration file at `path`.
///
/// Returns the stock defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<ResponsiveImageConfig, ConfigError> {
    if !path.exists() {
        return Ok(ResponsiveImageConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `responsive-image.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# Responsive Image Configuration
# ==============================
# All settings are optional. Values shown below are the defaults.
# A malformed value is ignored and the default is used instead.

[default]
# Candidate rendition widths in pixels, whitespace-separated and ascending.
# Images are never upscaled: an image narrower than a candidate gets its
# native width as the last rendition instead.
widths = "480 800 1200 2400"

# JPEG encoding quality for generated renditions (1 = worst, 100 = best).
quality = 92

# Width of the rendition referenced by the `src` attribute.
default_width = 1200

# Value for the `sizes` attribute, passed through verbatim. Only emitted
# when the image has a srcset.
# sizes = "(min-width: 60em) 50vw, 100vw"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn section(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_values() {
        let config = ResponsiveImageConfig::default();
        assert_eq!(config.widths, vec![480, 800, 1200, 2400]);
        assert_eq!(config.quality.value(), 92);
        assert_eq!(config.default_width, 1200);
        assert_eq!(config.sizes, None);
    }

    // =========================================================================
    // parse_section tests
    // =========================================================================

    #[test]
    fn widths_with_trailing_whitespace() {
        let o = ConfigOverrides::parse_section(&section(&[("widths", "10 20 ")]));
        assert_eq!(
            o,
            ConfigOverrides {
                widths: Some(vec![10, 20]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn widths_with_dash_is_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("widths", "10-20")]));
        assert!(o.is_empty());
    }

    #[test]
    fn widths_descending_is_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("widths", "800 480")]));
        assert!(o.widths.is_none());
    }

    #[test]
    fn widths_with_zero_is_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("widths", "0 480")]));
        assert!(o.widths.is_none());
    }

    #[test]
    fn widths_blank_is_empty_list() {
        let o = ConfigOverrides::parse_section(&section(&[("widths", "  ")]));
        assert_eq!(o.widths, Some(vec![]));
    }

    #[test]
    fn quality_parses() {
        let o = ConfigOverrides::parse_section(&section(&[("quality", "12")]));
        assert_eq!(o.quality, Some(Quality::new(12)));
    }

    #[test]
    fn quality_word_is_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("quality", "twelve")]));
        assert!(o.is_empty());
    }

    #[test]
    fn quality_is_clamped() {
        let o = ConfigOverrides::parse_section(&section(&[("quality", "250")]));
        assert_eq!(o.quality, Some(Quality::new(100)));
    }

    #[test]
    fn default_width_parses() {
        let o = ConfigOverrides::parse_section(&section(&[("default_width", "10")]));
        assert_eq!(o.default_width, Some(10));
    }

    #[test]
    fn default_width_zero_is_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("default_width", "0")]));
        assert!(o.is_empty());
    }

    #[test]
    fn sizes_passed_verbatim() {
        let o = ConfigOverrides::parse_section(&section(&[("sizes", "60vw")]));
        assert_eq!(o.sizes.as_deref(), Some("60vw"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let o = ConfigOverrides::parse_section(&section(&[("colour", "blue")]));
        assert!(o.is_empty());
    }

    #[test]
    fn malformed_key_does_not_affect_others() {
        let o = ConfigOverrides::parse_section(&section(&[
            ("widths", "10-20"),
            ("quality", "80"),
        ]));
        assert_eq!(o.widths, None);
        assert_eq!(o.quality, Some(Quality::new(80)));
    }

    #[test]
    fn apply_keeps_defaults_for_missing_keys() {
        let config = ConfigOverrides {
            default_width: Some(640),
            ..Default::default()
        }
        .apply(ResponsiveImageConfig::default());
        assert_eq!(config.default_width, 640);
        assert_eq!(config.widths, vec![480, 800, 1200, 2400]);
        assert_eq!(config.quality.value(), 92);
    }

    // =========================================================================
    // TOML loading tests
    // =========================================================================

    #[test]
    fn toml_scalars_are_stringified() {
        let config = parse_config(
            r#"
[default]
widths = [320, 640]
quality = 75
sizes = "50vw"
"#,
        )
        .unwrap();
        assert_eq!(config.widths, vec![320, 640]);
        assert_eq!(config.quality.value(), 75);
        assert_eq!(config.sizes.as_deref(), Some("50vw"));
    }

    #[test]
    fn toml_unsupported_value_kind_is_ignored() {
        let config = parse_config("[default]\nquality = 1.5\n").unwrap();
        assert_eq!(config.quality.value(), 92);
    }

    #[test]
    fn toml_negative_integer_is_ignored() {
        let config = parse_config("[default]\ndefault_width = -4\n").unwrap();
        assert_eq!(config.default_width, 1200);
    }

    #[test]
    fn missing_section_uses_defaults() {
        let config = parse_config("[other]\nquality = \"10\"\n").unwrap();
        assert_eq!(config, ResponsiveImageConfig::default());
    }

    #[test]
    fn non_table_section_is_error() {
        let result = parse_config("default = 5\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let result = parse_config("[default\nwidths = ");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, ResponsiveImageConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "[default]\nwidths = \"300 600\"\ndefault_width = \"600\"\nquality = \"twelve\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.widths, vec![300, 600]);
        assert_eq!(config.default_width, 600);
        assert_eq!(config.quality.value(), 92);
    }

    #[test]
    fn stock_config_matches_defaults() {
        let config = parse_config(stock_config_toml()).unwrap();
        assert_eq!(config, ResponsiveImageConfig::default());
    }
}
