//! Configuration hierarchy: defaults, then TOML file, then environment.
//! Command-line flags are applied last by the command handlers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::model::{EncoderSettings, FilterPreset, Resolution};
use crate::error::{CutframeError, CutframeResult};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "cutframe.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CUTFRAME_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub encoder: EncoderSettings,
    pub overlay: OverlayConfig,
    pub preview: PreviewConfig,
    pub defaults: FormDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub font_size: u32,
    pub font_color: String,
    pub font_file: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_size: 24,
            font_color: "white".to_string(),
            font_file: None,
        }
    }
}

/// Bounding box for preview frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: 560,
            max_height: 240,
        }
    }
}

/// Initial values of the editor form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub input: String,
    pub output: String,
    pub text: String,
    pub trim: String,
    pub filter: FilterPreset,
    pub resolution: Resolution,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            input: "input.mp4".to_string(),
            output: "output.mp4".to_string(),
            text: "Hello World".to_string(),
            trim: "10.0".to_string(),
            filter: FilterPreset::None,
            resolution: Resolution::P1080,
        }
    }
}

impl AppConfig {
    /// Load defaults, the config file and environment overrides.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> CutframeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CutframeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CutframeError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CutframeResult<Self> {
        toml::from_str(content).map_err(|e| CutframeError::ConfigError {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    pub fn to_toml(&self) -> CutframeResult<String> {
        toml::to_string_pretty(self).map_err(|e| CutframeError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    /// Apply `CUTFRAME_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> CutframeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut overrides = 0;

        if let Some(codec) = var("CODEC") {
            self.encoder.codec = codec;
            overrides += 1;
        }
        if let Some(crf) = var("CRF") {
            self.encoder.crf = parse_env("CRF", &crf)?;
            overrides += 1;
        }
        if let Some(preset) = var("PRESET") {
            self.encoder.preset = preset;
            overrides += 1;
        }
        if let Some(font_file) = var("FONT_FILE") {
            self.overlay.font_file = Some(font_file).filter(|f| !f.is_empty());
            overrides += 1;
        }
        if let Some(size) = var("FONT_SIZE") {
            self.overlay.font_size = parse_env("FONT_SIZE", &size)?;
            overrides += 1;
        }
        if let Some(color) = var("FONT_COLOR") {
            self.overlay.font_color = color;
            overrides += 1;
        }
        if let Some(filter) = var("FILTER") {
            self.defaults.filter = filter.parse()?;
            overrides += 1;
        }
        if let Some(resolution) = var("RESOLUTION") {
            self.defaults.resolution = resolution.parse()?;
            overrides += 1;
        }

        if overrides > 0 {
            info!("Applied {} environment variable overrides", overrides);
        }
        Ok(())
    }

    pub fn validate(&self) -> CutframeResult<()> {
        if self.encoder.crf > 51 {
            return Err(CutframeError::ConfigError {
                message: "CRF value cannot exceed 51".to_string(),
            });
        }
        if self.overlay.font_size == 0 {
            return Err(CutframeError::ConfigError {
                message: "font_size must be non-zero".to_string(),
            });
        }
        if self.preview.max_width < 2 || self.preview.max_height < 2 {
            return Err(CutframeError::ConfigError {
                message: "preview box must be at least 2x2".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> CutframeResult<T> {
    value.trim().parse().map_err(|_| CutframeError::ConfigError {
        message: format!("Invalid value for {}{}: {}", ENV_PREFIX, name, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.encoder.codec, "libx264");
        assert_eq!(config.encoder.crf, 23);
        assert_eq!(config.overlay.font_size, 24);
        assert_eq!(config.defaults.trim, "10.0");
        assert_eq!(config.defaults.resolution, Resolution::P1080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [encoder]
            crf = 18

            [defaults]
            filter = "sepia"
            resolution = "720p"
            "#,
        )
        .unwrap();
        assert_eq!(config.encoder.crf, 18);
        assert_eq!(config.encoder.preset, "medium");
        assert_eq!(config.defaults.filter, FilterPreset::Sepia);
        assert_eq!(config.defaults.resolution, Resolution::P720);
        assert_eq!(config.overlay.font_color, "white");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let result = AppConfig::from_toml("[encoder\ncrf = ");
        assert!(matches!(result, Err(CutframeError::ConfigError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CUTFRAME_CRF", "30"),
            ("CUTFRAME_FONT_COLOR", "yellow"),
            ("CUTFRAME_FILTER", "brighten"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.encoder.crf, 30);
        assert_eq!(config.overlay.font_color, "yellow");
        assert_eq!(config.defaults.filter, FilterPreset::Brighten);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == "CUTFRAME_CRF").then(|| "high".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutframe.toml");
        let mut config = AppConfig::default();
        config.overlay.font_file = Some("/fonts/DejaVuSans.ttf".to_string());
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_crf() {
        let mut config = AppConfig::default();
        config.encoder.crf = 52;
        assert!(config.validate().is_err());
    }
}
