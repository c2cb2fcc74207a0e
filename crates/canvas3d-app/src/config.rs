//! Application configuration.

use canvas3d_render::{RenderConfig, RenderingMode};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "CANVAS3D_CONFIG";
/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "canvas3d.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a CSS hex colour like "#ff0000".
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::from_rgba8(r, g, b, 255))
}

/// Application configuration.
///
/// Every field is optional in the JSON file; missing ones keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Clear colour as "#rrggbb".
    pub background: String,
    /// One of basic, ssao, line, hatching, sketchy, contour.
    pub rendering_mode: String,
    pub shadow_map_size: u32,
    pub ssao_kernel_size: usize,
    pub ssao_radius: f32,
    pub ssao_power: f32,
    pub history_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let render = RenderConfig::default();
        Self {
            title: "Canvas 3D".to_string(),
            width: 1280,
            height: 800,
            background: "#ffffff".to_string(),
            rendering_mode: RenderingMode::default().name().to_string(),
            shadow_map_size: render.shadow_map_size,
            ssao_kernel_size: render.ssao_kernel_size,
            ssao_radius: render.ssao_radius,
            ssao_power: render.ssao_power,
            history_capacity: canvas3d_core::history::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from `$CANVAS3D_CONFIG`, else `canvas3d.json` if present, else
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            log::info!("Loading configuration from {}", path.display());
            return Self::from_path(&path);
        }
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            log::info!("Loading configuration from {CONFIG_FILE}");
            return Self::from_path(path);
        }
        Ok(Self::default())
    }

    pub fn background_color(&self) -> Color {
        parse_color(&self.background).unwrap_or_else(|| {
            log::warn!("Invalid background colour {:?}, using white", self.background);
            Color::WHITE
        })
    }

    pub fn rendering_mode(&self) -> RenderingMode {
        RenderingMode::from_name(&self.rendering_mode).unwrap_or_else(|| {
            log::warn!("Unknown rendering mode {:?}", self.rendering_mode);
            RenderingMode::default()
        })
    }

    /// The renderer-facing subset.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            shadow_map_size: self.shadow_map_size,
            ssao_kernel_size: self.ssao_kernel_size,
            ssao_radius: self.ssao_radius,
            ssao_power: self.ssao_power,
            background: self.background_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_keep_defaults() {
        let config = AppConfig::from_json(r#"{ "width": 640, "rendering_mode": "Hatching" }"#)
            .expect("parse");
        assert_eq!(config.width, 640);
        assert_eq!(config.height, AppConfig::default().height);
        assert_eq!(config.rendering_mode(), RenderingMode::Hatching);
        assert_eq!(config.render_config(), RenderConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_json(r#"{ "background": "navy", "rendering_mode": "toon" }"#)
            .expect("parse");
        assert_eq!(config.background_color(), Color::WHITE);
        assert_eq!(config.rendering_mode(), RenderingMode::Basic);
    }

    #[test]
    fn test_background_parsed() {
        let config = AppConfig {
            background: "#ff8000".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.background_color(), Color::from_rgba8(255, 128, 0, 255));
        assert!(parse_color("#ff80").is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            AppConfig::from_json("{ width: 1 }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "title": "Test", "ssao_kernel_size": 16 }"#).expect("write");
        let config = AppConfig::from_path(&path).expect("load");
        assert_eq!(config.title, "Test");
        assert_eq!(config.render_config().ssao_kernel_size, 16);

        let missing = AppConfig::from_path(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
