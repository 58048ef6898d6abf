//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/mindmap/mindmap.toml`
//! 3. Local config: `<dir>/.mindmap.toml`
//! 4. Environment variables: `MINDMAP_*` prefix, `__` between section and key

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{LayoutConfig, ViewportConfig};

/// Raw layout config for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawLayoutConfig {
    pub sibling_pitch: Option<f64>,
    pub depth_pitch: Option<f64>,
    pub sibling_separation: Option<f64>,
    pub cousin_separation: Option<f64>,
    pub node_width: Option<f64>,
    pub node_height: Option<f64>,
    pub padding: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawViewportConfig {
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub zoom_in_step: Option<f64>,
    pub zoom_out_step: Option<f64>,
    pub fit_max_zoom: Option<f64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub layout: RawLayoutConfig,
    pub viewport: RawViewportConfig,
}

fn merge_layout(base: &LayoutConfig, overlay: &RawLayoutConfig) -> LayoutConfig {
    LayoutConfig {
        sibling_pitch: overlay.sibling_pitch.unwrap_or(base.sibling_pitch),
        depth_pitch: overlay.depth_pitch.unwrap_or(base.depth_pitch),
        sibling_separation: overlay.sibling_separation.unwrap_or(base.sibling_separation),
        cousin_separation: overlay.cousin_separation.unwrap_or(base.cousin_separation),
        node_width: overlay.node_width.unwrap_or(base.node_width),
        node_height: overlay.node_height.unwrap_or(base.node_height),
        padding: overlay.padding.unwrap_or(base.padding),
    }
}

fn merge_viewport(base: &ViewportConfig, overlay: &RawViewportConfig) -> ViewportConfig {
    ViewportConfig {
        min_zoom: overlay.min_zoom.unwrap_or(base.min_zoom),
        max_zoom: overlay.max_zoom.unwrap_or(base.max_zoom),
        zoom_in_step: overlay.zoom_in_step.unwrap_or(base.zoom_in_step),
        zoom_out_step: overlay.zoom_out_step.unwrap_or(base.zoom_out_step),
        fit_max_zoom: overlay.fit_max_zoom.unwrap_or(base.fit_max_zoom),
    }
}

/// Unified configuration for mindmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Layout grid and node footprint
    pub layout: LayoutConfig,
    /// Zoom limits and steps
    pub viewport: ViewportConfig,
}

/// Get the XDG config directory for mindmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mindmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("mindmap.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".mindmap.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it names a key.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            layout: merge_layout(&self.layout, &overlay.layout),
            viewport: merge_viewport(&self.viewport, &overlay.viewport),
        }
    }

    /// Load settings with layered precedence and validate the result.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.mindmap.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply MINDMAP_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("MINDMAP")
                .prefix_separator("_")
                .separator("__"),
        );
        let config = builder.build().map_err(config_err)?;

        let float = |key: &str| -> Result<Option<f64>, ApplicationError> {
            match config.get_float(key) {
                Ok(v) => Ok(Some(v)),
                Err(ConfigError::NotFound(_)) => Ok(None),
                Err(e) => Err(config_err(e)),
            }
        };

        let layout = RawLayoutConfig {
            sibling_pitch: float("layout.sibling_pitch")?,
            depth_pitch: float("layout.depth_pitch")?,
            sibling_separation: float("layout.sibling_separation")?,
            cousin_separation: float("layout.cousin_separation")?,
            node_width: float("layout.node_width")?,
            node_height: float("layout.node_height")?,
            padding: float("layout.padding")?,
        };
        let viewport = RawViewportConfig {
            min_zoom: float("viewport.min_zoom")?,
            max_zoom: float("viewport.max_zoom")?,
            zoom_in_step: float("viewport.zoom_in_step")?,
            zoom_out_step: float("viewport.zoom_out_step")?,
            fit_max_zoom: float("viewport.fit_max_zoom")?,
        };
        settings = settings.merge_with(&RawSettings { layout, viewport });
        Ok(settings)
    }

    /// Reject geometry the layout or viewport cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.layout.validate()?;
        self.viewport.validate()?;
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# mindmap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/mindmap/mindmap.toml
#   Local:  <dir>/.mindmap.toml  (select with -C <dir>)
#   Env:    MINDMAP_<SECTION>__<KEY>, e.g. MINDMAP_LAYOUT__DEPTH_PITCH=300
#
# Only the keys you set override the layer below.

[layout]
# Vertical pixels per separation unit between neighbouring nodes
# sibling_pitch = 120.0

# Horizontal pixels between depth levels
# depth_pitch = 250.0

# Separation multipliers; siblings must be >= 2 x cousins
# sibling_separation = 2.0
# cousin_separation = 1.0

# Node footprint used for bounds
# node_width = 250.0
# node_height = 80.0
# padding = 50.0

[viewport]
# min_zoom = 0.5
# max_zoom = 3.0
# zoom_in_step = 1.1
# zoom_out_step = 0.9

# Fit-to-view never zooms in further than this
# fit_max_zoom = 2.0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_only_named_keys_change() {
        let raw: RawSettings = toml::from_str("[layout]\ndepth_pitch = 300.0\n").unwrap();
        let merged = Settings::default().merge_with(&raw);
        assert_eq!(merged.layout.depth_pitch, 300.0);
        assert_eq!(merged.layout.sibling_pitch, 120.0);
        assert_eq!(merged.viewport, ViewportConfig::default());
    }

    #[test]
    fn given_template_when_parsed_then_equals_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), Settings::default());
    }

    #[test]
    fn given_inverted_zoom_range_when_validating_then_rejected() {
        let mut settings = Settings::default();
        settings.viewport.min_zoom = 4.0;
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Domain(_))
        ));
    }

    #[test]
    fn given_settings_when_rendering_toml_then_contains_sections() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("[layout]"));
        assert!(text.contains("depth_pitch = 250.0"));
        assert!(text.contains("[viewport]"));
    }
}
