use crate::layout::ForceLayoutParams;
use crate::packer::PackConfig;
use crate::style::VisualEncoding;
use crate::viewport::ViewportConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f32,
}

fn default_device_pixel_ratio() -> f32 {
    1.0
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

fn default_layout_timeout_ms() -> u64 {
    10_000
}

/// Everything a render session can be tuned with. Every section falls back
/// to its defaults when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub canvas: CanvasSettings,
    pub encoding: VisualEncoding,
    pub layout: ForceLayoutParams,
    pub pack: PackConfig,
    pub viewport: ViewportConfig,
    /// How long phase 2 waits for the layout to stop before using seed
    /// positions.
    #[serde(default = "default_layout_timeout_ms")]
    pub layout_timeout_ms: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSettings::default(),
            encoding: VisualEncoding::default(),
            layout: ForceLayoutParams::default(),
            pack: PackConfig::default(),
            viewport: ViewportConfig::default(),
            layout_timeout_ms: default_layout_timeout_ms(),
        }
    }
}

impl GraphSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: GraphSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn layout_timeout(&self) -> Duration {
        Duration::from_millis(self.layout_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("canvas.width", self.canvas.width)?;
        positive("canvas.height", self.canvas.height)?;
        positive("canvas.device_pixel_ratio", self.canvas.device_pixel_ratio)?;
        positive("viewport.min_zoom", self.viewport.min_zoom)?;
        positive("viewport.max_zoom", self.viewport.max_zoom)?;
        positive("viewport.zoom_factor", self.viewport.zoom_factor)?;

        if self.viewport.min_zoom > self.viewport.max_zoom {
            return Err(SettingsError::Invalid {
                field: "viewport.min_zoom",
                reason: format!(
                    "{} is above max_zoom {}",
                    self.viewport.min_zoom, self.viewport.max_zoom
                ),
            });
        }
        if self.pack.cols == 0 {
            return Err(SettingsError::Invalid {
                field: "pack.cols",
                reason: "a grid row needs at least one column".to_string(),
            });
        }
        if self.pack.large_min > self.pack.extra_large_min {
            return Err(SettingsError::Invalid {
                field: "pack.large_min",
                reason: format!(
                    "{} is above extra_large_min {}",
                    self.pack.large_min, self.pack.extra_large_min
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = GraphSettings::default();
        assert_eq!(settings.canvas.width, 1200.0);
        assert_eq!(settings.canvas.height, 600.0);
        assert_eq!(settings.layout_timeout(), Duration::from_secs(10));
        assert_eq!(settings.pack.cols, 8);
        assert_eq!(settings.viewport.fit_padding, 600.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<(), SettingsError> {
        let dir = tempdir().map_err(|source| SettingsError::Io {
            path: PathBuf::from("tempdir"),
            source,
        })?;
        let path = dir.path().join("clusterview.json");
        fs::write(
            &path,
            r#"{ "canvas": { "width": 800 }, "pack": { "row_gap": 50 }, "layout": { "seed": 9 } }"#,
        )
        .map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;

        let settings = GraphSettings::load(&path)?;
        assert_eq!(settings.canvas.width, 800.0);
        assert_eq!(settings.canvas.height, 600.0);
        assert_eq!(settings.canvas.device_pixel_ratio, 1.0);
        assert_eq!(settings.pack.row_gap, 50.0);
        assert_eq!(settings.pack.cluster_gap, 500.0);
        assert_eq!(settings.layout.seed, Some(9));
        assert_eq!(settings.layout_timeout_ms, 10_000);
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = GraphSettings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GraphSettings::from_json(r#"{ "canvas": { "height": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "canvas.height", .. }));

        let err = GraphSettings::from_json(r#"{ "viewport": { "min_zoom": 3.0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "viewport.min_zoom", .. }));

        let err = GraphSettings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
