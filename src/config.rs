//! Tunable parameters for the detector.
//!
//! Every field has a default matching the reference behaviour, so an empty TOML
//! document (or `DetectorConfig::default()`) reproduces the stock thresholds.
//! Sections mirror the pipeline stages: `sampling`, `grid`, `decision`, `upload`.

use crate::error::{DetectionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How flagged grid cells are reduced into bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// One envelope per class around every flagged cell.
    #[default]
    Envelope,
    /// One envelope per 4-connected cluster of flagged cells.
    ConnectedComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Longest side of the working image in pixels.
    pub max_dimension: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { max_dimension: 600 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side; the grid is always square.
    pub grid_size: u32,
    /// A cell is a fire region when its fire ratio is strictly above this.
    pub fire_cell_ratio: f64,
    /// A cell is a smoke region when its smoke ratio is strictly above this.
    pub smoke_cell_ratio: f64,
    pub merge_policy: MergePolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            fire_cell_ratio: 0.15,
            smoke_cell_ratio: 0.20,
            merge_policy: MergePolicy::Envelope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub max_boxes: usize,
    pub fire_confidence_cap: u32,
    pub smoke_confidence_cap: u32,
    pub no_fire_confidence_floor: u32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            max_boxes: 5,
            fire_confidence_cap: 95,
            smoke_confidence_cap: 90,
            no_fire_confidence_floor: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Top-level configuration passed to `FireDetector`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub sampling: SamplingConfig,
    pub grid: GridConfig,
    pub decision: DecisionConfig,
    pub upload: UploadConfig,
}

impl DetectorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: DetectorConfig =
            toml::from_str(contents).map_err(|e| DetectionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DetectionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.max_dimension == 0 {
            return Err(DetectionError::Config(
                "sampling.max_dimension must be at least 1".to_string(),
            ));
        }
        if self.grid.grid_size == 0 {
            return Err(DetectionError::Config(
                "grid.grid_size must be at least 1".to_string(),
            ));
        }
        for (name, ratio) in [
            ("grid.fire_cell_ratio", self.grid.fire_cell_ratio),
            ("grid.smoke_cell_ratio", self.grid.smoke_cell_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(DetectionError::Config(format!(
                    "{name} must be between 0.0 and 1.0, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DetectorConfig::from_toml_str("").unwrap();
        assert_eq!(config, DetectorConfig::default());
        assert_eq!(config.sampling.max_dimension, 600);
        assert_eq!(config.grid.grid_size, 10);
        assert_eq!(config.upload.max_bytes, 10_485_760);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = DetectorConfig::from_toml_str(
            r#"
            [grid]
            grid_size = 20
            merge_policy = "connected_components"
            "#,
        )
        .unwrap();
        assert_eq!(config.grid.grid_size, 20);
        assert_eq!(config.grid.merge_policy, MergePolicy::ConnectedComponents);
        assert_eq!(config.grid.fire_cell_ratio, 0.15);
        assert_eq!(config.decision, DecisionConfig::default());
    }

    #[test]
    fn rejects_degenerate_values() {
        assert!(matches!(
            DetectorConfig::from_toml_str("[grid]\ngrid_size = 0"),
            Err(DetectionError::Config(_))
        ));
        assert!(matches!(
            DetectorConfig::from_toml_str("[grid]\nsmoke_cell_ratio = 1.5"),
            Err(DetectionError::Config(_))
        ));
        assert!(matches!(
            DetectorConfig::from_toml_str("[sampling]\nmax_dimension = \"big\""),
            Err(DetectionError::Config(_))
        ));
    }
}
