use serde::{Deserialize, Serialize};

use crate::OmrError;

/// Immutable pipeline configuration.
///
/// Loaded once (typically from JSON), validated with [`OmrConfig::validate`]
/// and then shared by reference across every stage and every worker. The
/// pipeline never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OmrConfig {
    /// Minimum fiducial side length as a fraction of sheet width; a corner
    /// candidate must be at least `0.5 * fiducial_scaling_ref * image_width`
    /// wide and tall. Scale-adaptive across capture resolutions.
    #[serde(default = "default_scaling_ref")]
    pub fiducial_scaling_ref: f64,
    /// Canonical frame size every sheet is warped into.
    pub canonical_width: usize,
    pub canonical_height: usize,
    /// Inverse-threshold cutoff for the bubble-ink mask. The fiducial mask
    /// uses a fixed cutoff instead; thin corner squares and pencil fills
    /// respond differently to exposure.
    #[serde(default = "default_bubble_threshold")]
    pub bubble_threshold: u8,
    /// A bubble counts as filled when its circle fill density reaches this.
    #[serde(default = "default_min_fill")]
    pub min_fill_percentage: f64,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

/// Density bands and colors for the annotated preview.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisualizationConfig {
    pub threshold_high_density: f64,
    pub threshold_medium_density: f64,
    pub color_high: [u8; 3],
    pub color_medium: [u8; 3],
    pub color_low: [u8; 3],
    pub color_error: [u8; 3],
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            threshold_high_density: 0.5,
            threshold_medium_density: 0.4,
            color_high: [0, 255, 0],
            color_medium: [255, 255, 0],
            color_low: [255, 165, 0],
            color_error: [255, 50, 0],
        }
    }
}

fn default_scaling_ref() -> f64 {
    0.05
}

fn default_bubble_threshold() -> u8 {
    127
}

fn default_min_fill() -> f64 {
    0.40
}

impl OmrConfig {
    /// Reasonable defaults for a given canonical frame size.
    pub fn with_canonical_size(width: usize, height: usize) -> Self {
        Self {
            fiducial_scaling_ref: default_scaling_ref(),
            canonical_width: width,
            canonical_height: height,
            bubble_threshold: default_bubble_threshold(),
            min_fill_percentage: default_min_fill(),
            visualization: VisualizationConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), OmrError> {
        if !(self.fiducial_scaling_ref > 0.0 && self.fiducial_scaling_ref.is_finite()) {
            return Err(OmrError::InvalidConfig(format!(
                "fiducial_scaling_ref must be positive, got {}",
                self.fiducial_scaling_ref
            )));
        }
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(OmrError::InvalidConfig(format!(
                "canonical size must be nonzero, got {}x{}",
                self.canonical_width, self.canonical_height
            )));
        }
        if !(0.0..=1.0).contains(&self.min_fill_percentage) {
            return Err(OmrError::InvalidConfig(format!(
                "min_fill_percentage must be within [0, 1], got {}",
                self.min_fill_percentage
            )));
        }
        let v = &self.visualization;
        if !(0.0..=1.0).contains(&v.threshold_high_density)
            || !(0.0..=1.0).contains(&v.threshold_medium_density)
        {
            return Err(OmrError::InvalidConfig(
                "visualization density thresholds must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
