use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

use super::merge_json;

pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 500.0;
pub const DEFAULT_ANIMATION_ITERATION_COUNT: u32 = 1;
pub const DEFAULT_PROBE_FRAME_BUDGET: u32 = 2;

/// CSS positioning of a surface inside its host container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePosition {
    #[default]
    Absolute,
    Relative,
}

/// Style hints applied when the host creates a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceStyle {
    #[serde(default)]
    pub position: SurfacePosition,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default = "default_z_index")]
    pub z_index: i32,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            position: SurfacePosition::default(),
            top: 0.0,
            left: 0.0,
            z_index: default_z_index(),
        }
    }
}

impl SurfaceStyle {
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// Surface manager tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default)]
    pub style: SurfaceStyle,
    /// Fired frames to wait for the device-pixel-box probe before falling
    /// back to density listening.
    #[serde(default = "default_probe_frame_budget")]
    pub probe_frame_budget: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            style: SurfaceStyle::default(),
            probe_frame_budget: default_probe_frame_budget(),
        }
    }
}

impl SurfaceConfig {
    pub fn validate(self) -> ChartResult<Self> {
        if self.probe_frame_budget == 0 {
            return Err(ChartError::InvalidConfig(
                "probe frame budget must be >= 1".to_owned(),
            ));
        }
        if !self.style.top.is_finite() || !self.style.left.is_finite() {
            return Err(ChartError::InvalidConfig(
                "surface offsets must be finite".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Animation driver defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_animation_duration_ms")]
    pub duration_ms: f64,
    /// `1` plays once.
    #[serde(default = "default_animation_iteration_count")]
    pub iteration_count: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_animation_duration_ms(),
            iteration_count: default_animation_iteration_count(),
        }
    }
}

impl AnimationConfig {
    pub fn validate(self) -> ChartResult<Self> {
        validate_duration_ms(self.duration_ms)?;
        validate_iteration_count(self.iteration_count)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_iteration_count(mut self, iteration_count: u32) -> Self {
        self.iteration_count = iteration_count;
        self
    }
}

pub(crate) fn validate_duration_ms(duration_ms: f64) -> ChartResult<()> {
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(ChartError::InvalidConfig(
            "animation duration must be finite and >= 0".to_owned(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_iteration_count(iteration_count: u32) -> ChartResult<()> {
    if iteration_count == 0 {
        return Err(ChartError::InvalidConfig(
            "animation iteration count must be >= 1".to_owned(),
        ));
    }
    Ok(())
}

/// Top-level configuration of the chart core.
///
/// Serializable so hosts can persist partial overrides and merge them over
/// the defaults with [`ChartCoreConfig::from_partial_json`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartCoreConfig {
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

impl ChartCoreConfig {
    #[must_use]
    pub fn with_surface(mut self, surface: SurfaceConfig) -> Self {
        self.surface = surface;
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    pub fn validate(self) -> ChartResult<Self> {
        self.surface.validate()?;
        self.animation.validate()?;
        Ok(self)
    }

    /// Merges a partial JSON document over the defaults and validates it.
    ///
    /// `null` members keep the default value.
    pub fn from_partial_json(input: &str) -> ChartResult<Self> {
        let partial: serde_json::Value = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidConfig(format!("failed to parse config json: {e}"))
        })?;
        let mut merged = serde_json::to_value(Self::default()).map_err(|e| {
            ChartError::InvalidConfig(format!("failed to serialize default config: {e}"))
        })?;
        merge_json(&mut merged, &partial);
        let config: Self = serde_json::from_value(merged)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to decode config: {e}")))?;
        config.validate()
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to serialize config: {e}")))
    }
}

fn default_z_index() -> i32 {
    1
}

fn default_probe_frame_budget() -> u32 {
    DEFAULT_PROBE_FRAME_BUDGET
}

fn default_animation_duration_ms() -> f64 {
    DEFAULT_ANIMATION_DURATION_MS
}

fn default_animation_iteration_count() -> u32 {
    DEFAULT_ANIMATION_ITERATION_COUNT
}
