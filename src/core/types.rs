use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Surface extent in device-independent (CSS-like) units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    pub fn validate(self) -> ChartResult<Self> {
        if !self.is_valid() {
            return Err(ChartError::InvalidSurfaceSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// Projects the logical extent onto device pixels, rounding each axis.
    #[must_use]
    pub fn to_physical(self, density: f64) -> PhysicalSize {
        PhysicalSize::new(
            round_to_pixels(self.width * density),
            round_to_pixels(self.height * density),
        )
    }
}

/// Surface extent in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Reconciled surface geometry handed to paint routines.
///
/// The pixel ratios are tracked per axis: a device-pixel-box observer may
/// report physical sizes whose ratio to the logical size differs between
/// width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub logical: LogicalSize,
    pub physical: PhysicalSize,
    pub horizontal_pixel_ratio: f64,
    pub vertical_pixel_ratio: f64,
}

impl Default for SurfaceGeometry {
    fn default() -> Self {
        Self {
            logical: LogicalSize::default(),
            physical: PhysicalSize::default(),
            horizontal_pixel_ratio: 1.0,
            vertical_pixel_ratio: 1.0,
        }
    }
}

fn round_to_pixels(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::{LogicalSize, PhysicalSize};
    use crate::error::ChartError;

    #[test]
    fn to_physical_rounds_each_axis_independently() {
        let physical = LogicalSize::new(100.3, 50.5).to_physical(1.5);
        assert_eq!(physical, PhysicalSize::new(150, 76));
    }

    #[test]
    fn to_physical_clamps_negative_and_non_finite_to_zero() {
        assert_eq!(
            LogicalSize::new(-4.0, f64::NAN).to_physical(2.0),
            PhysicalSize::new(0, 0)
        );
    }

    #[test]
    fn validate_reports_offending_size() {
        let err = LogicalSize::new(10.0, -1.0).validate().expect_err("negative height");
        assert!(matches!(
            err,
            ChartError::InvalidSurfaceSize { width, height } if width == 10.0 && height == -1.0
        ));
        assert!(LogicalSize::new(0.0, 0.0).validate().is_ok());
    }
}
