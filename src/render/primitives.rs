use crate::core::LogicalSize;
use crate::error::{ChartError, ChartResult};

/// Fill color, channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn validate(self) -> ChartResult<()> {
        let channels = [self.red, self.green, self.blue, self.alpha];
        if channels
            .iter()
            .all(|channel| (0.0..=1.0).contains(channel))
        {
            Ok(())
        } else {
            Err(ChartError::InvalidData(format!(
                "color channels must be in [0, 1]: {channels:?}"
            )))
        }
    }
}

/// Filled rectangle in logical units.
///
/// The context transform installed by reconciliation maps it onto device
/// pixels, so paint routines never deal with the pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectPrimitive {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

impl RectPrimitive {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64, color: Color) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
        }
    }

    /// Rectangle covering a whole surface of `size`, e.g. a background.
    #[must_use]
    pub const fn covering(size: LogicalSize, color: Color) -> Self {
        Self::new(0.0, 0.0, size.width, size.height, color)
    }

    pub fn validate(self) -> ChartResult<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ChartError::InvalidData(
                "rect origin must be finite".to_owned(),
            ));
        }
        if !LogicalSize::new(self.width, self.height).is_valid() {
            return Err(ChartError::InvalidData(
                "rect size must be finite and >= 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}
