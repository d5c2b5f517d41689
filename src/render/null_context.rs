use crate::core::PhysicalSize;
use crate::error::ChartResult;
use crate::render::{DrawingContext, RectPrimitive};

/// Recording context for headless surfaces.
///
/// Rectangles are validated before they are counted, so invalid paint
/// geometry surfaces as an error without a real backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NullContext {
    pub buffer_size: PhysicalSize,
    pub transform: (f64, f64),
    pub resize_count: usize,
    pub clear_count: usize,
    /// Rectangles filled since the last buffer resize.
    pub rect_count: usize,
}

impl Default for NullContext {
    fn default() -> Self {
        Self {
            buffer_size: PhysicalSize::default(),
            transform: (1.0, 1.0),
            resize_count: 0,
            clear_count: 0,
            rect_count: 0,
        }
    }
}

impl DrawingContext for NullContext {
    fn resize_buffer(&mut self, size: PhysicalSize) {
        self.buffer_size = size;
        self.transform = (1.0, 1.0);
        self.resize_count += 1;
        self.rect_count = 0;
    }

    fn scale(&mut self, horizontal: f64, vertical: f64) {
        self.transform.0 *= horizontal;
        self.transform.1 *= vertical;
    }

    fn clear_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
        self.clear_count += 1;
    }

    fn fill_rect(&mut self, rect: &RectPrimitive) -> ChartResult<()> {
        rect.validate()?;
        self.rect_count += 1;
        Ok(())
    }
}
