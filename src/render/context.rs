use crate::core::PhysicalSize;
use crate::error::ChartResult;
use crate::render::RectPrimitive;

/// 2-D drawing context bound to one physical pixel buffer.
///
/// The surface manager owns the context and only hands out mutable access
/// to the paint callback. Draw commands are issued in logical units; the
/// transform installed by reconciliation maps them onto device pixels.
pub trait DrawingContext {
    /// Sets the backing buffer to `size` device pixels.
    ///
    /// Clears pixel content and resets the transform to identity.
    fn resize_buffer(&mut self, size: PhysicalSize);

    /// Multiplies the current transform by a per-axis scale.
    fn scale(&mut self, horizontal: f64, vertical: f64);

    /// Clears a rectangle given in logical units.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Fills a rectangle given in logical units.
    fn fill_rect(&mut self, rect: &RectPrimitive) -> ChartResult<()>;
}
