mod canvas;
mod context;
mod null_context;
mod primitives;

pub use canvas::{Canvas, CapabilityProbe, DeviceRatioMode, PaintCallback, SurfaceState};
pub use context::DrawingContext;
pub use null_context::NullContext;
pub use primitives::{Color, RectPrimitive};
