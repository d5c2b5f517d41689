//! Host platform seam.
//!
//! Platform callbacks are never stored inside the core. A component asks the
//! host to schedule a frame (or install an observer) and receives a handle;
//! when the platform later fires, the host calls the component's matching
//! entry point (`on_frame`, `on_device_pixel_box`, `on_density_changed`,
//! `resolve_capability_probe`) with that handle.

mod headless;

pub use headless::{HeadlessHost, ObserverKind};

use serde::{Deserialize, Serialize};

use crate::api::SurfaceStyle;
use crate::core::LogicalSize;
use crate::error::ChartResult;
use crate::render::DrawingContext;

/// Identifies one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(u64);

impl FrameHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identifies one installed resize/density observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverHandle(u64);

impl ObserverHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Frame-synchronized callback scheduling.
///
/// Each scheduled frame fires at most once. Cancelling an unknown or already
/// fired handle is a no-op.
pub trait FrameScheduler {
    fn schedule_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Wall-clock source for animation timing. Precision is not guaranteed.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// What the host needs to create a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    pub id: String,
    pub style: SurfaceStyle,
}

/// Host services backing one drawing surface.
pub trait SurfaceHost: FrameScheduler {
    type Context: DrawingContext;

    /// Creates the physical surface and returns its drawing context.
    fn create_surface(&mut self, descriptor: &SurfaceDescriptor) -> ChartResult<Self::Context>;

    /// Applies the CSS-visible size of the surface.
    fn apply_css_size(&mut self, size: LogicalSize);

    /// Current device pixel density, always positive.
    fn current_density(&self) -> f64;

    /// Starts probing for precise device-pixel-box reporting.
    ///
    /// The result is delivered later through `Canvas::resolve_capability_probe`
    /// and may never arrive.
    fn begin_capability_probe(&mut self) -> ChartResult<()>;

    /// Installs an observer delivering precise physical pixel sizes.
    fn observe_device_pixel_box(&mut self) -> ChartResult<ObserverHandle>;

    /// Installs a listener firing once the density stops matching `density`.
    fn listen_density_change(&mut self, density: f64) -> ChartResult<ObserverHandle>;

    fn remove_observer(&mut self, handle: ObserverHandle);
}
