use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::api::SurfaceConfig;
use crate::core::{LogicalSize, PhysicalSize, SurfaceGeometry, create_id};
use crate::error::ChartResult;
use crate::platform::{FrameHandle, ObserverHandle, SurfaceDescriptor, SurfaceHost};
use crate::render::DrawingContext;

/// How physical pixel sizes reach the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceRatioMode {
    /// A device-pixel-box observer reports exact physical sizes.
    ObservedByResize,
    /// Physical sizes are derived from `logical × density`; a density
    /// listener triggers recomputation.
    ObservedByMediaQuery,
}

/// State of the one-shot device-pixel-box capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityProbe {
    /// Waiting for the host's answer. Only frames fired for this canvas count
    /// down, so a canvas that is never repainted stays pending without a
    /// density listener.
    Pending { frames_remaining: u32 },
    Resolved { supported: bool },
}

/// Read-only snapshot of a [`Canvas`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    pub logical_size: LogicalSize,
    pub physical_size: PhysicalSize,
    pub pending_physical_size: PhysicalSize,
    pub device_ratio_mode: DeviceRatioMode,
    pub frame: Option<FrameHandle>,
    pub probe: CapabilityProbe,
    pub observing: bool,
    pub alive: bool,
}

/// Routine invoked once per coalesced repaint with the live context.
pub type PaintCallback<C> = Box<dyn FnMut(&mut C, &SurfaceGeometry)>;

/// Surface manager: one drawing surface, its context, and repaint coalescing.
///
/// Size and density changes only record a pending physical size and request
/// a frame. The frame, delivered through [`Canvas::on_frame`], applies the
/// latest pending size to the buffer, rescales the context per axis and
/// calls the paint routine exactly once. At most one frame is in flight.
pub struct Canvas<H: SurfaceHost> {
    id: String,
    host: H,
    context: H::Context,
    paint: PaintCallback<H::Context>,
    css_size: LogicalSize,
    logical_size: LogicalSize,
    physical_size: PhysicalSize,
    pending_physical_size: PhysicalSize,
    pixel_ratio: (f64, f64),
    reconcile_pending: bool,
    device_ratio_mode: DeviceRatioMode,
    probe: CapabilityProbe,
    observer: Option<ObserverHandle>,
    frame: Option<FrameHandle>,
    alive: bool,
}

impl<H: SurfaceHost> fmt::Debug for Canvas<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<H: SurfaceHost> Canvas<H> {
    /// Creates the surface on `host` and starts the capability probe.
    ///
    /// Only surface creation can fail. A probe that cannot start resolves to
    /// "unsupported" immediately.
    pub fn new<P>(mut host: H, config: SurfaceConfig, paint: P) -> ChartResult<Self>
    where
        P: FnMut(&mut H::Context, &SurfaceGeometry) + 'static,
    {
        let config = config.validate()?;
        let descriptor = SurfaceDescriptor {
            id: create_id("canvas"),
            style: config.style,
        };
        let context = host.create_surface(&descriptor)?;
        debug!(id = %descriptor.id, "surface created");

        let mut canvas = Self {
            id: descriptor.id,
            host,
            context,
            paint: Box::new(paint),
            css_size: LogicalSize::default(),
            logical_size: LogicalSize::default(),
            physical_size: PhysicalSize::default(),
            pending_physical_size: PhysicalSize::default(),
            pixel_ratio: (1.0, 1.0),
            reconcile_pending: false,
            device_ratio_mode: DeviceRatioMode::ObservedByMediaQuery,
            probe: CapabilityProbe::Pending {
                frames_remaining: config.probe_frame_budget,
            },
            observer: None,
            frame: None,
            alive: true,
        };

        if let Err(err) = canvas.host.begin_capability_probe() {
            debug!(error = %err, "device pixel box probe unavailable");
            canvas.resolve_capability_probe(false);
        }

        Ok(canvas)
    }

    /// Applies a new logical size, or requests a plain repaint when the size
    /// matches the CSS size already applied.
    ///
    /// Without precise pixel-box reporting the physical size is recomputed
    /// from the current density right away. Invalid sizes are logged and
    /// ignored.
    pub fn update(&mut self, width: f64, height: f64) {
        if !self.alive {
            trace!(id = %self.id, "update after destroy ignored");
            return;
        }

        let size = match LogicalSize::new(width, height).validate() {
            Ok(size) => size,
            Err(err) => {
                warn!(error = %err, "ignoring surface update");
                return;
            }
        };

        let derives_physical = self.device_ratio_mode != DeviceRatioMode::ObservedByResize;
        if size == self.css_size {
            if derives_physical && size != self.logical_size {
                let density = self.density();
                self.set_pending_physical_size(size.to_physical(density));
            } else {
                self.request_repaint();
            }
            return;
        }

        self.css_size = size;
        self.host.apply_css_size(size);
        if derives_physical {
            let density = self.density();
            self.set_pending_physical_size(size.to_physical(density));
        }
    }

    /// Requests a coalesced repaint without touching geometry.
    pub fn request_repaint(&mut self) {
        if !self.alive {
            return;
        }
        if self.frame.is_some() {
            trace!(id = %self.id, "repaint absorbed by pending frame");
            return;
        }
        self.frame = Some(self.host.schedule_frame());
    }

    /// Host entry point: a frame scheduled by this canvas fired.
    ///
    /// Handles that are not the in-flight frame are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        if self.frame != Some(handle) {
            trace!(handle = handle.raw(), "ignoring stale frame");
            return;
        }
        self.frame = None;
        if !self.alive {
            return;
        }

        self.tick_probe();
        self.context.clear_rect(
            0.0,
            0.0,
            self.logical_size.width,
            self.logical_size.height,
        );
        if self.reconcile_pending {
            self.reconcile();
        }

        let geometry = self.geometry();
        (self.paint)(&mut self.context, &geometry);
    }

    /// Host entry point: the pixel-box observer reported a physical size.
    pub fn on_device_pixel_box(&mut self, width: u32, height: u32) {
        if !self.alive || self.device_ratio_mode != DeviceRatioMode::ObservedByResize {
            return;
        }
        let size = PhysicalSize::new(width, height);
        if size != self.physical_size || self.reconcile_pending {
            self.set_pending_physical_size(size);
        }
    }

    /// Host entry point: the density listener fired.
    ///
    /// Recomputes the physical size and re-arms the listener for the new
    /// density.
    pub fn on_density_changed(&mut self) {
        if !self.alive || self.device_ratio_mode != DeviceRatioMode::ObservedByMediaQuery {
            return;
        }
        let density = self.density();
        debug!(id = %self.id, density, "device density changed");
        self.install_density_listener();
        self.set_pending_physical_size(self.css_size.to_physical(density));
    }

    /// Host entry point: the capability probe settled.
    ///
    /// Later results, and results arriving after [`Canvas::destroy`], are
    /// ignored.
    pub fn resolve_capability_probe(&mut self, supported: bool) {
        if !self.alive {
            debug!(id = %self.id, "probe resolved after destroy; ignoring");
            return;
        }
        if matches!(self.probe, CapabilityProbe::Resolved { .. }) {
            return;
        }
        self.probe = CapabilityProbe::Resolved { supported };

        if supported {
            match self.host.observe_device_pixel_box() {
                Ok(handle) => {
                    debug!(id = %self.id, "observing device pixel box");
                    self.observer = Some(handle);
                    self.device_ratio_mode = DeviceRatioMode::ObservedByResize;
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "pixel box observer failed; falling back to density");
                }
            }
        }

        self.device_ratio_mode = DeviceRatioMode::ObservedByMediaQuery;
        self.install_density_listener();
    }

    /// Releases observers and the in-flight frame. Idempotent.
    pub fn destroy(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        if let Some(frame) = self.frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(observer) = self.observer.take() {
            self.host.remove_observer(observer);
        }
        debug!(id = %self.id, "surface destroyed");
    }

    /// Live drawing context, pre-scaled to logical units.
    ///
    /// Mutation is reserved to the paint callback.
    #[must_use]
    pub fn context(&self) -> &H::Context {
        &self.context
    }

    #[must_use]
    pub fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry {
            logical: self.logical_size,
            physical: self.physical_size,
            horizontal_pixel_ratio: self.pixel_ratio.0,
            vertical_pixel_ratio: self.pixel_ratio.1,
        }
    }

    #[must_use]
    pub fn state(&self) -> SurfaceState {
        SurfaceState {
            logical_size: self.logical_size,
            physical_size: self.physical_size,
            pending_physical_size: self.pending_physical_size,
            device_ratio_mode: self.device_ratio_mode,
            frame: self.frame,
            probe: self.probe,
            observing: self.observer.is_some(),
            alive: self.alive,
        }
    }

    #[must_use]
    pub fn surface_id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn density(&self) -> f64 {
        let density = self.host.current_density();
        if density.is_finite() && density > 0.0 {
            density
        } else {
            warn!(density, "host reported invalid density; using 1.0");
            1.0
        }
    }

    fn set_pending_physical_size(&mut self, size: PhysicalSize) {
        self.pending_physical_size = size;
        self.reconcile_pending = true;
        self.request_repaint();
    }

    fn tick_probe(&mut self) {
        if let CapabilityProbe::Pending { frames_remaining } = self.probe {
            if frames_remaining <= 1 {
                debug!(id = %self.id, "capability probe timed out");
                self.resolve_capability_probe(false);
            } else {
                self.probe = CapabilityProbe::Pending {
                    frames_remaining: frames_remaining - 1,
                };
            }
        }
    }

    fn install_density_listener(&mut self) {
        if let Some(previous) = self.observer.take() {
            self.host.remove_observer(previous);
        }
        let density = self.density();
        match self.host.listen_density_change(density) {
            Ok(handle) => self.observer = Some(handle),
            Err(err) => {
                warn!(error = %err, "density listener unavailable; reconciling on update only");
            }
        }
    }

    fn reconcile(&mut self) {
        self.reconcile_pending = false;
        let density = self.density();
        let logical = self.css_size;
        let physical = self.pending_physical_size;
        let horizontal = axis_pixel_ratio(physical.width, logical.width, density);
        let vertical = axis_pixel_ratio(physical.height, logical.height, density);

        self.logical_size = logical;
        self.physical_size = physical;
        self.pixel_ratio = (horizontal, vertical);
        self.context.resize_buffer(physical);
        self.context.scale(horizontal, vertical);

        debug!(
            id = %self.id,
            logical_width = logical.width,
            logical_height = logical.height,
            physical_width = physical.width,
            physical_height = physical.height,
            horizontal,
            vertical,
            "surface reconciled"
        );
    }
}

impl<H: SurfaceHost> Drop for Canvas<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn axis_pixel_ratio(physical: u32, logical: f64, density: f64) -> f64 {
    if logical > 0.0 {
        f64::from(physical) / logical
    } else {
        density
    }
}
