use indexmap::IndexMap;
use tracing::trace;

use crate::core::LogicalSize;
use crate::error::{ChartError, ChartResult};
use crate::render::NullContext;

use super::{Clock, FrameHandle, FrameScheduler, ObserverHandle, SurfaceDescriptor, SurfaceHost};

/// Kind of observer installed on a [`HeadlessHost`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObserverKind {
    DevicePixelBox,
    Density(f64),
}

/// Deterministic host for headless usage and tests.
///
/// Frames never fire on their own: callers drain them with
/// [`HeadlessHost::take_scheduled_frames`] and deliver each handle to the
/// component that requested it. Time only moves through [`HeadlessHost::advance`].
#[derive(Debug)]
pub struct HeadlessHost {
    density: f64,
    now_ms: f64,
    next_handle: u64,
    scheduled: Vec<FrameHandle>,
    observers: IndexMap<ObserverHandle, ObserverKind>,
    css_size: Option<LogicalSize>,
    surface_ids: Vec<String>,
    probe_started: bool,
    fail_probe: bool,
    fail_observers: bool,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl HeadlessHost {
    #[must_use]
    pub fn new(density: f64) -> Self {
        Self {
            density,
            now_ms: 0.0,
            next_handle: 1,
            scheduled: Vec::new(),
            observers: IndexMap::new(),
            css_size: None,
            surface_ids: Vec::new(),
            probe_started: false,
            fail_probe: false,
            fail_observers: false,
        }
    }

    /// Makes `begin_capability_probe` fail.
    #[must_use]
    pub fn with_probe_failure(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// Makes every observer installation fail.
    #[must_use]
    pub fn with_observer_failure(mut self) -> Self {
        self.fail_observers = true;
        self
    }

    pub fn set_density(&mut self, density: f64) {
        self.density = density;
    }

    pub fn advance(&mut self, delta_ms: f64) {
        self.now_ms += delta_ms;
    }

    /// Drains scheduled frames in request order.
    pub fn take_scheduled_frames(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.scheduled)
    }

    #[must_use]
    pub fn scheduled_frame_count(&self) -> usize {
        self.scheduled.len()
    }

    #[must_use]
    pub fn observers(&self) -> Vec<ObserverKind> {
        self.observers.values().copied().collect()
    }

    #[must_use]
    pub fn css_size(&self) -> Option<LogicalSize> {
        self.css_size
    }

    #[must_use]
    pub fn surface_ids(&self) -> &[String] {
        &self.surface_ids
    }

    #[must_use]
    pub fn probe_started(&self) -> bool {
        self.probe_started
    }

    fn next_raw_handle(&mut self) -> u64 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    fn install_observer(&mut self, kind: ObserverKind) -> ChartResult<ObserverHandle> {
        if self.fail_observers {
            return Err(ChartError::Platform(
                "headless host rejects observers".to_owned(),
            ));
        }
        let handle = ObserverHandle::new(self.next_raw_handle());
        self.observers.insert(handle, kind);
        Ok(handle)
    }
}

impl FrameScheduler for HeadlessHost {
    fn schedule_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle::new(self.next_raw_handle());
        trace!(handle = handle.raw(), "schedule headless frame");
        self.scheduled.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.scheduled.retain(|scheduled| *scheduled != handle);
    }
}

impl Clock for HeadlessHost {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

impl SurfaceHost for HeadlessHost {
    type Context = NullContext;

    fn create_surface(&mut self, descriptor: &SurfaceDescriptor) -> ChartResult<Self::Context> {
        self.surface_ids.push(descriptor.id.clone());
        Ok(NullContext::default())
    }

    fn apply_css_size(&mut self, size: LogicalSize) {
        self.css_size = Some(size);
    }

    fn current_density(&self) -> f64 {
        self.density
    }

    fn begin_capability_probe(&mut self) -> ChartResult<()> {
        if self.fail_probe {
            return Err(ChartError::Platform(
                "device pixel box probing is unavailable".to_owned(),
            ));
        }
        self.probe_started = true;
        Ok(())
    }

    fn observe_device_pixel_box(&mut self) -> ChartResult<ObserverHandle> {
        self.install_observer(ObserverKind::DevicePixelBox)
    }

    fn listen_density_change(&mut self, density: f64) -> ChartResult<ObserverHandle> {
        self.install_observer(ObserverKind::Density(density))
    }

    fn remove_observer(&mut self, handle: ObserverHandle) {
        self.observers.shift_remove(&handle);
    }
}
