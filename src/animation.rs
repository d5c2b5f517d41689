//! Time-boxed, frame-driven animation with iteration control.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::api::{AnimationConfig, validate_duration_ms, validate_iteration_count};
use crate::error::ChartResult;
use crate::platform::{Clock, FrameHandle, FrameScheduler};

/// Receives the elapsed milliseconds of the current iteration.
pub type FrameCallback = Box<dyn FnMut(f64)>;

/// Public animation runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub duration_ms: f64,
    pub iteration_count: u32,
    pub current_iteration: u32,
    pub running: bool,
    pub start_ms: f64,
}

/// Frame-driven animation driver.
///
/// While running, every fired frame reports the elapsed time of the current
/// iteration to the frame callback. Once the elapsed time reaches the
/// duration, the callback receives exactly `duration_ms` one last time and the
/// next iteration starts if any remain.
///
/// Duration and iteration count changes are staged and take effect at the next
/// iteration boundary.
pub struct Animation {
    configured: AnimationConfig,
    active: AnimationConfig,
    current_iteration: u32,
    running: bool,
    start_ms: f64,
    frame: Option<FrameHandle>,
    frame_callback: Option<FrameCallback>,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("configured", &self.configured)
            .field("state", &self.state())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::from_valid_config(AnimationConfig::default())
    }
}

impl Animation {
    pub fn new(config: AnimationConfig) -> ChartResult<Self> {
        Ok(Self::from_valid_config(config.validate()?))
    }

    fn from_valid_config(config: AnimationConfig) -> Self {
        Self {
            configured: config,
            active: config,
            current_iteration: 0,
            running: false,
            start_ms: 0.0,
            frame: None,
            frame_callback: None,
        }
    }

    /// Installs the per-frame callback, replacing any previous one.
    pub fn do_frame<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(f64) + 'static,
    {
        let callback: FrameCallback = Box::new(callback);
        self.frame_callback = Some(callback);
        self
    }

    pub fn set_duration(&mut self, duration_ms: f64) -> ChartResult<&mut Self> {
        validate_duration_ms(duration_ms)?;
        self.configured.duration_ms = duration_ms;
        Ok(self)
    }

    pub fn set_iteration_count(&mut self, iteration_count: u32) -> ChartResult<&mut Self> {
        validate_iteration_count(iteration_count)?;
        self.configured.iteration_count = iteration_count;
        Ok(self)
    }

    /// Starts from the first iteration. No-op while running.
    pub fn start<H>(&mut self, host: &mut H)
    where
        H: FrameScheduler + Clock,
    {
        if self.running {
            trace!("animation already running");
            return;
        }
        self.current_iteration = 0;
        self.begin_iteration(host);
    }

    /// Cancels the in-flight frame and reports the terminal elapsed time.
    ///
    /// No-op while idle.
    pub fn stop<H>(&mut self, host: &mut H)
    where
        H: FrameScheduler,
    {
        if !self.running {
            return;
        }
        if let Some(frame) = self.frame.take() {
            host.cancel_frame(frame);
        }
        self.emit(self.active.duration_ms);
        self.running = false;
    }

    /// Host entry point: a frame scheduled by this animation fired.
    pub fn on_frame<H>(&mut self, handle: FrameHandle, host: &mut H)
    where
        H: FrameScheduler + Clock,
    {
        if self.frame != Some(handle) {
            trace!(handle = handle.raw(), "ignoring stale animation frame");
            return;
        }
        self.frame = None;
        if !self.running {
            return;
        }

        let elapsed = (host.now_ms() - self.start_ms).max(0.0);
        if elapsed < self.active.duration_ms {
            self.emit(elapsed);
            self.frame = Some(host.schedule_frame());
            return;
        }

        self.stop(host);
        self.current_iteration += 1;
        if self.current_iteration < self.configured.iteration_count {
            debug!(
                iteration = self.current_iteration,
                of = self.configured.iteration_count,
                "animation iteration restart"
            );
            self.begin_iteration(host);
        } else {
            debug!(iterations = self.current_iteration, "animation finished");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn state(&self) -> AnimationState {
        AnimationState {
            duration_ms: self.active.duration_ms,
            iteration_count: self.active.iteration_count,
            current_iteration: self.current_iteration,
            running: self.running,
            start_ms: self.start_ms,
        }
    }

    fn begin_iteration<H>(&mut self, host: &mut H)
    where
        H: FrameScheduler + Clock,
    {
        self.active = self.configured;
        self.start_ms = host.now_ms();
        self.running = true;
        self.frame = Some(host.schedule_frame());
    }

    fn emit(&mut self, elapsed_ms: f64) {
        if let Some(callback) = self.frame_callback.as_mut() {
            callback(elapsed_ms);
        }
    }
}
