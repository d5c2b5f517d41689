mod action;
mod config;
mod merge;

pub use action::{Action, ActionCallback, ActionPayload, ActionType, ChartActions};
pub use config::{
    AnimationConfig, ChartCoreConfig, DEFAULT_ANIMATION_DURATION_MS,
    DEFAULT_ANIMATION_ITERATION_COUNT, DEFAULT_PROBE_FRAME_BUDGET, SurfaceConfig,
    SurfacePosition, SurfaceStyle,
};
pub use merge::merge_json;

pub(crate) use config::{validate_duration_ms, validate_iteration_count};
