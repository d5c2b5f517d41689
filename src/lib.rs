//! kline-core: surface, repaint and interaction core for candlestick charts.
//!
//! The crate maps a logical drawing surface onto device pixels, coalesces
//! repaint requests into one frame, routes pointer input through a hit-tested
//! node tree, drives time-boxed animations and broadcasts chart actions.
//! Host platforms plug in through the traits in [`platform`].

pub mod animation;
pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod platform;
pub mod render;
pub mod telemetry;

pub use animation::{Animation, AnimationState};
pub use api::{ActionType, ChartActions, ChartCoreConfig};
pub use error::{ChartError, ChartResult};
pub use interaction::DispatchTree;
pub use render::Canvas;
