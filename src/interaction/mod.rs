mod dispatch;
mod event;

pub use dispatch::{DispatchTree, EventHandler, HitTest, NodeId, TreeEdit, TreeEditor};
pub use event::{Bounds, EventName, PointerEvent};
