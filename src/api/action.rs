use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{trace, warn};

/// Subscriber callback. Identity is the `Rc` allocation, so subscribing a
/// clone of the same `Rc` twice is a no-op.
pub type ActionCallback<T> = Rc<dyn Fn(Option<&T>)>;

/// Chart state changes broadcast to UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    OnZoom,
    OnScroll,
    OnVisibleRangeChange,
    OnTooltipIconClick,
    OnCrosshairChange,
    OnCandleBarClick,
    OnPaneDrag,
}

impl ActionType {
    pub const ALL: [Self; 7] = [
        Self::OnZoom,
        Self::OnScroll,
        Self::OnVisibleRangeChange,
        Self::OnTooltipIconClick,
        Self::OnCrosshairChange,
        Self::OnCandleBarClick,
        Self::OnPaneDrag,
    ];
}

/// Data delivered with each action kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionPayload {
    Zoom {
        scale: f64,
    },
    Scroll {
        distance: f64,
    },
    VisibleRangeChange {
        from: usize,
        to: usize,
        real_from: f64,
        real_to: f64,
    },
    TooltipIconClick {
        pane_id: String,
        indicator_name: String,
        icon_id: String,
    },
    CrosshairChange {
        x: Option<f64>,
        y: Option<f64>,
        pane_id: Option<String>,
        data_index: Option<usize>,
    },
    CandleBarClick {
        data_index: usize,
    },
    PaneDrag {
        pane_id: String,
    },
}

impl ActionPayload {
    #[must_use]
    pub fn kind(&self) -> ActionType {
        match self {
            Self::Zoom { .. } => ActionType::OnZoom,
            Self::Scroll { .. } => ActionType::OnScroll,
            Self::VisibleRangeChange { .. } => ActionType::OnVisibleRangeChange,
            Self::TooltipIconClick { .. } => ActionType::OnTooltipIconClick,
            Self::CrosshairChange { .. } => ActionType::OnCrosshairChange,
            Self::CandleBarClick { .. } => ActionType::OnCandleBarClick,
            Self::PaneDrag { .. } => ActionType::OnPaneDrag,
        }
    }
}

/// Ordered, duplicate-free fan-out of one signal.
///
/// `execute` iterates over a snapshot, so subscribers may subscribe or
/// unsubscribe while being notified. A panicking subscriber unwinds through
/// `execute` and skips the remaining subscribers of that call; the
/// subscription set itself is left intact.
pub struct Action<T> {
    callbacks: RefCell<Vec<ActionCallback<T>>>,
}

impl<T> Default for Action<T> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl<T> Action<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: ActionCallback<T>) {
        let mut callbacks = self.callbacks.borrow_mut();
        if callbacks
            .iter()
            .any(|existing| same_callback(existing, &callback))
        {
            return;
        }
        callbacks.push(callback);
    }

    /// Removes `callback`, or every subscriber when `None`.
    pub fn unsubscribe(&self, callback: Option<&ActionCallback<T>>) {
        let mut callbacks = self.callbacks.borrow_mut();
        match callback {
            Some(callback) => callbacks.retain(|existing| !same_callback(existing, callback)),
            None => callbacks.clear(),
        }
    }

    /// Calls every subscriber in subscription order with the same `data`.
    pub fn execute(&self, data: Option<&T>) {
        let snapshot: SmallVec<[ActionCallback<T>; 4]> =
            self.callbacks.borrow().iter().cloned().collect();
        for callback in snapshot {
            callback(data);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

fn same_callback<T>(left: &ActionCallback<T>, right: &ActionCallback<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
}

/// One [`Action`] bus per [`ActionType`], created on first subscription and
/// dropped once its last subscriber leaves.
#[derive(Debug, Default)]
pub struct ChartActions {
    actions: IndexMap<ActionType, Action<ActionPayload>>,
}

impl ChartActions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: ActionType, callback: ActionCallback<ActionPayload>) {
        self.actions.entry(kind).or_default().subscribe(callback);
        trace!(?kind, "subscribe action");
    }

    /// Removes one subscriber of `kind`, or all of them when `callback` is `None`.
    pub fn unsubscribe(
        &mut self,
        kind: ActionType,
        callback: Option<&ActionCallback<ActionPayload>>,
    ) {
        let Some(action) = self.actions.get(&kind) else {
            return;
        };
        action.unsubscribe(callback);
        if action.is_empty() {
            self.actions.shift_remove(&kind);
        }
    }

    pub fn execute(&self, kind: ActionType, data: Option<&ActionPayload>) {
        if let Some(payload) = data {
            if payload.kind() != kind {
                warn!(
                    ?kind,
                    payload_kind = ?payload.kind(),
                    "dropping action with mismatched payload"
                );
                return;
            }
        }
        if let Some(action) = self.actions.get(&kind) {
            action.execute(data);
        }
    }

    #[must_use]
    pub fn has_subscribers(&self, kind: ActionType) -> bool {
        self.actions
            .get(&kind)
            .is_some_and(|action| !action.is_empty())
    }

    #[must_use]
    pub fn action(&self, kind: ActionType) -> Option<&Action<ActionPayload>> {
        self.actions.get(&kind)
    }
}
