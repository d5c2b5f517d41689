use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::error::{ChartError, ChartResult};

use super::EventName;

/// Consumes an event; returns `true` when it was handled.
pub type EventHandler<E, X> = Box<dyn FnMut(&E, Option<&X>) -> bool>;

/// Geometric or logical hit test for one node.
pub type HitTest<E> = Box<dyn Fn(&E) -> bool>;

/// Generational index of a node in a [`DispatchTree`].
///
/// IDs of cleared nodes go stale and are rejected afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Structural edit queued through a [`TreeEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEdit {
    AddChild { parent: NodeId, child: NodeId },
    Clear { node: NodeId },
}

/// Queues structural edits from inside event handlers.
///
/// Edits are applied once the outermost [`DispatchTree::dispatch_event`]
/// returns, so a dispatch pass never observes a child list changing under it.
#[derive(Debug, Clone, Default)]
pub struct TreeEditor {
    queue: Rc<RefCell<Vec<TreeEdit>>>,
}

impl TreeEditor {
    pub fn add_child(&self, parent: NodeId, child: NodeId) {
        self.queue
            .borrow_mut()
            .push(TreeEdit::AddChild { parent, child });
    }

    pub fn clear(&self, node: NodeId) {
        self.queue.borrow_mut().push(TreeEdit::Clear { node });
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

struct DispatchNode<E, X> {
    callbacks: IndexMap<EventName, EventHandler<E, X>>,
    children: SmallVec<[NodeId; 4]>,
    parent: Option<NodeId>,
    hit_test: Option<HitTest<E>>,
}

impl<E, X> DispatchNode<E, X> {
    fn new(hit_test: Option<HitTest<E>>) -> Self {
        Self {
            callbacks: IndexMap::new(),
            children: SmallVec::new(),
            parent: None,
            hit_test,
        }
    }
}

struct Slot<E, X> {
    generation: u32,
    node: Option<DispatchNode<E, X>>,
}

/// Arena-backed tree of interactive elements.
///
/// Children are kept in insertion order, which is also z-order: the last
/// added child is topmost. Dispatch visits children topmost first, stops at
/// the first child that handles the event, and only then offers the event to
/// the node's own handler, gated by [`DispatchTree::check_event_on`].
pub struct DispatchTree<E, X = ()> {
    slots: Vec<Slot<E, X>>,
    free: Vec<u32>,
    editor: TreeEditor,
}

impl<E, X> Default for DispatchTree<E, X> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            editor: TreeEditor::default(),
        }
    }
}

impl<E, X> fmt::Debug for DispatchTree<E, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTree")
            .field("nodes", &self.len())
            .field("pending_edits", &self.editor.pending())
            .finish()
    }
}

impl<E, X> DispatchTree<E, X> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self) -> NodeId {
        self.insert(DispatchNode::new(None))
    }

    pub fn create_node_with_hit_test<F>(&mut self, hit_test: F) -> NodeId
    where
        F: Fn(&E) -> bool + 'static,
    {
        let hit_test: HitTest<E> = Box::new(hit_test);
        self.insert(DispatchNode::new(Some(hit_test)))
    }

    /// Replaces the node's hit test; `None` restores the default behavior.
    pub fn set_hit_test(&mut self, node: NodeId, hit_test: Option<HitTest<E>>) -> ChartResult<()> {
        self.node_mut(node)?.hit_test = hit_test;
        Ok(())
    }

    /// Binds `handler` to `name` on `node`. A later registration for the same
    /// name replaces the earlier one.
    pub fn register_event<F>(&mut self, node: NodeId, name: EventName, handler: F) -> ChartResult<()>
    where
        F: FnMut(&E, Option<&X>) -> bool + 'static,
    {
        let handler: EventHandler<E, X> = Box::new(handler);
        self.node_mut(node)?.callbacks.insert(name, handler);
        Ok(())
    }

    /// Appends `child` on top of `parent`'s children. The parent takes
    /// ownership: a child can only have one parent and cycles are rejected.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()> {
        if parent == child {
            return Err(ChartError::InvalidTree(
                "node cannot be its own child".to_owned(),
            ));
        }
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(ChartError::InvalidTree(
                "child is already attached to a parent".to_owned(),
            ));
        }
        if self.is_ancestor(child, parent) {
            return Err(ChartError::InvalidTree(
                "attaching child would create a cycle".to_owned(),
            ));
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Drops every child subtree of `node`. Handlers on `node` are kept.
    pub fn clear(&mut self, node: NodeId) -> ChartResult<()> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            self.release_subtree(child);
        }
        Ok(())
    }

    /// Whether `event` falls on `node`.
    ///
    /// Uses the node's own hit test when set; otherwise a node with children
    /// is hit iff any child is, and a leaf is always hit. Unknown nodes are
    /// never hit.
    #[must_use]
    pub fn check_event_on(&self, node: NodeId, event: &E) -> bool {
        let Ok(entry) = self.node(node) else {
            return false;
        };
        if let Some(hit_test) = &entry.hit_test {
            return hit_test(event);
        }
        if entry.children.is_empty() {
            return true;
        }
        entry
            .children
            .iter()
            .any(|child| self.check_event_on(*child, event))
    }

    /// Routes `event` from `root` down the tree; returns whether any handler
    /// consumed it.
    ///
    /// Edits queued through [`DispatchTree::editor`] during the pass are
    /// applied before returning.
    pub fn dispatch_event(
        &mut self,
        root: NodeId,
        name: EventName,
        event: &E,
        extra: Option<&X>,
    ) -> bool {
        let handled = self.dispatch_node(root, name, event, extra);
        if !handled {
            trace!(?name, "event not handled");
        }
        self.apply_deferred_edits();
        handled
    }

    /// Handle for queueing edits from inside event handlers.
    #[must_use]
    pub fn editor(&self) -> TreeEditor {
        self.editor.clone()
    }

    /// Applies queued edits in order and returns how many succeeded.
    /// Invalid edits are logged and skipped.
    pub fn apply_deferred_edits(&mut self) -> usize {
        let edits = std::mem::take(&mut *self.editor.queue.borrow_mut());
        let mut applied = 0;
        for edit in edits {
            let result = match edit {
                TreeEdit::AddChild { parent, child } => self.add_child(parent, child),
                TreeEdit::Clear { node } => self.clear(node),
            };
            match result {
                Ok(()) => applied += 1,
                Err(err) => warn!(error = %err, ?edit, "skipping deferred tree edit"),
            }
        }
        applied
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> Option<&[NodeId]> {
        self.node(node).ok().map(|entry| entry.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|entry| entry.parent)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dispatch_node(&mut self, node: NodeId, name: EventName, event: &E, extra: Option<&X>) -> bool {
        let Ok(entry) = self.node(node) else {
            return false;
        };
        let children = entry.children.clone();
        for child in children.iter().rev() {
            if self.dispatch_node(*child, name, event, extra) {
                return true;
            }
        }
        self.on_event(node, name, event, extra)
    }

    fn on_event(&mut self, node: NodeId, name: EventName, event: &E, extra: Option<&X>) -> bool {
        let has_handler = self
            .node(node)
            .is_ok_and(|entry| entry.callbacks.contains_key(&name));
        if !has_handler || !self.check_event_on(node, event) {
            return false;
        }
        match self
            .node_mut(node)
            .ok()
            .and_then(|entry| entry.callbacks.get_mut(&name))
        {
            Some(handler) => handler(event, extra),
            None => false,
        }
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            if ancestor == candidate {
                return true;
            }
            current = self.parent(ancestor);
        }
        false
    }

    fn insert(&mut self, node: DispatchNode<E, X>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn release_subtree(&mut self, node: NodeId) {
        let Some(slot) = self.slots.get_mut(node.index as usize) else {
            return;
        };
        if slot.generation != node.generation {
            return;
        }
        let Some(entry) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        for child in entry.children {
            self.release_subtree(child);
        }
    }

    fn node(&self, node: NodeId) -> ChartResult<&DispatchNode<E, X>> {
        self.slots
            .get(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| unknown_node(node))
    }

    fn node_mut(&mut self, node: NodeId) -> ChartResult<&mut DispatchNode<E, X>> {
        self.slots
            .get_mut(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| unknown_node(node))
    }
}

fn unknown_node(node: NodeId) -> ChartError {
    ChartError::InvalidTree(format!(
        "unknown node {}#{}",
        node.index, node.generation
    ))
}
