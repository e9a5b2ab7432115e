/*
 * jwz-thread - container / tree mutation kernel.
 *
 * Copyright 2021-2024 jwz-thread contributors
 *
 * This file is part of jwz-thread.
 *
 * jwz-thread is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * jwz-thread is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with jwz-thread. If not, see <http://www.gnu.org/licenses/>.
 */

//! The tree itself: an arena of [`Node`]s addressed by [`NodeId`], plus the
//! small mutation kernel (`add_child`, `remove_child`, `splice_child`,
//! `reachable`) every later stage (indexer, pruner, subject grouper) is
//! built on.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::message::Message;

/// Index of a node inside a [`Forest`]'s arena. `0` is always the virtual
/// root (see [`Forest::root`]).
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) message: Option<Message<T>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl<T> Node<T> {
    fn empty() -> Self {
        Node {
            message: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The forest of conversation trees produced by [`crate::thread`], rooted
/// under a synthetic virtual root that owns every discovered root thread as
/// a child.
#[derive(Debug, Clone)]
pub struct Forest<T> {
    pub(crate) nodes: Vec<Node<T>>,
}

impl<T> Forest<T> {
    pub(crate) fn new() -> Self {
        Forest {
            nodes: vec![Node::empty()],
        }
    }

    /// The virtual root. Always `0`; never carries a message and never
    /// appears as anyone's child.
    pub fn root(&self) -> NodeId {
        0
    }

    pub(crate) fn alloc(&mut self, message: Option<Message<T>>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            message,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn message(&self, id: NodeId) -> Option<&Message<T>> {
        self.nodes[id].message.as_ref()
    }

    pub(crate) fn set_message(&mut self, id: NodeId, message: Message<T>) {
        self.nodes[id].message = Some(message);
    }

    pub fn is_empty_node(&self, id: NodeId) -> bool {
        self.nodes[id].message.is_none()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn root_set(&self) -> &[NodeId] {
        self.children(self.root())
    }

    /// Pre-order walk of every node reachable from `id` (`id` included).
    /// Iterative: safe on arbitrarily deep trees.
    pub fn walk(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            for &child in self.nodes[node].children.iter().rev() {
                stack.push(child);
            }
            Some(node)
        })
    }

    /// Consumes the forest, returning every message payload that survived
    /// threading, in pre-order.
    pub fn into_messages(mut self) -> Vec<Message<T>> {
        let order: Vec<NodeId> = self.walk(self.root()).collect();
        order
            .into_iter()
            .filter_map(|id| self.nodes[id].message.take())
            .collect()
    }

    /// Detach `child` from its current parent's children list, if any.
    /// Leaves `child.parent` as it was; callers set it themselves right
    /// after (see [`add_child`], [`splice_child`]).
    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child].parent {
            self.nodes[parent].children.retain(|&c| c != child);
        }
    }
}

/// True iff `a == b` or `a` is reachable from `b` by descending `children`.
/// Iterative (explicit stack), so it is safe to call on deep trees.
pub(crate) fn reachable<T>(forest: &Forest<T>, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return true;
    }
    let mut stack = vec![b];
    let mut seen = std::collections::HashSet::new();
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        for &c in &forest.nodes[n].children {
            if c == a {
                return true;
            }
            stack.push(c);
        }
    }
    false
}

/// Appends `child` to `parent`'s children list, detaching it from its
/// current parent first. Refuses (and reports via `sink`) an attachment
/// that would make `parent` reachable from `child`, i.e. would turn the
/// attachment into a cycle.
pub(crate) fn add_child<T>(
    forest: &mut Forest<T>,
    parent: NodeId,
    child: NodeId,
    sink: &mut dyn DiagnosticSink,
) {
    if parent == child || reachable(forest, parent, child) {
        sink.report(Diagnostic::CircularReference { parent, child });
        return;
    }
    forest.detach(child);
    forest.nodes[parent].children.push(child);
    forest.nodes[child].parent = Some(parent);
}

/// Unlinks `child` from its parent's children list and clears its parent.
/// No-op if `child` has no parent.
pub(crate) fn remove_child<T>(forest: &mut Forest<T>, child: NodeId) {
    forest.detach(child);
    forest.nodes[child].parent = None;
}

/// Replaces `old_child` in its parent's children list with `new_children`,
/// preserving position. `old_child` ends parentless; every node in
/// `new_children` is reparented to `old_child`'s former parent.
pub(crate) fn splice_child<T>(forest: &mut Forest<T>, old_child: NodeId, new_children: &[NodeId]) {
    let Some(parent) = forest.nodes[old_child].parent else {
        return;
    };
    let idx = forest.nodes[parent]
        .children
        .iter()
        .position(|&c| c == old_child)
        .expect("old_child must be a child of its recorded parent");
    for &nc in new_children {
        forest.detach(nc);
    }
    forest.nodes[parent]
        .children
        .splice(idx..=idx, new_children.iter().copied());
    for &nc in new_children {
        forest.nodes[nc].parent = Some(parent);
    }
    forest.nodes[old_child].parent = None;
}
