/*
 * jwz-thread - pruner.
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

//! Removes empty placeholder Containers that add no structure.
//!
//! Rule B's "don't promote many placeholders to the root set" exception
//! only ever fires when the node under examination is a *direct* child of
//! the virtual root: one level further down, the node being examined always
//! has a non-root parent, so the exception's first disjunct is always
//! satisfied and promotion always happens. That collapses the traversal
//! into two passes: normalize everything strictly below the top level
//! (where promotion is unconditional), then apply the root's own
//! exception-aware rule to the now-settled top level. Both passes walk the
//! tree with an explicit stack, never native recursion, so pruning is safe
//! on arbitrarily deep input.

/// Depth past which we refuse to even attempt an iterative walk and report
/// resource exhaustion instead of risking pathological memory use. Iterative
/// traversal means we can never overflow the call stack the way a
/// recursive implementation could; this is a last-resort guard only.
const MAX_DEPTH_GUARD: usize = 1 << 24;

use crate::container::{remove_child, splice_child, Forest, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticSink};

pub(crate) fn prune<T>(forest: &mut Forest<T>, sink: &mut dyn DiagnosticSink) {
    let root = forest.root();
    if max_depth(forest, root) > MAX_DEPTH_GUARD {
        sink.report(Diagnostic::ResourceExhausted);
        return;
    }

    let top_level: Vec<NodeId> = forest.children(root).to_vec();
    for r in top_level {
        normalize_subtree(forest, r);
    }
    prune_level(forest, root, true);
}

fn max_depth<T>(forest: &Forest<T>, root: NodeId) -> usize {
    let mut stack = vec![(root, 0usize)];
    let mut deepest = 0;
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        if deepest > MAX_DEPTH_GUARD {
            return deepest;
        }
        for &c in forest.children(node) {
            stack.push((c, depth + 1));
        }
    }
    deepest
}

/// Normalizes every descendant of `start` (not `start`'s own position in
/// its parent's list — the caller handles that). Post-order: a node's
/// children are all settled before the node's own child-list is examined.
fn normalize_subtree<T>(forest: &mut Forest<T>, start: NodeId) {
    let mut stack = vec![start];
    let mut post_order = Vec::new();
    while let Some(n) = stack.pop() {
        post_order.push(n);
        for &c in forest.children(n) {
            stack.push(c);
        }
    }
    for n in post_order.into_iter().rev() {
        prune_level(forest, n, false);
    }
}

/// Applies Rule A/B to `parent`'s current children list in one left-to-right
/// scan, re-reading the list after every mutation (splice/remove change it
/// in place, so the next element to examine may now sit at the same index).
fn prune_level<T>(forest: &mut Forest<T>, parent: NodeId, root_exception: bool) {
    let mut i = 0;
    loop {
        let children = forest.children(parent).to_vec();
        if i >= children.len() {
            break;
        }
        let child = children[i];
        if forest.is_empty_node(child) {
            let grandchildren = forest.children(child).to_vec();
            if grandchildren.is_empty() {
                // Rule A
                remove_child(forest, child);
                continue;
            } else if !root_exception || grandchildren.len() == 1 {
                // Rule B
                splice_child(forest, child, &grandchildren);
                continue;
            }
        }
        i += 1;
    }
}
