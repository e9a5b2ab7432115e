/*
 * jwz-thread - subject grouper.
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

//! Merges root-level subtrees whose normalized subjects coincide.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::container::{add_child, remove_child, splice_child, Forest, NodeId};
use crate::diagnostics::DiagnosticSink;

/// Default subject normalizer: strips a run of leading reply markers
/// ("Re:", "RE[4]:", "Aw:", "Fwd:", ...). Callers with locale-aware or
/// mailing-list-aware stripping can supply their own via [`crate::Engine`].
pub fn default_normalize(s: &str) -> String {
    fn reply_prefix() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"(?i)^\s*(re(\[\d+\])?|aw|fwd?|sv)\s*:\s*").expect("invalid reply prefix regex")
        })
    }
    let re = reply_prefix();
    let mut current = s.trim().to_string();
    loop {
        let replaced = re.replace(&current, "").into_owned();
        if replaced == current {
            return current;
        }
        current = replaced;
    }
}

fn is_reply<T>(forest: &Forest<T>, id: NodeId, normalize: &dyn Fn(&str) -> String) -> bool {
    let raw = extract_subject(forest, id);
    normalize(raw).len() < raw.trim().len()
}

/// Finds a subject to represent root `r`: its own message's subject if it
/// has one, otherwise the first subject found by scanning `r`'s immediate
/// children, and failing that by recursing fully into each child in turn
/// (left to right) before trying the next. Implemented with an explicit
/// work stack so arbitrarily deep trees never recurse natively.
fn extract_subject<'a, T>(forest: &'a Forest<T>, root: NodeId) -> &'a str {
    enum Step {
        Enter,
        AfterChild(usize),
    }
    struct Frame {
        node: NodeId,
        step: Step,
    }

    let mut stack = vec![Frame {
        node: root,
        step: Step::Enter,
    }];
    let mut result: &'a str = "";

    loop {
        let Some(frame) = stack.last_mut() else {
            return result;
        };
        match frame.step {
            Step::Enter => {
                if let Some(m) = forest.message(frame.node) {
                    result = m.subject();
                    stack.pop();
                    continue;
                }
                let mut found = "";
                for &c in forest.children(frame.node) {
                    if let Some(m) = forest.message(c) {
                        found = m.subject();
                        break;
                    }
                }
                if !found.is_empty() {
                    result = found;
                    stack.pop();
                    continue;
                }
                frame.step = Step::AfterChild(0);
            }
            Step::AfterChild(idx) => {
                if idx > 0 && !result.is_empty() {
                    stack.pop();
                    continue;
                }
                let children = forest.children(frame.node);
                if idx >= children.len() {
                    result = "";
                    stack.pop();
                    continue;
                }
                let child = children[idx];
                frame.step = Step::AfterChild(idx + 1);
                stack.push(Frame {
                    node: child,
                    step: Step::Enter,
                });
            }
        }
    }
}

/// Applies the two-phase subject merge to the children of the virtual root.
pub(crate) fn group<T>(
    forest: &mut Forest<T>,
    normalize: &dyn Fn(&str) -> String,
    sink: &mut dyn DiagnosticSink,
) {
    let root = forest.root();
    let roots: Vec<NodeId> = forest.children(root).to_vec();

    // Phase 1: populate the subject table with a canonical representative
    // per normalized subject.
    let mut table: HashMap<String, NodeId> = HashMap::new();
    for &r in &roots {
        let raw = extract_subject(forest, r).to_string();
        let s = normalize(&raw);
        if s.is_empty() {
            continue;
        }
        match table.get(&s).copied() {
            None => {
                table.insert(s, r);
            }
            Some(t) => {
                let t_empty = forest.is_empty_node(t);
                let r_empty = forest.is_empty_node(r);
                let t_raw = extract_subject(forest, t).to_string();
                if r_empty && !t_empty {
                    table.insert(s, r);
                } else if t_raw.len() > s.len() && raw == s {
                    table.insert(s, r);
                }
            }
        }
    }

    // Phase 2: merge. Iterate the root set captured before any phase-2
    // mutation; a root that has since been reparented out of the root set
    // (by an earlier pair's merge) is skipped when we reach it, which is
    // the `Vec`-based equivalent of "skip past t if the saved next sibling
    // was t".
    for &r in &roots {
        if forest.parent(r) != Some(root) {
            continue;
        }
        let raw = extract_subject(forest, r).to_string();
        let s = normalize(&raw);
        if s.is_empty() {
            continue;
        }
        let Some(t) = table.get(&s).copied() else {
            continue;
        };
        if t == r || forest.parent(t) != Some(root) {
            continue;
        }
        merge_pair(forest, &mut table, s, r, t, normalize, sink);
    }
}

fn merge_pair<T>(
    forest: &mut Forest<T>,
    table: &mut HashMap<String, NodeId>,
    key: String,
    r: NodeId,
    t: NodeId,
    normalize: &dyn Fn(&str) -> String,
    sink: &mut dyn DiagnosticSink,
) {
    let r_empty = forest.is_empty_node(r);
    let t_empty = forest.is_empty_node(t);

    match (t_empty, r_empty) {
        (true, true) => {
            // Both empty: fold t's children into r, then drop t.
            let t_children = forest.children(t).to_vec();
            for c in t_children {
                add_child(forest, r, c, sink);
            }
            remove_child(forest, t);
            table.insert(key, r);
        }
        (true, false) => {
            // t empty, r non-empty: r becomes t's child. t (the empty one)
            // stays the root-set representative.
            add_child(forest, t, r, sink);
            table.insert(key, t);
        }
        (false, true) => {
            // r empty, t non-empty: t becomes r's child. r (the empty one,
            // now newly the one left in the root set) becomes the
            // representative.
            add_child(forest, r, t, sink);
            table.insert(key, r);
        }
        (false, false) => {
            let t_reply = is_reply(forest, t, normalize);
            let r_reply = is_reply(forest, r, normalize);
            if !t_reply && r_reply {
                // t is the original, r is a reply to it.
                add_child(forest, t, r, sink);
            } else if t_reply && !r_reply {
                // r is the original, t is a reply to it.
                add_child(forest, r, t, sink);
                table.insert(key, r);
            } else {
                // Both replies, or both originals: group under a fresh
                // empty parent.
                let p = forest.alloc(None);
                splice_child(forest, t, &[p]);
                add_child(forest, p, t, sink);
                add_child(forest, p, r, sink);
                table.insert(key, p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopSink;
    use crate::message::Message;

    fn leaf(forest: &mut Forest<()>, subject: &str) -> NodeId {
        forest.alloc(Some(Message::new("id", vec![], subject, ()).unwrap()))
    }

    #[test]
    fn normalize_strips_nested_reply_markers() {
        assert_eq!(default_normalize("Re: Re[4]: Hello"), "Hello");
        assert_eq!(default_normalize("  Re:   Hello  "), "Hello");
        assert_eq!(default_normalize("Hello"), "Hello");
    }

    #[test]
    fn non_reply_wins_table_slot_reply_becomes_child() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let root = forest.root();
        let a = leaf(&mut forest, "Hello");
        let b = leaf(&mut forest, "Re: Hello");
        add_child(&mut forest, root, a, &mut sink);
        add_child(&mut forest, root, b, &mut sink);
        group(&mut forest, &default_normalize, &mut sink);
        assert_eq!(forest.children(root), &[a]);
        assert_eq!(forest.children(a), &[b]);
    }

    #[test]
    fn both_replies_group_under_fresh_empty_parent() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let root = forest.root();
        let a = leaf(&mut forest, "Re: Hello");
        let b = leaf(&mut forest, "Re: Hello");
        add_child(&mut forest, root, a, &mut sink);
        add_child(&mut forest, root, b, &mut sink);
        group(&mut forest, &default_normalize, &mut sink);
        assert_eq!(forest.children(root).len(), 1);
        let p = forest.children(root)[0];
        assert!(forest.is_empty_node(p));
        assert_eq!(forest.children(p), &[a, b]);
    }

    #[test]
    fn idempotent_on_second_pass() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let root = forest.root();
        let a = leaf(&mut forest, "Hello");
        let b = leaf(&mut forest, "Re: Hello");
        add_child(&mut forest, root, a, &mut sink);
        add_child(&mut forest, root, b, &mut sink);
        group(&mut forest, &default_normalize, &mut sink);
        let before = format!("{:?}", forest.children(root));
        group(&mut forest, &default_normalize, &mut sink);
        let after = format!("{:?}", forest.children(root));
        assert_eq!(before, after);
    }
}
