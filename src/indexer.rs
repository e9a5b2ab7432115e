/*
 * jwz-thread - indexer.
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

//! Builds a `message-id -> Container` mapping and links Containers
//! according to each message's References chain.

use fnv::FnvHashMap;

use crate::container::{add_child, Forest, NodeId};
use crate::diagnostics::DiagnosticSink;
use crate::message::Message;

/// Returns the existing Container for `id`, or allocates a fresh empty one
/// and records its discovery order.
fn lookup_or_create<T>(
    table: &mut FnvHashMap<String, NodeId>,
    forest: &mut Forest<T>,
    order: &mut Vec<NodeId>,
    id: &str,
) -> NodeId {
    if let Some(&existing) = table.get(id) {
        existing
    } else {
        let node = forest.alloc(None);
        table.insert(id.to_string(), node);
        order.push(node);
        node
    }
}

/// Indexes `messages` into `forest`, creating a Container per observed id
/// (whether carrying a message or only known through References) and
/// linking them per the reference chain. Returns the ids' Containers in
/// first-insertion order, which the root collector scans to find roots.
pub(crate) fn index<T>(
    messages: Vec<Message<T>>,
    forest: &mut Forest<T>,
    sink: &mut dyn DiagnosticSink,
) -> Vec<NodeId> {
    let mut table: FnvHashMap<String, NodeId> = FnvHashMap::default();
    let mut order: Vec<NodeId> = Vec::new();
    let mut clash_counter: u64 = 0;

    for mut m in messages {
        let id = m.id().to_string();

        let self_node = match table.get(&id).copied() {
            // A placeholder was created earlier by some other message's
            // References; slot this message's payload into it.
            Some(existing) if forest.message(existing).is_none() => existing,
            // Id clash: the table already holds a *message* under this id.
            // Make `m` a synthetic reply-to-self of the earlier occupant
            // and re-key it under a fresh id.
            Some(_) => {
                clash_counter += 1;
                let mut refs = m.references().to_vec();
                refs.push(id.clone());
                m.set_references(refs);
                let synthetic = format!("\u{0}jwz-clash\u{0}{id}\u{0}{clash_counter}");
                let node = forest.alloc(None);
                table.insert(synthetic, node);
                order.push(node);
                node
            }
            None => lookup_or_create(&mut table, forest, &mut order, &id),
        };

        // Walk References in order, linking a parent chain; the last
        // reference is the definitive, most-specific parent.
        let mut prev: Option<NodeId> = None;
        let references: Vec<String> = m.references().to_vec();
        for r in &references {
            let cr = lookup_or_create(&mut table, forest, &mut order, r);
            if let Some(p) = prev {
                add_child(forest, p, cr, sink);
            }
            prev = Some(cr);
        }
        if let Some(p) = prev {
            add_child(forest, p, self_node, sink);
        }

        forest.set_message(self_node, m);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopSink;

    fn msg(id: &str, refs: &[&str], subject: &str) -> Message<()> {
        Message::new(
            id,
            refs.iter().map(|s| s.to_string()).collect(),
            subject,
            (),
        )
        .unwrap()
    }

    #[test]
    fn simple_chain_links_last_reference_as_parent() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let order = index(
            vec![
                msg("a", &[], "Hi"),
                msg("b", &["a"], "Re: Hi"),
                msg("c", &["a", "b"], "Re: Hi"),
            ],
            &mut forest,
            &mut sink,
        );
        assert_eq!(order.len(), 3);
        let a = order[0];
        let b = order[1];
        let c = order[2];
        assert_eq!(forest.parent(b), Some(a));
        assert_eq!(forest.parent(c), Some(b));
    }

    #[test]
    fn missing_middle_creates_placeholder() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let order = index(
            vec![msg("a", &[], "X"), msg("c", &["a", "b"], "Re: X")],
            &mut forest,
            &mut sink,
        );
        assert_eq!(order.len(), 3);
        // "a" is discovered from the first message; "c" is discovered from
        // the second message's own id (slotted before its References are
        // walked); "b" only shows up once References are walked.
        let a = order[0];
        let c = order[1];
        let b = order[2];
        assert!(forest.message(b).is_none());
        assert_eq!(forest.parent(b), Some(a));
        assert_eq!(forest.parent(c), Some(b));
    }

    #[test]
    fn id_clash_rewrites_references_and_keeps_both() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let order = index(
            vec![msg("x", &[], "First"), msg("x", &[], "Second")],
            &mut forest,
            &mut sink,
        );
        assert_eq!(order.len(), 2);
        let first = order[0];
        let second = order[1];
        assert_eq!(forest.message(first).unwrap().subject(), "First");
        assert_eq!(forest.message(second).unwrap().subject(), "Second");
        assert_eq!(
            forest.message(second).unwrap().references(),
            &["x".to_string()]
        );
        assert_eq!(forest.parent(second), Some(first));
    }

    #[test]
    fn reference_cycle_is_suppressed() {
        let mut forest = Forest::new();
        let mut sink = NoopSink;
        let order = index(
            vec![msg("a", &["b"], "A"), msg("b", &["a"], "B")],
            &mut forest,
            &mut sink,
        );
        assert_eq!(order.len(), 2);
        let a = order[0];
        let b = order[1];
        // a is processed first: it wants b as a parent, but b doesn't exist
        // yet so a placeholder for b is created and a is attached under it.
        assert_eq!(forest.parent(a), Some(b));
        // b is processed second: it wants a as a parent, but a is already an
        // ancestor of b's designated container, so the link is refused.
        assert_eq!(forest.parent(b), None);
    }
}
