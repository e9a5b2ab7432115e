//! Property-based tests (P1-P6) over randomly generated id/reference graphs,
//! including deliberately cyclic ones.

use std::collections::HashSet;

use jwz_thread::{thread, Forest, Message, NodeId};
use proptest::prelude::*;

const IDS: &[&str] = &["a", "b", "c", "d", "e"];
const SUBJECTS: &[&str] = &["Hello", "Re: Hello", "World", "Re: World", "Re[3]: Hello"];

fn arb_messages() -> impl Strategy<Value = Vec<(String, Vec<String>, String)>> {
    proptest::collection::vec(
        (
            proptest::sample::select(IDS).prop_map(String::from),
            proptest::collection::vec(proptest::sample::select(IDS).prop_map(String::from), 0..3),
            proptest::sample::select(SUBJECTS).prop_map(String::from),
        ),
        1..8,
    )
}

fn build(input: &[(String, Vec<String>, String)]) -> Vec<Message<usize>> {
    input.iter()
        .enumerate()
        .map(|(i, (id, refs, subject))| Message::new(id.clone(), refs.clone(), subject.clone(), i).unwrap())
        .collect()
}

/// DFS with an explicit work stack, tracking the current root-to-node path
/// so a back-edge into an ancestor is detected without native recursion.
fn has_cycle<T>(forest: &Forest<T>) -> bool {
    let root = forest.root();
    let mut frames: Vec<(NodeId, usize)> = vec![(root, 0)];
    let mut on_path: HashSet<NodeId> = HashSet::new();
    on_path.insert(root);
    while let Some(&mut (node, ref mut idx)) = frames.last_mut() {
        let children = forest.children(node);
        if *idx < children.len() {
            let c = children[*idx];
            *idx += 1;
            if on_path.contains(&c) {
                return true;
            }
            on_path.insert(c);
            frames.push((c, 0));
        } else {
            on_path.remove(&node);
            frames.pop();
        }
    }
    false
}

fn all_nodes<T>(forest: &Forest<T>) -> Vec<NodeId> {
    forest.walk(forest.root()).collect()
}

proptest! {
    #[test]
    fn p1_every_message_appears_exactly_once(input in arb_messages()) {
        let n = input.len();
        let forest = thread(build(&input), true);
        let payloads: Vec<usize> = forest
            .into_messages()
            .into_iter()
            .map(|m| m.into_payload())
            .collect();
        let mut seen: HashSet<usize> = HashSet::new();
        for p in &payloads {
            prop_assert!(seen.insert(*p), "payload {p} appeared more than once");
        }
        prop_assert_eq!(seen, (0..n).collect::<HashSet<usize>>());
    }

    #[test]
    fn p2_forest_is_acyclic(input in arb_messages()) {
        let forest = thread(build(&input), true);
        prop_assert!(!has_cycle(&forest));
    }

    #[test]
    fn p3_every_non_root_appears_in_its_parents_children(input in arb_messages()) {
        let forest = thread(build(&input), true);
        let root = forest.root();
        for node in all_nodes(&forest) {
            if node == root {
                continue;
            }
            let parent = forest.parent(node).expect("non-root node must have a parent");
            prop_assert!(forest.children(parent).contains(&node));
        }
    }

    #[test]
    fn p4_compaction_leaves_no_empty_childless_non_root(input in arb_messages()) {
        let forest = thread(build(&input), true);
        let root = forest.root();
        for node in all_nodes(&forest) {
            if node == root {
                continue;
            }
            prop_assert!(!(forest.is_empty_node(node) && forest.children(node).is_empty()));
        }
    }

    #[test]
    fn p5_threading_is_deterministic(input in arb_messages()) {
        // A stand-in, at the public-API boundary, for the stricter claim
        // that re-running subject grouping on an already-grouped tree is a
        // no-op (exercised directly in `subject::tests::idempotent_on_second_pass`,
        // which can call the private grouping step twice on the same forest).
        let first = thread(build(&input), true);
        let second = thread(build(&input), true);
        prop_assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }

    #[test]
    fn p6_reference_cycles_never_survive_indexing(input in arb_messages()) {
        // `reachable` is a kernel-internal helper, not part of the public
        // surface; its guarantee is observable here as plain acyclicity of
        // the indexed-and-linked output, regardless of how tangled the
        // input References are.
        let forest = thread(build(&input), false);
        prop_assert!(!has_cycle(&forest));
    }
}
