/*
 * jwz-thread - message threading engine.
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

//! Reconstructs conversation trees from a flat collection of messages,
//! following the jwz ("Jamie Zawinski") threading algorithm: containerize
//! messages into a node graph keyed by id, link nodes along each message's
//! References chain while refusing cycles, collect the unparented nodes
//! into a root set, optionally prune empty placeholder nodes, and merge
//! root-level subtrees whose subjects coincide once reply markers are
//! stripped.
//!
//! ```
//! use jwz_thread::{thread, Message};
//!
//! let messages = vec![
//!     Message::new("a", vec![], "Hi", ()).unwrap(),
//!     Message::new("b", vec!["a".into()], "Re: Hi", ()).unwrap(),
//! ];
//! let forest = thread(messages, true);
//! assert_eq!(forest.root_set().len(), 1);
//! ```

mod container;
mod diagnostics;
mod error;
mod indexer;
mod message;
mod pruner;
mod subject;

pub use container::{Forest, NodeId};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink, NoopSink};
pub use error::MessageError;
pub use message::Message;
pub use subject::default_normalize;

use container::add_child;

/// Scans the indexer's discovery order for Containers with no parent and
/// attaches them, in that order, under the virtual root.
fn collect_roots<T>(
    forest: &mut container::Forest<T>,
    order: &[NodeId],
    sink: &mut dyn DiagnosticSink,
) {
    let root = forest.root();
    for &id in order {
        if forest.parent(id).is_none() {
            add_child(forest, root, id, sink);
        }
    }
}

/// A threading engine bound to a specific subject normalizer and diagnostic
/// sink. Use this when the normalizer or sink need to be shared with, or
/// configured by, a host application; use [`thread`] for the common case.
pub struct Engine<N, D> {
    normalize: N,
    diagnostics: D,
}

impl<N, D> Engine<N, D>
where
    N: Fn(&str) -> String,
    D: DiagnosticSink,
{
    pub fn new(normalize: N, diagnostics: D) -> Self {
        Engine {
            normalize,
            diagnostics,
        }
    }

    /// Runs the full pipeline: index, collect roots, optionally prune, then
    /// merge root-level subtrees by subject.
    pub fn thread<T>(&mut self, messages: Vec<Message<T>>, compact: bool) -> Forest<T> {
        let mut forest = Forest::new();
        let order = indexer::index(messages, &mut forest, &mut self.diagnostics);
        collect_roots(&mut forest, &order, &mut self.diagnostics);

        if compact {
            pruner::prune(&mut forest, &mut self.diagnostics);
        }

        subject::group(&mut forest, &self.normalize, &mut self.diagnostics);
        forest
    }
}

/// Convenience entry point: threads `messages` using the crate's default
/// subject normalizer ([`default_normalize`]) and a no-op diagnostic sink.
/// Returns a fresh, childless virtual root if `messages` is empty.
pub fn thread<T>(messages: Vec<Message<T>>, compact: bool) -> Forest<T> {
    Engine::new(default_normalize, NoopSink).thread(messages, compact)
}
