/*
 * jwz-thread - diagnostics module.
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

use crate::container::NodeId;

/// Informational events the engine may report. These never change the
/// output tree; a caller that ignores them entirely gets the same result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The indexer or kernel refused to attach `child` under `parent`
    /// because `child` was already an ancestor of `parent` (or vice versa).
    CircularReference { parent: NodeId, child: NodeId },
    /// The pruner's defensive depth guard tripped; the pre-prune tree was
    /// returned untouched instead of risking unbounded recursion.
    ResourceExhausted,
}

/// Injected collaborator that receives [`Diagnostic`] events. Not a
/// process-wide singleton: every `Engine` owns its own sink.
pub trait DiagnosticSink {
    fn report(&mut self, event: Diagnostic);
}

/// Discards every event. Used by the convenience [`crate::thread`] entry
/// point, where no logging backend is assumed to be configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&mut self, _event: Diagnostic) {}
}

/// Forwards events to the `log` facade at `warn` level. Hosts that already
/// initialize a `log` backend (`env_logger`, `tracing-log`, ...) see these
/// for free.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, event: Diagnostic) {
        match event {
            Diagnostic::CircularReference { parent, child } => {
                log::warn!(
                    "jwz-thread: refused to attach node {:?} under {:?}: would close a cycle",
                    child,
                    parent
                );
            }
            Diagnostic::ResourceExhausted => {
                log::warn!("jwz-thread: pruner depth guard tripped, tree left unpruned");
            }
        }
    }
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, event: Diagnostic) {
        self(event)
    }
}
