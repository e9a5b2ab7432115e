/*
 * jwz-thread - error module.
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

//! Boundary validation errors.
//!
//! The threading engine itself is infallible: `thread()` always returns a
//! tree. The only place an `Err` makes sense is at the boundary where a
//! caller hands us a `Message` that cannot possibly be keyed by the indexer.

/// Error constructing a [`crate::Message`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("message id must not be empty")]
    EmptyId,
}

pub type Result<T> = std::result::Result<T, MessageError>;
