// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Backtracking parser-combinator engine with optional packrat memoization

mod context;
mod error;
mod infix;
mod location;
mod packrat;
mod whitespace;
mod word;

pub use context::{PResult, Parser, Rule};
pub use error::ParseError;
pub use infix::Infix;
pub use location::{mark_position, Location};
pub use packrat::{CacheEntry, Packrat};
pub use whitespace::{Skip, SkipFn, Whitespace};
pub use word::{CharClass, Word};
