// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rule memoization keyed by (position, rule id)

use super::error::ParseError;
use ahash::AHashMap;
use std::any::Any;
use std::rc::Rc;

/// State of one rule application
#[derive(Clone)]
pub enum CacheEntry {
    /// Rule is being parsed at this position; hitting it again is left recursion
    InProgress,
    Success { value: Rc<dyn Any>, end: usize },
    Failure(ParseError),
}

/// Memo table used by named rules
pub enum Packrat {
    /// No memoization
    Null,
    Memo(AHashMap<(usize, &'static str), CacheEntry>),
}

impl Packrat {
    pub fn memo() -> Self {
        Packrat::Memo(AHashMap::new())
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Packrat::Memo(_))
    }

    pub fn get(&self, pos: usize, rule: &'static str) -> Option<&CacheEntry> {
        match self {
            Packrat::Null => None,
            Packrat::Memo(map) => map.get(&(pos, rule)),
        }
    }

    pub fn set(&mut self, pos: usize, rule: &'static str, entry: CacheEntry) {
        if let Packrat::Memo(map) = self {
            map.insert((pos, rule), entry);
        }
    }

    /// Number of memoized entries
    pub fn len(&self) -> usize {
        match self {
            Packrat::Null => 0,
            Packrat::Memo(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Packrat {
    fn default() -> Self {
        Packrat::Null
    }
}
