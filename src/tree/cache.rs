// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render caches keyed by canonical node keys

use crate::geometry::Model;
use ahash::AHashMap;
use std::rc::Rc;

/// Mapping from canonical key to rendered model
pub trait RenderCache {
    fn lookup(&mut self, key: &str) -> Option<Rc<Model>>;
    fn store(&mut self, key: &str, model: Rc<Model>);
}

/// Cache that never hits
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl RenderCache for NullCache {
    fn lookup(&mut self, _key: &str) -> Option<Rc<Model>> {
        None
    }

    fn store(&mut self, _key: &str, _model: Rc<Model>) {}
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: AHashMap<String, Rc<Model>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl RenderCache for MemoryCache {
    fn lookup(&mut self, key: &str) -> Option<Rc<Model>> {
        self.entries.get(key).cloned()
    }

    fn store(&mut self, key: &str, model: Rc<Model>) {
        self.entries.insert(key.to_string(), model);
    }
}

/// One render generation: hits in `old` are carried into `new`, so after a
/// full pass `new` holds exactly the reachable entries
#[derive(Debug)]
pub struct CacheUpdater<C: RenderCache = MemoryCache> {
    old: C,
    new: MemoryCache,
}

impl<C: RenderCache> CacheUpdater<C> {
    pub fn new(old: C) -> Self {
        Self {
            old,
            new: MemoryCache::new(),
        }
    }

    /// Next generation; the old one is dropped
    pub fn finish(self) -> MemoryCache {
        self.new
    }
}

impl<C: RenderCache> RenderCache for CacheUpdater<C> {
    fn lookup(&mut self, key: &str) -> Option<Rc<Model>> {
        if let Some(model) = self.new.lookup(key) {
            return Some(model);
        }
        let model = self.old.lookup(key)?;
        self.new.store(key, model.clone());
        Some(model)
    }

    fn store(&mut self, key: &str, model: Rc<Model>) {
        self.new.store(key, model);
    }
}
