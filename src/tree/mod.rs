// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction tree and its cached renderer

mod cache;
mod node;
mod render;

pub use cache::{CacheUpdater, MemoryCache, NullCache, RenderCache};
pub use node::{quantize, ExtrudeParams, Node};
pub use render::{CacheStats, Renderer};
