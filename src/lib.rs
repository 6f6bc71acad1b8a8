// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadforge
//!
//! An OpenSCAD-compatible script interpreter on top of a BSP-tree CSG kernel.
//! Scripts are parsed into a syntax tree, evaluated into an immutable
//! construction tree, and rendered into a triangle [`Model`] through a
//! key-addressed cache that survives between passes.

pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod kernel;
pub mod lang;
pub mod parser;
pub mod tree;
pub mod utils;

pub use config::KernelConfig;
pub use diagnostics::{LogSink, MemorySink, NullSink, TracingSink};
pub use geometry::{BoundingBox, Face, Model};
pub use kernel::Kernel;
pub use lang::{EvalError, Interpreter, Value};
pub use tree::{CacheStats, Node};

use anyhow::Result;
use std::path::Path;

/// Render a SCAD script to a model, logging through `tracing`
pub fn render(source: &str) -> Result<Model> {
    Kernel::new().render_source(&TracingSink, source, "<input>")
}

/// Render a SCAD file to a model, logging through `tracing`
pub fn render_file(path: impl AsRef<Path>) -> Result<Model> {
    Kernel::new().render_file(&TracingSink, path)
}
