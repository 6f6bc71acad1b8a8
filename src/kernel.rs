// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API: load, evaluate and render scripts with a persistent cache

use crate::config::KernelConfig;
use crate::diagnostics::LogSink;
use crate::geometry::Model;
use crate::lang::{Interpreter, Loader, Program};
use crate::tree::{CacheStats, Node, Renderer};
use anyhow::{Context, Result};
use std::path::Path;

/// Main kernel; repeated renders reuse the previous pass's cache generation
#[derive(Debug)]
pub struct Kernel {
    config: KernelConfig,
    loader: Loader,
    renderer: Renderer,
}

impl Kernel {
    /// Create a kernel with the default configuration
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        let loader = Loader::new(config.search_paths.clone()).with_packrat(config.packrat);
        let renderer = Renderer::new(config.csg_settings());
        Self {
            config,
            loader,
            renderer,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Evaluate script text into its top-level construction nodes
    pub fn evaluate_source(&self, sink: &dyn LogSink, source: &str, name: &str) -> Result<Vec<Node>> {
        let program = self
            .loader
            .load_source(sink, source, name)
            .with_context(|| format!("Failed to load script: {}", name))?;
        self.evaluate(sink, &program)
            .with_context(|| format!("Failed to evaluate script: {}", name))
    }

    pub fn evaluate_file(&self, sink: &dyn LogSink, path: impl AsRef<Path>) -> Result<Vec<Node>> {
        let path = path.as_ref();
        let program = self
            .loader
            .load_file(sink, path)
            .with_context(|| format!("Failed to load SCAD file: {}", path.display()))?;
        self.evaluate(sink, &program)
            .with_context(|| format!("Failed to evaluate SCAD file: {}", path.display()))
    }

    /// Render script text to a model
    pub fn render_source(&mut self, sink: &dyn LogSink, source: &str, name: &str) -> Result<Model> {
        let nodes = self.evaluate_source(sink, source, name)?;
        self.render_nodes(&nodes)
    }

    /// Render a file to a model
    pub fn render_file(&mut self, sink: &dyn LogSink, path: impl AsRef<Path>) -> Result<Model> {
        let nodes = self.evaluate_file(sink, path)?;
        self.render_nodes(&nodes)
    }

    /// Render already-evaluated nodes as one cache pass
    pub fn render_nodes(&mut self, nodes: &[Node]) -> Result<Model> {
        let model = self.renderer.render_all(nodes).context("Failed to render model")?;
        let stats = self.renderer.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "render pass finished"
        );
        Ok(model)
    }

    /// Statistics of the last render pass
    pub fn cache_stats(&self) -> CacheStats {
        self.renderer.stats()
    }

    /// Drop cached models and memoized source files
    pub fn clear_cache(&mut self) {
        self.renderer.clear();
        self.loader.clear();
    }

    fn evaluate(&self, sink: &dyn LogSink, program: &Program) -> Result<Vec<Node>> {
        let interpreter = Interpreter::new(sink).with_max_depth(self.config.max_scope_depth);
        Ok(interpreter.run(program)?)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, NullSink};

    #[test]
    fn test_kernel_basic_render() {
        let mut kernel = Kernel::new();
        let model = kernel
            .render_source(&NullSink, "cube([10, 10, 10]);", "cube.scad")
            .unwrap();
        assert_eq!(model.len(), 12);
    }

    #[test]
    fn test_second_render_hits_cache() {
        let mut kernel = Kernel::new();
        let source = "difference() { cube(4, center = true); sphere(2, $fn = 8); }";
        let first = kernel.render_source(&NullSink, source, "a.scad").unwrap();
        assert!(kernel.cache_stats().misses > 0);

        let second = kernel.render_source(&NullSink, source, "a.scad").unwrap();
        assert_eq!(kernel.cache_stats().misses, 0);
        assert_eq!(first, second);

        kernel.clear_cache();
        assert_eq!(kernel.cache_stats().entries, 0);
    }

    #[test]
    fn test_parse_failure_names_the_source() {
        let mut kernel = Kernel::new();
        let err = kernel.render_source(&NullSink, "cube(;", "broken.scad").unwrap_err();
        assert!(format!("{:#}", err).contains("broken.scad"));
    }

    #[test]
    fn test_recursion_limit_is_fatal() {
        let sink = MemorySink::new();
        let kernel = Kernel::with_config(KernelConfig {
            max_scope_depth: 8,
            ..KernelConfig::default()
        });
        let result = kernel.evaluate_source(&sink, "module m() m(); m();", "deep.scad");
        assert!(result.is_err());
    }
}
