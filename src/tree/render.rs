// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cached rendering of construction trees into models

use super::cache::{CacheUpdater, MemoryCache, RenderCache};
use super::node::Node;
use crate::geometry::{earcut, primitives, BooleanOp, CsgSettings, Face, Model, Shape};
use crate::lang::EvalError;
use serde::Serialize;
use std::rc::Rc;

/// Cache statistics of the last render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Entries in the current generation
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

/// Renders trees, carrying one cache generation from pass to pass
#[derive(Debug, Default)]
pub struct Renderer {
    generation: MemoryCache,
    settings: CsgSettings,
    stats: CacheStats,
}

/// Installs the pass's generation when dropped, on every exit path
struct Pass<'r> {
    renderer: &'r mut Renderer,
    updater: Option<CacheUpdater>,
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        if let Some(updater) = self.updater.take() {
            self.renderer.generation = updater.finish();
            self.renderer.stats.entries = self.renderer.generation.len();
        }
    }
}

impl Renderer {
    pub fn new(settings: CsgSettings) -> Self {
        Self {
            generation: MemoryCache::new(),
            settings,
            stats: CacheStats::default(),
        }
    }

    pub fn settings(&self) -> &CsgSettings {
        &self.settings
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop the cached generation
    pub fn clear(&mut self) {
        self.generation = MemoryCache::new();
        self.stats = CacheStats::default();
    }

    /// Render a single tree as one cache pass
    pub fn render_tree(&mut self, node: &Node) -> Result<Model, EvalError> {
        self.render_all(std::slice::from_ref(node))
    }

    /// Render top-level nodes and join them left to right
    pub fn render_all(&mut self, nodes: &[Node]) -> Result<Model, EvalError> {
        let old = std::mem::take(&mut self.generation);
        self.stats = CacheStats::default();
        let mut pass = Pass {
            renderer: self,
            updater: Some(CacheUpdater::new(old)),
        };

        let mut result: Option<Model> = None;
        for node in nodes {
            let model = pass.render(node)?;
            result = Some(match result {
                None => Rc::unwrap_or_clone(model),
                Some(acc) => acc.join_with(&model, &pass.renderer.settings),
            });
        }
        Ok(result.unwrap_or_default())
    }
}

impl Pass<'_> {
    fn render(&mut self, node: &Node) -> Result<Rc<Model>, EvalError> {
        let key = node.key();
        if let Some(updater) = self.updater.as_mut() {
            if let Some(model) = updater.lookup(&key) {
                self.renderer.stats.hits += 1;
                return Ok(model);
            }
        }
        self.renderer.stats.misses += 1;

        let model = Rc::new(self.render_uncached(node)?);
        if let Some(updater) = self.updater.as_mut() {
            updater.store(&key, model.clone());
        }
        Ok(model)
    }

    fn render_children(&mut self, children: &[Node]) -> Result<Vec<Model>, EvalError> {
        children
            .iter()
            .map(|child| self.render(child).map(Rc::unwrap_or_clone))
            .collect()
    }

    fn fold(&mut self, op: BooleanOp, children: &[Node]) -> Result<Model, EvalError> {
        let models = self.render_children(children)?;
        Ok(op.fold(models, &self.renderer.settings))
    }

    fn render_uncached(&mut self, node: &Node) -> Result<Model, EvalError> {
        match node {
            Node::Cube(size) => Ok(primitives::cube(size)),
            Node::Sphere { radius, segments } => Ok(primitives::sphere(*radius, *segments)),
            Node::Cylinder {
                height,
                r1,
                r2,
                segments,
            } => Ok(primitives::cylinder(*r1, *r2, *height, *segments)),
            Node::Polygon(points) => match Shape::from_polygon(points) {
                Ok(shape) => Ok(shape.extrude(1.0, 0.0, 1.0, 1)),
                Err(err) => {
                    tracing::debug!("polygon with {} points not rendered: {}", points.len(), err);
                    Ok(Model::new())
                }
            },
            Node::Polyhedron { points, faces } => Ok(polyhedron(points, faces)),

            Node::Affine {
                matrix,
                offset,
                children,
            } => {
                let mut model = self.fold(BooleanOp::Union, children)?;
                if let Some(m) = matrix {
                    model.transform(m);
                }
                if let Some(v) = offset {
                    model.move_by(v);
                }
                Ok(model)
            }
            Node::Material { id, children } => {
                let mut model = self.fold(BooleanOp::Union, children)?;
                model.set_material(id);
                Ok(model)
            }
            Node::LinearExtrude { params, children } => {
                if children.is_empty() {
                    return Ok(Model::new());
                }
                let joined = self.fold(BooleanOp::Union, children)?;
                Ok(Shape::projection(&joined).extrude(
                    params.height,
                    params.twist,
                    params.scale,
                    params.slices,
                ))
            }

            Node::Union(children) => self.fold(BooleanOp::Union, children),
            Node::Difference(children) => self.fold(BooleanOp::Difference, children),
            Node::Intersection(children) => self.fold(BooleanOp::Intersection, children),
            Node::Hull(children) => {
                let mut models = self.render_children(children)?.into_iter();
                let Some(first) = models.next() else {
                    return Ok(Model::new());
                };
                let mut result = first.hull(&Model::new())?;
                for model in models {
                    result = result.hull(&model)?;
                }
                Ok(result)
            }
            Node::Minkowski(children) => {
                if children.len() != 2 {
                    return Ok(Model::new());
                }
                let models = self.render_children(children)?;
                Ok(models[0].minkowski(&models[1])?)
            }
        }
    }
}

/// Faces are listed clockwise seen from outside and may have any number of corners
fn polyhedron(points: &[nalgebra::Point3<f64>], faces: &[Vec<usize>]) -> Model {
    let mut model = Model::new();
    for face in faces {
        let ring: Vec<_> = face.iter().rev().filter_map(|&i| points.get(i).copied()).collect();
        match earcut::triangulate(&ring) {
            Ok(triangles) => {
                for [a, b, c] in triangles {
                    model.add_face(Face::new(ring[a], ring[b], ring[c]));
                }
            }
            Err(err) => tracing::debug!("polyhedron face {:?} dropped: {}", face, err),
        }
    }
    model
}
