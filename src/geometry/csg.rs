// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP tree
//!
//! Nodes live in an arena indexed by `usize`, so building, clipping and
//! inverting deep trees never recurse on the call stack.

use nalgebra::{Point3, Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

pub const EPSILON: f64 = 1e-5;

/// Tuning for BSP construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsgSettings {
    /// Seed of the splitting-plane picker
    pub seed: u64,
    /// Depth at which the tree stops descending
    pub max_depth: usize,
}

impl Default for CsgSettings {
    fn default() -> Self {
        Self {
            seed: 0x5eed_c59,
            max_depth: 65536,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub uv: Vector2<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>, uv: Vector2<f64>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal.lerp(&other.normal, t),
            uv: self.uv.lerp(&other.uv, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub w: f64,
}

/// Where a polygon ended up relative to a plane
pub enum Split {
    CoplanarFront(Polygon),
    CoplanarBack(Polygon),
    Front(Polygon),
    Back(Polygon),
    Spanning {
        front: Option<Polygon>,
        back: Option<Polygon>,
    },
}

const COPLANAR: u8 = 0;
const BACK: u8 = 1;
const FRONT: u8 = 2;
const SPANNING: u8 = 3;

impl Plane {
    /// Plane through three points; `None` when they are collinear
    pub fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        let length = normal.norm();
        if length < f64::EPSILON {
            return None;
        }
        let normal = normal / length;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Reflect a direction through the plane
    pub fn mirror(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v - self.normal * (2.0 * self.normal.dot(v))
    }

    fn classify(&self, p: &Point3<f64>) -> u8 {
        let t = self.normal.dot(&p.coords) - self.w;
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    pub fn split(&self, polygon: Polygon) -> Split {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.classify(&v.position))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR if self.normal.dot(&polygon.plane.normal) > 0.0 => {
                Split::CoplanarFront(polygon)
            }
            COPLANAR => Split::CoplanarBack(polygon),
            FRONT => Split::Front(polygon),
            BACK => Split::Back(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.position.coords))
                            / self.normal.dot(&(vj.position - vi.position));
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                Split::Spanning {
                    front: Polygon::with_plane(f, polygon.plane, polygon.material.clone()),
                    back: Polygon::with_plane(b, polygon.plane, polygon.material),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
    pub material: Rc<str>,
}

impl Polygon {
    /// Polygon whose plane comes from its first three vertices
    pub fn new(vertices: Vec<Vertex>, material: Rc<str>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(
            &vertices[0].position,
            &vertices[1].position,
            &vertices[2].position,
        )?;
        Some(Self {
            vertices,
            plane,
            material,
        })
    }

    fn with_plane(vertices: Vec<Vertex>, plane: Plane, material: Rc<str>) -> Option<Self> {
        (vertices.len() >= 3).then_some(Self {
            vertices,
            plane,
            material,
        })
    }

    pub fn flip(&mut self) {
        for v in &mut self.vertices {
            v.normal = self.plane.mirror(&v.normal);
        }
        self.vertices.reverse();
        self.plane.flip();
    }
}

#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<Polygon>,
    front: Option<usize>,
    back: Option<usize>,
}

/// BSP tree over an arena of nodes; index 0 is the root
#[derive(Debug, Clone)]
pub struct Bsp {
    nodes: Vec<BspNode>,
    rng: StdRng,
    max_depth: usize,
}

impl Bsp {
    pub fn new(polygons: Vec<Polygon>, settings: &CsgSettings) -> Self {
        let mut bsp = Self {
            nodes: vec![BspNode::default()],
            rng: StdRng::seed_from_u64(settings.seed),
            max_depth: settings.max_depth,
        };
        bsp.build(polygons);
        bsp
    }

    fn alloc(&mut self) -> usize {
        self.nodes.push(BspNode::default());
        self.nodes.len() - 1
    }

    /// Insert polygons, splitting them down the tree
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        let mut pending = vec![(0usize, polygons, 0usize)];

        while let Some((index, polygons, depth)) = pending.pop() {
            if polygons.is_empty() {
                continue;
            }
            if depth > self.max_depth {
                tracing::warn!("BSP depth limit {} reached", self.max_depth);
                self.nodes[index].polygons.extend(polygons);
                continue;
            }

            let plane = match self.nodes[index].plane {
                Some(plane) => plane,
                None => {
                    let pick = self.rng.gen_range(0..polygons.len());
                    let plane = polygons[pick].plane;
                    self.nodes[index].plane = Some(plane);
                    plane
                }
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                match plane.split(polygon) {
                    Split::CoplanarFront(p) | Split::CoplanarBack(p) => {
                        self.nodes[index].polygons.push(p)
                    }
                    Split::Front(p) => front.push(p),
                    Split::Back(p) => back.push(p),
                    Split::Spanning { front: f, back: b } => {
                        front.extend(f);
                        back.extend(b);
                    }
                }
            }

            if !front.is_empty() {
                let child = match self.nodes[index].front {
                    Some(child) => child,
                    None => {
                        let child = self.alloc();
                        self.nodes[index].front = Some(child);
                        child
                    }
                };
                pending.push((child, front, depth + 1));
            }
            if !back.is_empty() {
                let child = match self.nodes[index].back {
                    Some(child) => child,
                    None => {
                        let child = self.alloc();
                        self.nodes[index].back = Some(child);
                        child
                    }
                };
                pending.push((child, back, depth + 1));
            }
        }
    }

    /// Convert solid space to empty space and empty space to solid space
    pub fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut node.plane {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Remove the parts of `polygons` that are inside this tree
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut pending = vec![(0usize, polygons)];

        while let Some((index, polygons)) = pending.pop() {
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                result.extend(polygons);
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                match plane.split(polygon) {
                    Split::CoplanarFront(p) | Split::Front(p) => front.push(p),
                    Split::CoplanarBack(p) | Split::Back(p) => back.push(p),
                    Split::Spanning { front: f, back: b } => {
                        front.extend(f);
                        back.extend(b);
                    }
                }
            }

            match node.front {
                Some(child) => pending.push((child, front)),
                None => result.extend(front),
            }
            if let Some(child) = node.back {
                pending.push((child, back));
            }
        }

        result
    }

    /// Remove all polygons in this tree that are inside `other`
    pub fn clip_to(&mut self, other: &Bsp) {
        for node in &mut self.nodes {
            let polygons = std::mem::take(&mut node.polygons);
            node.polygons = other.clip_polygons(polygons);
        }
    }

    pub fn all_polygons(&self) -> Vec<Polygon> {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter().cloned())
            .collect()
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.nodes.into_iter().flat_map(|node| node.polygons).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A solid as a polygon soup
#[derive(Debug, Clone, Default)]
pub struct Csg {
    pub polygons: Vec<Polygon>,
}

impl Csg {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn union(&self, other: &Csg, settings: &CsgSettings) -> Csg {
        if self.polygons.is_empty() {
            return other.clone();
        }
        if other.polygons.is_empty() {
            return self.clone();
        }

        let mut a = Bsp::new(self.polygons.clone(), settings);
        let mut b = Bsp::new(other.polygons.clone(), settings);
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.into_polygons());
        Csg::new(a.into_polygons())
    }

    pub fn subtract(&self, other: &Csg, settings: &CsgSettings) -> Csg {
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return self.clone();
        }

        let mut a = Bsp::new(self.polygons.clone(), settings);
        let mut b = Bsp::new(other.polygons.clone(), settings);
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.into_polygons());
        a.invert();
        Csg::new(a.into_polygons())
    }

    pub fn intersect(&self, other: &Csg, settings: &CsgSettings) -> Csg {
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return Csg::default();
        }

        let mut a = Bsp::new(self.polygons.clone(), settings);
        let mut b = Bsp::new(other.polygons.clone(), settings);
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(b.into_polygons());
        a.invert();
        Csg::new(a.into_polygons())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: [[f64; 3]; 4]) -> Polygon {
        let vertices: Vec<Vertex> = points
            .iter()
            .map(|p| Vertex::new(Point3::new(p[0], p[1], p[2]), Vector3::zeros(), Vector2::zeros()))
            .collect();
        Polygon::new(vertices, Rc::from("")).unwrap()
    }

    fn box_polygons(min: f64, max: f64) -> Vec<Polygon> {
        let (a, b) = (min, max);
        vec![
            quad([[a, a, a], [a, b, a], [b, b, a], [b, a, a]]),
            quad([[a, a, b], [b, a, b], [b, b, b], [a, b, b]]),
            quad([[a, a, a], [b, a, a], [b, a, b], [a, a, b]]),
            quad([[a, b, a], [a, b, b], [b, b, b], [b, b, a]]),
            quad([[a, a, a], [a, a, b], [a, b, b], [a, b, a]]),
            quad([[b, a, a], [b, b, a], [b, b, b], [b, a, b]]),
        ]
    }

    #[test]
    fn test_plane_split_spanning() {
        let plane = Plane {
            normal: Vector3::new(1.0, 0.0, 0.0),
            w: 0.5,
        };
        let polygon = quad([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
        match plane.split(polygon) {
            Split::Spanning {
                front: Some(f),
                back: Some(b),
            } => {
                assert_eq!(f.vertices.len(), 4);
                assert_eq!(b.vertices.len(), 4);
                assert!(f.vertices.iter().all(|v| v.position.x >= 0.5 - EPSILON));
            }
            _ => panic!("expected a spanning split"),
        }
    }

    #[test]
    fn test_flip_mirrors_normals() {
        let mut polygon = quad([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
        for v in &mut polygon.vertices {
            v.normal = Vector3::new(0.0, 0.0, 1.0);
        }
        polygon.flip();
        assert_eq!(polygon.plane.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(polygon.vertices[0].normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(polygon.vertices[0].position, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_subtract_self_is_empty() {
        let settings = CsgSettings::default();
        let a = Csg::new(box_polygons(0.0, 1.0));
        assert!(a.subtract(&a, &settings).polygons.is_empty());
    }

    #[test]
    fn test_union_of_disjoint_boxes_keeps_all_faces() {
        let settings = CsgSettings::default();
        let a = Csg::new(box_polygons(0.0, 1.0));
        let b = Csg::new(box_polygons(2.0, 3.0));
        assert_eq!(a.union(&b, &settings).polygons.len(), 12);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let settings = CsgSettings::default();
        let a = Csg::new(box_polygons(0.0, 2.0));
        let b = Csg::new(box_polygons(1.0, 3.0));
        let first = a.intersect(&b, &settings).polygons;
        let second = a.intersect(&b, &settings).polygons;
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
