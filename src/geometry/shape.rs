// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar regions and their extrusion into solids

use super::earcut::{signed_area, triangulate_2d, EarcutError};
use super::{Face, Model};
use ahash::AHashSet;
use nalgebra::{Point3, Rotation2, Vector2};

const EPSILON: f64 = 1e-7;

fn point_key(p: &Vector2<f64>) -> [i64; 2] {
    [(p.x * 65536.0) as i64, (p.y * 65536.0) as i64]
}

/// 2D region stored as counter-clockwise triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    triangles: Vec<[Vector2<f64>; 3]>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulated simple polygon
    pub fn from_polygon(points: &[Vector2<f64>]) -> Result<Self, EarcutError> {
        let mut ring = points.to_vec();
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }
        let triangles = triangulate_2d(&ring)?
            .into_iter()
            .map(|[a, b, c]| [ring[a], ring[b], ring[c]])
            .collect();
        Ok(Self { triangles })
    }

    /// Footprint of the downward-facing faces of a model on the XY plane
    pub fn projection(model: &Model) -> Self {
        let triangles = model
            .faces()
            .iter()
            .filter(|f| f.normal().z < -EPSILON)
            .map(|f| {
                let [a, b, c] = f.positions.map(|p| Vector2::new(p.x, p.y));
                // Seen from above the face is clockwise
                [a, c, b]
            })
            .collect();
        Self { triangles }
    }

    pub fn triangles(&self) -> &[[Vector2<f64>; 3]] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|[a, b, c]| {
                let (u, v) = (b - a, c - a);
                (u.x * v.y - u.y * v.x) / 2.0
            })
            .sum()
    }

    /// Directed edges not shared with a neighbouring triangle; interior on the left
    pub fn boundary_edges(&self) -> Vec<(Vector2<f64>, Vector2<f64>)> {
        let mut directed: AHashSet<([i64; 2], [i64; 2])> = AHashSet::new();
        for tri in &self.triangles {
            for i in 0..3 {
                directed.insert((point_key(&tri[i]), point_key(&tri[(i + 1) % 3])));
            }
        }

        let mut edges = Vec::new();
        for tri in &self.triangles {
            for i in 0..3 {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                let (ka, kb) = (point_key(&a), point_key(&b));
                if ka != kb && !directed.contains(&(kb, ka)) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// Closed solid between z=0 and z=height; the top is rotated by
    /// `twist` degrees clockwise and scaled by `scale`
    pub fn extrude(&self, height: f64, twist: f64, scale: f64, slices: usize) -> Model {
        let slices = if twist == 0.0 { 1 } else { slices.max(1) };
        let level = |p: &Vector2<f64>, k: usize| {
            let t = k as f64 / slices as f64;
            let rotation = Rotation2::new(-(twist * t).to_radians());
            let s = 1.0 + (scale - 1.0) * t;
            let q = rotation * (p * s);
            Point3::new(q.x, q.y, height * t)
        };

        let mut model = Model::new();
        for [a, b, c] in &self.triangles {
            model.add_face(Face::new(level(a, 0), level(c, 0), level(b, 0)));
            if scale != 0.0 {
                model.add_face(Face::new(level(a, slices), level(b, slices), level(c, slices)));
            }
        }

        for (a, b) in self.boundary_edges() {
            for k in 0..slices {
                let (a0, b0) = (level(&a, k), level(&b, k));
                let (a1, b1) = (level(&a, k + 1), level(&b, k + 1));
                model.add_face(Face::new(a0, b0, b1));
                if (a1 - b1).norm() > EPSILON {
                    model.add_face(Face::new(a0, b1, a1));
                }
            }
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn test_clockwise_input_is_normalized() {
        let mut pts = square();
        pts.reverse();
        let shape = Shape::from_polygon(&pts).unwrap();
        assert_relative_eq!(shape.area(), 4.0, epsilon = 1e-9);
        assert_eq!(shape.boundary_edges().len(), 4);
    }

    #[test]
    fn test_extrude_prism() {
        let shape = Shape::from_polygon(&square()).unwrap();
        let model = shape.extrude(3.0, 0.0, 1.0, 20);
        assert!(model.is_closed());
        assert_relative_eq!(model.volume(), 12.0, epsilon = 1e-9);
        assert_eq!(model.len(), 2 + 2 + 4 * 2);
    }

    #[test]
    fn test_extrude_to_point() {
        let shape = Shape::from_polygon(&square()).unwrap();
        let model = shape.extrude(3.0, 0.0, 0.0, 1);
        assert!(model.is_closed());
        // Pyramid over the origin corner scaled to a point at the origin
        assert_relative_eq!(model.volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_twisted_extrusion_is_closed() {
        let shape = Shape::from_polygon(&square()).unwrap();
        let model = shape.extrude(5.0, 90.0, 1.0, 8);
        assert!(model.is_closed());
        assert_relative_eq!(model.bounding_box().max.z, 5.0);
    }

    #[test]
    fn test_projection_of_prism() {
        let shape = Shape::from_polygon(&square()).unwrap();
        let footprint = Shape::projection(&shape.extrude(1.0, 0.0, 1.0, 1));
        assert_relative_eq!(footprint.area(), 4.0, epsilon = 1e-9);
    }
}
