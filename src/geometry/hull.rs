// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Incremental 3D convex hull
//!
//! A seed tetrahedron is grown one eye point at a time: faces the point can
//! see are removed and the horizon is stitched to the point.

use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use thiserror::Error;

const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HullError {
    #[error("degenerate hull: need at least 4 points, got {0}")]
    TooFewPoints(usize),
    #[error("degenerate hull: all points are coplanar")]
    Degenerate,
}

/// Face key with the smallest index first, preserving the winding
pub fn face_key(a: usize, b: usize, c: usize) -> (usize, usize, usize) {
    if a < b && a < c {
        (a, b, c)
    } else if b < a && b < c {
        (b, c, a)
    } else {
        (c, a, b)
    }
}

#[derive(Debug, Clone, Copy)]
struct HullFace {
    normal: Vector3<f64>,
    offset: f64,
}

impl HullFace {
    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }
}

struct Builder<'a> {
    points: &'a [Point3<f64>],
    faces: AHashMap<(usize, usize, usize), HullFace>,
}

impl<'a> Builder<'a> {
    fn new(points: &'a [Point3<f64>]) -> Self {
        Self {
            points,
            faces: AHashMap::new(),
        }
    }

    fn add_face(&mut self, a: usize, b: usize, c: usize) {
        let (pa, pb, pc) = (&self.points[a], &self.points[b], &self.points[c]);
        let normal = (pb - pa).cross(&(pc - pa));
        let normal = if normal.norm() > 0.0 {
            normal.normalize()
        } else {
            normal
        };
        let face = HullFace {
            normal,
            offset: normal.dot(&pa.coords),
        };
        self.faces.insert(face_key(a, b, c), face);
    }

    fn most_distant_pair(&self) -> (usize, usize) {
        let mut best = (0, 1);
        let mut max_dist = -1.0;
        for i in 0..self.points.len() {
            for j in i + 1..self.points.len() {
                let d = (self.points[i] - self.points[j]).norm_squared();
                if d > max_dist {
                    max_dist = d;
                    best = (i, j);
                }
            }
        }
        best
    }

    /// Squared distance of `p` from the line through `a` and `b`
    fn line_distance(&self, a: usize, b: usize, p: usize) -> f64 {
        let ab = self.points[b] - self.points[a];
        let ap = self.points[p] - self.points[a];
        ab.cross(&ap).norm_squared() / ab.norm_squared()
    }

    /// Seed faces; returns the points they use and their centroid
    fn seed(&mut self) -> Result<(AHashSet<usize>, Vector3<f64>), HullError> {
        let (a, b) = self.most_distant_pair();

        let c = (0..self.points.len())
            .filter(|&i| i != a && i != b)
            .max_by(|&i, &j| {
                self.line_distance(a, b, i)
                    .total_cmp(&self.line_distance(a, b, j))
            })
            .ok_or(HullError::TooFewPoints(self.points.len()))?;
        if self.line_distance(a, b, c) < EPSILON * EPSILON {
            return Err(HullError::Degenerate);
        }

        let origin = self.points[a];
        let n = (self.points[b] - origin)
            .cross(&(self.points[c] - origin))
            .normalize();
        let plane_dist = |i: usize| n.dot(&(self.points[i] - origin));

        // Only the apex farthest from abc joins the seed; points on the
        // other side are inserted later like any other eye point
        let apex = (0..self.points.len())
            .max_by(|&i, &j| plane_dist(i).abs().total_cmp(&plane_dist(j).abs()))
            .ok_or(HullError::TooFewPoints(self.points.len()))?;
        if plane_dist(apex).abs() <= EPSILON {
            return Err(HullError::Degenerate);
        }
        let seed = [(a, b, c), (a, b, apex), (b, c, apex), (c, a, apex)];

        let used: AHashSet<usize> = seed.iter().flat_map(|&(x, y, z)| [x, y, z]).collect();
        let centroid = used
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.points[i].coords)
            / used.len() as f64;

        for (x, y, z) in seed {
            let normal = (self.points[y] - self.points[x]).cross(&(self.points[z] - self.points[x]));
            if normal.dot(&(centroid - self.points[x].coords)) > 0.0 {
                self.add_face(x, z, y);
            } else {
                self.add_face(x, y, z);
            }
        }

        Ok((used, centroid))
    }

    fn add_eye_point(&mut self, p: usize) {
        let point = self.points[p];
        let visible: Vec<(usize, usize, usize)> = self
            .faces
            .iter()
            .filter(|(_, face)| face.distance(&point) > EPSILON)
            .map(|(key, _)| *key)
            .collect();
        if visible.is_empty() {
            return;
        }

        let mut edges: AHashMap<(usize, usize), usize> = AHashMap::new();
        for &(a, b, c) in &visible {
            for edge in [(a, b), (b, c), (c, a)] {
                *edges.entry(edge).or_insert(0) += 1;
            }
            self.faces.remove(&(a, b, c));
        }

        let horizon: Vec<(usize, usize)> = edges
            .iter()
            .filter(|&(&(u, v), &count)| count == 1 && !edges.contains_key(&(v, u)))
            .map(|(&edge, _)| edge)
            .collect();
        for (u, v) in horizon {
            self.add_face(u, v, p);
        }
    }
}

/// Outward-wound triangles of the convex hull of `points`
pub fn convex_hull(points: &[Point3<f64>]) -> Result<Vec<[usize; 3]>, HullError> {
    if points.len() < 4 {
        return Err(HullError::TooFewPoints(points.len()));
    }

    let mut builder = Builder::new(points);
    let (used, centroid) = builder.seed()?;

    // Farthest points first, so points on the final faces are rarely kept
    let mut order: Vec<usize> = (0..points.len()).filter(|i| !used.contains(i)).collect();
    let spread = |i: usize| (points[i].coords - centroid).norm_squared();
    order.sort_by(|&i, &j| spread(j).total_cmp(&spread(i)).then(i.cmp(&j)));

    for i in order {
        builder.add_eye_point(i);
    }

    let mut faces: Vec<[usize; 3]> = builder.faces.keys().map(|&(a, b, c)| [a, b, c]).collect();
    faces.sort_unstable();
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    fn assert_contains_all(points: &[Point3<f64>], faces: &[[usize; 3]]) {
        for f in faces {
            let (a, b, c) = (points[f[0]], points[f[1]], points[f[2]]);
            let n = (b - a).cross(&(c - a)).normalize();
            for p in points {
                assert!(n.dot(&(p - a)) <= 1e-6, "point {:?} outside face {:?}", p, f);
            }
        }
    }

    #[test]
    fn test_face_key_rotation() {
        assert_eq!(face_key(3, 1, 2), (1, 2, 3));
        assert_eq!(face_key(2, 3, 1), (1, 2, 3));
        assert_eq!(face_key(1, 3, 2), (1, 3, 2));
    }

    #[test]
    fn test_tetrahedron() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = convex_hull(&points).unwrap();
        assert_eq!(faces.len(), 4);
        assert_contains_all(&points, &faces);
    }

    #[test]
    fn test_cube_with_interior_point() {
        let mut points = cube_points();
        points.push(Point3::new(0.5, 0.5, 0.5));
        let faces = convex_hull(&points).unwrap();
        assert!(faces.iter().all(|f| !f.contains(&8)));
        assert_contains_all(&points, &faces);
    }

    #[test]
    fn test_coplanar_input_fails() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(convex_hull(&points), Err(HullError::Degenerate));
        assert_eq!(
            convex_hull(&points[..3]),
            Err(HullError::TooFewPoints(3))
        );
    }

    #[test]
    fn test_apexes_on_both_sides_of_seed_plane() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 3.0, 0.0),
            Point3::new(5.0, -2.5, 1.0),
            Point3::new(5.0, 1.0, -1.0),
        ];
        let faces = convex_hull(&points).unwrap();
        assert_contains_all(&points, &faces);
        for i in 0..points.len() {
            assert!(faces.iter().any(|f| f.contains(&i)), "point {} not on hull", i);
        }
    }
}
