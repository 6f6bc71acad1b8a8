// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ear-clipping triangulation of simple polygons

use nalgebra::{Point3, Vector2, Vector3};
use thiserror::Error;

const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EarcutError {
    #[error("need at least 3 points to cut ears, got {0}")]
    TooFewPoints(usize),
    #[error("no ear found in polygon")]
    Degenerate,
}

fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Point-in-triangle test; points on the boundary count as inside
pub fn is_in_triangle(
    x: &Vector2<f64>,
    a: &Vector2<f64>,
    b: &Vector2<f64>,
    c: &Vector2<f64>,
) -> bool {
    let tolerance = EPSILON * (b - a).norm().max((c - b).norm()).max((a - c).norm());

    // 1 = right of the edge, 2 = left, 3 = on it
    let side = |from: &Vector2<f64>, to: &Vector2<f64>| -> u8 {
        let edge = to - from;
        let length = edge.norm();
        if length == 0.0 {
            return 3;
        }
        let distance = cross2(&edge, &(x - from)) / length;
        if distance < -tolerance {
            1
        } else if distance > tolerance {
            2
        } else {
            3
        }
    };

    side(a, b) & side(b, c) & side(c, a) != 0
}

/// True when the corner a-b-c turns with `winding` by more than rounding noise
fn is_convex_corner(winding: f64, a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> bool {
    let (ab, bc) = (b - a, c - b);
    winding * cross2(&ab, &bc) > EPSILON * ab.norm() * bc.norm()
}

/// Twice the signed area; positive for counter-clockwise rings
pub fn signed_area(polygon: &[Vector2<f64>]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| cross2(&polygon[i], &polygon[(i + 1) % n]))
        .sum()
}

/// Triangulate a 2D ring, returning index triples in the ring's winding
pub fn triangulate_2d(polygon: &[Vector2<f64>]) -> Result<Vec<[usize; 3]>, EarcutError> {
    if polygon.len() < 3 {
        return Err(EarcutError::TooFewPoints(polygon.len()));
    }

    let winding = signed_area(polygon).signum();
    let mut ring: Vec<usize> = (0..polygon.len()).collect();
    let mut triangles = Vec::with_capacity(polygon.len() - 2);

    while ring.len() > 3 {
        let n = ring.len();
        let ear = (0..n).find(|&i| {
            let a = &polygon[ring[i]];
            let b = &polygon[ring[(i + 1) % n]];
            let c = &polygon[ring[(i + 2) % n]];

            is_convex_corner(winding, a, b, c)
                && (3..n).all(|j| !is_in_triangle(&polygon[ring[(i + j) % n]], a, b, c))
        });

        match ear {
            Some(i) => {
                triangles.push([ring[i], ring[(i + 1) % n], ring[(i + 2) % n]]);
                ring.remove((i + 1) % n);
            }
            None => {
                tracing::warn!("no ear left in a ring of {} points, closing it with a fan", n);
                fan(polygon, &ring, &mut triangles);
                return finish(triangles);
            }
        }
    }

    fan(polygon, &ring, &mut triangles);
    finish(triangles)
}

/// Triangles from the ring's first vertex, skipping the ones with no area
fn fan(polygon: &[Vector2<f64>], ring: &[usize], triangles: &mut Vec<[usize; 3]>) {
    for k in 1..ring.len().saturating_sub(1) {
        let [a, b, c] = [ring[0], ring[k], ring[k + 1]];
        let (ab, ac) = (polygon[b] - polygon[a], polygon[c] - polygon[a]);
        if cross2(&ab, &ac).abs() > EPSILON * ab.norm() * ac.norm() {
            triangles.push([a, b, c]);
        }
    }
}

fn finish(triangles: Vec<[usize; 3]>) -> Result<Vec<[usize; 3]>, EarcutError> {
    if triangles.is_empty() {
        Err(EarcutError::Degenerate)
    } else {
        Ok(triangles)
    }
}

/// Newell normal of a planar 3D ring (not normalized)
pub fn newell_normal(polygon: &[Point3<f64>]) -> Vector3<f64> {
    let n = polygon.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Triangulate a planar 3D ring by projecting it onto its own plane
pub fn triangulate(polygon: &[Point3<f64>]) -> Result<Vec<[usize; 3]>, EarcutError> {
    if polygon.len() < 3 {
        return Err(EarcutError::TooFewPoints(polygon.len()));
    }
    if polygon.len() == 3 {
        return Ok(vec![[0, 1, 2]]);
    }

    let normal = newell_normal(polygon);
    let length = normal.norm();
    if length < EPSILON {
        return Err(EarcutError::Degenerate);
    }
    let n = normal / length;

    let first_edge = polygon
        .iter()
        .skip(1)
        .map(|p| p - polygon[0])
        .find(|e| e.norm() > EPSILON)
        .ok_or(EarcutError::Degenerate)?;
    let i = (first_edge - n * n.dot(&first_edge)).normalize();
    let j = n.cross(&i);

    let points: Vec<Vector2<f64>> = polygon
        .iter()
        .map(|p| Vector2::new(p.coords.dot(&i), p.coords.dot(&j)))
        .collect();

    triangulate_2d(&points)
}
