// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{Face, Model};
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Centered box with outward faces
pub fn cube(size: &Vector3<f64>) -> Model {
    let (x, y, z) = (size.x / 2.0, size.y / 2.0, size.z / 2.0);

    let positions = [
        Point3::new(-x, -y, -z),
        Point3::new(x, -y, -z),
        Point3::new(x, y, -z),
        Point3::new(-x, y, -z),
        Point3::new(-x, -y, z),
        Point3::new(x, -y, z),
        Point3::new(x, y, z),
        Point3::new(-x, y, z),
    ];

    // Two triangles per side, wound counter-clockwise seen from outside
    let faces = [
        [4, 5, 6],
        [4, 6, 7],
        [1, 0, 3],
        [1, 3, 2],
        [5, 1, 2],
        [5, 2, 6],
        [0, 4, 7],
        [0, 7, 3],
        [7, 6, 2],
        [7, 2, 3],
        [0, 1, 5],
        [0, 5, 4],
    ];

    let mut model = Model::new();
    for [a, b, c] in faces {
        model.add_face(Face::new(positions[a], positions[b], positions[c]));
    }
    model
}

/// UV sphere with `slices` segments around z and `(slices + 1) / 2` stacks
pub fn sphere(radius: f64, slices: usize) -> Model {
    let slices = slices.max(3);
    let stacks = (slices + 1) / 2;

    let vertex = |i: usize, j: usize| {
        let theta = 2.0 * PI * i as f64 / slices as f64;
        let phi = PI * j as f64 / stacks as f64;
        let normal = Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        let uv = Vector2::new(i as f64 / slices as f64, j as f64 / stacks as f64);
        (Point3::from(normal * radius), normal, uv)
    };

    let face = |corners: [(Point3<f64>, Vector3<f64>, Vector2<f64>); 3]| {
        let [a, b, c] = corners;
        Face::new(a.0, b.0, c.0)
            .with_normals([a.1, b.1, c.1])
            .with_uvs([a.2, b.2, c.2])
    };

    let mut model = Model::new();
    for j in 0..stacks {
        for i in 0..slices {
            let p00 = vertex(i, j);
            let p10 = vertex(i + 1, j);
            let p01 = vertex(i, j + 1);
            let p11 = vertex(i + 1, j + 1);

            if j > 0 {
                model.add_face(face([p00, p11, p10]));
            }
            if j + 1 < stacks {
                model.add_face(face([p00, p01, p11]));
            }
        }
    }
    model
}

/// Frustum from radius `r1` at z=0 to `r2` at z=h
pub fn cylinder(r1: f64, r2: f64, height: f64, segments: usize) -> Model {
    let segments = segments.max(3);
    let h = if height > 0.0 { height } else { 1.0 };
    let slope = (r1 - r2) / h;

    let ring = |r: f64, z: f64, i: usize| {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        Point3::new(r * angle.cos(), r * angle.sin(), z)
    };
    let side_normal = |i: usize| {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        Vector3::new(angle.cos(), angle.sin(), slope).normalize()
    };

    let bottom_center = Point3::new(0.0, 0.0, 0.0);
    let top_center = Point3::new(0.0, 0.0, h);
    let mut model = Model::new();

    for i in 0..segments {
        let (b0, b1) = (ring(r1, 0.0, i), ring(r1, 0.0, i + 1));
        let (t0, t1) = (ring(r2, h, i), ring(r2, h, i + 1));
        let (n0, n1) = (side_normal(i), side_normal(i + 1));

        if r1 > 0.0 {
            model.add_face(Face::new(b0, b1, t1).with_normals([n0, n1, n1]));
            model.add_face(Face::new(bottom_center, b1, b0));
        }
        if r2 > 0.0 {
            model.add_face(Face::new(b0, t1, t0).with_normals([n0, n1, n0]));
            model.add_face(Face::new(top_center, t0, t1));
        }
    }
    model
}
