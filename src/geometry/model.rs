// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle-soup model and its operations

use super::csg::{Csg, CsgSettings, Polygon, Vertex};
use super::earcut;
use super::hull::{convex_hull, HullError};
use super::minkowski::minkowski_sum;
use super::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::rc::Rc;

/// Default texture coordinates of a face
fn default_uvs() -> [Vector2<f64>; 3] {
    [
        Vector2::new(0.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(1.0, 0.0),
    ]
}

/// Quantized position used to weld and compare vertices
pub fn position_key(p: &Point3<f64>) -> [i64; 3] {
    [
        (p.x * 65536.0) as i64,
        (p.y * 65536.0) as i64,
        (p.z * 65536.0) as i64,
    ]
}

/// Triangle with per-vertex normals and texture coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub positions: [Point3<f64>; 3],
    pub normals: [Vector3<f64>; 3],
    pub uvs: [Vector2<f64>; 3],
    pub material: String,
}

impl Face {
    /// Flat-shaded face with default texture coordinates
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        let normal = (b - a).cross(&(c - a));
        let normal = if normal.norm() > 0.0 {
            normal.normalize()
        } else {
            normal
        };
        Self {
            positions: [a, b, c],
            normals: [normal; 3],
            uvs: default_uvs(),
            material: String::new(),
        }
    }

    pub fn with_normals(mut self, normals: [Vector3<f64>; 3]) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: [Vector2<f64>; 3]) -> Self {
        self.uvs = uvs;
        self
    }

    /// Geometric normal from the winding
    pub fn normal(&self) -> Vector3<f64> {
        let [a, b, c] = &self.positions;
        (b - a).cross(&(c - a)).normalize()
    }

    pub fn area(&self) -> f64 {
        let [a, b, c] = &self.positions;
        (b - a).cross(&(c - a)).norm() / 2.0
    }

    /// Reverse the winding, keeping each vertex's attributes attached
    fn reverse(&mut self) {
        self.positions.swap(1, 2);
        self.normals.swap(1, 2);
        self.uvs.swap(1, 2);
    }
}

/// Triangle soup; operations that combine models return new ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    faces: Vec<Face>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_faces(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn set_material(&mut self, material: &str) {
        for face in &mut self.faces {
            face.material = material.to_string();
        }
    }

    pub fn move_by(&mut self, delta: &Vector3<f64>) {
        for face in &mut self.faces {
            for p in &mut face.positions {
                *p += *delta;
            }
        }
    }

    /// Apply a linear map; normals use the inverse transpose
    pub fn transform(&mut self, matrix: &Matrix3<f64>) {
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        let flips = matrix.determinant() < 0.0;

        for face in &mut self.faces {
            for p in &mut face.positions {
                *p = Point3::from(matrix * p.coords);
            }
            for n in &mut face.normals {
                let mapped = normal_matrix * *n;
                *n = if mapped.norm() > 0.0 {
                    mapped.normalize()
                } else {
                    mapped
                };
            }
            if flips {
                face.reverse();
            }
        }
    }

    /// Apply a 4x4 affine matrix
    pub fn transform_affine(&mut self, matrix: &Matrix4<f64>) {
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let translation = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        self.transform(&linear);
        self.move_by(&translation);
    }

    /// Reflect through the plane through the origin with normal `plane`
    pub fn mirror(&mut self, plane: &Vector3<f64>) {
        let n = plane.normalize();
        let reflection = Matrix3::identity() - n * n.transpose() * 2.0;
        self.transform(&reflection);
    }

    pub fn scale(&mut self, s: &Vector3<f64>) {
        self.transform(&Matrix3::from_diagonal(s));
    }

    /// Concatenate faces without any CSG
    pub fn append(&mut self, other: Model) {
        self.faces.extend(other.faces);
    }

    pub fn join(&self, other: &Model) -> Model {
        self.join_with(other, &CsgSettings::default())
    }

    pub fn join_with(&self, other: &Model, settings: &CsgSettings) -> Model {
        Model::from_csg(&self.to_csg().union(&other.to_csg(), settings))
    }

    pub fn subtract(&self, other: &Model) -> Model {
        self.subtract_with(other, &CsgSettings::default())
    }

    pub fn subtract_with(&self, other: &Model, settings: &CsgSettings) -> Model {
        Model::from_csg(&self.to_csg().subtract(&other.to_csg(), settings))
    }

    pub fn intersect(&self, other: &Model) -> Model {
        self.intersect_with(other, &CsgSettings::default())
    }

    pub fn intersect_with(&self, other: &Model, settings: &CsgSettings) -> Model {
        Model::from_csg(&self.to_csg().intersect(&other.to_csg(), settings))
    }

    /// Convex hull of the vertices of both models
    pub fn hull(&self, other: &Model) -> Result<Model, HullError> {
        let mut index: AHashMap<[i64; 3], usize> = AHashMap::new();
        let mut points = Vec::new();
        for face in self.faces.iter().chain(other.faces.iter()) {
            for p in &face.positions {
                index.entry(position_key(p)).or_insert_with(|| {
                    points.push(*p);
                    points.len() - 1
                });
            }
        }

        if points.len() < 4 {
            return Ok(Model::new());
        }

        let material = self.common_material(other);
        let faces = convex_hull(&points)?
            .into_iter()
            .map(|[a, b, c]| {
                let mut face = Face::new(points[a], points[b], points[c]);
                face.material = material.clone();
                face
            })
            .collect();
        Ok(Model::from_faces(faces))
    }

    /// Material shared by every face of both models, or the default one
    fn common_material(&self, other: &Model) -> String {
        let mut faces = self.faces.iter().chain(other.faces.iter());
        let Some(first) = faces.next() else {
            return String::new();
        };
        if faces.all(|f| f.material == first.material) {
            first.material.clone()
        } else {
            String::new()
        }
    }

    /// Minkowski sum with `other`
    pub fn minkowski(&self, other: &Model) -> Result<Model, HullError> {
        minkowski_sum(self, other)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.faces.iter().flat_map(|f| f.positions.iter()))
    }

    pub fn faces_by_material<'a>(&'a self, material: &'a str) -> impl Iterator<Item = &'a Face> + 'a {
        self.faces.iter().filter(move |f| f.material == material)
    }

    /// Distinct material tags, sorted
    pub fn materials(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.faces.iter().map(|f| f.material.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Enclosed volume of a closed, outward-wound model
    pub fn volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = &f.positions;
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    /// True if every edge is matched by an opposite edge
    pub fn is_closed(&self) -> bool {
        let mut edges: AHashMap<([i64; 3], [i64; 3]), i64> = AHashMap::new();
        for face in &self.faces {
            let keys = face.positions.map(|p| position_key(&p));
            for i in 0..3 {
                let (a, b) = (keys[i], keys[(i + 1) % 3]);
                if a == b {
                    continue;
                }
                if a < b {
                    *edges.entry((a, b)).or_insert(0) += 1;
                } else {
                    *edges.entry((b, a)).or_insert(0) -= 1;
                }
            }
        }
        edges.values().all(|&count| count == 0)
    }

    pub fn to_csg(&self) -> Csg {
        let mut materials: AHashMap<&str, Rc<str>> = AHashMap::new();
        let polygons = self
            .faces
            .iter()
            .filter_map(|face| {
                let material = materials
                    .entry(face.material.as_str())
                    .or_insert_with(|| Rc::from(face.material.as_str()))
                    .clone();
                let vertices = (0..3)
                    .map(|i| Vertex::new(face.positions[i], face.normals[i], face.uvs[i]))
                    .collect();
                Polygon::new(vertices, material)
            })
            .collect();
        Csg::new(polygons)
    }

    /// Triangulate CSG polygons back into faces; polygons that fail are dropped
    pub fn from_csg(csg: &Csg) -> Model {
        let mut model = Model::new();
        for polygon in &csg.polygons {
            model.add_polygon(polygon);
        }
        model
    }

    fn add_polygon(&mut self, polygon: &Polygon) {
        let points: Vec<Point3<f64>> = polygon.vertices.iter().map(|v| v.position).collect();
        let triangles = match earcut::triangulate(&points) {
            Ok(triangles) => triangles,
            Err(err) => {
                tracing::debug!("dropping polygon with {} vertices: {}", points.len(), err);
                return;
            }
        };

        for [a, b, c] in triangles {
            let (va, vb, vc) = (&polygon.vertices[a], &polygon.vertices[b], &polygon.vertices[c]);
            let mut face = Face::new(va.position, vb.position, vc.position)
                .with_normals([va.normal, vb.normal, vc.normal])
                .with_uvs([va.uv, vb.uv, vc.uv]);
            face.material = polygon.material.to_string();
            self.add_face(face);
        }
    }
}
