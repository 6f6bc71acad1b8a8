// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction tree node definitions

use nalgebra::{Matrix3, Point3, Vector2, Vector3};
use std::fmt::Write;

/// Fixed-point value with 1/65536 resolution, truncated toward zero
pub fn quantize(v: f64) -> i64 {
    (v * 65536.0) as i64
}

fn quantize_vec3(v: &Vector3<f64>) -> String {
    format!("[{},{},{}]", quantize(v.x), quantize(v.y), quantize(v.z))
}

fn quantize_vec2(v: &Vector2<f64>) -> String {
    format!("[{},{}]", quantize(v.x), quantize(v.y))
}

fn quantize_mat3(m: &Matrix3<f64>) -> String {
    let cells: Vec<String> = (0..3)
        .flat_map(|r| (0..3).map(move |c| (r, c)))
        .map(|(r, c)| quantize(m[(r, c)]).to_string())
        .collect();
    format!("[[{}]]", cells.join(","))
}

/// Parameters of `linear_extrude`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeParams {
    pub height: f64,
    /// Degrees
    pub twist: f64,
    pub scale: f64,
    pub slices: usize,
}

impl Default for ExtrudeParams {
    fn default() -> Self {
        Self {
            height: 1.0,
            twist: 0.0,
            scale: 1.0,
            slices: 20,
        }
    }
}

/// Immutable modeling operation; children are owned by value
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Centered box
    Cube(Vector3<f64>),
    Sphere {
        radius: f64,
        segments: usize,
    },
    Cylinder {
        height: f64,
        r1: f64,
        r2: f64,
        segments: usize,
    },
    Polygon(Vec<Vector2<f64>>),
    Polyhedron {
        points: Vec<Point3<f64>>,
        faces: Vec<Vec<usize>>,
    },

    /// Linear map then translation; `None` parts are identity
    Affine {
        matrix: Option<Matrix3<f64>>,
        offset: Option<Vector3<f64>>,
        children: Vec<Node>,
    },
    Material {
        id: String,
        children: Vec<Node>,
    },
    LinearExtrude {
        params: ExtrudeParams,
        children: Vec<Node>,
    },

    Union(Vec<Node>),
    Difference(Vec<Node>),
    Intersection(Vec<Node>),
    Hull(Vec<Node>),
    Minkowski(Vec<Node>),
}

impl Node {
    /// Affine node with identity parts dropped, so equal transforms share a key
    pub fn affine(matrix: Option<Matrix3<f64>>, offset: Option<Vector3<f64>>, children: Vec<Node>) -> Self {
        Node::Affine {
            matrix: matrix.filter(|m| *m != Matrix3::identity()),
            offset: offset.filter(|v| *v != Vector3::zeros()),
            children,
        }
    }

    pub fn translate(offset: Vector3<f64>, children: Vec<Node>) -> Self {
        Node::affine(None, Some(offset), children)
    }

    /// Child nodes
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Affine { children, .. }
            | Node::Material { children, .. }
            | Node::LinearExtrude { children, .. }
            | Node::Union(children)
            | Node::Difference(children)
            | Node::Intersection(children)
            | Node::Hull(children)
            | Node::Minkowski(children) => children,
            _ => &[],
        }
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }

    /// Canonical key; equal keys render to equal models
    pub fn key(&self) -> String {
        let mut out = String::new();
        self.write_key(&mut out);
        out
    }

    fn write_children_key(children: &[Node], out: &mut String) {
        for (i, child) in children.iter().enumerate() {
            if i != 0 {
                out.push('_');
            }
            child.write_key(out);
        }
    }

    fn write_key(&self, out: &mut String) {
        match self {
            Node::Cube(size) => {
                out.push_str("CUBE");
                out.push_str(&quantize_vec3(size));
            }
            Node::Sphere { radius, segments } => {
                let _ = write!(out, "SPHERE({}${})", quantize(*radius), segments);
            }
            Node::Cylinder {
                height,
                r1,
                r2,
                segments,
            } => {
                let _ = write!(
                    out,
                    "CYLINDER({}:{}:{}${})",
                    quantize(*height),
                    quantize(*r1),
                    quantize(*r2),
                    segments
                );
            }
            Node::Polygon(points) => {
                let points: Vec<String> = points.iter().map(quantize_vec2).collect();
                let _ = write!(out, "POLYGON({})", points.join("/"));
            }
            Node::Polyhedron { points, faces } => {
                let points: Vec<String> = points.iter().map(|p| quantize_vec3(&p.coords)).collect();
                let faces: Vec<String> = faces
                    .iter()
                    .map(|f| {
                        let idx: Vec<String> = f.iter().map(usize::to_string).collect();
                        format!("[{}]", idx.join(","))
                    })
                    .collect();
                let _ = write!(out, "POLYHEDRON({};{})", points.join("/"), faces.join("/"));
            }
            Node::Affine {
                matrix,
                offset,
                children,
            } => {
                out.push_str("AFFINE");
                if let Some(m) = matrix {
                    out.push_str(&quantize_mat3(m));
                }
                out.push('/');
                if let Some(v) = offset {
                    out.push_str(&quantize_vec3(v));
                }
                out.push('(');
                Self::write_children_key(children, out);
                out.push(')');
            }
            Node::Material { id, children } => {
                let _ = write!(out, "MATERIAL{}(", id);
                Self::write_children_key(children, out);
                out.push(')');
            }
            Node::LinearExtrude { params, children } => {
                let _ = write!(
                    out,
                    "EXTRUDE[{},{},{},{}{{",
                    quantize(params.height),
                    quantize(params.twist),
                    quantize(params.scale),
                    params.slices
                );
                Self::write_children_key(children, out);
                out.push('}');
            }
            Node::Union(children)
            | Node::Difference(children)
            | Node::Intersection(children)
            | Node::Hull(children)
            | Node::Minkowski(children) => {
                let tag = match self {
                    Node::Union(_) => "UNION",
                    Node::Difference(_) => "DIFFERENCE",
                    Node::Intersection(_) => "INTERSECTION",
                    Node::Hull(_) => "HULL",
                    _ => "MINKOWSKI",
                };
                out.push_str(tag);
                out.push('{');
                Self::write_children_key(children, out);
                out.push('}');
            }
        }
    }

    /// Script text that evaluates back to a node with the same key
    pub fn to_openscad(&self) -> String {
        let mut out = String::new();
        self.write_openscad(&mut out, 0);
        out
    }

    fn write_block(&self, out: &mut String, indent: usize, head: &str, children: &[Node]) {
        let pad = "  ".repeat(indent);
        let _ = writeln!(out, "{}{} {{", pad, head);
        for child in children {
            child.write_openscad(out, indent + 1);
        }
        let _ = writeln!(out, "{}}}", pad);
    }

    fn write_openscad(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            Node::Cube(s) => {
                let _ = writeln!(out, "{}cube([{}, {}, {}], center = true);", pad, s.x, s.y, s.z);
            }
            Node::Sphere { radius, segments } => {
                let _ = writeln!(out, "{}sphere(r = {}, $fn = {});", pad, radius, segments);
            }
            Node::Cylinder {
                height,
                r1,
                r2,
                segments,
            } => {
                let _ = writeln!(
                    out,
                    "{}cylinder(h = {}, r1 = {}, r2 = {}, $fn = {});",
                    pad, height, r1, r2, segments
                );
            }
            Node::Polygon(points) => {
                let points: Vec<String> = points.iter().map(|p| format!("[{}, {}]", p.x, p.y)).collect();
                let _ = writeln!(out, "{}polygon([{}]);", pad, points.join(", "));
            }
            Node::Polyhedron { points, faces } => {
                let points: Vec<String> = points
                    .iter()
                    .map(|p| format!("[{}, {}, {}]", p.x, p.y, p.z))
                    .collect();
                let faces: Vec<String> = faces
                    .iter()
                    .map(|f| {
                        let idx: Vec<String> = f.iter().map(usize::to_string).collect();
                        format!("[{}]", idx.join(", "))
                    })
                    .collect();
                let _ = writeln!(
                    out,
                    "{}polyhedron(points = [{}], faces = [{}]);",
                    pad,
                    points.join(", "),
                    faces.join(", ")
                );
            }
            Node::Affine {
                matrix,
                offset,
                children,
            } => {
                let b = offset.unwrap_or_else(Vector3::zeros);
                let head = match matrix {
                    None => format!("translate([{}, {}, {}])", b.x, b.y, b.z),
                    Some(a) => {
                        let rows: Vec<String> = (0..3)
                            .map(|r| format!("[{}, {}, {}, {}]", a[(r, 0)], a[(r, 1)], a[(r, 2)], b[r]))
                            .collect();
                        format!("multmatrix([{}])", rows.join(", "))
                    }
                };
                self.write_block(out, indent, &head, children);
            }
            Node::Material { id, children } => {
                self.write_block(out, indent, &format!("color(\"{}\")", id), children);
            }
            Node::LinearExtrude { params, children } => {
                let head = format!(
                    "linear_extrude(height = {}, twist = {}, scale = {}, slices = {})",
                    params.height, params.twist, params.scale, params.slices
                );
                self.write_block(out, indent, &head, children);
            }
            Node::Union(children) => self.write_block(out, indent, "union()", children),
            Node::Difference(children) => self.write_block(out, indent, "difference()", children),
            Node::Intersection(children) => self.write_block(out, indent, "intersection()", children),
            Node::Hull(children) => self.write_block(out, indent, "hull()", children),
            Node::Minkowski(children) => self.write_block(out, indent, "minkowski()", children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_truncates() {
        assert_eq!(quantize(1.0), 65536);
        assert_eq!(quantize(-0.5), -32768);
        assert_eq!(quantize(1.0 / 131072.0), 0);
    }

    #[test]
    fn test_primitive_keys() {
        assert_eq!(Node::Cube(Vector3::new(1.0, 2.0, 0.5)).key(), "CUBE[65536,131072,32768]");
        assert_eq!(
            Node::Sphere {
                radius: 1.0,
                segments: 12
            }
            .key(),
            "SPHERE(65536$12)"
        );
        assert_eq!(
            Node::Cylinder {
                height: 2.0,
                r1: 1.0,
                r2: 0.0,
                segments: 8
            }
            .key(),
            "CYLINDER(131072:65536:0$8)"
        );
    }

    #[test]
    fn test_composite_keys() {
        let cube = Node::Cube(Vector3::new(1.0, 1.0, 1.0));
        let union = Node::Union(vec![cube.clone(), cube.clone()]);
        assert_eq!(union.key(), "UNION{CUBE[65536,65536,65536]_CUBE[65536,65536,65536]}");

        let moved = Node::translate(Vector3::new(1.0, 0.0, 0.0), vec![cube.clone()]);
        assert_eq!(moved.key(), "AFFINE/[65536,0,0](CUBE[65536,65536,65536])");

        let tagged = Node::Material {
            id: "#ff0000".into(),
            children: vec![cube],
        };
        assert_eq!(tagged.key(), "MATERIAL#ff0000(CUBE[65536,65536,65536])");
    }

    #[test]
    fn test_key_stable_under_small_perturbation() {
        let a = Node::Cube(Vector3::new(1.0, 2.0, 3.0));
        let b = Node::Cube(Vector3::new(1.0 + 1e-7, 2.0 + 1e-7, 3.0 + 1e-7));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_affine_drops_identity_parts() {
        let node = Node::affine(Some(Matrix3::identity()), Some(Vector3::zeros()), vec![]);
        assert_eq!(
            node,
            Node::Affine {
                matrix: None,
                offset: None,
                children: vec![]
            }
        );
        assert_eq!(node.key(), "AFFINE/()");
    }

    #[test]
    fn test_to_openscad_layout() {
        let node = Node::Difference(vec![
            Node::Cube(Vector3::new(2.0, 2.0, 2.0)),
            Node::Sphere {
                radius: 1.5,
                segments: 16,
            },
        ]);
        assert_eq!(
            node.to_openscad(),
            "difference() {\n  cube([2, 2, 2], center = true);\n  sphere(r = 1.5, $fn = 16);\n}\n"
        );
        assert_eq!(node.count(), 3);
    }
}
