// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Builtin modules: primitives, transforms and operations
//!
//! Each module receives its already-evaluated children and returns the
//! nodes it contributes. Bad arguments are logged and produce no nodes.

use super::args::{as_index_list, as_vec2, as_vec3, fragments, parse_args};
use super::color::{material_tag, parse_color};
use crate::lang::error::EvalError;
use crate::lang::interpreter::Interpreter;
use crate::lang::scope::{BuiltinModuleFn, Module, Scope};
use crate::lang::value::{ArgValue, Value};
use crate::tree::{ExtrudeParams, Node};
use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector2, Vector3};

type NodeResult = Result<Vec<Node>, EvalError>;

const TABLE: &[(&str, BuiltinModuleFn)] = &[
    ("cube", cube),
    ("sphere", sphere),
    ("cylinder", cylinder),
    ("circle", circle),
    ("square", square),
    ("polygon", polygon),
    ("polyhedron", polyhedron),
    ("linear_extrude", linear_extrude),
    ("translate", translate),
    ("rotate", rotate),
    ("scale", scale),
    ("mirror", mirror),
    ("multmatrix", multmatrix),
    ("color", color),
    ("union", |_, _, _, children| Ok(vec![Node::Union(children)])),
    ("difference", |_, _, _, children| Ok(vec![Node::Difference(children)])),
    ("intersection", |_, _, _, children| Ok(vec![Node::Intersection(children)])),
    ("hull", hull),
    ("minkowski", minkowski),
    ("echo", echo),
    ("assert", assert),
];

pub fn register(scope: &Scope<'_>) {
    for (name, call) in TABLE {
        scope.set_module(*name, Module::Builtin { name: *name, call: *call });
    }
}

// ---------------------------------------------------------------------------
// Solids
// ---------------------------------------------------------------------------

fn cube(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "cube", args, &["size", "center"]);
    let size = match args.get("size") {
        Value::Undefined => Some(Vector3::new(1.0, 1.0, 1.0)),
        value => as_vec3(interp, &value),
    };
    let Some(size) = size else {
        return Ok(Vec::new());
    };

    let node = Node::Cube(size);
    Ok(vec![if args.flag("center") {
        node
    } else {
        Node::translate(size * 0.5, vec![node])
    }])
}

/// `r`, else half of `d`, else 1; non-positive radii become 1
fn sphere(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "sphere", args, &["r", "d"]);
    let radius = args
        .number("r")
        .or_else(|| args.number("d").map(|d| d / 2.0))
        .filter(|r| *r > 0.0)
        .unwrap_or(1.0);
    Ok(vec![Node::Sphere {
        radius,
        segments: fragments(ctx, radius),
    }])
}

/// `r`/`d` set both radii; `r1`/`d1` and `r2`/`d2` override one end each
fn cylinder(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(
        interp,
        ctx,
        "cylinder",
        args,
        &["h", "r1", "r2", "center", "r", "d", "d1", "d2"],
    );
    let height = args.number("h").filter(|h| *h > 0.0).unwrap_or(1.0);
    let both = args
        .number("r")
        .or_else(|| args.number("d").map(|d| d / 2.0))
        .unwrap_or(1.0);
    let r1 = args
        .number("r1")
        .or_else(|| args.number("d1").map(|d| d / 2.0))
        .unwrap_or(both);
    let r2 = args
        .number("r2")
        .or_else(|| args.number("d2").map(|d| d / 2.0))
        .unwrap_or(both);

    let node = Node::Cylinder {
        height,
        r1,
        r2,
        segments: fragments(ctx, r1.max(r2)),
    };
    Ok(vec![if args.flag("center") {
        Node::translate(Vector3::new(0.0, 0.0, -height / 2.0), vec![node])
    } else {
        node
    }])
}

/// Unit-height disc on z in [0, 1]
fn circle(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "circle", args, &["r", "d"]);
    let radius = match args.number("r").or_else(|| args.number("d").map(|d| d / 2.0)) {
        Some(r) => r,
        None => {
            interp.log("ERROR: Invalid arguments for circle");
            1.0
        }
    };
    Ok(vec![Node::Cylinder {
        height: 1.0,
        r1: radius,
        r2: radius,
        segments: fragments(ctx, radius),
    }])
}

/// Unit-height box on z in [0, 1]
fn square(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "square", args, &["size", "center"]);
    let size = match args.get("size") {
        Value::Undefined => Some(Vector2::new(1.0, 1.0)),
        value => as_vec2(interp, &value),
    };
    let Some(size) = size else {
        return Ok(Vec::new());
    };

    let offset = if args.flag("center") {
        Vector3::new(0.0, 0.0, 0.5)
    } else {
        Vector3::new(size.x / 2.0, size.y / 2.0, 0.5)
    };
    Ok(vec![Node::translate(
        offset,
        vec![Node::Cube(Vector3::new(size.x, size.y, 1.0))],
    )])
}

/// `points` with optional `paths`; extra paths are holes cut from the first
fn polygon(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    if args.is_empty() {
        interp.log("ERROR: Invalid arguments for polygon");
        return Ok(Vec::new());
    }
    let args = parse_args(interp, ctx, "polygon", args, &["points", "paths"]);
    let points_value = args.get("points");
    let Some(raw_points) = points_value.as_list() else {
        interp.log("ERROR: Invalid arguments for polygon: first argument should be a list");
        return Ok(Vec::new());
    };

    let mut points = Vec::with_capacity(raw_points.len());
    for value in raw_points {
        match as_vec2(interp, value) {
            Some(p) => points.push(p),
            None => {
                interp.log("ERROR: Invalid point in polygon");
                return Ok(Vec::new());
            }
        }
    }

    let paths = args.get("paths");
    let Some(path_values) = paths.as_list() else {
        return Ok(vec![Node::Polygon(points)]);
    };
    if path_values.is_empty() {
        interp.log("ERROR: Empty paths in polygon");
        return Ok(Vec::new());
    }

    let raw_paths: Vec<Vec<i64>> = if matches!(path_values[0], Value::List(_)) {
        let Some(outer) = as_index_list(&path_values[0]) else {
            interp.log("ERROR: Invalid paths for polygon");
            return Ok(Vec::new());
        };
        std::iter::once(outer)
            .chain(path_values[1..].iter().filter_map(as_index_list))
            .collect()
    } else {
        match as_index_list(&paths) {
            Some(single) => vec![single],
            None => {
                interp.log("ERROR: Invalid paths for polygon");
                return Ok(Vec::new());
            }
        }
    };

    let mut rings: Vec<Vec<Vector2<f64>>> = Vec::new();
    for path in raw_paths {
        let ring: Option<Vec<Vector2<f64>>> = path
            .iter()
            .map(|&i| usize::try_from(i).ok().and_then(|i| points.get(i).copied()))
            .collect();
        let ring = match ring {
            Some(ring) if ring.len() >= 3 => ring,
            Some(_) => {
                interp.log("ERROR: Too short path for polygon");
                if rings.is_empty() {
                    return Ok(Vec::new());
                }
                continue;
            }
            None => {
                interp.log("ERROR: Invalid points index in polygon");
                if rings.is_empty() {
                    return Ok(Vec::new());
                }
                continue;
            }
        };
        rings.push(ring);
    }

    Ok(vec![if rings.len() == 1 {
        Node::Polygon(rings.remove(0))
    } else {
        Node::Difference(rings.into_iter().map(Node::Polygon).collect())
    }])
}

fn polyhedron(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], _: Vec<Node>) -> NodeResult {
    let args = parse_args(
        interp,
        ctx,
        "polyhedron",
        args,
        &["points", "faces", "convexity", "triangles"],
    );
    let points_value = args.get("points");
    let faces_value = match args.get("faces") {
        Value::List(faces) => Value::List(faces),
        _ => args.get("triangles"),
    };
    let (Some(raw_points), Some(raw_faces)) = (points_value.as_list(), faces_value.as_list()) else {
        interp.log("ERROR: Invalid arguments for polyhedron");
        return Ok(Vec::new());
    };

    let mut points = Vec::with_capacity(raw_points.len());
    for value in raw_points {
        match as_vec3(interp, value) {
            Some(p) => points.push(Point3::from(p)),
            None => {
                interp.log(format!("ERROR: Invalid arguments for polyhedron (invalid point: {})", value));
                return Ok(Vec::new());
            }
        }
    }

    let mut faces = Vec::with_capacity(raw_faces.len());
    for value in raw_faces {
        let Some(indices) = value.as_list() else {
            interp.log("ERROR: Invalid arguments for polyhedron");
            return Ok(Vec::new());
        };
        let mut face = Vec::with_capacity(indices.len());
        for index in indices {
            let Some(n) = index.as_number() else {
                interp.log("ERROR: Invalid arguments for polyhedron (invalid index)");
                return Ok(Vec::new());
            };
            if n < 0.0 || n as usize >= points.len() {
                interp.log("ERROR: Invalid arguments for polyhedron (point index is out of range)");
                return Ok(Vec::new());
            }
            face.push(n as usize);
        }
        if face.len() < 3 {
            interp.log("ERROR: Invalid arguments for polyhedron (invalid face (less than 3 points))");
            return Ok(Vec::new());
        }
        faces.push(face);
    }

    Ok(vec![Node::Polyhedron { points, faces }])
}

/// Extrudes the downward-facing footprint of the children
fn linear_extrude(
    interp: &Interpreter<'_>,
    ctx: &Scope<'_>,
    args: &[ArgValue],
    children: Vec<Node>,
) -> NodeResult {
    let args = parse_args(
        interp,
        ctx,
        "linear_extrude",
        args,
        &["height", "v", "center", "convexity", "twist", "slices", "scale"],
    );
    let defaults = ExtrudeParams::default();
    let height = args.number("height").unwrap_or(defaults.height);
    let twist = args.number("twist").unwrap_or(defaults.twist);
    let slices = if twist == 0.0 {
        1
    } else {
        args.number("slices")
            .map_or(defaults.slices, |s| s.max(1.0) as usize)
    };
    let params = ExtrudeParams {
        height,
        twist,
        scale: args.number("scale").unwrap_or(defaults.scale),
        slices,
    };

    let node = Node::LinearExtrude { params, children };
    Ok(vec![if args.flag("center") {
        Node::translate(Vector3::new(0.0, 0.0, -height / 2.0), vec![node])
    } else {
        node
    }])
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

fn translate(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "translate", args, &["v"]);
    match as_vec3(interp, &args.get("v")) {
        Some(v) => Ok(vec![Node::translate(v, children)]),
        None => {
            interp.log("ERROR: Invalid argument for translate");
            Ok(Vec::new())
        }
    }
}

/// Angle vector applied x, then y, then z; or `a` degrees about axis `v`
/// (the z axis when `v` is absent)
fn rotate(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "rotate", args, &["a", "v"]);
    let rotation = match (args.get("a"), args.get("v")) {
        (Value::List(_), _) => as_vec3(interp, &args.get("a")).map(|angles| {
            Rotation3::from_euler_angles(
                angles.x.to_radians(),
                angles.y.to_radians(),
                angles.z.to_radians(),
            )
        }),
        (Value::Number(a), Value::Undefined) => {
            Some(Rotation3::from_axis_angle(&Vector3::z_axis(), a.to_radians()))
        }
        (Value::Number(a), v) => as_vec3(interp, &v)
            .and_then(|axis| Unit::try_new(axis, 1e-12))
            .map(|axis| Rotation3::from_axis_angle(&axis, a.to_radians())),
        _ => None,
    };

    match rotation {
        Some(rotation) => Ok(vec![Node::affine(
            Some(snap(rotation.into_inner())),
            None,
            children,
        )]),
        None => {
            interp.log("ERROR: Invalid argument for rotate");
            Ok(Vec::new())
        }
    }
}

fn scale(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "scale", args, &["v"]);
    match as_vec3(interp, &args.get("v")) {
        Some(v) => Ok(vec![Node::affine(Some(Matrix3::from_diagonal(&v)), None, children)]),
        None => {
            interp.log("ERROR: Invalid argument for scale");
            Ok(Vec::new())
        }
    }
}

/// Reflection across the plane through the origin with normal `v`
fn mirror(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "mirror", args, &["v"]);
    let Some(normal) = as_vec3(interp, &args.get("v")) else {
        interp.log("ERROR: Invalid argument for mirror");
        return Ok(Vec::new());
    };
    let length_sq = normal.norm_squared();
    let matrix = if length_sq > 0.0 {
        Matrix3::identity() - normal * normal.transpose() * (2.0 / length_sq)
    } else {
        Matrix3::identity()
    };
    Ok(vec![Node::affine(Some(matrix), None, children)])
}

/// Upper 3x4 block of a row-major matrix; missing cells keep the identity
fn multmatrix(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "multmatrix", args, &["m"]);
    let m = args.get("m");
    let Some(rows) = m.as_list() else {
        interp.log("ERROR: Invalid argument for multmatrix");
        return Ok(Vec::new());
    };

    let mut linear = Matrix3::identity();
    let mut offset = Vector3::zeros();
    for (r, row) in rows.iter().take(3).enumerate() {
        let Some(cells) = row.as_list() else {
            interp.log("ERROR: Invalid argument for multmatrix");
            return Ok(Vec::new());
        };
        for (c, cell) in cells.iter().take(4).enumerate() {
            if let Some(x) = cell.as_number() {
                if c < 3 {
                    linear[(r, c)] = x;
                } else {
                    offset[r] = x;
                }
            }
        }
    }
    Ok(vec![Node::affine(Some(linear), Some(offset), children)])
}

/// Round entries within 1e-12 of -1, 0 or 1 so axis rotations stay exact
fn snap(mut m: Matrix3<f64>) -> Matrix3<f64> {
    for v in m.iter_mut() {
        let r = v.round();
        if (*v - r).abs() < 1e-12 {
            *v = r;
        }
    }
    m
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// `c` as an RGB(A) vector or a color string; anything else passes children through
fn color(interp: &Interpreter<'_>, ctx: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    let args = parse_args(interp, ctx, "color", args, &["c", "alpha"]);
    let rgb = match args.get("c") {
        Value::List(items) => {
            let mut rgb = [0.0; 3];
            for (slot, item) in rgb.iter_mut().zip(items.iter()) {
                if let Some(x) = item.as_number() {
                    *slot = x;
                }
            }
            rgb
        }
        Value::String(s) => {
            let [r, g, b, _] = parse_color(interp, &s);
            [r, g, b]
        }
        _ => return Ok(children),
    };
    Ok(vec![Node::Material {
        id: material_tag(rgb),
        children,
    }])
}

fn hull(interp: &Interpreter<'_>, _: &Scope<'_>, _: &[ArgValue], children: Vec<Node>) -> NodeResult {
    if children.is_empty() {
        interp.log("ERROR: no children for hull");
        return Ok(Vec::new());
    }
    Ok(vec![Node::Hull(children)])
}

fn minkowski(interp: &Interpreter<'_>, _: &Scope<'_>, _: &[ArgValue], children: Vec<Node>) -> NodeResult {
    if children.len() != 2 {
        interp.log("ERROR: invalid children count for minkowski");
        return Ok(Vec::new());
    }
    Ok(vec![Node::Minkowski(children)])
}

fn echo(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    interp.echo(args);
    Ok(children)
}

fn assert(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue], children: Vec<Node>) -> NodeResult {
    interp.check_assertion(args);
    Ok(children)
}
