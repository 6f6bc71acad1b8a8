// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end rendering scenarios

use approx::assert_relative_eq;
use scadforge::diagnostics::MemorySink;
use scadforge::lang::{parse_expression, Interpreter};
use scadforge::{Kernel, Model, Value};

fn render(source: &str) -> Model {
    let sink = MemorySink::new();
    let model = Kernel::new()
        .render_source(&sink, source, "scenario.scad")
        .unwrap_or_else(|e| panic!("{:#}", e));
    assert!(
        !sink.messages().iter().any(|m| m.starts_with("ERROR:")),
        "{:?}",
        sink.messages()
    );
    model
}

#[test]
fn centered_cube_has_axis_aligned_faces() {
    let model = render("cube([2,2,2], center=true);");
    assert_eq!(model.len(), 12);

    for face in model.faces() {
        let n = face.normal();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        let axis_aligned = n.iter().filter(|c| c.abs() > 1e-12).count() == 1;
        assert!(axis_aligned, "normal {:?} is not axis aligned", n);
    }

    let bbox = model.bounding_box();
    for i in 0..3 {
        assert_relative_eq!(bbox.min[i], -1.0);
        assert_relative_eq!(bbox.max[i], 1.0);
    }
    assert!(model.is_closed());
    assert_relative_eq!(model.volume(), 8.0, epsilon = 1e-9);
}

#[test]
fn union_of_separated_cubes_keeps_two_vertex_groups() {
    let model = render("union() { cube(1); translate([3, 0, 0]) cube(1); }");
    assert!(!model.is_empty());

    let (mut left, mut right) = (0, 0);
    for face in model.faces() {
        for p in &face.positions {
            if (-1e-9..=1.0 + 1e-9).contains(&p.x) {
                left += 1;
            } else if (3.0 - 1e-9..=4.0 + 1e-9).contains(&p.x) {
                right += 1;
            } else {
                panic!("vertex {:?} outside both cubes", p);
            }
        }
    }
    assert!(left > 0 && right > 0);
    assert_relative_eq!(model.volume(), 2.0, epsilon = 1e-6);
}

#[test]
fn cube_swallowed_by_sphere_leaves_nothing() {
    let model = render("difference(){ cube(10, center=true); sphere(r=20); }");
    assert_eq!(model.len(), 0);
}

#[test]
fn arithmetic_precedence() {
    let sink = MemorySink::new();
    let interp = Interpreter::new(&sink);
    let scope = interp.root_scope();
    let expr = parse_expression("1 + 2 * 3 - 4").unwrap();
    assert_eq!(interp.eval(&scope, &expr).unwrap(), Value::Number(3.0));
}

#[test]
fn hull_of_two_cubes_is_convex() {
    let model = render("hull(){ cube(1); translate([5,0,0]) cube(1); }");
    assert!(!model.is_empty());
    assert!(model.len() < 24);
    assert!(model.is_closed());

    let points: Vec<_> = model.faces().iter().flat_map(|f| f.positions).collect();
    for face in model.faces() {
        let n = face.normal();
        let a = face.positions[0];
        for p in &points {
            assert!(n.dot(&(p - a)) <= 1e-6, "{:?} is outside a hull face", p);
        }
    }

    let bbox = model.bounding_box();
    assert_relative_eq!(bbox.max.x, 6.0, epsilon = 1e-9);
    assert_relative_eq!(model.volume(), 6.0, epsilon = 1e-6);
}
