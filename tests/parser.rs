// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grammar and parser-engine behaviour through the public API

use scadforge::diagnostics::MemorySink;
use scadforge::lang::{parse_program, Interpreter, StmtKind};
use scadforge::parser::{PResult, Parser, Whitespace};
use scadforge::Node;

fn evaluate(source: &str) -> Vec<Node> {
    let sink = MemorySink::new();
    let program = parse_program(source, None, false).unwrap_or_else(|e| panic!("{}", e));
    let nodes = Interpreter::new(&sink).run(&program).unwrap();
    assert!(sink.messages().is_empty(), "{:?}", sink.messages());
    nodes
}

fn keys(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(Node::key).collect()
}

#[test]
fn printed_tree_evaluates_to_same_keys() {
    let source = r#"
        $fn = 12;
        module post(h) cylinder(h = h, r1 = 1, r2 = 0.5);
        difference() {
            cube(4, center = true);
            translate([1, 0, 0]) rotate([0, 0, 30]) sphere(2);
            mirror([1, 1, 0]) post(6);
        }
        color("orange") linear_extrude(height = 2, twist = 45, slices = 3) square([1, 2]);
        hull() { cube(1); translate([3, 0, 0]) scale([1, 2, 1]) cube(1); }
        polyhedron(points = [[0,0,0],[1,0,0],[0,1,0],[0,0,1]], faces = [[0,1,2],[0,3,1],[0,2,3],[1,3,2]]);
        polygon([[0,0],[2,0],[1,1.5]]);
    "#;

    let first = evaluate(source);
    assert_eq!(first.len(), 5);

    let printed: String = first.iter().map(Node::to_openscad).collect();
    let second = evaluate(&printed);
    assert_eq!(keys(&first), keys(&second), "printed:\n{}", printed);
}

#[test]
fn packrat_and_plain_parses_agree() {
    let source = "a = [for (i = [0:2]) i * 2]; module m(x = 1) { cube(x); } m(a[1]); // done\n/* tail */";
    let plain = parse_program(source, None, false).unwrap();
    let memo = parse_program(source, None, true).unwrap();
    assert_eq!(plain, memo);
    assert_eq!(plain.statements.len(), 3);
}

fn sum(p: &mut Parser) -> PResult<f64> {
    p.rule("Sum", |p| {
        let left = sum(p)?;
        p.literal("+")?;
        Ok(left + p.float()?)
    })
}

#[test]
fn left_recursion_terminates_with_memoization() {
    let mut p = Parser::new("1 + 2")
        .with_whitespace(Whitespace::c_like())
        .with_packrat();
    let err = sum(&mut p).unwrap_err();
    assert!(err.to_string().contains("Left recursion detected"));
}

#[test]
fn errors_point_at_the_failure() {
    let err = parse_program("cube(1);\nsphere(;\n", None, false).unwrap_err();
    assert_eq!(err.location().line, 2);
    assert!(err.render(0).contains("line 2"));
}

#[test]
fn includes_are_recorded_unresolved() {
    let program = parse_program("include <parts/a.scad>\nuse <b.scad>\ncube(1);", None, false).unwrap();
    assert!(matches!(
        &program.statements[0].kind,
        StmtKind::Include { path, program: None } if path == "parts/a.scad"
    ));
    assert!(matches!(&program.statements[1].kind, StmtKind::Use { .. }));
}
