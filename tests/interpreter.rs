// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Script evaluation through the public API

use nalgebra::Vector3;
use scadforge::diagnostics::MemorySink;
use scadforge::lang::{parse_program, Interpreter};
use scadforge::{EvalError, Node};

fn run(source: &str, sink: &MemorySink) -> Result<Vec<Node>, EvalError> {
    let program = parse_program(source, None, false).unwrap_or_else(|e| panic!("{}", e));
    Interpreter::new(sink).run(&program)
}

fn echoes(source: &str) -> Vec<String> {
    let sink = MemorySink::new();
    run(source, &sink).unwrap();
    sink.messages()
}

#[test]
fn recursive_functions() {
    assert_eq!(
        echoes("function fact(n) = n <= 1 ? 1 : n * fact(n - 1); echo(fact(5));"),
        vec!["ECHO: 120"]
    );
    assert_eq!(
        echoes(
            "function sum(v, i = 0) = i >= len(v) ? 0 : v[i] + sum(v, i + 1);\n\
             echo(total = sum([for (x = [1:4]) x * x]));"
        ),
        vec!["ECHO: total=30"]
    );
}

#[test]
fn strings_and_lists() {
    assert_eq!(
        echoes("echo(str(\"w\", 2, [1, 2]), len(\"abc\"), concat([1], [2, 3]));"),
        vec!["ECHO: \"w2[1, 2]\", 3, [1, 2, 3]"]
    );
}

#[test]
fn let_and_conditionals() {
    let sink = MemorySink::new();
    let nodes = run(
        "let (s = 3) if (s > 2) cube(s); else sphere(s);\n\
         x = 1; if (x == 2) cube(1);",
        &sink,
    )
    .unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(
        nodes[0],
        Node::translate(
            Vector3::new(1.5, 1.5, 1.5),
            vec![Node::Cube(Vector3::new(3.0, 3.0, 3.0))]
        )
    );
}

#[test]
fn children_selection_and_count() {
    let sink = MemorySink::new();
    let nodes = run(
        "module second() { echo($children); children(1); }\n\
         second() { cube(1, true); sphere(1, $fn = 5); cube(2, true); }",
        &sink,
    )
    .unwrap();
    assert_eq!(
        nodes,
        vec![Node::Sphere {
            radius: 1.0,
            segments: 5
        }]
    );
    assert_eq!(sink.messages(), vec!["ECHO: 3"]);
}

#[test]
fn special_variables_reach_nested_calls() {
    let sink = MemorySink::new();
    let nodes = run("module ball() sphere(2);\nball($fn = 7);", &sink).unwrap();
    assert_eq!(
        nodes,
        vec![Node::Sphere {
            radius: 2.0,
            segments: 7
        }]
    );
}

#[test]
fn intersection_for_groups_iterations() {
    let sink = MemorySink::new();
    let nodes = run(
        "intersection_for (i = [0:2]) rotate([0, 0, i * 30]) cube(2, center = true);",
        &sink,
    )
    .unwrap();
    match &nodes[..] {
        [Node::Intersection(children)] => assert_eq!(children.len(), 3),
        other => panic!("unexpected {:?}", other),
    }

    let none = run("for (i = []) cube(i);", &sink).unwrap();
    assert!(none.is_empty());
}

#[test]
fn failures_are_logged_not_fatal() {
    let sink = MemorySink::new();
    let nodes = run(
        "x = [0:1:100000];\n\
         echo(undefined_fn(1));\n\
         cube([1, 2]);\n\
         minkowski() cube(1);\n\
         color(\"notacolor\") sphere(1);",
        &sink,
    )
    .unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(sink.contains("ERROR: list is too long"));
    assert!(sink.contains("ERROR: Invalid value for vector"));
    assert!(sink.contains("ERROR: invalid children count for minkowski"));
    assert!(sink.contains("WARNING: invalid color notacolor"));
}

#[test]
fn deep_module_recursion_hits_the_ceiling() {
    let sink = MemorySink::new();
    let program = parse_program("module nest(n) nest(n + 1) cube(1); nest(0);", None, false).unwrap();
    let result = Interpreter::new(&sink).with_max_depth(16).run(&program);
    assert!(matches!(result, Err(EvalError::RecursionLimit { .. })));
}
