// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! `include` and `use` across files on disk

use approx::assert_relative_eq;
use scadforge::diagnostics::{MemorySink, NullSink};
use scadforge::{Kernel, KernelConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn include_brings_definitions_and_geometry() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("lib.scad"),
        "size = 3;\nmodule post() cylinder(h = size, r = 1, $fn = 8);\n",
    )
    .unwrap();
    let main = dir.path().join("main.scad");
    fs::write(&main, "include <lib.scad>\npost();\n").unwrap();

    let model = Kernel::new().render_file(&NullSink, &main).unwrap();
    let bbox = model.bounding_box();
    assert_relative_eq!(bbox.min.z, 0.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.max.z, 3.0, epsilon = 1e-9);
}

#[test]
fn use_imports_only_modules_and_functions() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("lib.scad"),
        "w = 9;\nmodule slab() cube([2, 2, 1]);\nfunction twice(x) = 2 * x;\ncube(100);\n",
    )
    .unwrap();
    let main = dir.path().join("main.scad");
    fs::write(
        &main,
        "use <lib.scad>\nslab();\necho(twice(3));\necho(is_undef(w));\n",
    )
    .unwrap();

    let sink = MemorySink::new();
    let kernel = Kernel::new();
    let nodes = kernel.evaluate_file(&sink, &main).unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(sink.contains("ECHO: 6"));
    assert!(sink.contains("ECHO: true"));
}

#[test]
fn includer_keeps_the_copy_it_resolved() {
    let dir = TempDir::new().unwrap();
    let part = dir.path().join("part.scad");
    let main = dir.path().join("main.scad");
    fs::write(&part, "cube(2);\n").unwrap();
    fs::write(&main, "include <part.scad>\n").unwrap();

    let mut kernel = Kernel::new();
    let before = kernel.render_file(&NullSink, &main).unwrap();
    assert_relative_eq!(before.bounding_box().max.x, 2.0, epsilon = 1e-9);

    fs::write(&part, "cube(12);\n").unwrap();

    let unchanged = kernel.render_file(&NullSink, &main).unwrap();
    assert_relative_eq!(unchanged.bounding_box().max.x, 2.0, epsilon = 1e-9);

    let direct = kernel.render_file(&NullSink, &part).unwrap();
    assert_relative_eq!(direct.bounding_box().max.x, 12.0, epsilon = 1e-9);
}

#[test]
fn search_paths_are_consulted_after_the_includer_directory() {
    let libs = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(libs.path().join("shared.scad"), "module peg() cube([1, 1, 4]);\n").unwrap();
    let main = project.path().join("main.scad");
    fs::write(&main, "include <shared.scad>\npeg();\n").unwrap();

    let sink = MemorySink::new();
    let missing = Kernel::new().evaluate_file(&sink, &main).unwrap();
    assert!(missing.is_empty());
    assert!(sink.contains("ERROR: Can't find file shared.scad"));

    let config = KernelConfig {
        search_paths: vec![libs.path().to_path_buf()],
        ..KernelConfig::default()
    };
    let mut kernel = Kernel::with_config(config);
    let model = kernel.render_file(&NullSink, &main).unwrap();
    assert_relative_eq!(model.bounding_box().max.z, 4.0, epsilon = 1e-9);
}
