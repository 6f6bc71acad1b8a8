// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use scadforge::diagnostics::NullSink;
use scadforge::geometry::primitives;
use scadforge::lang::{parse_program, Interpreter};
use scadforge::{render, Kernel};

const COMPLEX: &str = r#"
    module peg(h) { cylinder(h = h, r = 1, $fn = 16); }
    difference() {
        cube([20, 20, 20]);
        translate([10, 10, 10])
            sphere(r = 12, $fn = 24);
        for (i = [0:3]) translate([i * 5, 2, 0]) peg(25);
    }
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let simple = "cube([10, 10, 10]);";
    group.bench_with_input(BenchmarkId::new("simple_cube", ""), &simple, |b, source| {
        b.iter(|| parse_program(black_box(source), None, false).unwrap());
    });

    group.bench_with_input(BenchmarkId::new("complex", ""), &COMPLEX, |b, source| {
        b.iter(|| parse_program(black_box(source), None, false).unwrap());
    });

    group.bench_with_input(BenchmarkId::new("complex_packrat", ""), &COMPLEX, |b, source| {
        b.iter(|| parse_program(black_box(source), None, true).unwrap());
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let program = parse_program(COMPLEX, None, false).unwrap();
    group.bench_function("complex", |b| {
        b.iter(|| Interpreter::new(&NullSink).run(black_box(&program)).unwrap());
    });

    let comprehension =
        parse_program("x = [for (i = [0:999]) if (i % 3 == 0) i * i]; echo(len(x));", None, false).unwrap();
    group.bench_function("comprehension_1000", |b| {
        b.iter(|| Interpreter::new(&NullSink).run(black_box(&comprehension)).unwrap());
    });

    group.finish();
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("cube", |b| {
        b.iter(|| primitives::cube(black_box(&Vector3::new(10.0, 10.0, 10.0))));
    });

    group.bench_function("sphere_32", |b| {
        b.iter(|| primitives::sphere(black_box(10.0), black_box(32)));
    });

    group.bench_function("sphere_64", |b| {
        b.iter(|| primitives::sphere(black_box(10.0), black_box(64)));
    });

    group.bench_function("cylinder", |b| {
        b.iter(|| primitives::cylinder(black_box(5.0), black_box(5.0), black_box(20.0), black_box(32)));
    });

    group.finish();
}

fn bench_boolean_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean_ops");

    let cube = primitives::cube(&Vector3::new(10.0, 10.0, 10.0));
    let mut other = primitives::cube(&Vector3::new(8.0, 8.0, 8.0));
    other.move_by(&Vector3::new(4.0, 4.0, 4.0));
    let sphere = primitives::sphere(6.0, 24);

    group.bench_function("union", |b| {
        b.iter(|| cube.join(black_box(&other)));
    });

    group.bench_function("difference", |b| {
        b.iter(|| cube.subtract(black_box(&other)));
    });

    group.bench_function("intersection_sphere", |b| {
        b.iter(|| cube.intersect(black_box(&sphere)));
    });

    group.finish();
}

fn bench_hull(c: &mut Criterion) {
    let mut group = c.benchmark_group("hull");

    let sphere = primitives::sphere(5.0, 32);
    let mut shifted = primitives::cube(&Vector3::new(2.0, 2.0, 2.0));
    shifted.move_by(&Vector3::new(10.0, 0.0, 0.0));

    group.bench_function("sphere_and_cube", |b| {
        b.iter(|| sphere.hull(black_box(&shifted)).unwrap());
    });

    group.bench_function("minkowski_cube_sphere", |b| {
        let small = primitives::sphere(1.0, 8);
        b.iter(|| shifted.minkowski(black_box(&small)).unwrap());
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    group.bench_function("cube", |b| {
        b.iter(|| render(black_box("cube([10, 10, 10]);")).unwrap());
    });

    group.bench_function("transform", |b| {
        b.iter(|| render(black_box("translate([5, 0, 0]) rotate([0, 45, 0]) cube([10, 10, 10]);")).unwrap());
    });

    group.bench_function("complex_cold", |b| {
        b.iter(|| Kernel::new().render_source(&NullSink, black_box(COMPLEX), "bench.scad").unwrap());
    });

    group.bench_function("complex_cached", |b| {
        let mut kernel = Kernel::new();
        kernel.render_source(&NullSink, COMPLEX, "bench.scad").unwrap();
        b.iter(|| kernel.render_source(&NullSink, black_box(COMPLEX), "bench.scad").unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_evaluate,
    bench_primitives,
    bench_boolean_ops,
    bench_hull,
    bench_render
);
criterion_main!(benches);
