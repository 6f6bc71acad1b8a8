// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Minkowski sum by hull sweeping

use super::hull::HullError;
use super::Model;
use nalgebra::Point3;

fn placed(model: &Model, at: &Point3<f64>) -> Model {
    let mut copy = model.clone();
    copy.move_by(&at.coords);
    copy
}

/// Sum of `a` and `b`: for each face of `a`, `b` is hulled over the three
/// corners and the sweep is hulled into the running result.
///
/// The result is convex; concave inputs are over-approximated.
pub fn minkowski_sum(a: &Model, b: &Model) -> Result<Model, HullError> {
    let mut result = a.clone();
    for face in a.faces() {
        let [p, q, r] = &face.positions;
        let swept = placed(b, p).hull(&placed(b, q))?.hull(&placed(b, r))?;
        result = result.hull(&swept)?;
    }
    Ok(result)
}
