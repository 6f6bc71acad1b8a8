// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - triangle models, CSG, hulls and primitives

mod bbox;
mod boolean;
pub mod csg;
pub mod earcut;
pub mod hull;
mod minkowski;
mod model;
pub mod primitives;
mod shape;

pub use bbox::BoundingBox;
pub use boolean::BooleanOp;
pub use csg::{Csg, CsgSettings};
pub use earcut::EarcutError;
pub use hull::HullError;
pub use minkowski::minkowski_sum;
pub use model::{position_key, Face, Model};
pub use shape::Shape;
