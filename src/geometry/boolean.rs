// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations folded over sequences of models

use super::{CsgSettings, Model};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    /// Perform the operation between two models
    pub fn apply(self, a: &Model, b: &Model, settings: &CsgSettings) -> Model {
        match self {
            BooleanOp::Union => a.join_with(b, settings),
            BooleanOp::Difference => a.subtract_with(b, settings),
            BooleanOp::Intersection => a.intersect_with(b, settings),
        }
    }

    /// Fold strictly left to right; an empty sequence yields an empty model
    pub fn fold<I>(self, models: I, settings: &CsgSettings) -> Model
    where
        I: IntoIterator<Item = Model>,
    {
        let mut models = models.into_iter();
        let Some(first) = models.next() else {
            return Model::new();
        };
        models.fold(first, |acc, next| self.apply(&acc, &next, settings))
    }

    pub fn name(self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
        }
    }
}
