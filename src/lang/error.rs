// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fatal evaluation errors

use crate::geometry::HullError;
use thiserror::Error;

/// Conditions that abort evaluation or rendering; everything else is logged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("recursion limit reached at depth {depth}")]
    RecursionLimit { depth: usize },

    #[error(transparent)]
    Hull(#[from] HullError),
}
