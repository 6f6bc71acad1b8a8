// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Native library installed into every root scope

mod args;
mod color;
mod functions;
mod modules;

pub use color::{material_tag, named_color, parse_color, FALLBACK};

use super::scope::{Module, Scope};
use super::value::Value;
use std::rc::Rc;

/// Register root variables, builtin functions and builtin modules
pub fn install(scope: &Scope<'_>) {
    scope.set_variable("undef", Value::Undefined);
    scope.set_variable("PI", Value::Number(std::f64::consts::PI));
    scope.set_variable("$fa", Value::Number(12.0));
    scope.set_variable("$fs", Value::Number(2.0));
    scope.set_variable("$fn", Value::Number(0.0));

    functions::register(scope);
    modules::register(scope);

    // Top-level `children()` yields nothing
    scope.set_module("children", Module::Children(Rc::new(Vec::new())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::scope::DEFAULT_MAX_DEPTH;

    #[test]
    fn test_install_populates_root() {
        let scope = Scope::root(DEFAULT_MAX_DEPTH);
        install(&scope);
        assert_eq!(scope.get_variable("$fa"), Value::Number(12.0));
        assert!(scope.get_variable("undef").is_undefined());
        assert!(scope.get_function("sqrt").is_some());
        assert!(scope.get_module("linear_extrude").is_some());
        assert!(matches!(scope.get_module("children"), Some(Module::Children(c)) if c.is_empty()));
    }
}
