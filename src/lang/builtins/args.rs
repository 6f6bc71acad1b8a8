// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Argument binding for native modules

use crate::lang::interpreter::Interpreter;
use crate::lang::scope::Scope;
use crate::lang::value::{ArgValue, Value};
use crate::utils::math;
use ahash::AHashMap;
use nalgebra::{Vector2, Vector3};

/// Arguments bound to the parameter names of a native module
#[derive(Debug, Default)]
pub struct Args {
    values: AHashMap<&'static str, Value>,
}

impl Args {
    /// Bound value; names that were not passed are `Undefined`
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_number)
    }

    /// Truthiness of the bound value
    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).map_or(false, Value::as_bool)
    }
}

/// Bind `args` to `names`: positional in order, then by name
///
/// `$name` arguments become special variables of `ctx`.
pub fn parse_args(
    interp: &Interpreter<'_>,
    ctx: &Scope<'_>,
    name: &str,
    args: &[ArgValue],
    names: &[&'static str],
) -> Args {
    let mut bound = Args::default();
    let mut position = 0;

    for arg in args {
        match &arg.name {
            None => match names.get(position) {
                Some(param) => {
                    bound.values.insert(*param, arg.value.clone());
                    position += 1;
                }
                None => interp.log(format!("ERROR: Too many arguments for {}", name)),
            },
            Some(arg_name) if arg_name.starts_with('$') => {
                ctx.set_variable(arg_name.as_str(), arg.value.clone());
            }
            Some(arg_name) => match names.iter().find(|n| **n == arg_name.as_str()) {
                Some(param) => {
                    bound.values.insert(*param, arg.value.clone());
                }
                None => interp.log(format!("ERROR: unknown parameter {} for {}", arg_name, name)),
            },
        }
    }

    for param in names {
        bound.values.entry(*param).or_insert(Value::Undefined);
    }
    bound
}

fn leading_numbers(value: &Value, count: usize) -> Option<Vec<f64>> {
    let items = value.as_list()?;
    if items.len() < count {
        return None;
    }
    items[..count].iter().map(Value::as_number).collect()
}

/// A number `v` becomes `(v, v, v)`; a list needs three leading numbers
pub fn as_vec3(interp: &Interpreter<'_>, value: &Value) -> Option<Vector3<f64>> {
    match value {
        Value::Number(v) => Some(Vector3::new(*v, *v, *v)),
        Value::List(_) => match leading_numbers(value, 3) {
            Some(v) => Some(Vector3::new(v[0], v[1], v[2])),
            None => {
                interp.log(format!("ERROR: Invalid value for vector {}", value));
                None
            }
        },
        _ => None,
    }
}

pub fn as_vec2(interp: &Interpreter<'_>, value: &Value) -> Option<Vector2<f64>> {
    match value {
        Value::Number(v) => Some(Vector2::new(*v, *v)),
        Value::List(_) => match leading_numbers(value, 2) {
            Some(v) => Some(Vector2::new(v[0], v[1])),
            None => {
                interp.log(format!("ERROR: Invalid value for vector {}", value));
                None
            }
        },
        _ => None,
    }
}

/// Integer list; `None` if any element is not a number
pub fn as_index_list(value: &Value) -> Option<Vec<i64>> {
    value
        .as_list()?
        .iter()
        .map(|v| v.as_number().map(|n| n as i64))
        .collect()
}

/// Fragment count for a circle of `radius` under the special variables in scope
pub fn fragments(ctx: &Scope<'_>, radius: f64) -> usize {
    let special = |name: &str, default: f64| ctx.get_variable(name).as_number().unwrap_or(default);
    math::fragments(
        radius,
        special("$fn", 0.0),
        special("$fa", 12.0),
        special("$fs", 2.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;

    #[test]
    fn test_positional_named_and_special() {
        let sink = MemorySink::new();
        let interp = Interpreter::new(&sink);
        let root = interp.root_scope();
        let ctx = root.enter().unwrap();

        let args = parse_args(
            &interp,
            &ctx,
            "cube",
            &[
                ArgValue::positional(Value::from(2.0)),
                ArgValue::named("center", Value::from(true)),
                ArgValue::named("$fn", Value::from(7.0)),
                ArgValue::named("bogus", Value::from(1.0)),
                ArgValue::positional(Value::from(3.0)),
                ArgValue::positional(Value::from(4.0)),
            ],
            &["size", "center"],
        );

        assert_eq!(args.number("size"), Some(2.0));
        // The second positional fills the next slot even though it was named
        assert_eq!(args.get("center"), Value::from(3.0));
        assert_eq!(ctx.get_variable("$fn"), Value::from(7.0));
        assert_eq!(root.get_variable("$fn"), Value::from(0.0));
        assert!(sink.contains("ERROR: unknown parameter bogus for cube"));
        assert!(sink.contains("ERROR: Too many arguments for cube"));
    }

    #[test]
    fn test_missing_names_are_undefined() {
        let sink = MemorySink::new();
        let interp = Interpreter::new(&sink);
        let root = interp.root_scope();
        let args = parse_args(&interp, &root, "sphere", &[], &["r", "d"]);
        assert!(args.get("r").is_undefined());
        assert!(!args.flag("d"));
    }

    #[test]
    fn test_vectors() {
        let sink = MemorySink::new();
        let interp = Interpreter::new(&sink);
        let list = Value::list(vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]);

        assert_eq!(as_vec3(&interp, &Value::from(2.0)), Some(Vector3::new(2.0, 2.0, 2.0)));
        assert_eq!(as_vec3(&interp, &list), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(as_vec2(&interp, &list), Some(Vector2::new(1.0, 2.0)));
        assert!(as_vec3(&interp, &Value::Undefined).is_none());
        assert!(sink.messages().is_empty());

        let short = Value::list(vec![Value::from(1.0)]);
        assert!(as_vec3(&interp, &short).is_none());
        assert!(sink.contains("ERROR: Invalid value for vector [1]"));
    }
}
