// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Builtin function library
//!
//! Functions never fail: bad input is logged and yields `Undefined`.

use crate::lang::interpreter::{Interpreter, MAX_LIST_LENGTH};
use crate::lang::scope::Scope;
use crate::lang::value::{ArgValue, BuiltinFn, Function, Value};
use crate::utils::math::{cos_deg, sin_deg, tan_deg};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TABLE: &[(&str, BuiltinFn)] = &[
    ("abs", |i, _, a| unary(i, "abs", a, f64::abs)),
    ("sign", |i, _, a| unary(i, "sign", a, sign)),
    ("sin", |i, _, a| unary(i, "sin", a, sin_deg)),
    ("cos", |i, _, a| unary(i, "cos", a, cos_deg)),
    ("tan", |i, _, a| unary(i, "tan", a, tan_deg)),
    ("asin", |i, _, a| unary(i, "asin", a, |x| x.asin().to_degrees())),
    ("acos", |i, _, a| unary(i, "acos", a, |x| x.acos().to_degrees())),
    ("atan", |i, _, a| unary(i, "atan", a, |x| x.atan().to_degrees())),
    ("floor", |i, _, a| unary(i, "floor", a, f64::floor)),
    ("round", |i, _, a| unary(i, "round", a, f64::round)),
    ("ceil", |i, _, a| unary(i, "ceil", a, f64::ceil)),
    ("ln", |i, _, a| unary(i, "ln", a, f64::ln)),
    ("log", |i, _, a| unary(i, "log", a, f64::log10)),
    ("sqrt", |i, _, a| unary(i, "sqrt", a, f64::sqrt)),
    ("exp", |i, _, a| unary(i, "exp", a, f64::exp)),
    ("atan2", atan2),
    ("pow", pow),
    ("min", |i, _, a| extremum(i, "min", a, f64::min)),
    ("max", |i, _, a| extremum(i, "max", a, f64::max)),
    ("rands", rands),
    ("concat", concat),
    ("len", len),
    ("norm", norm),
    ("cross", cross),
    ("str", str_),
    ("chr", chr),
    ("ord", ord),
    ("version", |_, _, _| {
        Value::list(vec![Value::from(2019.0), Value::from(5.0), Value::from(1.0)])
    }),
    ("version_num", |_, _, _| Value::from(20190501.0)),
    ("is_undef", |i, _, a| type_check(i, "is_undef", a, |v| matches!(v, Value::Undefined))),
    ("is_bool", |i, _, a| type_check(i, "is_bool", a, |v| matches!(v, Value::Bool(_)))),
    ("is_num", |i, _, a| type_check(i, "is_num", a, |v| matches!(v, Value::Number(_)))),
    ("is_string", |i, _, a| type_check(i, "is_string", a, |v| matches!(v, Value::String(_)))),
    ("is_list", |i, _, a| type_check(i, "is_list", a, |v| matches!(v, Value::List(_)))),
    ("is_function", |i, _, a| type_check(i, "is_function", a, |v| matches!(v, Value::Function(_)))),
];

pub fn register(scope: &Scope<'_>) {
    for (name, call) in TABLE {
        scope.set_function(*name, Function::Builtin { name: *name, call: *call });
    }
}

fn describe(args: &[ArgValue]) -> String {
    args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn unary(interp: &Interpreter<'_>, name: &str, args: &[ArgValue], f: fn(f64) -> f64) -> Value {
    let [arg] = args else {
        interp.log(format!("ERROR: Invalid number of arguments for {}", name));
        return Value::Undefined;
    };
    match arg.value.as_number() {
        Some(x) => Value::Number(f(x)),
        None => {
            interp.log(format!("ERROR: Invalid argument type for {}", name));
            Value::Undefined
        }
    }
}

fn type_check(interp: &Interpreter<'_>, name: &str, args: &[ArgValue], test: fn(&Value) -> bool) -> Value {
    match args {
        [arg] => Value::Bool(test(&arg.value)),
        _ => {
            interp.log(format!("ERROR: Invalid number of arguments for {}", name));
            Value::Undefined
        }
    }
}

fn two_numbers(args: &[ArgValue]) -> Option<(f64, f64)> {
    match args {
        [a, b] => Some((a.value.as_number()?, b.value.as_number()?)),
        _ => None,
    }
}

fn atan2(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    match two_numbers(args) {
        Some((y, x)) => Value::Number(y.atan2(x).to_degrees()),
        None => {
            interp.log(format!("ERROR: Invalid arguments for atan2: {}", describe(args)));
            Value::Undefined
        }
    }
}

fn pow(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    match two_numbers(args) {
        Some((base, exponent)) => Value::Number(base.powf(exponent)),
        None => {
            interp.log(format!("ERROR: Invalid arguments for pow: {}", describe(args)));
            Value::Undefined
        }
    }
}

/// Variadic numbers or a single list of numbers
fn extremum(interp: &Interpreter<'_>, name: &str, args: &[ArgValue], pick: fn(f64, f64) -> f64) -> Value {
    let values: Vec<Value> = match args {
        [] => {
            interp.log(format!("ERROR: No arguments for {}", name));
            return Value::Undefined;
        }
        [single] => match &single.value {
            Value::List(items) => items.to_vec(),
            other => vec![other.clone()],
        },
        many => many.iter().map(|a| a.value.clone()).collect(),
    };

    let numbers: Option<Vec<f64>> = values.iter().map(Value::as_number).collect();
    match numbers.and_then(|n| n.into_iter().reduce(pick)) {
        Some(result) => Value::Number(result),
        None => {
            interp.log(format!("ERROR: Invalid arguments for {} {}", name, describe(args)));
            Value::Undefined
        }
    }
}

/// `rands(min, max, count, seed)`; a seed makes the sequence reproducible
fn rands(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let numbers: Option<Vec<f64>> = args.iter().map(|a| a.value.as_number()).collect();
    let (lo, hi, count, seed) = match numbers.as_deref() {
        Some([lo, hi, count]) => (*lo, *hi, *count, None),
        Some([lo, hi, count, seed]) => (*lo, *hi, *count, Some(*seed)),
        _ => {
            interp.log(format!("ERROR: Invalid arguments for rands: {}", describe(args)));
            return Value::Undefined;
        }
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed as i64 as u64),
        None => StdRng::from_entropy(),
    };
    let count = count.max(0.0) as usize;
    if count > MAX_LIST_LENGTH {
        interp.log("ERROR: list is too long");
        return Value::Undefined;
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    Value::list(
        (0..count)
            .map(|_| Value::Number(if lo < hi { rng.gen_range(lo..hi) } else { lo }))
            .collect(),
    )
}

/// Lists are spliced; any other value is appended as an element
fn concat(_: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let mut out = Vec::new();
    for arg in args {
        match &arg.value {
            Value::List(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Value::list(out)
}

fn len(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let [arg] = args else {
        interp.log(format!("ERROR: invalid number of arguments for len: {}", describe(args)));
        return Value::Undefined;
    };
    match &arg.value {
        Value::List(items) => Value::Number(items.len() as f64),
        Value::String(s) => Value::Number(s.chars().count() as f64),
        _ => {
            interp.log(format!("ERROR: invalid argument type for len: {}", describe(args)));
            Value::Undefined
        }
    }
}

fn number_list(value: &Value) -> Option<Vec<f64>> {
    value.as_list()?.iter().map(Value::as_number).collect()
}

fn norm(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    match args {
        [arg] => match number_list(&arg.value) {
            Some(v) => Value::Number(v.iter().map(|x| x * x).sum::<f64>().sqrt()),
            None => {
                interp.log(format!("ERROR: Invalid arguments for norm: {}", describe(args)));
                Value::Undefined
            }
        },
        _ => {
            interp.log("ERROR: Invalid number of arguments for norm");
            Value::Undefined
        }
    }
}

/// Cross product of two 3-vectors, or the z component for 2-vectors
fn cross(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let vectors = match args {
        [a, b] => number_list(&a.value).zip(number_list(&b.value)),
        _ => None,
    };
    match vectors {
        Some((a, b)) if a.len() == 3 && b.len() == 3 => {
            let c = Vector3::new(a[0], a[1], a[2]).cross(&Vector3::new(b[0], b[1], b[2]));
            Value::list(vec![Value::Number(c.x), Value::Number(c.y), Value::Number(c.z)])
        }
        Some((a, b)) if a.len() == 2 && b.len() == 2 => Value::Number(a[0] * b[1] - a[1] * b[0]),
        _ => {
            interp.log(format!("ERROR: Invalid arguments for cross: {}", describe(args)));
            Value::Undefined
        }
    }
}

/// Concatenation; strings are taken without quotes
fn str_(_: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let mut out = String::new();
    for arg in args {
        match &arg.value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    Value::String(out)
}

fn chr(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    let mut codes = Vec::new();
    for arg in args {
        match &arg.value {
            Value::Number(n) => codes.push(*n),
            Value::List(items) => codes.extend(items.iter().filter_map(Value::as_number)),
            _ => {}
        }
    }
    let text: Option<String> = codes
        .into_iter()
        .map(|c| if c >= 0.0 { char::from_u32(c as u32) } else { None })
        .collect();
    match text {
        Some(text) => Value::String(text),
        None => {
            interp.log(format!("ERROR: Invalid arguments for chr: {}", describe(args)));
            Value::Undefined
        }
    }
}

fn ord(interp: &Interpreter<'_>, _: &Scope<'_>, args: &[ArgValue]) -> Value {
    if let [arg] = args {
        if let Value::String(s) = &arg.value {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Value::Number(c as u32 as f64);
            }
        }
    }
    interp.log(format!("ERROR: Invalid arguments for ord: {}", describe(args)));
    Value::Undefined
}
