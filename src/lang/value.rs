// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Script values and their operators
//!
//! Operators never fail: a type mismatch yields `Undefined` (arithmetic) or
//! `false` (logic and comparison).

use super::interpreter::Interpreter;
use super::scope::Scope;
use super::syntax::FunctionDef;
use std::fmt;
use std::rc::Rc;

/// Native function body
pub type BuiltinFn = fn(&Interpreter<'_>, &Scope<'_>, &[ArgValue]) -> Value;

/// Evaluated call argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgValue {
    pub name: Option<String>,
    pub value: Value,
}

impl ArgValue {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}={}", name, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Clone)]
pub enum Function {
    User(Rc<FunctionDef>),
    Builtin { name: &'static str, call: BuiltinFn },
}

impl Function {
    /// Identity comparison
    pub fn same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::User(a), Function::User(b)) => Rc::ptr_eq(a, b),
            (Function::Builtin { name: a, .. }, Function::Builtin { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User(def) => write!(f, "Function::User({} params)", def.params.len()),
            Function::Builtin { name, .. } => write!(f, "Function::Builtin({})", name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    List(Rc<Vec<Value>>),
    Function(Function),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Script truthiness
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::List(items) => !items.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undef",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
        }
    }

    fn pointwise(&self, other: &Value, op: fn(&Value, &Value) -> Value) -> Value {
        match (self, other) {
            (Value::List(a), Value::List(b)) if a.len() == b.len() => {
                Value::list(a.iter().zip(b.iter()).map(|(x, y)| op(x, y)).collect())
            }
            _ => Value::Undefined,
        }
    }

    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => self.pointwise(other, Value::add),
        }
    }

    pub fn sub(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a - b),
            _ => self.pointwise(other, Value::sub),
        }
    }

    pub fn mul(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a * b),
            (Value::List(items), Value::Number(_)) => {
                Value::list(items.iter().map(|x| x.mul(other)).collect())
            }
            (Value::Number(_), Value::List(items)) => {
                Value::list(items.iter().map(|x| self.mul(x)).collect())
            }
            _ => Value::Undefined,
        }
    }

    pub fn div(&self, other: &Value) -> Value {
        match (self, other) {
            (_, Value::Number(b)) if *b == 0.0 => Value::Undefined,
            (Value::Number(a), Value::Number(b)) => Value::Number(a / b),
            (Value::List(items), Value::Number(_)) => {
                Value::list(items.iter().map(|x| x.div(other)).collect())
            }
            _ => Value::Undefined,
        }
    }

    pub fn rem(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if *b != 0.0 => Value::Number(a % b),
            _ => Value::Undefined,
        }
    }

    pub fn pow(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a.powf(*b)),
            _ => Value::Undefined,
        }
    }

    pub fn neg(&self) -> Value {
        match self {
            Value::Number(n) => Value::Number(-n),
            Value::List(items) => Value::list(items.iter().map(Value::neg).collect()),
            _ => Value::Undefined,
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.as_bool())
    }

    pub fn and(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(*a && *b),
            _ => Value::Bool(false),
        }
    }

    pub fn or(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(*a || *b),
            _ => Value::Bool(false),
        }
    }

    /// Ordering of number, bool or string pairs
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undef"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Function(_) => write!(f, "function"),
        }
    }
}
