// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD language: syntax tree, grammar, values, scopes and evaluation

pub mod builtins;
mod error;
pub mod grammar;
mod interpreter;
mod loader;
mod scope;
pub mod syntax;
mod value;

pub use error::EvalError;
pub use grammar::{parse_expression, parse_program};
pub use interpreter::{Interpreter, MAX_LIST_LENGTH};
pub use loader::{LoadError, Loader};
pub use scope::{BuiltinModuleFn, Module, Scope, ScopeKind, DEFAULT_MAX_DEPTH};
pub use syntax::{Expr, Program, Stmt, StmtKind};
pub use value::{ArgValue, BuiltinFn, Function, Value};
