// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lexical execution frames
//!
//! A frame borrows its parent, so a child never outlives the frame it was
//! entered from.

use super::error::EvalError;
use super::interpreter::Interpreter;
use super::syntax::ModuleDef;
use super::value::{ArgValue, Function, Value};
use crate::tree::Node;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Default nesting ceiling
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Native module body; receives the already-evaluated children
pub type BuiltinModuleFn =
    fn(&Interpreter<'_>, &Scope<'_>, &[ArgValue], Vec<Node>) -> Result<Vec<Node>, EvalError>;

#[derive(Clone)]
pub enum Module {
    Builtin { name: &'static str, call: BuiltinModuleFn },
    User(Rc<ModuleDef>),
    /// Children captured at an instantiation site
    Children(Rc<Vec<Node>>),
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Module::Builtin { name, .. } => write!(f, "Module::Builtin({})", name),
            Module::User(def) => write!(f, "Module::User({})", def.name),
            Module::Children(nodes) => write!(f, "Module::Children({})", nodes.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Own function and module tables
    Owned,
    /// Function and module reads and writes go to the parent (`use<>`)
    Forwarding,
}

pub struct Scope<'p> {
    kind: ScopeKind,
    parent: Option<&'p Scope<'p>>,
    vars: RefCell<AHashMap<String, Value>>,
    functions: RefCell<AHashMap<String, Function>>,
    modules: RefCell<AHashMap<String, Module>>,
    depth: usize,
    max_depth: usize,
}

impl Scope<'static> {
    /// Parentless frame
    pub fn root(max_depth: usize) -> Self {
        Self::with_parent(ScopeKind::Owned, None, 0, max_depth)
    }
}

impl<'p> Scope<'p> {
    fn with_parent(kind: ScopeKind, parent: Option<&'p Scope<'p>>, depth: usize, max_depth: usize) -> Self {
        Self {
            kind,
            parent,
            vars: RefCell::new(AHashMap::new()),
            functions: RefCell::new(AHashMap::new()),
            modules: RefCell::new(AHashMap::new()),
            depth,
            max_depth,
        }
    }

    fn child(&self, kind: ScopeKind) -> Result<Scope<'_>, EvalError> {
        let depth = self.depth + 1;
        if depth >= self.max_depth {
            return Err(EvalError::RecursionLimit { depth });
        }
        Ok(Scope::with_parent(kind, Some(self), depth, self.max_depth))
    }

    /// Nested frame
    pub fn enter(&self) -> Result<Scope<'_>, EvalError> {
        self.child(ScopeKind::Owned)
    }

    /// Nested frame sharing this frame's functions and modules
    pub fn forwarding(&self) -> Result<Scope<'_>, EvalError> {
        self.child(ScopeKind::Forwarding)
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn parent(&self) -> Option<&Scope<'p>> {
        self.parent
    }

    /// Variables, then functions, then the parent chain
    pub fn get_variable(&self, name: &str) -> Value {
        if let Some(value) = self.vars.borrow().get(name) {
            return value.clone();
        }
        if let Some(f) = self.functions.borrow().get(name) {
            return Value::Function(f.clone());
        }
        match self.parent {
            Some(parent) => parent.get_variable(name),
            None => Value::Undefined,
        }
    }

    /// Variable bound in this frame only
    pub fn local_variable(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn set_variable(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    /// A variable holding a function shadows function definitions
    pub fn get_function(&self, name: &str) -> Option<Function> {
        if let Some(Value::Function(f)) = self.vars.borrow().get(name) {
            return Some(f.clone());
        }
        if self.kind == ScopeKind::Owned {
            if let Some(f) = self.functions.borrow().get(name) {
                return Some(f.clone());
            }
        }
        self.parent.and_then(|parent| parent.get_function(name))
    }

    pub fn set_function(&self, name: impl Into<String>, function: Function) {
        match (self.kind, self.parent) {
            (ScopeKind::Forwarding, Some(parent)) => parent.set_function(name, function),
            _ => {
                self.functions.borrow_mut().insert(name.into(), function);
            }
        }
    }

    pub fn get_module(&self, name: &str) -> Option<Module> {
        if self.kind == ScopeKind::Owned {
            if let Some(m) = self.modules.borrow().get(name) {
                return Some(m.clone());
            }
        }
        self.parent.and_then(|parent| parent.get_module(name))
    }

    pub fn set_module(&self, name: impl Into<String>, module: Module) {
        match (self.kind, self.parent) {
            (ScopeKind::Forwarding, Some(parent)) => parent.set_module(name, module),
            _ => {
                self.modules.borrow_mut().insert(name.into(), module);
            }
        }
    }
}
