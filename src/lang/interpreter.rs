// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tree-walking evaluator
//!
//! A statement list runs in three passes over the same scope: `prepare`
//! registers definitions, `assign` evaluates assignments in order and
//! `execute` produces construction-tree nodes.

use super::builtins;
use super::error::EvalError;
use super::scope::{Module, Scope, DEFAULT_MAX_DEPTH};
use super::syntax::{
    Argument, BinaryOp, Expr, ListElem, Modifier, Parameter, Program, Stmt, StmtKind, UnaryOp,
};
use super::value::{ArgValue, Function, Value};
use crate::diagnostics::LogSink;
use crate::tree::Node;
use ahash::AHashSet;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Upper bound on generated list lengths and C-style loop iterations
pub const MAX_LIST_LENGTH: usize = 65536;

pub struct Interpreter<'a> {
    sink: &'a dyn LogSink,
    max_depth: usize,
    /// Files whose include already executed once in this run
    included: RefCell<AHashSet<String>>,
    /// Files already imported with `use`
    used: RefCell<AHashSet<String>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self {
            sink,
            max_depth: DEFAULT_MAX_DEPTH,
            included: RefCell::new(AHashSet::new()),
            used: RefCell::new(AHashSet::new()),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.sink.log(message.as_ref());
    }

    /// Fresh top-level scope with the builtin library installed
    pub fn root_scope(&self) -> Scope<'static> {
        let scope = Scope::root(self.max_depth);
        builtins::install(&scope);
        scope
    }

    /// Evaluate a program in a fresh root scope
    pub fn run(&self, program: &Program) -> Result<Vec<Node>, EvalError> {
        let root = self.root_scope();
        self.run_in(&root, program)
    }

    pub fn run_in(&self, scope: &Scope<'_>, program: &Program) -> Result<Vec<Node>, EvalError> {
        self.run_body(scope, &program.statements)
    }

    fn run_body(&self, scope: &Scope<'_>, statements: &[Stmt]) -> Result<Vec<Node>, EvalError> {
        self.prepare(scope, statements)?;
        self.assign(scope, statements)?;
        self.execute(scope, statements)
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    fn prepare(&self, scope: &Scope<'_>, statements: &[Stmt]) -> Result<(), EvalError> {
        for stmt in statements {
            match &stmt.kind {
                StmtKind::FunctionDef { name, def } => {
                    scope.set_function(name.as_str(), Function::User(def.clone()));
                }
                StmtKind::ModuleDef(def) => {
                    scope.set_module(def.name.as_str(), Module::User(def.clone()));
                }
                StmtKind::Include {
                    program: Some(program),
                    ..
                } => self.prepare(scope, &program.statements)?,
                StmtKind::Use {
                    path,
                    program: Some(program),
                } => {
                    if self.used.borrow_mut().insert(file_key(path, program)) {
                        let imported = scope.forwarding()?;
                        self.prepare(&imported, &program.statements)?;
                        self.assign(&imported, &program.statements)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn assign(&self, scope: &Scope<'_>, statements: &[Stmt]) -> Result<(), EvalError> {
        for stmt in statements {
            match &stmt.kind {
                StmtKind::Assign { name, value } => {
                    let value = self.eval(scope, value)?;
                    scope.set_variable(name.as_str(), value);
                }
                StmtKind::Include {
                    program: Some(program),
                    ..
                } => self.assign(scope, &program.statements)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn execute(&self, scope: &Scope<'_>, statements: &[Stmt]) -> Result<Vec<Node>, EvalError> {
        let mut nodes = Vec::new();
        for stmt in statements {
            nodes.extend(self.execute_stmt(scope, stmt)?);
        }
        Ok(nodes)
    }

    fn execute_stmt(&self, scope: &Scope<'_>, stmt: &Stmt) -> Result<Vec<Node>, EvalError> {
        match &stmt.kind {
            StmtKind::Empty
            | StmtKind::Assign { .. }
            | StmtKind::FunctionDef { .. }
            | StmtKind::ModuleDef(_)
            | StmtKind::Use { .. } => Ok(Vec::new()),

            StmtKind::Include { path, program } => {
                let Some(program) = program else {
                    return Ok(Vec::new());
                };
                let repeated = !self.included.borrow_mut().insert(file_key(path, program));
                let mut nodes = Vec::new();
                for child in &program.statements {
                    if repeated && is_definition(child) {
                        continue;
                    }
                    nodes.extend(self.execute_stmt(scope, child)?);
                }
                Ok(nodes)
            }

            StmtKind::Block(statements) => {
                let inner = scope.enter()?;
                self.run_body(&inner, statements)
            }

            StmtKind::IfElse {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(scope, cond)?.as_bool() {
                    self.execute_stmt(scope, then)
                } else if let Some(otherwise) = otherwise {
                    self.execute_stmt(scope, otherwise)
                } else {
                    Ok(Vec::new())
                }
            }

            StmtKind::Modified { modifiers, stmt } => {
                if modifiers
                    .iter()
                    .any(|m| matches!(m, Modifier::Disable | Modifier::Background))
                {
                    return Ok(Vec::new());
                }
                self.execute_stmt(scope, stmt)
            }

            StmtKind::Instance { name, args, child } => {
                self.instantiate(scope, stmt.line, name, args, child)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Module instantiation
    // -----------------------------------------------------------------------

    fn instantiate(
        &self,
        scope: &Scope<'_>,
        line: usize,
        name: &str,
        args: &[Argument],
        child: &Stmt,
    ) -> Result<Vec<Node>, EvalError> {
        match name {
            "for" => return self.instantiate_for(scope, args, child, false),
            "intersection_for" => return self.instantiate_for(scope, args, child, true),
            "let" => {
                let ctx = scope.enter()?;
                self.bind_arguments(&ctx, "let", args)?;
                return self.execute_stmt(&ctx, child);
            }
            _ => {}
        }

        let values = self.eval_args(scope, args)?;
        let children = if matches!(child.kind, StmtKind::Empty) {
            Vec::new()
        } else {
            let ctx = scope.enter()?;
            self.execute_stmt(&ctx, child)?
        };

        let Some(module) = scope.get_module(name) else {
            self.log(format!("ERROR: unknown module {} at line {}", name, line));
            return Ok(Vec::new());
        };

        match module {
            Module::Children(captured) => Ok(self.select_children(&captured, &values)),
            Module::Builtin { call, .. } => {
                let modctx = scope.enter()?;
                modctx.set_variable("$children", Value::Number(children.len() as f64));
                call(self, &modctx, &values, children)
            }
            Module::User(def) => {
                let modctx = scope.enter()?;
                modctx.set_variable("$children", Value::Number(children.len() as f64));
                modctx.set_module("children", Module::Children(Rc::new(children)));
                self.set_local_variables(&modctx, &def.name, &def.params, &values)?;
                match &def.body.kind {
                    StmtKind::Block(statements) => self.run_body(&modctx, statements),
                    _ => self.run_body(&modctx, std::slice::from_ref(&def.body)),
                }
            }
        }
    }

    fn select_children(&self, children: &[Node], args: &[ArgValue]) -> Vec<Node> {
        let pick = |index: f64| -> Option<Node> {
            if index < 0.0 {
                return None;
            }
            children.get(index.floor() as usize).cloned()
        };

        match args {
            [] => children.to_vec(),
            [arg] if arg.name.is_none() => match &arg.value {
                Value::Number(n) => pick(*n).into_iter().collect(),
                Value::List(items) => items
                    .iter()
                    .filter_map(Value::as_number)
                    .filter_map(pick)
                    .collect(),
                _ => {
                    self.log("ERROR: Invalid arguments for children");
                    Vec::new()
                }
            },
            _ => {
                self.log("ERROR: Invalid arguments for children");
                Vec::new()
            }
        }
    }

    fn instantiate_for(
        &self,
        scope: &Scope<'_>,
        args: &[Argument],
        child: &Stmt,
        intersect: bool,
    ) -> Result<Vec<Node>, EvalError> {
        let ctx = scope.enter()?;
        let mut groups: Vec<Vec<Node>> = Vec::new();
        self.for_each_binding(&ctx, args, &mut |ctx| {
            let nodes = self.execute_stmt(ctx, child)?;
            if !nodes.is_empty() {
                groups.push(nodes);
            }
            Ok(())
        })?;

        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let node = if intersect {
            Node::Intersection(
                groups
                    .into_iter()
                    .map(|mut nodes| {
                        if nodes.len() == 1 {
                            nodes.remove(0)
                        } else {
                            Node::Union(nodes)
                        }
                    })
                    .collect(),
            )
        } else {
            Node::Union(groups.into_iter().flatten().collect())
        };
        Ok(vec![node])
    }

    /// Bind each named argument in turn to every element of its value and
    /// call `body` for each full combination
    fn for_each_binding(
        &self,
        ctx: &Scope<'_>,
        args: &[Argument],
        body: &mut dyn FnMut(&Scope<'_>) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let Some((first, rest)) = args.split_first() else {
            return body(ctx);
        };
        let Some(name) = &first.name else {
            self.log("ERROR: unnamed argument in for");
            return self.for_each_binding(ctx, rest, body);
        };

        let value = self.eval(ctx, &first.value)?;
        for item in iteration_items(&value) {
            ctx.set_variable(name.as_str(), item);
            self.for_each_binding(ctx, rest, body)?;
        }
        Ok(())
    }

    /// Sequential `name = value` bindings for `let`
    fn bind_arguments(&self, ctx: &Scope<'_>, what: &str, args: &[Argument]) -> Result<(), EvalError> {
        for arg in args {
            match &arg.name {
                Some(name) => {
                    let value = self.eval(ctx, &arg.value)?;
                    ctx.set_variable(name.as_str(), value);
                }
                None => self.log(format!("ERROR: unnamed argument in {}", what)),
            }
        }
        Ok(())
    }

    /// Bind call arguments to declared parameters: defaults first, then
    /// positional arguments in order, then named ones
    pub fn set_local_variables(
        &self,
        ctx: &Scope<'_>,
        name: &str,
        params: &[Parameter],
        args: &[ArgValue],
    ) -> Result<(), EvalError> {
        for param in params {
            let value = match &param.default {
                Some(default) => self.eval(ctx, default)?,
                None => Value::Undefined,
            };
            ctx.set_variable(param.name.as_str(), value);
        }

        let mut position = 0;
        for arg in args.iter().filter(|a| a.name.is_none()) {
            match params.get(position) {
                Some(param) => ctx.set_variable(param.name.as_str(), arg.value.clone()),
                None => self.log(format!("ERROR: Too many arguments for {}", name)),
            }
            position += 1;
        }

        for arg in args {
            let Some(arg_name) = &arg.name else {
                continue;
            };
            if arg_name.starts_with('$') || params.iter().any(|p| &p.name == arg_name) {
                ctx.set_variable(arg_name.as_str(), arg.value.clone());
            } else {
                self.log(format!("ERROR: Unknown argument with name {}", arg_name));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn eval_args(&self, scope: &Scope<'_>, args: &[Argument]) -> Result<Vec<ArgValue>, EvalError> {
        args.iter()
            .map(|arg| {
                Ok(ArgValue {
                    name: arg.name.clone(),
                    value: self.eval(scope, &arg.value)?,
                })
            })
            .collect()
    }

    pub fn eval(&self, scope: &Scope<'_>, expr: &Expr) -> Result<Value, EvalError> {
        Ok(match expr {
            Expr::Undef => Value::Undefined,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Ident(name) => scope.get_variable(name),

            Expr::List(elems) => {
                let mut items = Vec::new();
                for elem in elems {
                    self.eval_elem(scope, elem, &mut items)?;
                }
                Value::list(items)
            }
            Expr::Range { begin, step, end } => {
                let begin = self.eval(scope, begin)?;
                let step = match step {
                    Some(step) => self.eval(scope, step)?,
                    None => Value::Number(1.0),
                };
                let end = self.eval(scope, end)?;
                self.range(&begin, &step, &end)
            }

            Expr::Unary { op, expr } => {
                let value = self.eval(scope, expr)?;
                match op {
                    UnaryOp::Neg => value.neg(),
                    UnaryOp::Plus => value,
                    UnaryOp::Not => value.not(),
                }
            }
            Expr::Binary { left, op, right } => {
                let left = self.eval(scope, left)?;
                let right = self.eval(scope, right)?;
                binary(*op, &left, &right)
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(scope, cond)?.as_bool() {
                    self.eval(scope, then)?
                } else {
                    self.eval(scope, otherwise)?
                }
            }

            Expr::Call { callee, args } => {
                let function = match callee.as_ref() {
                    Expr::Ident(name) => scope.get_function(name),
                    other => match self.eval(scope, other)? {
                        Value::Function(f) => Some(f),
                        _ => None,
                    },
                };
                let args = self.eval_args(scope, args)?;
                match function {
                    Some(function) => self.call_function(scope, &function, &args)?,
                    None => {
                        self.log("ERROR: Trying to call non-function object");
                        Value::Undefined
                    }
                }
            }
            Expr::Index { target, index } => {
                let target = self.eval(scope, target)?;
                let index = self.eval(scope, index)?;
                self.index(&target, &index)
            }
            Expr::Member { target, name } => {
                let target = self.eval(scope, target)?;
                let slot = match name.as_str() {
                    "x" => Some(0),
                    "y" => Some(1),
                    "z" => Some(2),
                    _ => None,
                };
                match (target.as_list(), slot) {
                    (Some(items), Some(slot)) => items.get(slot).cloned().unwrap_or_default(),
                    _ => Value::Undefined,
                }
            }
            Expr::Lambda(def) => Value::Function(Function::User(def.clone())),

            Expr::Let { args, body } => {
                let ctx = scope.enter()?;
                self.bind_arguments(&ctx, "let", args)?;
                self.eval(&ctx, body)?
            }
            Expr::Assert { args, body } => {
                let values = self.eval_args(scope, args)?;
                self.check_assertion(&values);
                match body {
                    Some(body) => self.eval(scope, body)?,
                    None => Value::Undefined,
                }
            }
            Expr::Echo { args, body } => {
                let values = self.eval_args(scope, args)?;
                self.echo(&values);
                match body {
                    Some(body) => self.eval(scope, body)?,
                    None => Value::Undefined,
                }
            }
        })
    }

    fn eval_elem(&self, scope: &Scope<'_>, elem: &ListElem, out: &mut Vec<Value>) -> Result<(), EvalError> {
        match elem {
            ListElem::Expr(expr) => out.push(self.eval(scope, expr)?),
            ListElem::Let { args, elem } => {
                let ctx = scope.enter()?;
                self.bind_arguments(&ctx, "let", args)?;
                self.eval_elem(&ctx, elem, out)?;
            }
            ListElem::Each(inner) => {
                let mut values = Vec::new();
                self.eval_elem(scope, inner, &mut values)?;
                for value in values {
                    match value {
                        Value::List(_) | Value::String(_) => out.extend(iteration_items(&value)),
                        other => out.push(other),
                    }
                }
            }
            ListElem::For { args, elem } => {
                let ctx = scope.enter()?;
                self.for_each_binding(&ctx, args, &mut |ctx| self.eval_elem(ctx, elem, out))?;
            }
            ListElem::ForC {
                init,
                cond,
                update,
                elem,
            } => {
                let ctx = scope.enter()?;
                self.bind_arguments(&ctx, "for", init)?;
                let mut iterations = 0;
                while self.eval(&ctx, cond)?.as_bool() {
                    if iterations >= MAX_LIST_LENGTH {
                        self.log("ERROR: list is too long");
                        break;
                    }
                    self.eval_elem(&ctx, elem, out)?;
                    // All updates see the values of the finished iteration
                    let next = self.eval_args(&ctx, update)?;
                    for arg in next {
                        if let Some(name) = arg.name {
                            ctx.set_variable(name, arg.value);
                        }
                    }
                    iterations += 1;
                }
            }
            ListElem::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(scope, cond)?.as_bool() {
                    self.eval_elem(scope, then, out)?;
                } else if let Some(otherwise) = otherwise {
                    self.eval_elem(scope, otherwise, out)?;
                }
            }
        }
        Ok(())
    }

    pub fn call_function(
        &self,
        scope: &Scope<'_>,
        function: &Function,
        args: &[ArgValue],
    ) -> Result<Value, EvalError> {
        match function {
            Function::Builtin { call, .. } => Ok(call(self, scope, args)),
            Function::User(def) => {
                let ctx = scope.enter()?;
                self.set_local_variables(&ctx, "function", &def.params, args)?;
                self.eval(&ctx, &def.body)
            }
        }
    }

    fn index(&self, target: &Value, index: &Value) -> Value {
        let Some(n) = index.as_number() else {
            self.log("ERROR: Invalid index for list");
            return Value::Undefined;
        };
        let slot = if n >= 0.0 { Some(n.floor() as usize) } else { None };
        let found = match target {
            Value::List(items) => slot.and_then(|i| items.get(i).cloned()),
            Value::String(s) => slot.and_then(|i| s.chars().nth(i)).map(|c| Value::String(c.to_string())),
            _ => {
                self.log("ERROR: Invalid index for list");
                return Value::Undefined;
            }
        };
        found.unwrap_or_else(|| {
            self.log("ERROR: Index is out of range");
            Value::Undefined
        })
    }

    /// Inclusive range; a non-positive step gives an empty list
    fn range(&self, begin: &Value, step: &Value, end: &Value) -> Value {
        let (Some(begin), Some(step), Some(end)) = (begin.as_number(), step.as_number(), end.as_number()) else {
            return Value::Undefined;
        };
        if step <= 0.0 || end < begin {
            return Value::list(Vec::new());
        }
        let count = ((end - begin) / step + 1e-9).floor() + 1.0;
        if count > MAX_LIST_LENGTH as f64 {
            self.log("ERROR: list is too long");
            return Value::Undefined;
        }
        Value::list(
            (0..count as usize)
                .map(|i| Value::Number(begin + i as f64 * step))
                .collect(),
        )
    }

    /// `assert(condition, message)` in expression or statement form
    pub fn check_assertion(&self, args: &[ArgValue]) {
        let lookup = |name: &str, position: usize| {
            args.iter()
                .find(|a| a.name.as_deref() == Some(name))
                .or_else(|| args.iter().filter(|a| a.name.is_none()).nth(position))
                .map(|a| a.value.clone())
        };
        let condition = lookup("condition", 0).unwrap_or_default();
        if condition.as_bool() {
            return;
        }
        match lookup("message", 1) {
            Some(Value::String(message)) => self.log(format!("ERROR: Assertion failed: {}", message)),
            Some(other) if !other.is_undefined() => self.log(format!("ERROR: Assertion failed: {}", other)),
            _ => self.log("ERROR: Assertion failed"),
        }
    }

    pub fn echo(&self, args: &[ArgValue]) {
        let text = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.log(format!("ECHO: {}", text));
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let ordered = |accept: fn(Ordering) -> bool| Value::Bool(left.compare(right).map_or(false, accept));
    match op {
        BinaryOp::Or => left.or(right),
        BinaryOp::And => left.and(right),
        BinaryOp::Eq => Value::Bool(left == right),
        BinaryOp::Ne => Value::Bool(left != right),
        BinaryOp::Lt => ordered(|o| o == Ordering::Less),
        BinaryOp::Le => ordered(|o| o != Ordering::Greater),
        BinaryOp::Gt => ordered(|o| o == Ordering::Greater),
        BinaryOp::Ge => ordered(|o| o != Ordering::Less),
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => left.sub(right),
        BinaryOp::Mul => left.mul(right),
        BinaryOp::Div => left.div(right),
        BinaryOp::Mod => left.rem(right),
        BinaryOp::Pow => left.pow(right),
    }
}

/// Loop domain: list elements, string characters, or the value itself
fn iteration_items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.to_vec(),
        Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
        other => vec![other.clone()],
    }
}

fn is_definition(stmt: &Stmt) -> bool {
    matches!(
        stmt.kind,
        StmtKind::Assign { .. } | StmtKind::FunctionDef { .. } | StmtKind::ModuleDef(_)
    )
}

fn file_key(path: &str, program: &Program) -> String {
    match &program.path {
        Some(resolved) => resolved.display().to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::lang::grammar::{parse_expression, parse_program};

    fn eval_str(src: &str) -> Value {
        let sink = MemorySink::new();
        let interp = Interpreter::new(&sink);
        let scope = interp.root_scope();
        interp.eval(&scope, &parse_expression(src).unwrap()).unwrap()
    }

    fn run(src: &str, sink: &MemorySink) -> Result<Vec<Node>, EvalError> {
        let program = parse_program(src, None, false).unwrap_or_else(|e| panic!("{}", e));
        Interpreter::new(sink).run(&program)
    }

    fn nums(values: &[f64]) -> Value {
        Value::list(values.iter().map(|&v| Value::Number(v)).collect())
    }

    #[test]
    fn test_arithmetic_and_logic() {
        assert_eq!(eval_str("1 + 2 * 3 - 4"), Value::from(3.0));
        assert_eq!(eval_str("2 ^ 3"), Value::from(8.0));
        assert_eq!(eval_str("[1, 2] + [3, 4]"), nums(&[4.0, 6.0]));
        assert_eq!(eval_str("1 < 2 && \"a\" < \"b\""), Value::Bool(true));
        assert_eq!(eval_str("1 && true"), Value::Bool(false));
        assert_eq!(eval_str("3 > 2 ? \"yes\" : \"no\""), Value::from("yes"));
    }

    #[test]
    fn test_ranges() {
        assert_eq!(eval_str("[0:3]"), nums(&[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(eval_str("[0:0.5:1]"), nums(&[0.0, 0.5, 1.0]));
        assert_eq!(eval_str("[0:-1:3]"), nums(&[]));
        assert!(eval_str("[0:100000]").is_undefined());
    }

    #[test]
    fn test_comprehensions() {
        assert_eq!(eval_str("[for (i = [0:4]) if (i % 2 == 0) i]"), nums(&[0.0, 2.0, 4.0]));
        assert_eq!(eval_str("[for (i = 0; i < 4; i = i + 1) i * i]"), nums(&[0.0, 1.0, 4.0, 9.0]));
        assert_eq!(eval_str("[each [1, 2], 3]"), nums(&[1.0, 2.0, 3.0]));
        assert_eq!(eval_str("[let (a = 2) a * 3]"), nums(&[6.0]));
        assert_eq!(
            eval_str("[for (c = \"ab\") c]"),
            Value::list(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_indexing() {
        assert_eq!(eval_str("[5, 6, 7][1]"), Value::from(6.0));
        assert_eq!(eval_str("\"abc\"[2]"), Value::from("c"));
        assert_eq!(eval_str("[1, 2, 3].z"), Value::from(3.0));
        assert!(eval_str("[1, 2][5]").is_undefined());
    }

    #[test]
    fn test_index_errors_are_logged() {
        let sink = MemorySink::new();
        run("a = [1][3]; b = [1][\"x\"]; c = 5(1);", &sink).unwrap();
        assert!(sink.contains("Index is out of range"));
        assert!(sink.contains("Invalid index for list"));
        assert!(sink.contains("Trying to call non-function object"));
    }

    #[test]
    fn test_functions_and_lambdas() {
        let sink = MemorySink::new();
        run(
            "function sq(x) = x * x; f = function (y) y + 1; echo(sq(3), f(1), b = sq(f(2)));",
            &sink,
        )
        .unwrap();
        assert_eq!(sink.messages(), vec!["ECHO: 9, 2, b=9".to_string()]);
    }

    #[test]
    fn test_user_module_with_children() {
        let sink = MemorySink::new();
        let nodes = run(
            "module pair(gap = 2) { children(0); translate([gap, 0, 0]) children(1); }\n\
             pair(gap = 5) { cube(1); sphere(1); }",
            &sink,
        )
        .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], Node::Affine { .. }));
        assert!(sink.messages().is_empty(), "{:?}", sink.messages());
    }

    #[test]
    fn test_parameter_binding_messages() {
        let sink = MemorySink::new();
        run("module m(a) { echo(a, $fn); }\nm(1, 2, b = 3, $fn = 8);", &sink).unwrap();
        assert!(sink.contains("Too many arguments for m"));
        assert!(sink.contains("Unknown argument with name b"));
        assert!(sink.contains("ECHO: 1, 8"));
    }

    #[test]
    fn test_for_builds_union() {
        let sink = MemorySink::new();
        let nodes = run("for (i = [0:2], j = [0:1]) translate([i, j, 0]) cube(1);", &sink).unwrap();
        match &nodes[..] {
            [Node::Union(children)] => assert_eq!(children.len(), 6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_modifiers() {
        let sink = MemorySink::new();
        let nodes = run("*cube(1); %sphere(1); #cube(2); !cube(3);", &sink).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_unknown_module_names_line() {
        let sink = MemorySink::new();
        let nodes = run("cube(1);\nwidget(2);", &sink).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(sink.contains("ERROR: unknown module widget at line 2"));
    }

    #[test]
    fn test_recursion_limit_is_fatal() {
        let sink = MemorySink::new();
        let result = run("function f(n) = f(n + 1); x = f(0);", &sink);
        assert!(matches!(result, Err(EvalError::RecursionLimit { .. })));
    }

    #[test]
    fn test_assert_continues() {
        let sink = MemorySink::new();
        let nodes = run("assert(1 > 2, \"too small\") cube(1);\ncube(2);", &sink).unwrap();
        assert!(sink.contains("ERROR: Assertion failed: too small"));
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_assignments_are_hoisted_per_body() {
        let sink = MemorySink::new();
        run("echo(a); a = 3;", &sink).unwrap();
        assert_eq!(sink.messages(), vec!["ECHO: 3".to_string()]);
    }
}
