// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Abstract syntax of the scripting language

use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Call-site argument, optionally named
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
}

/// Declared parameter with optional default
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
}

/// Function literal or `function name(...) = body;`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<Parameter>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Undef,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    List(Vec<ListElem>),
    Range {
        begin: Box<Expr>,
        step: Option<Box<Expr>>,
        end: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        target: Box<Expr>,
        name: String,
    },
    Lambda(Rc<FunctionDef>),
    Let {
        args: Vec<Argument>,
        body: Box<Expr>,
    },
    Assert {
        args: Vec<Argument>,
        body: Option<Box<Expr>>,
    },
    Echo {
        args: Vec<Argument>,
        body: Option<Box<Expr>>,
    },
}

/// Element of a list literal or comprehension
#[derive(Debug, Clone, PartialEq)]
pub enum ListElem {
    Expr(Expr),
    Let {
        args: Vec<Argument>,
        elem: Box<ListElem>,
    },
    Each(Box<ListElem>),
    For {
        args: Vec<Argument>,
        elem: Box<ListElem>,
    },
    /// `for (init; cond; update)`
    ForC {
        init: Vec<Argument>,
        cond: Expr,
        update: Vec<Argument>,
        elem: Box<ListElem>,
    },
    If {
        cond: Expr,
        then: Box<ListElem>,
        otherwise: Option<Box<ListElem>>,
    },
}

/// Instantiation modifier characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `!` root
    Root,
    /// `#` highlight
    Highlight,
    /// `%` background, not part of the model
    Background,
    /// `*` disable
    Disable,
}

/// Statement with its byte offset and line in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub offset: usize,
    pub line: usize,
}

impl Stmt {
    pub fn new(kind: StmtKind, offset: usize, line: usize) -> Self {
        Self { kind, offset, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Empty,
    Include {
        path: String,
        program: Option<Rc<Program>>,
    },
    Use {
        path: String,
        program: Option<Rc<Program>>,
    },
    Assign {
        name: String,
        value: Expr,
    },
    FunctionDef {
        name: String,
        def: Rc<FunctionDef>,
    },
    ModuleDef(Rc<ModuleDef>),
    Instance {
        name: String,
        args: Vec<Argument>,
        child: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    IfElse {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Modified {
        modifiers: Vec<Modifier>,
        stmt: Box<Stmt>,
    },
}

/// Parsed source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub path: Option<PathBuf>,
}
