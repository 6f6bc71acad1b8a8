// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Script grammar expressed with the combinator engine

use super::syntax::*;
use crate::parser::{PResult, ParseError, Parser, Whitespace, Word};
use regex::Regex;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::OnceLock;

fn ident_word() -> &'static Word {
    static WORD: OnceLock<Word> = OnceLock::new();
    WORD.get_or_init(|| Word::new("A-Za-z_$", "A-Za-z0-9_"))
}

fn include_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[^>]*").expect("include path pattern"))
}

const LOGIC_OR: &[(&str, BinaryOp)] = &[("||", BinaryOp::Or)];
const LOGIC_AND: &[(&str, BinaryOp)] = &[("&&", BinaryOp::And)];
const EQUALITY: &[(&str, BinaryOp)] = &[("==", BinaryOp::Eq), ("!=", BinaryOp::Ne)];
const COMPARISON: &[(&str, BinaryOp)] = &[
    ("<=", BinaryOp::Le),
    (">=", BinaryOp::Ge),
    ("<", BinaryOp::Lt),
    (">", BinaryOp::Gt),
];
const ADDITIVE: &[(&str, BinaryOp)] = &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)];
const MULTIPLICATIVE: &[(&str, BinaryOp)] = &[
    ("*", BinaryOp::Mul),
    ("/", BinaryOp::Div),
    ("%", BinaryOp::Mod),
];
const UNARY: &[(&str, UnaryOp)] = &[("-", UnaryOp::Neg), ("+", UnaryOp::Plus), ("!", UnaryOp::Not)];
const MODIFIERS: &[(&str, Modifier)] = &[
    ("!", Modifier::Root),
    ("#", Modifier::Highlight),
    ("%", Modifier::Background),
    ("*", Modifier::Disable),
];

/// Parse a whole source file
pub fn parse_program(source: &str, path: Option<PathBuf>, packrat: bool) -> Result<Program, ParseError> {
    let mut parser = Parser::new(source).with_whitespace(Whitespace::c_like());
    if packrat {
        parser = parser.with_packrat();
    }
    let statements = program(&mut parser)?;
    Ok(Program { statements, path })
}

/// Parse a single expression, e.g. for `-D name=value` style overrides
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(source).with_whitespace(Whitespace::c_like());
    let expr = expression(&mut parser)?;
    parser.eof()?;
    Ok(expr)
}

fn program(p: &mut Parser) -> PResult<Vec<Stmt>> {
    let mut statements = p.zero_or_more(statement);
    // A trailing statement or EOF: the error then points at the deepest failure
    loop {
        p.skip_whitespace()?;
        let next = p.first_of::<Option<Stmt>>(&[
            &|p: &mut Parser| statement(p).map(Some),
            &|p: &mut Parser| p.eof().map(|_| None),
        ])?;
        match next {
            Some(stmt) => {
                statements.push(stmt);
                statements.extend(p.zero_or_more(statement));
            }
            None => return Ok(statements),
        }
    }
}

fn identifier(p: &mut Parser) -> PResult<String> {
    p.word(ident_word())
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

pub fn expression(p: &mut Parser) -> PResult<Expr> {
    p.rule("Expression", |p| {
        p.first_of::<Expr>(&[&lambda, &let_expr, &assert_expr, &echo_expr, &ternary])
    })
}

fn parenthesized<T>(p: &mut Parser, inner: impl FnOnce(&mut Parser) -> PResult<T>) -> PResult<T> {
    p.literal("(")?;
    let value = inner(p)?;
    p.literal(")")?;
    Ok(value)
}

fn lambda(p: &mut Parser) -> PResult<Expr> {
    p.keyword("function")?;
    let params = parenthesized(p, |p| Ok(parameters(p)))?;
    let body = expression(p)?;
    Ok(Expr::Lambda(Rc::new(FunctionDef { params, body })))
}

fn let_expr(p: &mut Parser) -> PResult<Expr> {
    p.keyword("let")?;
    let args = parenthesized(p, |p| Ok(arguments(p)))?;
    let body = expression(p)?;
    Ok(Expr::Let {
        args,
        body: Box::new(body),
    })
}

fn assert_expr(p: &mut Parser) -> PResult<Expr> {
    p.keyword("assert")?;
    let args = parenthesized(p, |p| Ok(arguments(p)))?;
    let body = p.optional(expression).map(Box::new);
    Ok(Expr::Assert { args, body })
}

fn echo_expr(p: &mut Parser) -> PResult<Expr> {
    p.keyword("echo")?;
    let args = parenthesized(p, |p| Ok(arguments(p)))?;
    let body = p.optional(expression).map(Box::new);
    Ok(Expr::Echo { args, body })
}

fn ternary(p: &mut Parser) -> PResult<Expr> {
    let cond = logic_or(p)?;
    let branches = p.optional(|p| {
        p.literal("?")?;
        let then = expression(p)?;
        p.literal(":")?;
        let otherwise = expression(p)?;
        Ok((then, otherwise))
    });
    Ok(match branches {
        Some((then, otherwise)) => Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        None => cond,
    })
}

fn binary_level(
    p: &mut Parser,
    table: &[(&'static str, BinaryOp)],
    operand: fn(&mut Parser) -> PResult<Expr>,
) -> PResult<Expr> {
    let chain = p.infix(table, operand)?;
    Ok(chain.fold(&mut |e| e, &mut |left, op, right| Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }))
}

fn logic_or(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, LOGIC_OR, logic_and)
}

fn logic_and(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, LOGIC_AND, equality)
}

fn equality(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, EQUALITY, comparison)
}

fn comparison(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, COMPARISON, additive)
}

fn additive(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, ADDITIVE, multiplicative)
}

fn multiplicative(p: &mut Parser) -> PResult<Expr> {
    binary_level(p, MULTIPLICATIVE, unary)
}

fn unary(p: &mut Parser) -> PResult<Expr> {
    p.attempt(|p| {
        let ops = p.zero_or_more(|p| p.symbol(UNARY));
        let mut expr = exponent(p)?;
        for op in ops.into_iter().rev() {
            expr = Expr::Unary {
                op,
                expr: Box::new(expr),
            };
        }
        Ok(expr)
    })
}

fn exponent(p: &mut Parser) -> PResult<Expr> {
    let base = call(p)?;
    match p.optional(|p| {
        p.literal("^")?;
        call(p)
    }) {
        Some(exp) => Ok(Expr::Binary {
            left: Box::new(base),
            op: BinaryOp::Pow,
            right: Box::new(exp),
        }),
        None => Ok(base),
    }
}

fn call(p: &mut Parser) -> PResult<Expr> {
    let mut expr = primary(p)?;
    loop {
        if let Some(args) = p.optional(|p| parenthesized(p, |p| Ok(arguments(p)))) {
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
            };
        } else if let Some(index) = p.optional(|p| {
            p.literal("[")?;
            let index = expression(p)?;
            p.literal("]")?;
            Ok(index)
        }) {
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        } else if let Some(name) = p.optional(|p| {
            p.literal(".")?;
            identifier(p)
        }) {
            expr = Expr::Member {
                target: Box::new(expr),
                name,
            };
        } else {
            return Ok(expr);
        }
    }
}

fn primary(p: &mut Parser) -> PResult<Expr> {
    p.first_of::<Expr>(&[
        &constant,
        &|p: &mut Parser| p.float().map(Expr::Number),
        &|p: &mut Parser| string_literal(p).map(Expr::Str),
        &|p: &mut Parser| identifier(p).map(Expr::Ident),
        &|p: &mut Parser| parenthesized(p, expression),
        &list_or_range,
    ])
}

fn constant(p: &mut Parser) -> PResult<Expr> {
    p.first_of::<Expr>(&[
        &|p: &mut Parser| p.keyword("true").map(|_| Expr::Bool(true)),
        &|p: &mut Parser| p.keyword("false").map(|_| Expr::Bool(false)),
        &|p: &mut Parser| p.keyword("undef").map(|_| Expr::Undef),
    ])
}

/// Double-quoted string; a backslash escapes the next character
fn string_literal(p: &mut Parser) -> PResult<String> {
    p.skip_whitespace()?;
    if p.peek() != Some('"') {
        return Err(p.error("Expected string"));
    }

    let mut value = String::new();
    let mut chars = p.rest().char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                p.advance(i + 1);
                return Ok(value);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            _ => value.push(c),
        }
    }
    Err(p.error("End of file inside a string"))
}

/// `[a : b]`, `[a : step : b]` or a list literal with comprehensions
fn list_or_range(p: &mut Parser) -> PResult<Expr> {
    p.literal("[")?;
    if let Some(range) = p.optional(range_tail) {
        return Ok(range);
    }
    let elems = p.delimited_list(list_elem, |p| p.literal(","));
    p.optional(|p| p.literal(","));
    p.literal("]")?;
    Ok(Expr::List(elems))
}

fn range_tail(p: &mut Parser) -> PResult<Expr> {
    let begin = expression(p)?;
    p.literal(":")?;
    let second = expression(p)?;
    let third = p.optional(|p| {
        p.literal(":")?;
        expression(p)
    });
    p.literal("]")?;
    Ok(match third {
        Some(end) => Expr::Range {
            begin: Box::new(begin),
            step: Some(Box::new(second)),
            end: Box::new(end),
        },
        None => Expr::Range {
            begin: Box::new(begin),
            step: None,
            end: Box::new(second),
        },
    })
}

fn list_elem(p: &mut Parser) -> PResult<ListElem> {
    p.first_of::<ListElem>(&[
        &let_elem,
        &each_elem,
        &for_elem,
        &if_elem,
        &|p: &mut Parser| expression(p).map(ListElem::Expr),
    ])
}

fn let_elem(p: &mut Parser) -> PResult<ListElem> {
    p.keyword("let")?;
    let args = parenthesized(p, |p| Ok(arguments(p)))?;
    let elem = list_elem(p)?;
    Ok(ListElem::Let {
        args,
        elem: Box::new(elem),
    })
}

fn each_elem(p: &mut Parser) -> PResult<ListElem> {
    p.keyword("each")?;
    Ok(ListElem::Each(Box::new(list_elem(p)?)))
}

fn for_elem(p: &mut Parser) -> PResult<ListElem> {
    p.keyword("for")?;
    p.literal("(")?;
    let args = arguments(p);
    let c_style = p.optional(|p| {
        p.literal(";")?;
        let cond = expression(p)?;
        p.literal(";")?;
        Ok((cond, arguments(p)))
    });
    p.literal(")")?;
    let elem = Box::new(list_elem(p)?);
    Ok(match c_style {
        Some((cond, update)) => ListElem::ForC {
            init: args,
            cond,
            update,
            elem,
        },
        None => ListElem::For { args, elem },
    })
}

fn if_elem(p: &mut Parser) -> PResult<ListElem> {
    p.keyword("if")?;
    let cond = parenthesized(p, expression)?;
    let then = Box::new(list_elem(p)?);
    let otherwise = p
        .optional(|p| {
            p.keyword("else")?;
            list_elem(p)
        })
        .map(Box::new);
    Ok(ListElem::If {
        cond,
        then,
        otherwise,
    })
}

/// `name = ` where the `=` does not start `==`
fn argument_name(p: &mut Parser) -> PResult<String> {
    let name = identifier(p)?;
    p.literal("=")?;
    p.not_any(|p| p.literal("="))?;
    Ok(name)
}

fn arguments(p: &mut Parser) -> Vec<Argument> {
    p.delimited_list(
        |p| {
            let name = p.optional(argument_name);
            let value = expression(p)?;
            Ok(Argument { name, value })
        },
        |p| p.literal(","),
    )
}

fn parameters(p: &mut Parser) -> Vec<Parameter> {
    p.delimited_list(
        |p| {
            let name = identifier(p)?;
            let default = p.optional(|p| {
                p.literal("=")?;
                p.not_any(|p| p.literal("="))?;
                expression(p)
            });
            Ok(Parameter { name, default })
        },
        |p| p.literal(","),
    )
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Run `f` and tag the result with the offset of its first token
fn located(p: &mut Parser, f: impl FnOnce(&mut Parser) -> PResult<StmtKind>) -> PResult<Stmt> {
    p.attempt(|p| {
        p.skip_whitespace()?;
        let offset = p.position();
        let line = p.line_at(offset);
        Ok(Stmt::new(f(p)?, offset, line))
    })
}

pub fn statement(p: &mut Parser) -> PResult<Stmt> {
    p.rule("Statement", |p| {
        p.first_of::<Stmt>(&[
            &empty_stmt,
            &include_stmt,
            &use_stmt,
            &assignment,
            &function_def,
            &module_def,
            &module_instantiation,
        ])
    })
}

fn empty_stmt(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| p.literal(";").map(|_| StmtKind::Empty))
}

fn file_reference(p: &mut Parser, keyword: &str) -> PResult<String> {
    p.keyword(keyword)?;
    p.literal("<")?;
    let path = p.regex(include_path())?;
    p.literal(">")?;
    Ok(path.trim().to_string())
}

fn include_stmt(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        let path = file_reference(p, "include")?;
        Ok(StmtKind::Include { path, program: None })
    })
}

fn use_stmt(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        let path = file_reference(p, "use")?;
        Ok(StmtKind::Use { path, program: None })
    })
}

fn assignment(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        let name = argument_name(p)?;
        let value = expression(p)?;
        p.literal(";")?;
        Ok(StmtKind::Assign { name, value })
    })
}

fn function_def(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        p.keyword("function")?;
        let name = identifier(p)?;
        let params = parenthesized(p, |p| Ok(parameters(p)))?;
        p.literal("=")?;
        let body = expression(p)?;
        p.literal(";")?;
        Ok(StmtKind::FunctionDef {
            name,
            def: Rc::new(FunctionDef { params, body }),
        })
    })
}

fn module_def(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        p.keyword("module")?;
        let name = identifier(p)?;
        let params = parenthesized(p, |p| Ok(parameters(p)))?;
        let body = statement(p)?;
        Ok(StmtKind::ModuleDef(Rc::new(ModuleDef { name, params, body })))
    })
}

fn module_instantiation(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        let modifiers = p.zero_or_more(|p| p.symbol(MODIFIERS));
        let stmt = p.first_of::<Stmt>(&[&if_else, &single_instance, &block])?;
        Ok(if modifiers.is_empty() {
            stmt.kind
        } else {
            StmtKind::Modified {
                modifiers,
                stmt: Box::new(stmt),
            }
        })
    })
}

fn single_instance(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        let name = identifier(p)?;
        let args = parenthesized(p, |p| Ok(arguments(p)))?;
        let child = child_statement(p)?;
        Ok(StmtKind::Instance {
            name,
            args,
            child: Box::new(child),
        })
    })
}

fn child_statement(p: &mut Parser) -> PResult<Stmt> {
    p.first_of::<Stmt>(&[&empty_stmt, &module_instantiation])
}

fn block(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        p.literal("{")?;
        let body = p.zero_or_more(|p| {
            p.first_of::<Stmt>(&[
                &assignment,
                &module_def,
                &function_def,
                &module_instantiation,
                &empty_stmt,
            ])
        });
        p.literal("}")?;
        Ok(StmtKind::Block(body))
    })
}

fn if_else(p: &mut Parser) -> PResult<Stmt> {
    located(p, |p| {
        p.keyword("if")?;
        let cond = parenthesized(p, expression)?;
        let then = child_statement(p)?;
        let otherwise = p
            .optional(|p| {
                p.keyword("else")?;
                child_statement(p)
            })
            .map(Box::new);
        Ok(StmtKind::IfElse {
            cond,
            then: Box::new(then),
            otherwise,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Stmt> {
        parse_program(src, None, false)
            .unwrap_or_else(|e| panic!("{}", e))
            .statements
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3 - 4").unwrap();
        let Expr::Binary { left, op, right } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(*right, Expr::Number(4.0));
        let Expr::Binary { op, right, .. } = *left else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_unary_and_power() {
        let expr = parse_expression("-2^2").unwrap();
        let Expr::Unary { op, expr } = expr else {
            panic!("expected unary");
        };
        assert_eq!(op, UnaryOp::Neg);
        assert!(matches!(*expr, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_ranges_and_lists() {
        assert!(matches!(
            parse_expression("[0:2:10]").unwrap(),
            Expr::Range { step: Some(_), .. }
        ));
        assert!(matches!(
            parse_expression("[0 : 10]").unwrap(),
            Expr::Range { step: None, .. }
        ));
        let Expr::List(elems) = parse_expression("[1, [2, 3], ]").unwrap() else {
            panic!("expected list");
        };
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn test_comprehension() {
        let Expr::List(elems) =
            parse_expression("[for (i = [0:3]) if (i % 2 == 0) i * 2 else -1]").unwrap()
        else {
            panic!("expected list");
        };
        let ListElem::For { args, elem } = &elems[0] else {
            panic!("expected for");
        };
        assert_eq!(args[0].name.as_deref(), Some("i"));
        assert!(matches!(**elem, ListElem::If { otherwise: Some(_), .. }));

        let Expr::List(elems) = parse_expression("[for (i = 0; i < 3; i = i + 1) i]").unwrap()
        else {
            panic!("expected list");
        };
        assert!(matches!(elems[0], ListElem::ForC { .. }));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse_expression(r#""a\"b\\c\n""#).unwrap(),
            Expr::Str("a\"b\\c\n".to_string())
        );
        let err = parse_expression("\"open").unwrap_err();
        assert!(err.to_string().contains("End of file inside a string"));
    }

    #[test]
    fn test_call_modifiers() {
        let expr = parse_expression("f(1)[0].x").unwrap();
        let Expr::Member { target, name } = expr else {
            panic!("expected member");
        };
        assert_eq!(name, "x");
        assert!(matches!(*target, Expr::Index { .. }));
    }

    #[test]
    fn test_named_arguments_are_not_comparisons() {
        let Expr::Call { args, .. } = parse_expression("f(a = 1, b == 2)").unwrap() else {
            panic!("expected call");
        };
        assert_eq!(args[0].name.as_deref(), Some("a"));
        assert_eq!(args[1].name, None);
    }

    #[test]
    fn test_statements() {
        let stmts = parse(
            "include <lib/a.scad>\n\
             use <b.scad>;\n\
             x = 3;\n\
             function sq(v) = v * v;\n\
             module m(s = 1) { cube(s); }\n\
             translate([1, 0, 0]) m(2);\n\
             if (x > 2) sphere(1); else { cube(1); }\n\
             %cylinder(h = 1);\n",
        );
        assert_eq!(stmts.len(), 9);
        assert!(matches!(&stmts[0].kind, StmtKind::Include { path, .. } if path == "lib/a.scad"));
        assert!(matches!(&stmts[1].kind, StmtKind::Use { path, .. } if path == "b.scad"));
        assert!(matches!(stmts[2].kind, StmtKind::Empty));
        assert!(matches!(stmts[3].kind, StmtKind::Assign { .. }));
        assert!(matches!(stmts[4].kind, StmtKind::FunctionDef { .. }));
        assert!(matches!(stmts[5].kind, StmtKind::ModuleDef(_)));
        assert!(matches!(stmts[6].kind, StmtKind::Instance { .. }));
        assert!(matches!(stmts[7].kind, StmtKind::IfElse { otherwise: Some(_), .. }));
        assert!(matches!(
            &stmts[8].kind,
            StmtKind::Modified { modifiers, .. } if modifiers == &vec![Modifier::Background]
        ));
    }

    #[test]
    fn test_statement_offsets() {
        let stmts = parse("a = 1;\n  cube(1);");
        assert_eq!(stmts[0].offset, 0);
        assert_eq!(stmts[1].offset, 9);
        assert_eq!((stmts[0].line, stmts[1].line), (1, 2));
    }

    #[test]
    fn test_error_points_at_failure() {
        let err = parse_program("cube(1);\nsphere(;\n", None, false).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Error: One of following options required at line 2 column 1"));
        assert!(text.contains("Possible option:"));
        assert!(err.deepest_position() >= 16);
    }

    #[test]
    fn test_comments_and_packrat() {
        let src = "/* header */ cube(1); // trailing\n sphere(2);";
        let plain = parse_program(src, None, false).unwrap();
        let memo = parse_program(src, None, true).unwrap();
        assert_eq!(plain, memo);
        assert_eq!(plain.statements.len(), 2);
    }
}
