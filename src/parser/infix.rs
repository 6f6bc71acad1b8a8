// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Left-associative binary operator chains

use super::context::{PResult, Parser};

/// `Value (Op Value)*` folded to the left
#[derive(Debug, Clone, PartialEq)]
pub enum Infix<T, O> {
    Value(T),
    Binary {
        left: Box<Infix<T, O>>,
        op: O,
        right: T,
    },
}

impl<T, O> Infix<T, O> {
    /// Collapse the chain with `leaf` for operands and `combine` for operators
    pub fn fold<R>(
        self,
        leaf: &mut impl FnMut(T) -> R,
        combine: &mut impl FnMut(R, O, R) -> R,
    ) -> R {
        match self {
            Infix::Value(value) => leaf(value),
            Infix::Binary { left, op, right } => {
                let left = left.fold(leaf, combine);
                let right = leaf(right);
                combine(left, op, right)
            }
        }
    }
}

impl Parser {
    /// One of the symbols in `table`, tried in order
    pub fn symbol<O: Copy>(&mut self, table: &[(&'static str, O)]) -> PResult<O> {
        self.skip_whitespace()?;
        for &(text, op) in table {
            if self.rest().starts_with(text) {
                self.advance(text.len());
                return Ok(op);
            }
        }
        let names: Vec<&str> = table.iter().map(|(text, _)| *text).collect();
        Err(self.error(format!("Waiting for one of {}", names.join("/"))))
    }

    /// Operands separated by operators from `table`. Longer spellings must
    /// come before their prefixes.
    pub fn infix<T, O: Copy>(
        &mut self,
        table: &[(&'static str, O)],
        operand: impl Fn(&mut Parser) -> PResult<T>,
    ) -> PResult<Infix<T, O>> {
        let first = self.attempt(&operand)?;
        let mut chain = Infix::Value(first);
        loop {
            let save = self.position();
            let Ok(op) = self.symbol(table) else {
                self.set_position(save);
                break;
            };
            match self.attempt(&operand) {
                Ok(right) => {
                    chain = Infix::Binary {
                        left: Box::new(chain),
                        op,
                        right,
                    }
                }
                Err(_) => {
                    self.set_position(save);
                    break;
                }
            }
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Whitespace;

    const ADDITIVE: &[(&str, char)] = &[("+", '+'), ("-", '-')];

    fn eval(chain: Infix<f64, char>) -> f64 {
        chain.fold(&mut |v| v, &mut |l, op, r| if op == '+' { l + r } else { l - r })
    }

    #[test]
    fn test_left_fold() {
        let mut p = Parser::new("10 - 3 - 2").with_whitespace(Whitespace::c_like());
        let chain = p.infix(ADDITIVE, |p| p.float()).unwrap();
        assert_eq!(eval(chain), 5.0);
        assert!(p.eof().is_ok());
    }

    #[test]
    fn test_dangling_operator_is_left_unparsed() {
        let mut p = Parser::new("1 + ;").with_whitespace(Whitespace::c_like());
        let chain = p.infix(ADDITIVE, |p| p.float()).unwrap();
        assert_eq!(chain, Infix::Value(1.0));
        assert_eq!(p.rest(), " + ;");
    }

    #[test]
    fn test_symbol_prefers_listed_order() {
        let mut p = Parser::new("<= 1");
        let op = p.symbol(&[("<=", 1), ("<", 2)]).unwrap();
        assert_eq!(op, 1);
        let err = Parser::new("?").symbol(&[("<", 2)]).unwrap_err();
        assert_eq!(err.message, "Waiting for one of <");
    }
}
