// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parsing context: input, position, primitives and combinators
//!
//! Every rule either succeeds and advances the position, or fails with a
//! [`ParseError`] and leaves the position where it was.

use super::error::ParseError;
use super::packrat::{CacheEntry, Packrat};
use super::whitespace::Whitespace;
use super::word::Word;
use ahash::AHashMap;
use regex::Regex;
use std::rc::Rc;
use std::sync::Arc;

pub type PResult<T> = Result<T, ParseError>;

/// Borrowed rule, used where alternatives are passed as a slice
pub type Rule<'a, T> = &'a dyn Fn(&mut Parser) -> PResult<T>;

pub struct Parser {
    source: Arc<str>,
    pos: usize,
    whitespace: Option<Whitespace>,
    ws_cache: AHashMap<(usize, u16), usize>,
    packrat: Packrat,
    newlines: Vec<usize>,
}

impl Parser {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = source.into();
        let newlines = source.match_indices('\n').map(|(i, _)| i).collect();
        Self {
            source,
            pos: 0,
            whitespace: None,
            ws_cache: AHashMap::new(),
            packrat: Packrat::Null,
            newlines,
        }
    }

    pub fn with_whitespace(mut self, whitespace: Whitespace) -> Self {
        self.whitespace = Some(whitespace);
        self
    }

    /// Enable memoization of named rules
    pub fn with_packrat(mut self) -> Self {
        self.packrat = Packrat::memo();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shared_source(&self) -> Arc<str> {
        self.source.clone()
    }

    /// 1-based line of a byte offset
    pub fn line_at(&self, pos: usize) -> usize {
        self.newlines.partition_point(|&n| n < pos) + 1
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    /// Unparsed remainder
    pub fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self, bytes: usize) {
        self.set_position(self.pos + bytes);
    }

    pub fn packrat(&self) -> &Packrat {
        &self.packrat
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.pos, message)
    }

    pub fn error_at(&self, pos: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.source.clone(), pos, message)
    }

    /// Apply the current whitespace policy
    pub fn skip_whitespace(&mut self) -> PResult<()> {
        let Some(ws) = self.whitespace else {
            return Ok(());
        };
        let key = (self.pos, ws.cache_tag());
        if let Some(&end) = self.ws_cache.get(&key) {
            self.pos = end;
            return Ok(());
        }
        match ws.skip(&self.source, self.pos) {
            Ok(end) => {
                self.ws_cache.insert(key, end);
                self.pos = end;
                Ok(())
            }
            Err(at) => Err(self.error_at(at, "Comment did not end")),
        }
    }

    /// Run `f`, restoring the position if it fails
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Named rule. Results are memoized when packrat is enabled, and
    /// re-entering a rule at the same position fails as left recursion.
    pub fn rule<T: Clone + 'static>(
        &mut self,
        id: &'static str,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let start = self.pos;
        match self.packrat.get(start, id) {
            Some(CacheEntry::InProgress) => {
                return Err(self.error(format!("Left recursion detected in rule {}", id)));
            }
            Some(CacheEntry::Success { value, end }) => {
                if let Some(value) = value.downcast_ref::<T>() {
                    let value = value.clone();
                    self.pos = *end;
                    return Ok(value);
                }
            }
            Some(CacheEntry::Failure(err)) => return Err(err.clone()),
            None => {}
        }

        self.packrat.set(start, id, CacheEntry::InProgress);
        let result = self.attempt(f).map_err(|e| e.within(id));
        let entry = match &result {
            Ok(value) => CacheEntry::Success {
                value: Rc::new(value.clone()),
                end: self.pos,
            },
            Err(err) => CacheEntry::Failure(err.clone()),
        };
        self.packrat.set(start, id, entry);
        result
    }

    pub fn literal(&mut self, text: &str) -> PResult<()> {
        self.skip_whitespace()?;
        if self.rest().starts_with(text) {
            self.pos += text.len();
            Ok(())
        } else {
            Err(self.error(format!("Expected `{}'", text)))
        }
    }

    /// First matching literal from `options`, in order
    pub fn literals(&mut self, options: &[&'static str]) -> PResult<&'static str> {
        self.skip_whitespace()?;
        for &option in options {
            if self.rest().starts_with(option) {
                self.pos += option.len();
                return Ok(option);
            }
        }
        Err(self.error(format!("Waiting for one of {}", options.join("/"))))
    }

    /// Literal that is not followed by an identifier character
    pub fn keyword(&mut self, text: &str) -> PResult<()> {
        self.skip_whitespace()?;
        let rest = self.rest();
        let matched = rest.starts_with(text)
            && rest[text.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
        if matched {
            self.pos += text.len();
            Ok(())
        } else {
            Err(self.error(format!("Expected keyword `{}'", text)))
        }
    }

    pub fn word(&mut self, word: &Word) -> PResult<String> {
        self.skip_whitespace()?;
        match word.scan(&self.source, self.pos) {
            Some(len) => {
                let text = self.source[self.pos..self.pos + len].to_string();
                self.pos += len;
                Ok(text)
            }
            None => Err(self.error(format!("Expected word {}", word))),
        }
    }

    /// Regex match anchored at the current position
    pub fn regex(&mut self, re: &Regex) -> PResult<String> {
        self.skip_whitespace()?;
        match re.find(self.rest()) {
            Some(m) if m.start() == 0 => {
                let text = m.as_str().to_string();
                self.pos += m.end();
                Ok(text)
            }
            _ => Err(self.error(format!("Waiting for {}", re.as_str()))),
        }
    }

    /// `[+-]? ([0-9]* ".")? [0-9]+ ([eE][+-]?[0-9]+)?`
    pub fn float(&mut self) -> PResult<f64> {
        self.skip_whitespace()?;
        let bytes = self.source.as_bytes();
        let digits_from = |mut i: usize| {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            i
        };

        let start = self.pos;
        let mut i = start;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let int_start = i;
        i = digits_from(i);
        let has_int = i > int_start;
        if i < bytes.len() && bytes[i] == b'.' {
            let frac_end = digits_from(i + 1);
            if frac_end > i + 1 {
                i = frac_end;
            } else if !has_int {
                return Err(self.error("Expected floating point number"));
            }
        } else if !has_int {
            return Err(self.error("Expected floating point number"));
        }

        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            let exp_end = digits_from(j);
            if exp_end > j {
                i = exp_end;
            }
        }

        match self.source[start..i].parse::<f64>() {
            Ok(value) => {
                self.pos = i;
                Ok(value)
            }
            Err(_) => Err(self.error("Expected floating point number")),
        }
    }

    pub fn eof(&mut self) -> PResult<()> {
        self.skip_whitespace()?;
        if self.pos == self.source.len() {
            Ok(())
        } else {
            Err(self.error("Not all context was parsed"))
        }
    }

    pub fn not_eof(&mut self) -> PResult<()> {
        self.skip_whitespace()?;
        if self.pos < self.source.len() {
            Ok(())
        } else {
            Err(self.error("Unexpected end of file"))
        }
    }

    /// Ordered choice. On failure the error carries the deepest alternatives.
    pub fn first_of<T>(&mut self, alternatives: &[Rule<'_, T>]) -> PResult<T> {
        let start = self.pos;
        let mut error = self.error("One of following options required");
        for alternative in alternatives {
            match alternative(self) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    self.pos = start;
                    error.add_child(err);
                }
            }
        }
        Err(error)
    }

    pub fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        self.attempt(f).ok()
    }

    /// Between `min` and `max` repetitions of `item`
    pub fn repeated<T>(
        &mut self,
        min: usize,
        max: Option<usize>,
        item: impl Fn(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let start = self.pos;
        let mut items = Vec::new();
        while max.map_or(true, |max| items.len() < max) {
            let before = self.pos;
            match self.attempt(&item) {
                Ok(value) => {
                    items.push(value);
                    if self.pos == before {
                        break;
                    }
                }
                Err(err) => {
                    if items.len() < min {
                        self.pos = start;
                        return Err(err);
                    }
                    break;
                }
            }
        }
        Ok(items)
    }

    pub fn zero_or_more<T>(&mut self, item: impl Fn(&mut Self) -> PResult<T>) -> Vec<T> {
        self.repeated(0, None, item).unwrap_or_default()
    }

    pub fn one_or_more<T>(&mut self, item: impl Fn(&mut Self) -> PResult<T>) -> PResult<Vec<T>> {
        self.repeated(1, None, item)
    }

    /// `item (delim item)*`, possibly empty
    pub fn delimited_list<T, D>(
        &mut self,
        item: impl Fn(&mut Self) -> PResult<T>,
        delim: impl Fn(&mut Self) -> PResult<D>,
    ) -> Vec<T> {
        let mut items = Vec::new();
        match self.attempt(&item) {
            Ok(value) => items.push(value),
            Err(_) => return items,
        }
        loop {
            let save = self.pos;
            if self.attempt(&delim).is_err() {
                break;
            }
            match self.attempt(&item) {
                Ok(value) => items.push(value),
                Err(_) => {
                    self.pos = save;
                    break;
                }
            }
        }
        items
    }

    /// Lookahead: succeeds if `f` would match, never consumes input
    pub fn followed_by<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<()> {
        let start = self.pos;
        let result = f(self);
        self.pos = start;
        result.map(|_| ())
    }

    /// Negative lookahead: fails if `f` would match, never consumes input
    pub fn not_any<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<()> {
        let start = self.pos;
        let result = f(self);
        self.pos = start;
        match result {
            Ok(_) => Err(self.error("Unexpected input")),
            Err(_) => Ok(()),
        }
    }

    /// Source text matched by `f`, parsed under a different whitespace policy
    pub fn combine<T>(
        &mut self,
        whitespace: Option<Whitespace>,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<String> {
        self.skip_whitespace()?;
        let start = self.pos;
        let saved = std::mem::replace(&mut self.whitespace, whitespace);
        let result = self.attempt(f);
        self.whitespace = saved;
        result.map(|_| self.source[start..self.pos].to_string())
    }
}
