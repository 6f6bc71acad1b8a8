// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Character-class word scanner

use std::fmt;

/// Set of characters written as ranges, e.g. `A-Za-z_`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Build from a pattern such as `A-Za-z0-9_$`. A `-` at either end is literal.
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if i + 2 < chars.len() && chars[i + 1] == '-' {
                ranges.push((chars[i], chars[i + 2]));
                i += 3;
            } else {
                ranges.push((chars[i], chars[i]));
                i += 1;
            }
        }
        Self { ranges }
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for &(lo, hi) in &self.ranges {
            if lo == hi {
                write!(f, "{}", lo)?;
            } else {
                write!(f, "{}-{}", lo, hi)?;
            }
        }
        write!(f, "]")
    }
}

/// Word with a first-character class, a rest class, and an optional length cap
#[derive(Debug, Clone)]
pub struct Word {
    first: CharClass,
    rest: CharClass,
    max_len: Option<usize>,
}

impl Word {
    pub fn new(first: &str, rest: &str) -> Self {
        Self {
            first: CharClass::new(first),
            rest: CharClass::new(rest),
            max_len: None,
        }
    }

    /// Same class for every character
    pub fn uniform(chars: &str) -> Self {
        Self::new(chars, chars)
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Byte length of the word starting at `pos`, or None
    pub fn scan(&self, src: &str, pos: usize) -> Option<usize> {
        let mut chars = src[pos..].char_indices();
        let (_, first) = chars.next()?;
        if !self.first.contains(first) {
            return None;
        }

        let mut end = first.len_utf8();
        let mut count = 1;
        for (i, c) in chars {
            if self.max_len.is_some_and(|max| count >= max) || !self.rest.contains(c) {
                break;
            }
            end = i + c.len_utf8();
            count += 1;
        }
        Some(end)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_len {
            Some(max) => write!(f, "{}{}{{0,{}}}", self.first, self.rest, max),
            None => write!(f, "{}{}*", self.first, self.rest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_word() {
        let ident = Word::new("A-Za-z_$", "A-Za-z0-9_");
        assert_eq!(ident.scan("$fn = 3", 0), Some(3));
        assert_eq!(ident.scan("foo_1+", 0), Some(5));
        assert_eq!(ident.scan("1abc", 0), None);
        assert_eq!(ident.scan("", 0), None);
        assert_eq!(ident.to_string(), "[A-Za-z_$][A-Za-z0-9_]*");
    }

    #[test]
    fn test_max_len() {
        let hex = Word::uniform("0-9a-f").with_max_len(2);
        assert_eq!(hex.scan("abcd", 0), Some(2));
        assert_eq!(hex.scan("a", 0), Some(1));
    }
}
