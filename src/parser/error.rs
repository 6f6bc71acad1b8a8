// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structured parse errors

use super::location::{mark_position, Location};
use std::fmt;
use std::sync::Arc;

/// Parse failure with the alternatives that failed at the deepest position.
#[derive(Debug, Clone, thiserror::Error)]
pub struct ParseError {
    input: Arc<str>,
    pub position: usize,
    pub message: String,
    pub children: Vec<ParseError>,
}

impl ParseError {
    pub fn new(source: Arc<str>, position: usize, message: impl Into<String>) -> Self {
        Self {
            input: source,
            position,
            message: message.into(),
            children: Vec::new(),
        }
    }

    /// Merge a failed alternative: deeper errors replace shallower ones,
    /// errors at the same position become siblings.
    pub fn add_child(&mut self, child: ParseError) {
        if let Some(first) = self.children.first() {
            if child.position < first.position {
                return;
            }
            if child.position > first.position {
                self.children.clear();
            }
        }
        self.children.push(child);
    }

    /// Prefix the message with the name of the rule that failed
    pub fn within(mut self, rule: &str) -> Self {
        self.message = format!("When parsing {}: {}", rule, self.message);
        self
    }

    pub fn location(&self) -> Location {
        Location::of(&self.input, self.position)
    }

    /// Position of the deepest failure in this error tree
    pub fn deepest_position(&self) -> usize {
        self.children
            .iter()
            .map(ParseError::deepest_position)
            .fold(self.position, usize::max)
    }

    /// Render with line, pointer and nested alternatives
    pub fn render(&self, offset: usize) -> String {
        let loc = self.location();
        let (line, pointer) = mark_position(&self.input, self.position);
        let off = " ".repeat(offset);

        let mut msg = format!(
            "{}Error: {} at line {} column {}\n{}\n{}",
            off, self.message, loc.line, loc.column, line, pointer
        );
        for child in &self.children {
            msg.push_str(&format!("\n{}Possible option:\n{}", off, child.render(offset + 1)));
        }
        msg
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(src: &Arc<str>, pos: usize, msg: &str) -> ParseError {
        ParseError::new(src.clone(), pos, msg)
    }

    #[test]
    fn test_add_child_keeps_deepest() {
        let src: Arc<str> = Arc::from("abcdef");
        let mut parent = err(&src, 0, "parent");
        parent.add_child(err(&src, 2, "a"));
        parent.add_child(err(&src, 2, "b"));
        assert_eq!(parent.children.len(), 2);

        parent.add_child(err(&src, 1, "shallow"));
        assert_eq!(parent.children.len(), 2);

        parent.add_child(err(&src, 4, "deep"));
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].message, "deep");
        assert_eq!(parent.deepest_position(), 4);
    }

    #[test]
    fn test_render_format() {
        let src: Arc<str> = Arc::from("x = ;\n");
        let mut e = err(&src, 4, "One of following options required");
        e.add_child(err(&src, 4, "Expected `('"));
        let text = e.to_string();
        assert_eq!(
            text,
            "Error: One of following options required at line 1 column 5\nx = ;\n    ^--- here\n\
             Possible option:\n Error: Expected `(' at line 1 column 5\nx = ;\n    ^--- here"
        );
    }
}
