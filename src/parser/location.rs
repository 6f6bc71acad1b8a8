// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Line/column lookup and position markers for diagnostics

/// 1-based line and column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Locate `pos` inside `src`. Columns count characters and reset after a newline.
    pub fn of(src: &str, pos: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (i, c) in src.char_indices() {
            if i >= pos {
                break;
            }
            column += 1;
            if c == '\n' {
                line += 1;
                column = 1;
            }
        }
        Self { line, column }
    }
}

/// Source line containing `pos` and a pointer line marking the column.
pub fn mark_position(src: &str, pos: usize) -> (String, String) {
    let pos = pos.min(src.len());
    let line_start = src[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = src[pos..].find('\n').map(|i| pos + i).unwrap_or(src.len());

    let line = &src[line_start..line_end];
    let mut pointer = String::new();
    for (i, _) in line.char_indices() {
        if line_start + i >= pos {
            break;
        }
        pointer.push(' ');
    }
    pointer.push_str("^--- here");

    (line.to_string(), pointer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let src = "ab\ncd\nef";
        assert_eq!(Location::of(src, 0), Location { line: 1, column: 1 });
        assert_eq!(Location::of(src, 1), Location { line: 1, column: 2 });
        assert_eq!(Location::of(src, 3), Location { line: 2, column: 1 });
        assert_eq!(Location::of(src, 7), Location { line: 3, column: 2 });
    }

    #[test]
    fn test_mark_position() {
        let (line, pointer) = mark_position("foo\nbar baz\n", 8);
        assert_eq!(line, "bar baz");
        assert_eq!(pointer, "    ^--- here");
    }

    #[test]
    fn test_mark_end_of_input() {
        let (line, pointer) = mark_position("abc", 3);
        assert_eq!(line, "abc");
        assert_eq!(pointer, "   ^--- here");
    }
}
