// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Whitespace and comment skipping

use std::ops::BitOr;

/// Classes of input skipped between tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Skip(u8);

impl Skip {
    pub const NONE: Skip = Skip(0);
    pub const WHITE_CHARS: Skip = Skip(1);
    pub const C_STYLE_COMMENT: Skip = Skip(2);
    pub const CPP_STYLE_COMMENT: Skip = Skip(4);
    pub const SHELL_COMMENT: Skip = Skip(8);

    pub fn contains(self, other: Skip) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Skip {
    type Output = Skip;

    fn bitor(self, rhs: Skip) -> Skip {
        Skip(self.0 | rhs.0)
    }
}

/// Custom skipper: returns the new position, or the start of an
/// unterminated construct.
pub type SkipFn = fn(&str, usize) -> Result<usize, usize>;

/// Whitespace policy applied before every primitive
#[derive(Debug, Clone, Copy)]
pub struct Whitespace {
    classes: Skip,
    custom: Option<SkipFn>,
}

impl Whitespace {
    pub fn new(classes: Skip) -> Self {
        Self {
            classes,
            custom: None,
        }
    }

    pub fn with_custom(classes: Skip, custom: SkipFn) -> Self {
        Self {
            classes,
            custom: Some(custom),
        }
    }

    /// Whitespace, C and C++ comments
    pub fn c_like() -> Self {
        Self::new(Skip::WHITE_CHARS | Skip::C_STYLE_COMMENT | Skip::CPP_STYLE_COMMENT)
    }

    /// Tag distinguishing skip policies in the position cache
    pub(crate) fn cache_tag(&self) -> u16 {
        self.classes.bits() as u16 | if self.custom.is_some() { 0x100 } else { 0 }
    }

    /// Skip everything this policy covers, starting at `pos`.
    /// On an unterminated comment returns the position where it started.
    pub fn skip(&self, src: &str, mut pos: usize) -> Result<usize, usize> {
        while pos < src.len() {
            let start = pos;
            pos = self.step(src, pos)?;
            if pos == start {
                break;
            }
        }
        Ok(pos)
    }

    fn step(&self, src: &str, mut pos: usize) -> Result<usize, usize> {
        if let Some(custom) = self.custom {
            pos = custom(src, pos)?;
        }

        if self.classes.contains(Skip::WHITE_CHARS) {
            pos += src[pos..]
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map(|(i, _)| i)
                .unwrap_or(src.len() - pos);
        }

        if self.classes.contains(Skip::C_STYLE_COMMENT) && src[pos..].starts_with("/*") {
            match src[pos + 2..].find("*/") {
                Some(end) => pos += 2 + end + 2,
                None => return Err(pos),
            }
        }

        if self.classes.contains(Skip::CPP_STYLE_COMMENT) && src[pos..].starts_with("//") {
            pos = skip_line(src, pos + 2);
        }

        if self.classes.contains(Skip::SHELL_COMMENT) && src[pos..].starts_with('#') {
            pos = skip_line(src, pos + 1);
        }

        Ok(pos)
    }
}

fn skip_line(src: &str, pos: usize) -> usize {
    src[pos..].find('\n').map(|i| pos + i + 1).unwrap_or(src.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_mixed() {
        let ws = Whitespace::c_like();
        let src = "  /* a */ // b\n\t x";
        assert_eq!(ws.skip(src, 0), Ok(src.len() - 1));
    }

    #[test]
    fn test_unterminated_comment() {
        let ws = Whitespace::c_like();
        assert_eq!(ws.skip("  /* never", 0), Err(2));
    }

    #[test]
    fn test_shell_comment_only_when_enabled() {
        let src = "# comment\nx";
        assert_eq!(Whitespace::c_like().skip(src, 0), Ok(0));
        let shell = Whitespace::new(Skip::WHITE_CHARS | Skip::SHELL_COMMENT);
        assert_eq!(shell.skip(src, 0), Ok(src.len() - 1));
    }

    #[test]
    fn test_custom_skipper() {
        fn semis(src: &str, pos: usize) -> Result<usize, usize> {
            Ok(pos + src[pos..].chars().take_while(|c| *c == ';').count())
        }
        let ws = Whitespace::with_custom(Skip::WHITE_CHARS, semis);
        assert_eq!(ws.skip(";; ;x", 0), Ok(4));
    }
}
