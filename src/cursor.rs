//! UTF-8 source cursor: decoding, position tracking, and code-point
//! classification shared by the lexer and the error model.

use unicode_general_category::{get_general_category, GeneralCategory};

/// A 1-based line/column plus byte offset, used only on the error-reporting
/// path (the cursor itself never tracks line/column eagerly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

/// Computes the line/column of a byte offset by replaying line-terminator
/// classification over the prefix. Only called when rendering an error, so
/// it doesn't need to be fast.
pub fn position_at(input: &str, offset: usize) -> Position {
    let mut line = 1u32;
    let mut column = 1u32;
    for ch in input[..offset.min(input.len())].chars() {
        if is_line_terminator(ch) {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position { line, column, offset }
}

/// Pull-based decoder over a borrowed `&str`. Tracks only a byte offset;
/// everything else is derived on demand.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor over `input`, silently consuming a leading BOM.
    pub fn new(input: &'a str) -> Self {
        let offset = if input.starts_with('\u{FEFF}') {
            '\u{FEFF}'.len_utf8()
        } else {
            0
        };
        Self { input, offset }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// The current code point, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    /// The code point one past the current one, without consuming anything.
    pub fn peek2(&self) -> Option<char> {
        let mut chars = self.input[self.offset..].chars();
        chars.next()?;
        chars.next()
    }

    /// Consumes and returns the current code point.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Rewinds the cursor to a previously observed offset.
    pub fn reset_to(&mut self, offset: usize) {
        debug_assert!(offset <= self.input.len());
        self.offset = offset;
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }
}

/// Line terminators recognized per the spec: LF, VT, FF, CR (CRLF collapses
/// to one `TERM` at the lexer level), NEL, LS, PS.
pub fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\u{000A}' | '\u{000B}' | '\u{000C}' | '\u{000D}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Horizontal whitespace: Unicode Zs plus ASCII HT, excluding line terminators.
pub fn is_whitespace(c: char) -> bool {
    if is_line_terminator(c) {
        return false;
    }
    c == '\u{0009}' || get_general_category(c) == GeneralCategory::SpaceSeparator
}

/// Control characters (Cc), excluding the whitespace/line-terminator set
/// that's explicitly whitelisted. These are rejected in unquoted and quoted
/// argument contexts alike (forbidden characters).
pub fn is_forbidden_control(c: char) -> bool {
    if is_whitespace(c) || is_line_terminator(c) {
        return false;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::Control | GeneralCategory::Unassigned
    )
}

/// Reserved punctuators that always terminate a bare argument.
pub fn is_reserved_punctuator(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | '#' | '"' | '\'')
}
