//! Token recognition (spec §4.2): a pull-based lexer producing one token
//! per call, with no suspension and no I/O.

use std::borrow::Cow;

use crate::ast::{ArgumentKind, CommentKind};
use crate::cursor::{self, Cursor};
use crate::error::ParseError;
use crate::options::ParserOptions;

/// Characters escapable with a leading backslash in bare and quoted
/// argument position, per spec §4.2. The quoted scanner additionally
/// admits the *current* delimiter, which is always a member of this set.
const ESCAPABLE: [char; 6] = ['{', '}', ';', '#', '"', '\''];

fn is_escapable(c: char) -> bool {
    ESCAPABLE.contains(&c) || c == '\\'
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    LBrace,
    RBrace,
    /// End of directive: a line terminator or `;`, not suppressed by a
    /// preceding line continuation.
    Term,
    Argument(Cow<'a, str>, ArgumentKind),
    Comment(Cow<'a, str>, CommentKind),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub offset: usize,
    pub length: usize,
}

impl<'a> Token<'a> {
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    cursor: Cursor<'a>,
    options: ParserOptions,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, options: ParserOptions) -> Self {
        Self {
            input,
            cursor: Cursor::new(input),
            options,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Produces the next token, or `Eof` once the input is exhausted.
    ///
    /// Standalone line continuations (a backslash directly before a line
    /// terminator, not part of any argument) are swallowed here rather than
    /// surfaced as a token: they behave exactly like whitespace from the
    /// parser's point of view.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        loop {
            self.skip_horizontal_whitespace();

            if self.cursor.is_eof() {
                let offset = self.cursor.offset();
                return Ok(Token {
                    kind: TokenKind::Eof,
                    offset,
                    length: 0,
                });
            }

            let start = self.cursor.offset();
            let c = self.cursor.peek().unwrap();

            if cursor::is_forbidden_control(c) {
                return Err(ParseError::ControlCharacter {
                    offset: start,
                    codepoint: c as u32,
                });
            }

            if c == '#' {
                let text = self.scan_line_comment(1)?;
                return Ok(Token {
                    kind: TokenKind::Comment(text, CommentKind::Hash),
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if self.options.c_style_comments && c == '/' && self.cursor.peek2() == Some('/') {
                let text = self.scan_line_comment(2)?;
                return Ok(Token {
                    kind: TokenKind::Comment(text, CommentKind::CLine),
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if self.options.c_style_comments && c == '/' && self.cursor.peek2() == Some('*') {
                let text = self.scan_block_comment()?;
                return Ok(Token {
                    kind: TokenKind::Comment(text, CommentKind::CBlock),
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if cursor::is_line_terminator(c) {
                self.bump_line_terminator();
                return Ok(Token {
                    kind: TokenKind::Term,
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if c == ';' {
                self.cursor.bump();
                return Ok(Token {
                    kind: TokenKind::Term,
                    offset: start,
                    length: 1,
                });
            }

            if c == '{' {
                self.cursor.bump();
                return Ok(Token {
                    kind: TokenKind::LBrace,
                    offset: start,
                    length: 1,
                });
            }

            if c == '}' {
                self.cursor.bump();
                return Ok(Token {
                    kind: TokenKind::RBrace,
                    offset: start,
                    length: 1,
                });
            }

            if c == '\\' {
                self.cursor.bump();
                match self.cursor.peek() {
                    Some(nc) if cursor::is_line_terminator(nc) => {
                        self.bump_line_terminator();
                        // Standalone continuation: swallow and loop for the
                        // next real token.
                        continue;
                    }
                    None => {
                        return Err(ParseError::DanglingContinuation { offset: start });
                    }
                    Some(_) => {
                        // Backslash is part of an argument; rewind and let
                        // the bare-argument scanner handle escaping.
                        self.cursor.reset_to(start);
                        let (value, kind) = self.scan_bare_argument()?;
                        return Ok(Token {
                            kind: TokenKind::Argument(value, kind),
                            offset: start,
                            length: self.cursor.offset() - start,
                        });
                    }
                }
            }

            if c == '"' || c == '\'' {
                let (value, kind) = self.scan_quoted_argument(c)?;
                return Ok(Token {
                    kind: TokenKind::Argument(value, kind),
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if self.options.expression_arguments && c == '(' {
                let value = self.scan_expression_argument()?;
                return Ok(Token {
                    kind: TokenKind::Argument(value, ArgumentKind::Expression),
                    offset: start,
                    length: self.cursor.offset() - start,
                });
            }

            if let Some(matched_len) = self.match_punctuator() {
                let text = &self.input[start..start + matched_len];
                self.cursor.reset_to(start + matched_len);
                return Ok(Token {
                    kind: TokenKind::Argument(Cow::Borrowed(text), ArgumentKind::Punctuator),
                    offset: start,
                    length: matched_len,
                });
            }

            let (value, kind) = self.scan_bare_argument()?;
            return Ok(Token {
                kind: TokenKind::Argument(value, kind),
                offset: start,
                length: self.cursor.offset() - start,
            });
        }
    }

    fn skip_horizontal_whitespace(&mut self) {
        while let Some(c) = self.cursor.peek() {
            if cursor::is_whitespace(c) {
                self.cursor.bump();
            } else {
                break;
            }
        }
    }

    /// Consumes one line terminator, folding CRLF into a single step.
    fn bump_line_terminator(&mut self) {
        let c = self.cursor.bump();
        if c == Some('\r') && self.cursor.peek() == Some('\n') {
            self.cursor.bump();
        }
    }

    fn match_punctuator(&self) -> Option<usize> {
        let rest = self.cursor.rest();
        self.options
            .sorted_punctuators()
            .into_iter()
            .find(|p| rest.starts_with(*p))
            .map(str::len)
    }

    fn scan_line_comment(&mut self, intro_len: usize) -> Result<Cow<'a, str>, ParseError> {
        for _ in 0..intro_len {
            self.cursor.bump();
        }
        let text_start = self.cursor.offset();
        while let Some(c) = self.cursor.peek() {
            if cursor::is_line_terminator(c) {
                break;
            }
            if cursor::is_forbidden_control(c) {
                return Err(ParseError::ControlCharacter {
                    offset: self.cursor.offset(),
                    codepoint: c as u32,
                });
            }
            self.cursor.bump();
        }
        Ok(Cow::Borrowed(&self.input[text_start..self.cursor.offset()]))
    }

    fn scan_block_comment(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let start = self.cursor.offset();
        self.cursor.bump(); // '/'
        self.cursor.bump(); // '*'
        let text_start = self.cursor.offset();
        loop {
            match self.cursor.peek() {
                None => return Err(ParseError::UnterminatedComment { offset: start }),
                Some('*') if self.cursor.peek2() == Some('/') => {
                    let text_end = self.cursor.offset();
                    self.cursor.bump();
                    self.cursor.bump();
                    return Ok(Cow::Borrowed(&self.input[text_start..text_end]));
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn scan_bare_argument(&mut self) -> Result<(Cow<'a, str>, ArgumentKind), ParseError> {
        let start = self.cursor.offset();
        let mut owned: Option<String> = None;

        loop {
            match self.cursor.peek() {
                None => break,
                Some(c) if cursor::is_whitespace(c) || cursor::is_line_terminator(c) => break,
                Some(c) if cursor::is_reserved_punctuator(c) => break,
                Some('(') if self.options.expression_arguments => break,
                Some('\\') => {
                    let backslash_offset = self.cursor.offset();
                    ensure_owned(&mut owned, self.input, start, backslash_offset);
                    self.cursor.bump();
                    match self.cursor.peek() {
                        None => return Err(ParseError::EscapeAtEof { offset: backslash_offset }),
                        Some(nc) if cursor::is_line_terminator(nc) => {
                            self.bump_line_terminator();
                        }
                        Some(nc) if is_escapable(nc) => {
                            self.cursor.bump();
                            owned.as_mut().unwrap().push(nc);
                        }
                        Some(nc) => {
                            return Err(ParseError::BadEscape {
                                offset: backslash_offset,
                                codepoint: nc,
                            })
                        }
                    }
                }
                Some(c) if cursor::is_forbidden_control(c) => {
                    return Err(ParseError::ControlCharacter {
                        offset: self.cursor.offset(),
                        codepoint: c as u32,
                    })
                }
                Some(c) => {
                    if let Some(buf) = owned.as_mut() {
                        buf.push(c);
                    }
                    self.cursor.bump();
                }
            }
        }

        let value = match owned {
            Some(s) => Cow::Owned(s),
            None => Cow::Borrowed(&self.input[start..self.cursor.offset()]),
        };
        Ok((value, ArgumentKind::Bare))
    }

    fn scan_quoted_argument(&mut self, delim: char) -> Result<(Cow<'a, str>, ArgumentKind), ParseError> {
        let start = self.cursor.offset();
        self.cursor.bump(); // opening delimiter

        let is_triple = self.cursor.peek() == Some(delim) && self.cursor.peek2() == Some(delim);
        if is_triple {
            self.cursor.bump();
            self.cursor.bump();
            let text = self.scan_triple_body(start, delim)?;
            return Ok((text, ArgumentKind::Triple));
        }

        let mut owned = String::new();
        loop {
            match self.cursor.peek() {
                None => return Err(ParseError::UnterminatedQuote { offset: start }),
                Some(c) if c == delim => {
                    self.cursor.bump();
                    break;
                }
                Some(c) if cursor::is_line_terminator(c) => {
                    return Err(ParseError::UnterminatedQuote { offset: start })
                }
                Some('\\') => {
                    let backslash_offset = self.cursor.offset();
                    self.cursor.bump();
                    match self.cursor.peek() {
                        None => return Err(ParseError::EscapeAtEof { offset: backslash_offset }),
                        Some(nc) if cursor::is_line_terminator(nc) => {
                            self.bump_line_terminator();
                        }
                        Some(nc) if is_escapable(nc) || nc == delim => {
                            self.cursor.bump();
                            owned.push(nc);
                        }
                        Some(nc) => {
                            return Err(ParseError::BadEscape {
                                offset: backslash_offset,
                                codepoint: nc,
                            })
                        }
                    }
                }
                Some(c) if cursor::is_forbidden_control(c) => {
                    return Err(ParseError::ControlCharacter {
                        offset: self.cursor.offset(),
                        codepoint: c as u32,
                    })
                }
                Some(c) => {
                    owned.push(c);
                    self.cursor.bump();
                }
            }
        }

        Ok((Cow::Owned(owned), ArgumentKind::Quoted))
    }

    /// Scans the verbatim body of a triple-quoted argument: no escape
    /// processing, closed only by three consecutive `delim` characters.
    fn scan_triple_body(&mut self, start: usize, delim: char) -> Result<Cow<'a, str>, ParseError> {
        let text_start = self.cursor.offset();
        loop {
            match self.cursor.peek() {
                None => return Err(ParseError::UnterminatedTripleQuote { offset: start }),
                Some(c) if c == delim => {
                    let close_start = self.cursor.offset();
                    self.cursor.bump();
                    if self.cursor.peek() == Some(delim) && self.cursor.peek2() == Some(delim) {
                        self.cursor.bump();
                        self.cursor.bump();
                        return Ok(Cow::Borrowed(&self.input[text_start..close_start]));
                    }
                    // Not a closing triple: the lone quote is ordinary content.
                }
                Some(c) if cursor::is_forbidden_control(c) => {
                    return Err(ParseError::ControlCharacter {
                        offset: self.cursor.offset(),
                        codepoint: c as u32,
                    })
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn scan_expression_argument(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let start = self.cursor.offset();
        self.cursor.bump(); // opening '('
        let body_start = self.cursor.offset();
        let mut depth = 1usize;
        loop {
            match self.cursor.peek() {
                None => return Err(ParseError::UnbalancedExpression { offset: start }),
                Some('(') => {
                    depth += 1;
                    self.cursor.bump();
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        let body_end = self.cursor.offset();
                        self.cursor.bump();
                        return Ok(Cow::Borrowed(&self.input[body_start..body_end]));
                    }
                    self.cursor.bump();
                }
                Some(c) if cursor::is_forbidden_control(c) => {
                    return Err(ParseError::ControlCharacter {
                        offset: self.cursor.offset(),
                        codepoint: c as u32,
                    })
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }
}

fn ensure_owned(owned: &mut Option<String>, input: &str, start: usize, upto: usize) {
    if owned.is_none() {
        *owned = Some(input[start..upto].to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens<'a>(input: &'a str, options: ParserOptions) -> Vec<TokenKind<'a>> {
        let mut lexer = Lexer::new(input, options);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let eof = matches!(tok.kind, TokenKind::Eof);
            out.push(tok.kind);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn bare_argument_is_borrowed_when_no_escapes() {
        let mut lexer = Lexer::new("hello", ParserOptions::default());
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(Cow::Borrowed(s), ArgumentKind::Bare) => assert_eq!(s, "hello"),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn escaped_argument_is_owned() {
        let mut lexer = Lexer::new(r"a\;b", ParserOptions::default());
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(Cow::Owned(s), ArgumentKind::Bare) => assert_eq!(s, "a;b"),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn bad_escape_in_bare_argument_errors() {
        let mut lexer = Lexer::new(r"a\qb", ParserOptions::default());
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::BadEscape { codepoint: 'q', .. }));
    }

    #[test]
    fn escape_at_eof_errors() {
        let mut lexer = Lexer::new(r"a\", ParserOptions::default());
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::EscapeAtEof { .. }));
    }

    #[test]
    fn standalone_continuation_is_swallowed() {
        let kinds = tokens("a \\\nb\n", ParserOptions::default());
        assert_eq!(
            kinds,
            vec![
                TokenKind::Argument(Cow::Borrowed("a"), ArgumentKind::Bare),
                TokenKind::Argument(Cow::Borrowed("b"), ArgumentKind::Bare),
                TokenKind::Term,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dangling_continuation_at_eof_errors() {
        let mut lexer = Lexer::new("a \\", ParserOptions::default());
        lexer.next_token().unwrap(); // "a"
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::DanglingContinuation { .. }));
    }

    #[test]
    fn quoted_argument_unescapes() {
        let mut lexer = Lexer::new(r#""a\"b""#, ParserOptions::default());
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(Cow::Owned(s), ArgumentKind::Quoted) => assert_eq!(s, "a\"b"),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn unterminated_quote_errors() {
        let mut lexer = Lexer::new("\"abc\ndef\"", ParserOptions::default());
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote { .. }));
    }

    #[test]
    fn triple_quoted_preserves_newlines_verbatim() {
        let mut lexer = Lexer::new("\"\"\"line1\nline2\"\"\"", ParserOptions::default());
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(value, ArgumentKind::Triple) => {
                assert_eq!(value, "line1\nline2");
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn triple_quote_unterminated_errors() {
        let mut lexer = Lexer::new("\"\"\"abc", ParserOptions::default());
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedTripleQuote { .. }));
    }

    #[test]
    fn back_to_back_quotes_are_two_arguments() {
        let kinds = tokens(r#""a""b""#, ParserOptions::default());
        assert_eq!(
            kinds,
            vec![
                TokenKind::Argument(Cow::Owned("a".into()), ArgumentKind::Quoted),
                TokenKind::Argument(Cow::Owned("b".into()), ArgumentKind::Quoted),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hash_starts_comment_not_in_argument() {
        let kinds = tokens("x\\#y\n", ParserOptions::default());
        assert_eq!(
            kinds,
            vec![
                TokenKind::Argument(Cow::Owned("x#y".into()), ArgumentKind::Bare),
                TokenKind::Term,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn c_style_comments_require_option() {
        let mut lexer = Lexer::new("// not a comment\n", ParserOptions::default());
        // '/' is a plain bare-argument character when the extension is off.
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(value, ArgumentKind::Bare) => assert_eq!(value, "//"),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn c_style_block_comment_unterminated_errors() {
        let options = ParserOptions {
            c_style_comments: true,
            ..ParserOptions::default()
        };
        let mut lexer = Lexer::new("/* unterminated", options);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { .. }));
    }

    #[test]
    fn expression_argument_tracks_balance() {
        let options = ParserOptions {
            expression_arguments: true,
            ..ParserOptions::default()
        };
        let mut lexer = Lexer::new("(a (b) c)", options);
        let tok = lexer.next_token().unwrap();
        match tok.kind {
            TokenKind::Argument(value, ArgumentKind::Expression) => assert_eq!(value, "a (b) c"),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn unbalanced_expression_errors() {
        let options = ParserOptions {
            expression_arguments: true,
            ..ParserOptions::default()
        };
        let mut lexer = Lexer::new("(a (b)", options);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedExpression { .. }));
    }

    #[test]
    fn punctuator_arguments_are_greedy() {
        let options = ParserOptions {
            punctuator_arguments: vec![":".into(), ":=".into()],
            ..ParserOptions::default()
        };
        let kinds = tokens("a := b", options);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Argument(Cow::Borrowed("a"), ArgumentKind::Bare),
                TokenKind::Argument(Cow::Borrowed(":="), ArgumentKind::Punctuator),
                TokenKind::Argument(Cow::Borrowed("b"), ArgumentKind::Bare),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn crlf_is_a_single_term() {
        let kinds = tokens("a\r\nb", ParserOptions::default());
        assert_eq!(
            kinds,
            vec![
                TokenKind::Argument(Cow::Borrowed("a"), ArgumentKind::Bare),
                TokenKind::Term,
                TokenKind::Argument(Cow::Borrowed("b"), ArgumentKind::Bare),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn control_character_is_rejected() {
        let mut lexer = Lexer::new("\u{0001}", ParserOptions::default());
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::ControlCharacter { .. }));
    }
}
