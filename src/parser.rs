//! Recursive-descent parser (spec §4.3) turning a token stream into a
//! `Unit`. Partially built directives are held on an explicit stack
//! (spec §5) rather than via native recursion, so nesting depth is
//! enforced deterministically instead of depending on the host stack.

use crate::ast::{Argument, Comment, Directive, Unit};
use crate::error::ParseError;
use crate::lexer::{Lexer, TokenKind};
use crate::options::ParserOptions;

/// A directive whose own block is currently open: its arguments are fixed,
/// but its children are still being collected.
struct OpenBlock<'a> {
    arguments: Vec<Argument<'a>>,
    children: Vec<Directive<'a>>,
    brace_offset: usize,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParserOptions,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, options: ParserOptions) -> Self {
        Self {
            lexer: Lexer::new(input, options.clone()),
            options,
        }
    }

    pub fn parse(mut self) -> Result<Unit<'a>, ParseError> {
        let mut top: Vec<Directive<'a>> = Vec::new();
        let mut comments: Vec<Comment<'a>> = Vec::new();
        let mut stack: Vec<OpenBlock<'a>> = Vec::new();
        let mut current_args: Vec<Argument<'a>> = Vec::new();

        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Eof => {
                    if let Some(open) = stack.last() {
                        return Err(ParseError::UnclosedBlock {
                            offset: open.brace_offset,
                        });
                    }
                    if !current_args.is_empty() {
                        top.push(Directive {
                            arguments: std::mem::take(&mut current_args),
                            children: Vec::new(),
                        });
                    }
                    break;
                }

                TokenKind::Comment(text, kind) => {
                    comments.push(Comment {
                        text,
                        offset: tok.offset,
                        length: tok.length,
                        kind,
                    });
                }

                TokenKind::Term => {
                    if !current_args.is_empty() {
                        let directive = Directive {
                            arguments: std::mem::take(&mut current_args),
                            children: Vec::new(),
                        };
                        push_finished(directive, &mut stack, &mut top);
                    }
                    // Otherwise a no-op: a blank line, or a TERM already
                    // implied by a just-closed block.
                }

                TokenKind::LBrace => {
                    if current_args.is_empty() {
                        return Err(ParseError::UnexpectedOpeningBrace { offset: tok.offset });
                    }
                    if stack.len() >= self.options.max_depth {
                        return Err(ParseError::NestingTooDeep {
                            offset: tok.offset,
                            max_depth: self.options.max_depth,
                        });
                    }
                    stack.push(OpenBlock {
                        arguments: std::mem::take(&mut current_args),
                        children: Vec::new(),
                        brace_offset: tok.offset,
                    });
                }

                TokenKind::RBrace => {
                    let mut open = match stack.pop() {
                        Some(open) => open,
                        None => return Err(ParseError::UnexpectedClosingBrace { offset: tok.offset }),
                    };
                    if !current_args.is_empty() {
                        open.children.push(Directive {
                            arguments: std::mem::take(&mut current_args),
                            children: Vec::new(),
                        });
                    }
                    let directive = Directive {
                        arguments: open.arguments,
                        children: open.children,
                    };
                    push_finished(directive, &mut stack, &mut top);
                }

                TokenKind::Argument(value, kind) => {
                    current_args.push(Argument {
                        value,
                        offset: tok.offset,
                        length: tok.length,
                        kind,
                    });
                }
            }
        }

        Ok(Unit {
            directives: top,
            comments,
        })
    }
}

fn push_finished<'a>(directive: Directive<'a>, stack: &mut [OpenBlock<'a>], top: &mut Vec<Directive<'a>>) {
    match stack.last_mut() {
        Some(open) => open.children.push(directive),
        None => top.push(directive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ArgumentKind;

    fn parse(input: &str) -> Unit<'_> {
        Parser::new(input, ParserOptions::default()).parse().unwrap()
    }

    #[test]
    fn empty_input_has_no_directives() {
        let unit = parse("");
        assert!(unit.directives.is_empty());
        assert!(unit.comments.is_empty());
    }

    #[test]
    fn simple_directive_is_name_plus_values() {
        let unit = parse("server localhost\n");
        assert_eq!(unit.directives.len(), 1);
        assert_eq!(unit.directives[0].name().value, "server");
        assert_eq!(unit.directives[0].values()[0].value, "localhost");
    }

    #[test]
    fn directive_without_trailing_term_at_eof_is_accepted() {
        let unit = parse("server localhost");
        assert_eq!(unit.directives.len(), 1);
    }

    #[test]
    fn block_directive_collects_children() {
        let unit = parse("server {\n  listen 80\n}\n");
        let server = &unit.directives[0];
        assert_eq!(server.name().value, "server");
        assert!(server.values().is_empty());
        assert_eq!(server.children.len(), 1);
        assert_eq!(server.children[0].name().value, "listen");
        assert_eq!(server.children[0].values()[0].value, "80");
    }

    #[test]
    fn block_close_does_not_require_trailing_term() {
        let unit = parse("server { listen 80 }");
        assert_eq!(unit.directives[0].children.len(), 1);
    }

    #[test]
    fn consecutive_terms_collapse() {
        let unit = parse("a 1\n\n\nb 2\n");
        assert_eq!(unit.directives.len(), 2);
    }

    #[test]
    fn comments_are_collected_separately_from_directives() {
        let unit = parse("# leading\nserver localhost # trailing note would be a new comment\n");
        assert_eq!(unit.comments.len(), 2);
        assert_eq!(unit.directives.len(), 1);
    }

    #[test]
    fn opening_brace_with_no_preceding_argument_errors() {
        let err = Parser::new("{ a 1 }", ParserOptions::default())
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedOpeningBrace { .. }));
    }

    #[test]
    fn unmatched_closing_brace_at_top_level_errors() {
        let err = Parser::new("a 1 }", ParserOptions::default())
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClosingBrace { .. }));
    }

    #[test]
    fn unclosed_block_at_eof_errors() {
        let err = Parser::new("server {\n  listen 80\n", ParserOptions::default())
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnclosedBlock { .. }));
    }

    #[test]
    fn nesting_exactly_at_max_depth_succeeds() {
        let mut input = String::new();
        for i in 0..4 {
            input.push_str(&format!("a{i} {{\n"));
        }
        input.push_str("leaf 1\n");
        for _ in 0..4 {
            input.push_str("}\n");
        }
        let options = ParserOptions {
            max_depth: 4,
            ..ParserOptions::default()
        };
        let unit = Parser::new(&input, options).parse().unwrap();
        assert_eq!(unit.directives.len(), 1);
    }

    #[test]
    fn nesting_beyond_max_depth_errors() {
        let mut input = String::new();
        for i in 0..5 {
            input.push_str(&format!("a{i} {{\n"));
        }
        input.push_str("leaf 1\n");
        for _ in 0..5 {
            input.push_str("}\n");
        }
        let options = ParserOptions {
            max_depth: 4,
            ..ParserOptions::default()
        };
        let err = Parser::new(&input, options).parse().unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { max_depth: 4, .. }));
    }

    #[test]
    fn argument_kinds_are_preserved() {
        let unit = parse("server \"localhost\"\n");
        assert_eq!(unit.directives[0].values()[0].kind, ArgumentKind::Quoted);
    }
}
