//! The Confetti AST (spec §3): `Unit`, `Directive`, `Argument`, `Comment`.
//!
//! A directive has no separate "name" field — per spec §3 its first
//! argument *is* its name, matching the reference implementation's
//! `directive.arguments[0]`. `Directive::name` is a convenience accessor.

use std::borrow::Cow;

/// How an argument was spelled in the source. Doesn't affect `value`, which
/// is always the logical (post-escape) content, but is useful for
/// round-tripping and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Bare,
    Quoted,
    Triple,
    /// `(...)`, only produced when `ParserOptions::expression_arguments` is set.
    Expression,
    /// A standalone punctuator token, only produced when
    /// `ParserOptions::punctuator_arguments` recognizes it.
    Punctuator,
}

/// One argument of a directive: its logical value plus the syntactic span
/// it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument<'a> {
    pub value: Cow<'a, str>,
    pub offset: usize,
    pub length: usize,
    pub kind: ArgumentKind,
}

impl<'a> Argument<'a> {
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self.kind, ArgumentKind::Quoted | ArgumentKind::Triple)
    }

    /// Converts into a fully owned argument with a `'static` lifetime.
    pub fn into_owned(self) -> Argument<'static> {
        Argument {
            value: Cow::Owned(self.value.into_owned()),
            offset: self.offset,
            length: self.length,
            kind: self.kind,
        }
    }
}

/// One directive: a non-empty ordered list of arguments plus an ordered
/// (possibly empty) list of child directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    pub arguments: Vec<Argument<'a>>,
    pub children: Vec<Directive<'a>>,
}

impl<'a> Directive<'a> {
    /// The directive's name: its first argument. Every `Directive` produced
    /// by a successful parse has at least one argument (spec §3 invariant),
    /// so this never panics on such a value.
    pub fn name(&self) -> &Argument<'a> {
        &self.arguments[0]
    }

    /// Arguments after the name, i.e. the "value" arguments in mapper terms.
    pub fn values(&self) -> &[Argument<'a>] {
        &self.arguments[1..]
    }

    pub fn into_owned(self) -> Directive<'static> {
        Directive {
            arguments: self.arguments.into_iter().map(Argument::into_owned).collect(),
            children: self.children.into_iter().map(Directive::into_owned).collect(),
        }
    }

    /// Renders the canonical comparison format used by conformance tests:
    /// `<arg1> <arg2> [ <child> <child> ]`.
    pub fn to_comparison_format(&self) -> String {
        let mut out = String::new();
        self.write_comparison_format(&mut out);
        out
    }

    fn write_comparison_format(&self, out: &mut String) {
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push('<');
            out.push_str(&arg.value);
            out.push('>');
        }
        if !self.children.is_empty() {
            out.push_str(" [");
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                child.write_comparison_format(out);
            }
            out.push(']');
        }
    }
}

/// Whether a comment was introduced by `#` or by a C-style `//`/`/* */`
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Hash,
    CLine,
    CBlock,
}

/// A single comment, preserved in source order on `Unit::comments` but
/// never attached to the directive tree (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    pub text: Cow<'a, str>,
    pub offset: usize,
    pub length: usize,
    pub kind: CommentKind,
}

impl<'a> Comment<'a> {
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }

    pub fn into_owned(self) -> Comment<'static> {
        Comment {
            text: Cow::Owned(self.text.into_owned()),
            offset: self.offset,
            length: self.length,
            kind: self.kind,
        }
    }
}

/// The root of a parse: an ordered list of top-level directives plus a
/// flat, source-ordered list of every comment encountered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unit<'a> {
    pub directives: Vec<Directive<'a>>,
    pub comments: Vec<Comment<'a>>,
}

impl<'a> Unit<'a> {
    pub fn into_owned(self) -> Unit<'static> {
        Unit {
            directives: self.directives.into_iter().map(Directive::into_owned).collect(),
            comments: self.comments.into_iter().map(Comment::into_owned).collect(),
        }
    }
}

/// Convenience alias for a `Unit` that owns all of its string data.
pub type OwnedUnit = Unit<'static>;
