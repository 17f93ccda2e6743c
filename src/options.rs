//! Parser options (spec §6): the only configuration surface the lexer and
//! parser read. Nothing in this crate consults process-wide mutable state;
//! every knob lives here and is threaded through explicitly (spec §5's "no
//! global state" requirement).

/// Options controlling the lexer/parser's recognized syntax extensions and
/// limits.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Recognize `// ...` line comments and `/* ... */` block comments
    /// (nested block comments are not supported; an unterminated block
    /// comment is `UnterminatedComment`).
    pub c_style_comments: bool,
    /// Recognize `( ... )` as a single verbatim argument with balanced
    /// parenthesis tracking; unbalanced input is `UnbalancedExpression`.
    pub expression_arguments: bool,
    /// Multi-character punctuator tokens (e.g. `:`, `:=`, `+`, `-`)
    /// recognized as standalone arguments between other arguments. Matched
    /// greedily, longest first.
    pub punctuator_arguments: Vec<String>,
    /// Maximum directive nesting depth. Exceeding it is `NestingTooDeep`.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            c_style_comments: false,
            expression_arguments: false,
            punctuator_arguments: Vec::new(),
            max_depth: 1024,
        }
    }
}

impl ParserOptions {
    /// Punctuators sorted longest-first so the lexer can match greedily.
    pub(crate) fn sorted_punctuators(&self) -> Vec<&str> {
        let mut punctuators: Vec<&str> = self.punctuator_arguments.iter().map(String::as_str).collect();
        punctuators.sort_by_key(|p| std::cmp::Reverse(p.len()));
        punctuators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let options = ParserOptions::default();
        assert!(!options.c_style_comments);
        assert!(!options.expression_arguments);
        assert!(options.punctuator_arguments.is_empty());
        assert_eq!(options.max_depth, 1024);
    }

    #[test]
    fn sorted_punctuators_are_longest_first() {
        let options = ParserOptions {
            punctuator_arguments: vec![":".into(), ":=".into(), "+".into()],
            ..ParserOptions::default()
        };
        assert_eq!(options.sorted_punctuators(), vec![":=", ":", "+"]);
    }
}
