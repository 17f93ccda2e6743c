/*!
# confetti

A parser and object mapper for the Confetti configuration language: a
directive-tree text format in the spirit of nginx.conf or HCL, with a
small, fixed grammar and no embedded evaluation.

## Basic usage

```
use confetti::parse;

let input = "server {\n  listen 80\n}";
let unit = parse(input).unwrap();
assert_eq!(unit.directives[0].name().value, "server");
```

## Mapping to a struct

```
use confetti::Confetti;
use confetti::mapper::FromConf;

#[derive(Confetti, Debug)]
struct ServerConfig {
    host: String,
    port: i64,
}

let config_str = r#"
server-config {
    host "localhost"
    port 8080
}
"#;

let config = ServerConfig::from_str(config_str).unwrap();
assert_eq!(config.host, "localhost");
assert_eq!(config.port, 8080);
```

## Syntax

```text
server {
    listen 80
    root "/var/www/html"
    tags a, b, c

    location "/" {
        try_files "$uri" "$uri/" "=404"
    }
}
```
*/

pub mod ast;
pub mod cursor;
pub mod error;
pub mod lexer;
pub mod mapper;
pub mod options;
pub mod parser;

#[cfg(feature = "derive")]
pub use confetti_derive::Confetti;

pub use ast::{Argument, ArgumentKind, Comment, CommentKind, Directive, OwnedUnit, Unit};
pub use error::{MappingError, ParseError};
pub use mapper::{FromConf, ToConf};
pub use options::ParserOptions;
pub use parser::Parser;

use std::fs;
use std::path::Path;

/// Parses a Confetti document with default parser options (spec §4.3).
pub fn parse(input: &str) -> Result<Unit<'_>, ParseError> {
    Parser::new(input, ParserOptions::default()).parse()
}

/// Parses a Confetti document with caller-supplied options (spec §6).
pub fn parse_with_options(input: &str, options: ParserOptions) -> Result<Unit<'_>, ParseError> {
    Parser::new(input, options).parse()
}

/// Validates `input` as UTF-8 before parsing, surfacing `MalformedEncoding`
/// for invalid byte sequences rather than relying on the caller to have
/// already produced a valid `&str` (spec §4.1).
pub fn parse_bytes(input: &[u8]) -> Result<OwnedUnit, ParseError> {
    let text = std::str::from_utf8(input).map_err(|e| ParseError::MalformedEncoding { offset: e.valid_up_to() })?;
    parse(text).map(Unit::into_owned)
}

/// Loads a value implementing [`FromConf`] from a configuration string.
pub fn from_str<T: FromConf>(input: &str) -> Result<T, MappingError> {
    T::from_str(input)
}

/// Loads a value implementing [`FromConf`] from a configuration file.
pub fn from_file<T: FromConf, P: AsRef<Path>>(path: P) -> Result<T, MappingError> {
    T::from_file(path)
}

/// Dumps a value implementing [`ToConf`] to a configuration string (spec §4.6).
pub fn to_string<T: ToConf>(value: &T) -> String {
    value.to_string()
}

/// Dumps a value implementing [`ToConf`] to a configuration file.
pub fn to_file<T: ToConf, P: AsRef<Path>>(value: &T, path: P) -> Result<(), MappingError> {
    fs::write(path, value.to_string()).map_err(MappingError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_input_yields_no_directives() {
        let unit = parse("").unwrap();
        assert!(unit.directives.is_empty());
    }

    #[test]
    fn parse_reports_offset_on_error() {
        let err = parse("a }").unwrap_err();
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn parse_bytes_rejects_invalid_utf8() {
        let bytes = [b's', b'e', b'r', 0xff, b'v', b'e', b'r'];
        let err = parse_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::MalformedEncoding { offset: 3 }));
    }

    #[test]
    fn parse_bytes_accepts_valid_utf8() {
        let unit = parse_bytes("server localhost\n".as_bytes()).unwrap();
        assert_eq!(unit.directives[0].name().value, "server");
    }

    #[test]
    fn parse_with_options_enables_c_style_comments() {
        let options = ParserOptions {
            c_style_comments: true,
            ..ParserOptions::default()
        };
        let unit = parse_with_options("// hi\nserver localhost\n", options).unwrap();
        assert_eq!(unit.comments.len(), 1);
    }
}
