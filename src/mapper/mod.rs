//! Schema-descriptor-driven mapping between the AST and user types (spec
//! §4.5/§4.6). The heavy lifting lives in [`engine`]; this module is the
//! public `FromConf`/`ToConf` surface, carried over from the original
//! mapper module's ergonomics (`from_str`/`from_file`/`to_string`/
//! `to_file`).

pub mod engine;

pub use engine::{EnumCodec, FieldDefault, FieldDescriptor, FieldKind, Primitive, SchemaDescriptor, ValueConverter};

use std::fs;
use std::path::Path;

use crate::ast::{Directive, Unit};
use crate::error::MappingError;
use crate::options::ParserOptions;
use crate::parser::Parser;

/// Implemented by `#[derive(Confetti)]` for types loadable from a parsed
/// directive. The blanket structure mirrors spec §4.5's algorithm: resolve
/// the root directive by name, then let the generated `from_directive`
/// body dispatch field by field via [`engine`]'s helpers.
pub trait FromConf: SchemaDescriptor + Sized {
    fn from_directive(directive: &Directive) -> Result<Self, MappingError>;

    fn from_unit(unit: &Unit) -> Result<Self, MappingError> {
        let expected = Self::directive_name();
        let directive = unit
            .directives
            .iter()
            .find(|d| d.name().value == expected)
            .ok_or_else(|| MappingError::RootMismatch {
                expected: expected.to_string(),
                found: unit
                    .directives
                    .first()
                    .map(|d| d.name().value.to_string())
                    .unwrap_or_default(),
            })?;
        Self::from_directive(directive)
    }

    fn from_str(input: &str) -> Result<Self, MappingError> {
        Self::from_str_with_options(input, ParserOptions::default())
    }

    fn from_str_with_options(input: &str, options: ParserOptions) -> Result<Self, MappingError> {
        let unit = Parser::new(input, options).parse()?;
        Self::from_unit(&unit)
    }

    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let content = fs::read_to_string(path).map_err(MappingError::Io)?;
        Self::from_str(&content)
    }
}

/// Implemented by `#[derive(Confetti)]` for types dumpable to a directive
/// (spec §4.6). `to_fields` is what the derive actually generates; the
/// other methods are provided in terms of it so a nested struct field can
/// reuse `to_fields` directly (see `engine::struct_child`).
pub trait ToConf: SchemaDescriptor {
    fn to_fields(&self) -> Vec<Directive<'static>>;

    fn to_directive(&self) -> Directive<'static> {
        Directive {
            arguments: vec![engine::bare_argument(Self::directive_name())],
            children: self.to_fields(),
        }
    }

    fn to_string(&self) -> String {
        let directive = self.to_directive();
        let mut out = String::new();
        engine::render_directive(&directive, 0, &mut out);
        out
    }

    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MappingError> {
        fs::write(path, ToConf::to_string(self)).map_err(MappingError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, ArgumentKind};
    use std::borrow::Cow;

    struct ServerConfig {
        host: String,
        port: i64,
    }

    impl SchemaDescriptor for ServerConfig {
        fn directive_name() -> &'static str {
            "server"
        }

        fn fields() -> &'static [FieldDescriptor] {
            static FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor {
                    name: "host",
                    rename: None,
                    kind: FieldKind::Scalar(Primitive::String),
                    default: FieldDefault::Required,
                },
                FieldDescriptor {
                    name: "port",
                    rename: None,
                    kind: FieldKind::Scalar(Primitive::Int),
                    default: FieldDefault::Required,
                },
            ];
            FIELDS
        }
    }

    impl FromConf for ServerConfig {
        fn from_directive(directive: &Directive) -> Result<Self, MappingError> {
            engine::validate_fields(directive, Self::fields())?;
            Ok(ServerConfig {
                host: engine::scalar_field(directive, "host", "host")?,
                port: engine::scalar_field(directive, "port", "port")?,
            })
        }
    }

    impl ToConf for ServerConfig {
        fn to_fields(&self) -> Vec<Directive<'static>> {
            vec![
                engine::scalar_child("host", &self.host),
                engine::scalar_child("port", &self.port),
            ]
        }
    }

    #[test]
    fn round_trips_through_from_str_and_to_string() {
        let input = "server {\n    host \"localhost\"\n    port 8080\n}\n";
        let config = ServerConfig::from_str(input).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);

        let dumped = ToConf::to_string(&config);
        let reloaded = ServerConfig::from_str(&dumped).unwrap();
        assert_eq!(reloaded.host, config.host);
        assert_eq!(reloaded.port, config.port);
    }

    #[test]
    fn root_mismatch_is_reported() {
        let err = ServerConfig::from_str("other {\n    host \"x\"\n    port 1\n}\n").unwrap_err();
        assert!(matches!(err, MappingError::RootMismatch { .. }));
    }

    #[test]
    fn unknown_field_propagates_from_directive() {
        let err = ServerConfig::from_str("server {\n    host \"x\"\n    port 1\n    extra 1\n}\n").unwrap_err();
        assert!(matches!(err, MappingError::UnknownField { .. }));
    }

    #[test]
    fn from_directive_accepts_manually_built_ast() {
        let directive = Directive {
            arguments: vec![Argument {
                value: Cow::Borrowed("server"),
                offset: 0,
                length: 6,
                kind: ArgumentKind::Bare,
            }],
            children: vec![
                Directive {
                    arguments: vec![
                        Argument { value: Cow::Borrowed("host"), offset: 0, length: 4, kind: ArgumentKind::Bare },
                        Argument { value: Cow::Borrowed("localhost"), offset: 0, length: 9, kind: ArgumentKind::Bare },
                    ],
                    children: vec![],
                },
                Directive {
                    arguments: vec![
                        Argument { value: Cow::Borrowed("port"), offset: 0, length: 4, kind: ArgumentKind::Bare },
                        Argument { value: Cow::Borrowed("80"), offset: 0, length: 2, kind: ArgumentKind::Bare },
                    ],
                    children: vec![],
                },
            ],
        };
        let config = ServerConfig::from_directive(&directive).unwrap();
        assert_eq!(config.port, 80);
    }
}
