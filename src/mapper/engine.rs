//! Shared runtime helpers behind the generated `FromConf`/`ToConf` bodies
//! (spec §4.5/§4.6). `#[derive(Confetti)]` emits one call into this module
//! per field; the derive owns field order and concrete types, this module
//! owns the traversal/validation rules that are common to every field.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::ast::{Argument, ArgumentKind, Directive};
use crate::cursor;
use crate::error::MappingError;

/// Field kinds recognized by the schema descriptor. Actual value extraction
/// is done by concretely typed helpers below, called from generated code
/// that already knows each field's Rust type; `kind` instead drives the
/// shape checks `validate_fields` runs ahead of that per-field extraction
/// (arity and block-vs-no-block), and `FieldDefault` drives whether an
/// absent field is an error or takes its declared default.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(Primitive),
    Enum,
    Struct,
    Option(Box<FieldKind>),
    List(Box<FieldKind>),
    Map(Box<FieldKind>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Bool,
    Int,
    Float,
}

/// Whether a field is required, or may be absent and take a default. The
/// carried string is the default's raw textual form (as it would appear as
/// a bare argument), parsed through the field's `ValueConverter` when the
/// field is absent (spec §4.5 step 5). Unused (empty) for shapes whose
/// "default" is simply `None`/empty (`Option`, `List`, `Map`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Required,
    Defaulted(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub rename: Option<&'static str>,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

/// Implemented by `#[derive(Confetti)]`: describes a type's directive name
/// and field shape, independent of the concrete extraction/emission code.
pub trait SchemaDescriptor {
    fn directive_name() -> &'static str;
    fn fields() -> &'static [FieldDescriptor];
}

/// Scalar codec for primitive field values (spec §4.5 primitives). Kept
/// under the teacher's original name; unlike the teacher's version this
/// reports a plain parse failure reason rather than a pre-rendered
/// `MappingError`, so the engine can attach field context uniformly.
pub trait ValueConverter: Sized {
    fn from_conf_value(value: &str) -> Result<Self, String>;
    fn to_conf_value(&self) -> String;

    /// Whether `list_scalar_field` should comma-split a lone occurrence's
    /// argument into multiple elements (spec §4.5 step 3). Spec.md's
    /// comma-splitting is defined only "for `list(string)`"; every other
    /// element type keeps the default of treating each occurrence as one
    /// element.
    fn splits_on_comma() -> bool {
        false
    }
}

impl ValueConverter for String {
    fn from_conf_value(value: &str) -> Result<Self, String> {
        Ok(value.to_string())
    }

    fn to_conf_value(&self) -> String {
        self.clone()
    }

    fn splits_on_comma() -> bool {
        true
    }
}

impl ValueConverter for bool {
    fn from_conf_value(value: &str) -> Result<Self, String> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(format!("'{other}' is not a recognized boolean")),
        }
    }

    fn to_conf_value(&self) -> String {
        if *self { "true".to_string() } else { "false".to_string() }
    }
}

impl ValueConverter for i64 {
    fn from_conf_value(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let magnitude = match unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
            Some(hex) => i64::from_str_radix(hex, 16).map_err(|e| e.to_string())?,
            None => unsigned.parse::<i64>().map_err(|e| e.to_string())?,
        };
        Ok(if negative { -magnitude } else { magnitude })
    }

    fn to_conf_value(&self) -> String {
        self.to_string()
    }
}

impl ValueConverter for f64 {
    fn from_conf_value(value: &str) -> Result<Self, String> {
        value.trim().parse::<f64>().map_err(|e| e.to_string())
    }

    fn to_conf_value(&self) -> String {
        self.to_string()
    }
}

/// Enum codec generated by `#[derive(Confetti)]` for fields of
/// `FieldKind::Enum`. `MEMBERS` matches case-insensitively against the
/// single scalar argument (spec §4.5's "member names").
pub trait EnumCodec: Sized {
    const MEMBERS: &'static [&'static str];
    fn from_member(name: &str) -> Option<Self>;
    fn member_name(&self) -> &'static str;
}

fn occurrences<'d, 'a>(directive: &'d Directive<'a>, key: &str) -> impl Iterator<Item = &'d Directive<'a>> {
    directive.children.iter().filter(move |child| child.name().value == key)
}

fn directive_label(directive: &Directive) -> String {
    directive.name().value.to_string()
}

/// A single match, erroring on duplicates (spec §4.5 step 4: repeated
/// occurrence of a non-list/non-map field is `DuplicateField`).
fn find_one<'d, 'a>(
    directive: &'d Directive<'a>,
    key: &str,
    field: &str,
) -> Result<Option<&'d Directive<'a>>, MappingError> {
    let mut matches = occurrences(directive, key);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(MappingError::DuplicateField {
            directive: directive_label(directive),
            field: field.to_string(),
        });
    }
    Ok(first)
}

fn require_one<'d, 'a>(directive: &'d Directive<'a>, key: &str, field: &str) -> Result<&'d Directive<'a>, MappingError> {
    find_one(directive, key, field)?.ok_or_else(|| MappingError::MissingField {
        directive: directive_label(directive),
        field: field.to_string(),
    })
}

fn scalar_arg<'d, 'a>(child: &'d Directive<'a>, field: &str) -> Result<&'d str, MappingError> {
    match child.values() {
        [single] => Ok(&single.value),
        other => Err(MappingError::TypeMismatch {
            field: field.to_string(),
            expected: "exactly one argument",
            found: format!("{} arguments", other.len()),
        }),
    }
}

fn check_no_block(child: &Directive, field: &str) -> Result<(), MappingError> {
    if child.children.is_empty() {
        Ok(())
    } else {
        Err(MappingError::UnexpectedBlock { field: field.to_string() })
    }
}

// ---- load helpers -------------------------------------------------------

/// Whether `kind` expects at most one occurrence of its directive (anything
/// other than `List`/`Map`, looking through `Option`).
fn expects_single_occurrence(kind: &FieldKind) -> bool {
    match kind {
        FieldKind::List(_) | FieldKind::Map(_) => false,
        FieldKind::Option(inner) => expects_single_occurrence(inner),
        FieldKind::Scalar(_) | FieldKind::Enum | FieldKind::Struct => true,
    }
}

/// Whether `kind` permits its directive occurrence(s) to carry a block.
fn allows_block(kind: &FieldKind) -> bool {
    match kind {
        FieldKind::Struct => true,
        FieldKind::Option(inner) | FieldKind::List(inner) | FieldKind::Map(inner) => allows_block(inner),
        FieldKind::Scalar(_) | FieldKind::Enum => false,
    }
}

/// Structural validation pass run ahead of field-by-field extraction (spec
/// §4.5 steps 2/4/5): rejects directive children with no matching field,
/// flags a required field that has no occurrence at all, flags more
/// occurrences than its `kind` allows, and flags a block on a field whose
/// `kind` doesn't take one. Per-field extraction below still re-checks its
/// own slice of these rules (e.g. `scalar_field`'s `require_one`), since it
/// has to produce the same errors when called without this pass (direct
/// `FromConf` impls that skip `validate_fields`); this pass is what makes
/// `FieldKind`/`FieldDefault` meaningful independent of any single field's
/// generated code.
pub fn validate_fields(directive: &Directive, fields: &'static [FieldDescriptor]) -> Result<(), MappingError> {
    'children: for child in &directive.children {
        let key: &str = &child.name().value;
        for field in fields {
            if key == field.name || field.rename == Some(key) {
                continue 'children;
            }
        }
        return Err(MappingError::UnknownField {
            directive: directive_label(directive),
            field: key.to_string(),
        });
    }

    for field in fields {
        let key = field.rename.unwrap_or(field.name);
        let matches: Vec<&Directive> = occurrences(directive, key).collect();

        if matches.is_empty() {
            if matches!(field.default, FieldDefault::Required) {
                return Err(MappingError::MissingField {
                    directive: directive_label(directive),
                    field: field.name.to_string(),
                });
            }
            continue;
        }

        if expects_single_occurrence(&field.kind) && matches.len() > 1 {
            return Err(MappingError::DuplicateField {
                directive: directive_label(directive),
                field: field.name.to_string(),
            });
        }

        if !allows_block(&field.kind) {
            for occurrence in &matches {
                check_no_block(occurrence, field.name)?;
            }
        }
    }

    Ok(())
}

pub fn scalar_field<T: ValueConverter>(directive: &Directive, key: &str, field: &str) -> Result<T, MappingError> {
    let child = require_one(directive, key, field)?;
    check_no_block(child, field)?;
    let raw = scalar_arg(child, field)?;
    T::from_conf_value(raw).map_err(|reason| MappingError::BadScalar {
        field: field.to_string(),
        value: raw.to_string(),
        reason,
    })
}

/// Like `scalar_field`, but takes `default` (the field's
/// `#[conf(default = "...")]` text) instead of erroring when the directive
/// has no occurrence of `key` (spec §4.5 step 5).
pub fn scalar_field_or_default<T: ValueConverter>(
    directive: &Directive,
    key: &str,
    field: &str,
    default: &str,
) -> Result<T, MappingError> {
    match find_one(directive, key, field)? {
        Some(child) => {
            check_no_block(child, field)?;
            let raw = scalar_arg(child, field)?;
            T::from_conf_value(raw).map_err(|reason| MappingError::BadScalar {
                field: field.to_string(),
                value: raw.to_string(),
                reason,
            })
        }
        None => T::from_conf_value(default).map_err(|reason| MappingError::BadScalar {
            field: field.to_string(),
            value: default.to_string(),
            reason,
        }),
    }
}

pub fn option_scalar_field<T: ValueConverter>(
    directive: &Directive,
    key: &str,
    field: &str,
) -> Result<Option<T>, MappingError> {
    match find_one(directive, key, field)? {
        None => Ok(None),
        Some(child) => {
            check_no_block(child, field)?;
            let raw = scalar_arg(child, field)?;
            T::from_conf_value(raw)
                .map(Some)
                .map_err(|reason| MappingError::BadScalar {
                    field: field.to_string(),
                    value: raw.to_string(),
                    reason,
                })
        }
    }
}

/// `list(string)`-equivalent: spec §4.5 step 3 — a single occurrence whose
/// lone argument contains commas is split on `,`; otherwise every
/// occurrence contributes one element. This split rule applies only to
/// scalar elements (never `list(struct(..))`, see `list_struct_field`).
pub fn list_scalar_field<T: ValueConverter>(directive: &Directive, key: &str, field: &str) -> Result<Vec<T>, MappingError> {
    let matches: Vec<&Directive> = occurrences(directive, key).collect();
    if let [only] = matches.as_slice() {
        check_no_block(only, field)?;
        let raw = scalar_arg(only, field)?;
        if T::splits_on_comma() && raw.contains(',') {
            return raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    T::from_conf_value(s).map_err(|reason| MappingError::BadScalar {
                        field: field.to_string(),
                        value: s.to_string(),
                        reason,
                    })
                })
                .collect();
        }
    }
    matches
        .into_iter()
        .map(|child| {
            check_no_block(child, field)?;
            let raw = scalar_arg(child, field)?;
            T::from_conf_value(raw).map_err(|reason| MappingError::BadScalar {
                field: field.to_string(),
                value: raw.to_string(),
                reason,
            })
        })
        .collect()
}

pub fn enum_field<T: EnumCodec>(directive: &Directive, key: &str, field: &str) -> Result<T, MappingError> {
    let child = require_one(directive, key, field)?;
    check_no_block(child, field)?;
    let raw = scalar_arg(child, field)?;
    T::from_member(raw).ok_or_else(|| MappingError::EnumOutOfRange {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

pub fn option_enum_field<T: EnumCodec>(directive: &Directive, key: &str, field: &str) -> Result<Option<T>, MappingError> {
    match find_one(directive, key, field)? {
        None => Ok(None),
        Some(child) => {
            check_no_block(child, field)?;
            let raw = scalar_arg(child, field)?;
            Some(T::from_member(raw).ok_or_else(|| MappingError::EnumOutOfRange {
                field: field.to_string(),
                value: raw.to_string(),
            }))
            .transpose()
        }
    }
}

/// A `struct(S)` field's directive is permitted to have an empty block: the
/// parser's `Directive` doesn't distinguish "no braces" from "empty braces"
/// (spec §4.4's AST carries no such flag), so an absent block is treated as
/// an empty one rather than raising `ExpectedBlock`.
pub fn struct_field<T: super::FromConf>(directive: &Directive, key: &str, field: &str) -> Result<T, MappingError> {
    let child = require_one(directive, key, field)?;
    T::from_directive(child)
}

pub fn option_struct_field<T: super::FromConf>(
    directive: &Directive,
    key: &str,
    field: &str,
) -> Result<Option<T>, MappingError> {
    match find_one(directive, key, field)? {
        None => Ok(None),
        Some(child) => T::from_directive(child).map(Some),
    }
}

pub fn list_struct_field<T: super::FromConf>(directive: &Directive, key: &str) -> Result<Vec<T>, MappingError> {
    occurrences(directive, key).map(T::from_directive).collect()
}

/// `map(string, V)`: each occurrence's first remaining argument is the map
/// key, the second is the scalar value (spec §4.5's `map(string,V)` step).
/// Struct-valued maps are out of scope: the source spec doesn't define
/// where a struct value's block would live once the key occupies the
/// second argument slot.
pub fn map_scalar_field<T: ValueConverter>(
    directive: &Directive,
    key: &str,
    field: &str,
) -> Result<HashMap<String, T>, MappingError> {
    let mut map = HashMap::new();
    for child in occurrences(directive, key) {
        check_no_block(child, field)?;
        let (map_key, raw_value) = match child.values() {
            [k, v] => (k.value.to_string(), &v.value),
            other => {
                return Err(MappingError::TypeMismatch {
                    field: field.to_string(),
                    expected: "a key and a value argument",
                    found: format!("{} arguments", other.len()),
                })
            }
        };
        let value = T::from_conf_value(raw_value).map_err(|reason| MappingError::BadScalar {
            field: field.to_string(),
            value: raw_value.to_string(),
            reason,
        })?;
        if map.insert(map_key.clone(), value).is_some() {
            return Err(MappingError::DuplicateField {
                directive: directive_label(directive),
                field: format!("{field}.{map_key}"),
            });
        }
    }
    Ok(map)
}

// ---- dump helpers --------------------------------------------------------

pub fn bare_argument(value: impl Into<String>) -> Argument<'static> {
    Argument {
        value: Cow::Owned(value.into()),
        offset: 0,
        length: 0,
        kind: ArgumentKind::Bare,
    }
}

fn named_directive(name: &'static str, values: Vec<Argument<'static>>) -> Directive<'static> {
    let mut arguments = Vec::with_capacity(values.len() + 1);
    arguments.push(bare_argument(name));
    arguments.extend(values);
    Directive { arguments, children: Vec::new() }
}

pub fn scalar_child<T: ValueConverter>(name: &'static str, value: &T) -> Directive<'static> {
    named_directive(name, vec![bare_argument(value.to_conf_value())])
}

pub fn option_scalar_child<T: ValueConverter>(name: &'static str, value: &Option<T>) -> Option<Directive<'static>> {
    value.as_ref().map(|v| scalar_child(name, v))
}

pub fn list_scalar_children<T: ValueConverter>(name: &'static str, values: &[T]) -> Vec<Directive<'static>> {
    values.iter().map(|v| scalar_child(name, v)).collect()
}

pub fn enum_child<T: EnumCodec>(name: &'static str, value: &T) -> Directive<'static> {
    named_directive(name, vec![bare_argument(value.member_name())])
}

pub fn option_enum_child<T: EnumCodec>(name: &'static str, value: &Option<T>) -> Option<Directive<'static>> {
    value.as_ref().map(|v| enum_child(name, v))
}

pub fn struct_child<T: super::ToConf>(name: &'static str, value: &T) -> Directive<'static> {
    Directive {
        arguments: vec![bare_argument(name)],
        children: value.to_fields(),
    }
}

pub fn option_struct_child<T: super::ToConf>(name: &'static str, value: &Option<T>) -> Option<Directive<'static>> {
    value.as_ref().map(|v| struct_child(name, v))
}

pub fn list_struct_children<T: super::ToConf>(name: &'static str, values: &[T]) -> Vec<Directive<'static>> {
    values.iter().map(|v| struct_child(name, v)).collect()
}

pub fn map_scalar_children<T: ValueConverter>(name: &'static str, map: &HashMap<String, T>) -> Vec<Directive<'static>> {
    map.iter()
        .map(|(k, v)| named_directive(name, vec![bare_argument(k.clone()), bare_argument(v.to_conf_value())]))
        .collect()
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| cursor::is_whitespace(c) || cursor::is_line_terminator(c) || cursor::is_reserved_punctuator(c) || c == '\\')
}

fn render_argument(arg: &Argument, out: &mut String) {
    if needs_quotes(&arg.value) {
        out.push('"');
        for c in arg.value.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(&arg.value);
    }
}

/// Renders a directive tree in the canonical dump format (spec §4.6):
/// 4-space indentation, one directive per line, LF line endings.
pub fn render_directive(directive: &Directive, depth: usize, out: &mut String) {
    let indent = "    ".repeat(depth);
    out.push_str(&indent);
    for (i, arg) in directive.arguments.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        render_argument(arg, out);
    }
    if directive.children.is_empty() {
        out.push('\n');
    } else {
        out.push_str(" {\n");
        for child in &directive.children {
            render_directive(child, depth + 1, out);
        }
        out.push_str(&indent);
        out.push_str("}\n");
    }
}
