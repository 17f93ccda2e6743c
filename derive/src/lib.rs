extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, Meta, NestedMeta, Type};

/// Derives `SchemaDescriptor`, `FromConf`, and `ToConf` for a struct.
///
/// # Example
///
/// ```rust
/// use confetti::Confetti;
///
/// #[derive(Confetti, Debug)]
/// struct ServerConfig {
///     host: String,
///     port: i64,
///     #[conf(rename = "max-connections")]
///     max_connections: Option<i64>,
///     tags: Vec<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[conf(rename = "directive-name")]`: override the directive key used
///   for this field (default: the field's Rust name).
/// - `#[conf(enum)]`: the field's type implements `EnumCodec` rather than
///   being treated as a nested struct.
/// - `#[conf(default = "8080")]`: on a plain scalar field, take this value
///   (parsed through the field's `ValueConverter`) instead of erroring when
///   the directive is absent. Not meaningful on `Option`/`Vec`/`HashMap`
///   fields, which already default to `None`/empty.
#[proc_macro_derive(Confetti, attributes(conf))]
pub fn derive_confetti(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let directive_name = to_kebab_case(&name.to_string());

    let fields_named = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields_named) => fields_named,
            _ => {
                return syn::Error::new(data_struct.fields.span(), "Confetti can only be derived for structs with named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => return syn::Error::new(input.span(), "Confetti can only be derived for structs").to_compile_error().into(),
    };

    let mut field_descriptors = Vec::new();
    let mut from_conf_fields = Vec::new();
    let mut to_fields_pushes = Vec::new();

    for field in &fields_named.named {
        let field_name = field.ident.as_ref().unwrap();
        let field_name_str = field_name.to_string();
        let conf_name = conf_rename(&field.attrs).unwrap_or_else(|| field_name_str.clone());
        let is_enum = has_enum_attr(&field.attrs);
        let shape = classify(&field.ty, is_enum);
        let default = conf_default(&field.attrs);

        field_descriptors.push(field_descriptor_tokens(&field_name_str, &conf_name, &shape, default.as_deref()));

        from_conf_fields.push(match (&shape, &default) {
            (Shape::Scalar, Some(default)) => quote! {
                #field_name: confetti::mapper::engine::scalar_field_or_default(directive, #conf_name, #field_name_str, #default)?
            },
            (Shape::Scalar, None) => quote! {
                #field_name: confetti::mapper::engine::scalar_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::OptionScalar, _) => quote! {
                #field_name: confetti::mapper::engine::option_scalar_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::ListScalar, _) => quote! {
                #field_name: confetti::mapper::engine::list_scalar_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::MapScalar, _) => quote! {
                #field_name: confetti::mapper::engine::map_scalar_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::Enum, _) => quote! {
                #field_name: confetti::mapper::engine::enum_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::OptionEnum, _) => quote! {
                #field_name: confetti::mapper::engine::option_enum_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::Struct, _) => quote! {
                #field_name: confetti::mapper::engine::struct_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::OptionStruct, _) => quote! {
                #field_name: confetti::mapper::engine::option_struct_field(directive, #conf_name, #field_name_str)?
            },
            (Shape::ListStruct, _) => quote! {
                #field_name: confetti::mapper::engine::list_struct_field(directive, #conf_name)?
            },
        });

        to_fields_pushes.push(match &shape {
            Shape::Scalar => quote! {
                fields.push(confetti::mapper::engine::scalar_child(#conf_name, &self.#field_name));
            },
            Shape::OptionScalar => quote! {
                if let Some(child) = confetti::mapper::engine::option_scalar_child(#conf_name, &self.#field_name) {
                    fields.push(child);
                }
            },
            Shape::ListScalar => quote! {
                fields.extend(confetti::mapper::engine::list_scalar_children(#conf_name, &self.#field_name));
            },
            Shape::MapScalar => quote! {
                fields.extend(confetti::mapper::engine::map_scalar_children(#conf_name, &self.#field_name));
            },
            Shape::Enum => quote! {
                fields.push(confetti::mapper::engine::enum_child(#conf_name, &self.#field_name));
            },
            Shape::OptionEnum => quote! {
                if let Some(child) = confetti::mapper::engine::option_enum_child(#conf_name, &self.#field_name) {
                    fields.push(child);
                }
            },
            Shape::Struct => quote! {
                fields.push(confetti::mapper::engine::struct_child(#conf_name, &self.#field_name));
            },
            Shape::OptionStruct => quote! {
                if let Some(child) = confetti::mapper::engine::option_struct_child(#conf_name, &self.#field_name) {
                    fields.push(child);
                }
            },
            Shape::ListStruct => quote! {
                fields.extend(confetti::mapper::engine::list_struct_children(#conf_name, &self.#field_name));
            },
        });
    }

    let field_count = field_descriptors.len();

    let expanded = quote! {
        impl confetti::mapper::SchemaDescriptor for #name {
            fn directive_name() -> &'static str {
                #directive_name
            }

            fn fields() -> &'static [confetti::mapper::FieldDescriptor] {
                static FIELDS: [confetti::mapper::FieldDescriptor; #field_count] = [
                    #(#field_descriptors),*
                ];
                &FIELDS
            }
        }

        impl confetti::mapper::FromConf for #name {
            fn from_directive(directive: &confetti::ast::Directive) -> Result<Self, confetti::error::MappingError> {
                confetti::mapper::engine::validate_fields(directive, <Self as confetti::mapper::SchemaDescriptor>::fields())?;
                Ok(Self {
                    #(#from_conf_fields),*
                })
            }
        }

        impl confetti::mapper::ToConf for #name {
            fn to_fields(&self) -> Vec<confetti::ast::Directive<'static>> {
                let mut fields = Vec::new();
                #(#to_fields_pushes)*
                fields
            }
        }
    };

    expanded.into()
}

enum Shape {
    Scalar,
    OptionScalar,
    ListScalar,
    MapScalar,
    Enum,
    OptionEnum,
    Struct,
    OptionStruct,
    ListStruct,
}

fn classify(ty: &Type, is_enum: bool) -> Shape {
    if is_map_type(ty) {
        return Shape::MapScalar;
    }
    if let Some(inner) = generic_inner(ty, "Vec") {
        return if is_enum_or_struct(inner, is_enum) {
            Shape::ListStruct
        } else {
            Shape::ListScalar
        };
    }
    if let Some(inner) = generic_inner(ty, "Option") {
        return match (is_primitive(inner), is_enum) {
            (true, _) => Shape::OptionScalar,
            (false, true) => Shape::OptionEnum,
            (false, false) => Shape::OptionStruct,
        };
    }
    match (is_primitive(ty), is_enum) {
        (true, _) => Shape::Scalar,
        (false, true) => Shape::Enum,
        (false, false) => Shape::Struct,
    }
}

fn is_enum_or_struct(ty: &Type, is_enum: bool) -> bool {
    !is_primitive(ty) || is_enum
}

fn is_primitive(ty: &Type) -> bool {
    matches!(type_ident(ty).as_deref(), Some("String" | "str" | "bool" | "i64" | "f64"))
}

fn type_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

fn is_map_type(ty: &Type) -> bool {
    let Type::Path(path) = ty else { return false };
    path.path.segments.last().map(|s| s.ident == "HashMap").unwrap_or(false)
}

fn field_descriptor_tokens(field_name: &str, conf_name: &str, shape: &Shape, default: Option<&str>) -> proc_macro2::TokenStream {
    let kind = match shape {
        Shape::Scalar | Shape::OptionScalar | Shape::ListScalar => quote! {
            confetti::mapper::FieldKind::Scalar(confetti::mapper::Primitive::String)
        },
        Shape::MapScalar => quote! { confetti::mapper::FieldKind::Map(Box::new(confetti::mapper::FieldKind::Scalar(confetti::mapper::Primitive::String))) },
        Shape::Enum | Shape::OptionEnum => quote! { confetti::mapper::FieldKind::Enum },
        Shape::Struct | Shape::OptionStruct | Shape::ListStruct => quote! { confetti::mapper::FieldKind::Struct },
    };
    let default_tokens = match (shape, default) {
        (Shape::Scalar, Some(value)) => quote! { confetti::mapper::FieldDefault::Defaulted(#value) },
        (Shape::Scalar, None) | (Shape::Enum, _) | (Shape::Struct, _) => quote! { confetti::mapper::FieldDefault::Required },
        (Shape::OptionScalar | Shape::OptionEnum | Shape::OptionStruct | Shape::ListScalar | Shape::ListStruct | Shape::MapScalar, _) => {
            quote! { confetti::mapper::FieldDefault::Defaulted("") }
        }
    };
    let rename = if conf_name == field_name {
        quote! { None }
    } else {
        quote! { Some(#conf_name) }
    };
    quote! {
        confetti::mapper::FieldDescriptor {
            name: #field_name,
            rename: #rename,
            kind: #kind,
            default: #default_tokens,
        }
    }
}

fn conf_rename(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path.is_ident("conf") {
            continue;
        }
        if let Ok(Meta::List(meta_list)) = attr.parse_meta() {
            for nested in meta_list.nested.iter() {
                if let NestedMeta::Meta(Meta::NameValue(name_value)) = nested {
                    if name_value.path.is_ident("rename") {
                        if let Lit::Str(lit_str) = &name_value.lit {
                            return Some(lit_str.value());
                        }
                    }
                }
            }
        }
    }
    None
}

fn conf_default(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path.is_ident("conf") {
            continue;
        }
        if let Ok(Meta::List(meta_list)) = attr.parse_meta() {
            for nested in meta_list.nested.iter() {
                if let NestedMeta::Meta(Meta::NameValue(name_value)) = nested {
                    if name_value.path.is_ident("default") {
                        if let Lit::Str(lit_str) = &name_value.lit {
                            return Some(lit_str.value());
                        }
                    }
                }
            }
        }
    }
    None
}

fn has_enum_attr(attrs: &[Attribute]) -> bool {
    for attr in attrs {
        if !attr.path.is_ident("conf") {
            continue;
        }
        if let Ok(Meta::List(meta_list)) = attr.parse_meta() {
            for nested in meta_list.nested.iter() {
                if let NestedMeta::Meta(Meta::Path(path)) = nested {
                    if path.is_ident("enum") {
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn to_kebab_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('-');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
