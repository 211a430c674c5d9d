//! Derive macro for mapped entities.
//!
//! This crate provides `#[derive(Entity)]`, which emits the static field
//! descriptor table and the property accessor that `oxide-mapper-core`
//! operates on.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, Type};

/// Derives `oxide_mapper_core::schema::Entity` for a struct with named
/// fields.
///
/// # Attributes
///
/// - `#[entity(table = "name")]` - Explicit table name (defaults to the
///   struct name plus `s`)
/// - `#[entity(schema = "name")]` - Schema of the explicit table
/// - `#[entity(interface)]` - Strip a leading `I` from the conventional name
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - SQL column name (defaults to the
///   field name)
/// - `#[column(key)]` - Part of the primary key
/// - `#[column(identity)]` - Populated by an auto-increment mechanism
/// - `#[column(generated)]` - Computed by the database
/// - `#[column(sequence = "seq")]` - Populated from a database sequence
/// - `#[column(version)]` - Optimistic-concurrency column
/// - `#[column(ignore)]` - Not persisted at all
/// - `#[column(ignore_insert)]`, `#[column(ignore_update)]`,
///   `#[column(ignore_select)]` - Left out of the named statements
/// - `#[column(read_only)]` - Never written
///
/// A field named `id` becomes an identity key when no field is marked
/// `key`.
///
/// # Example
///
/// ```ignore
/// use oxide_mapper_derive::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[entity(table = "Product", schema = "Sales")]
/// struct Product {
///     #[column(key, identity, name = "ProductID")]
///     product_id: i64,
///     name: String,
///     #[column(name = "rowguid", ignore_update)]
///     guid_id: uuid::Uuid,
///     #[column(ignore)]
///     cache: Option<String>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let entity_attrs = parse_entity_attrs(&input.attrs)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut mapped: Vec<MappedField> = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.ignore {
            continue;
        }
        mapped.push(MappedField {
            property: ident.unraw().to_string(),
            ident,
            ty: field.ty.clone(),
            attrs,
        });
    }

    let field_count = mapped.len();
    let descriptors: Vec<TokenStream2> = mapped.iter().map(field_descriptor).collect();

    let type_name = struct_name.to_string();
    let mut entity_descriptor = quote! {
        ::oxide_mapper_core::schema::EntityDescriptor::new(#type_name, &FIELDS)
    };
    if let Some(table) = &entity_attrs.table {
        entity_descriptor = quote! { #entity_descriptor.table(#table) };
    }
    if let Some(schema) = &entity_attrs.schema {
        entity_descriptor = quote! { #entity_descriptor.schema(#schema) };
    }
    if entity_attrs.interface {
        entity_descriptor = quote! { #entity_descriptor.interface() };
    }

    let getters: Vec<TokenStream2> = mapped
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let property = &f.property;
            quote! {
                if property.eq_ignore_ascii_case(#property) {
                    return Some(::oxide_mapper_core::ToSqlValue::to_sql_value(
                        ::core::clone::Clone::clone(&self.#ident),
                    ));
                }
            }
        })
        .collect();

    let setters: Vec<TokenStream2> = mapped
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let ty = &f.ty;
            let property = &f.property;
            quote! {
                if property.eq_ignore_ascii_case(#property) {
                    self.#ident = <#ty as ::oxide_mapper_core::FromSqlValue>::from_sql_value(value)?;
                    return Ok(());
                }
            }
        })
        .collect();

    let expanded = quote! {
        impl ::oxide_mapper_core::schema::Entity for #struct_name {
            fn descriptor() -> &'static ::oxide_mapper_core::schema::EntityDescriptor {
                static FIELDS: [::oxide_mapper_core::schema::FieldDescriptor; #field_count] = [
                    #(#descriptors),*
                ];
                static DESCRIPTOR: ::oxide_mapper_core::schema::EntityDescriptor =
                    #entity_descriptor;
                &DESCRIPTOR
            }

            fn get_value(&self, property: &str) -> Option<::oxide_mapper_core::SqlValue> {
                #(#getters)*
                None
            }

            fn set_value(
                &mut self,
                property: &str,
                value: ::oxide_mapper_core::SqlValue,
            ) -> Result<(), ::oxide_mapper_core::ConversionError> {
                #(#setters)*
                Err(::oxide_mapper_core::ConversionError::UnknownField(
                    ::std::string::String::from(property),
                ))
            }
        }
    };

    Ok(expanded)
}

struct MappedField {
    ident: Ident,
    ty: Type,
    property: String,
    attrs: ColumnAttrs,
}

#[derive(Default)]
struct EntityAttrs {
    table: Option<String>,
    schema: Option<String>,
    interface: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    sequence: Option<String>,
    key: bool,
    identity: bool,
    generated: bool,
    version: bool,
    ignore: bool,
    ignore_insert: bool,
    ignore_update: bool,
    ignore_select: bool,
    read_only: bool,
}

fn field_descriptor(field: &MappedField) -> TokenStream2 {
    let property = &field.property;
    let attrs = &field.attrs;
    let mut tokens = quote! {
        ::oxide_mapper_core::schema::FieldDescriptor::new(#property)
    };
    if let Some(name) = &attrs.name {
        tokens = quote! { #tokens.column(#name) };
    }
    if let Some(sequence) = &attrs.sequence {
        tokens = quote! { #tokens.sequence(#sequence) };
    }
    let flags = [
        (attrs.key, quote!(key)),
        (attrs.identity, quote!(identity)),
        (attrs.generated, quote!(generated)),
        (attrs.version, quote!(version)),
        (attrs.ignore_insert, quote!(ignore_insert)),
        (attrs.ignore_update, quote!(ignore_update)),
        (attrs.ignore_select, quote!(ignore_select)),
        (attrs.read_only, quote!(read_only)),
    ];
    for (set, method) in flags {
        if set {
            tokens = quote! { #tokens.#method() };
        }
    }
    tokens
}

fn parse_entity_attrs(attrs: &[Attribute]) -> syn::Result<EntityAttrs> {
    let mut result = EntityAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                result.table = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("schema") {
                result.schema = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("interface") {
                result.interface = true;
            } else {
                return Err(meta.error("unknown entity attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("column") {
            continue;
        }
        // Handle empty attribute like #[column]
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if path.is_ident("sequence") {
                result.sequence = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if path.is_ident("key") {
                result.key = true;
            } else if path.is_ident("identity") {
                result.identity = true;
            } else if path.is_ident("generated") {
                result.generated = true;
            } else if path.is_ident("version") {
                result.version = true;
            } else if path.is_ident("ignore") {
                result.ignore = true;
            } else if path.is_ident("ignore_insert") {
                result.ignore_insert = true;
            } else if path.is_ident("ignore_update") {
                result.ignore_update = true;
            } else if path.is_ident("ignore_select") {
                result.ignore_select = true;
            } else if path.is_ident("read_only") {
                result.read_only = true;
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
