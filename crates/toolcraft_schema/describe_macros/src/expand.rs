//! Code generation for `#[derive(Describe)]`.

use crate::attrs::{FieldDefault, container_attrs, member_attrs};
use proc_macro2::TokenStream;
use quote::quote;
use syn::visit::Visit;
use syn::{Data, DataEnum, DataStruct, DeriveInput, Fields, Ident, Type};
use toolcraft_macro_utils::{ToolcraftCrate, doc_comment, resolve_crate_path};

pub(crate) fn derive_describe(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Describe)] does not support generic types",
        ));
    }

    let ts = resolve_crate_path(ToolcraftCrate::Schema);
    let name = &input.ident;

    let body = match &input.data {
        Data::Struct(data) => describe_struct(input, data, &ts)?,
        Data::Enum(data) => describe_enum(input, data, &ts)?,
        Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "#[derive(Describe)] does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #ts::Describe for #name {
            fn describe() -> #ts::TypeDescriptor {
                #body
            }
        }
    })
}

fn describe_struct(
    input: &DeriveInput,
    data: &DataStruct,
    ts: &TokenStream,
) -> syn::Result<TokenStream> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Describe)] requires a struct with named fields",
        ));
    };

    let container = container_attrs(&input.attrs)?;
    let name = &input.ident;
    let name_str = name.to_string();

    let doc = doc_comment(&input.attrs)
        .map(|doc| quote! { .with_doc(#doc) })
        .unwrap_or_default();

    let mut params = Vec::new();
    for field in &fields.named {
        let attrs = member_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        if attrs.flatten {
            return Err(syn::Error::new_spanned(
                field,
                "#[derive(Describe)] does not support `#[serde(flatten)]`",
            ));
        }
        if mentions_type(&field.ty, name) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[derive(Describe)] does not support recursive types",
            ));
        }

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ident_str = ident.to_string();
        let ident_str = ident_str.strip_prefix("r#").unwrap_or(&ident_str);
        let wire_name = attrs.rename.clone().unwrap_or_else(|| match container.rename_all {
            Some(rule) => rule.apply_to_field(ident_str),
            None => ident_str.to_string(),
        });

        let ty = &field.ty;
        let field_doc = doc_comment(&field.attrs)
            .map(|doc| quote! { .with_doc(#doc) })
            .unwrap_or_default();

        let default = match &attrs.default {
            Some(FieldDefault::Json(expr)) => {
                quote! { .with_default(#ts::__private::serde_json::json!(#expr)) }
            }
            Some(FieldDefault::TypeDefault) => quote! {
                .with_default(#ts::__private::default_value(<#ty as ::core::default::Default>::default()))
            },
            Some(FieldDefault::Function(path)) => quote! {
                .with_default(#ts::__private::default_value::<#ty>(#path()))
            },
            None if container.default => quote! {
                .with_default(#ts::__private::default_value(<#name as ::core::default::Default>::default().#ident))
            },
            None if is_option(ty) => quote! {
                .with_default(#ts::__private::serde_json::Value::Null)
            },
            None => quote! {},
        };

        params.push(quote! {
            .param(
                #ts::Param::new(#wire_name, <#ty as #ts::Describe>::describe())
                    #field_doc
                    #default
            )
        });
    }

    Ok(quote! {
        #ts::__private::describe_record(
            ::core::any::TypeId::of::<Self>(),
            #name_str,
            || #ts::TypeDescriptor::record(
                #ts::Signature::new(#name_str)
                    #doc
                    #(#params)*
            ),
        )
    })
}

fn describe_enum(
    input: &DeriveInput,
    data: &DataEnum,
    ts: &TokenStream,
) -> syn::Result<TokenStream> {
    let container = container_attrs(&input.attrs)?;

    let mut literals = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "#[derive(Describe)] supports only unit variants",
            ));
        }
        let attrs = member_attrs(&variant.attrs)?;
        if attrs.skip {
            continue;
        }
        let variant_str = variant.ident.to_string();
        let wire_name = attrs.rename.unwrap_or_else(|| match container.rename_all {
            Some(rule) => rule.apply_to_variant(&variant_str),
            None => variant_str.clone(),
        });
        literals.push(wire_name);
    }

    if literals.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Describe)] requires at least one variant",
        ));
    }

    Ok(quote! {
        #ts::TypeDescriptor::literal([#(#literals),*])
    })
}

fn is_option(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Option";
    }
    false
}

/// Returns whether `ty` refers to `Self` or the type being derived.
fn mentions_type(ty: &Type, name: &Ident) -> bool {
    struct Finder<'a> {
        name: &'a Ident,
        found: bool,
    }

    impl<'ast> Visit<'ast> for Finder<'_> {
        fn visit_path_segment(&mut self, segment: &'ast syn::PathSegment) {
            if segment.ident == *self.name || segment.ident == "Self" {
                self.found = true;
            }
            syn::visit::visit_path_segment(self, segment);
        }
    }

    let mut finder = Finder { name, found: false };
    finder.visit_type(ty);
    finder.found
}
