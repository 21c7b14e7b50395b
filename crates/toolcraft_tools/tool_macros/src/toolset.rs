//! Code generation for `#[toolset]` on impl blocks.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Generics, ImplItem, ImplItemFn, ItemImpl, Type};
use toolcraft_macro_utils::{ToolcraftCrate, doc_comment, resolve_crate_path};

use crate::common::{
    ToolOptions, generate_execute, generate_signature, generate_tool_methods, parse_params,
    strip_param_attrs, tool_struct_ident, validate_tool_signature, validate_toolset_method,
};

/// A `#[tool]` method and the options on its attribute.
struct ToolMethod<'a> {
    method: &'a ImplItemFn,
    options: ToolOptions,
}

/// Generates a `Toolset` impl for an impl block with `#[tool]` methods.
pub(crate) fn generate_toolset(input: &ItemImpl) -> syn::Result<TokenStream> {
    let tt = resolve_crate_path(ToolcraftCrate::Tools);

    let self_ty = &input.self_ty;
    let type_name = type_name_str(self_ty)?;
    let (impl_generics, _ty_generics, where_clause) = input.generics.split_for_impl();

    let mut tool_methods = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item
            && let Some(attr) = method.attrs.iter().find(|attr| attr.path().is_ident("tool"))
        {
            validate_tool_signature(&method.sig)?;
            validate_toolset_method(&method.sig)?;
            tool_methods.push(ToolMethod {
                method,
                options: ToolOptions::from_attr(attr)?,
            });
        }
    }

    let tool_structs = tool_methods
        .iter()
        .map(|tool| generate_tool_struct(self_ty, &type_name, tool, &input.generics, &tt))
        .collect::<syn::Result<Vec<_>>>()?;

    let tool_constructors = tool_methods.iter().map(|tool| {
        let struct_name = tool_struct_ident(&type_name, &tool.method.sig.ident);
        quote! {
            ::std::boxed::Box::new(#struct_name { inner: ::std::sync::Arc::clone(&__arc_self) })
        }
    });

    // The original impl block, minus the attributes the macro consumed.
    let mut cleaned = input.clone();
    for item in &mut cleaned.items {
        if let ImplItem::Fn(method) = item
            && method.attrs.iter().any(|attr| attr.path().is_ident("tool"))
        {
            method.attrs.retain(|attr| !attr.path().is_ident("tool"));
            strip_param_attrs(&mut method.sig.inputs);
        }
    }

    Ok(quote! {
        #cleaned

        #(#tool_structs)*

        impl #impl_generics #tt::Toolset for #self_ty #where_clause {
            fn tools(self) -> ::std::vec::Vec<::std::boxed::Box<dyn #tt::Tool>> {
                let __arc_self = ::std::sync::Arc::new(self);
                ::std::vec![
                    #(#tool_constructors),*
                ]
            }
        }
    })
}

fn generate_tool_struct(
    self_ty: &Type,
    type_name: &str,
    tool: &ToolMethod<'_>,
    generics: &Generics,
    tt: &TokenStream,
) -> syn::Result<TokenStream> {
    let method = tool.method;
    let method_name = &method.sig.ident;
    let struct_name = tool_struct_ident(type_name, method_name);
    let tool_name = tool
        .options
        .name
        .clone()
        .unwrap_or_else(|| method_name.to_string());

    let params = parse_params(&method.sig)?;
    let doc = doc_comment(&method.attrs);

    let signature_code = generate_signature(
        &tool_name,
        doc.as_deref(),
        &params,
        &method.sig.output,
        &tool.options,
        tt,
    );
    let execute_code = generate_execute(
        &quote! { self.inner.#method_name },
        &params,
        &method.sig.output,
        tt,
    );
    let methods = generate_tool_methods(&signature_code, &execute_code, tt);

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let existing_predicates: Vec<_> = where_clause
        .map(|wc| wc.predicates.iter().collect())
        .unwrap_or_default();

    Ok(quote! {
        #[doc(hidden)]
        struct #struct_name #impl_generics
        where
            #self_ty: Send + Sync + 'static,
            #(#existing_predicates),*
        {
            inner: ::std::sync::Arc<#self_ty>,
        }

        impl #impl_generics #tt::Tool for #struct_name #ty_generics
        where
            #self_ty: Send + Sync + 'static,
            #(#existing_predicates),*
        {
            #methods
        }
    })
}

fn type_name_str(ty: &Type) -> syn::Result<String> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return Ok(segment.ident.to_string());
    }
    Err(syn::Error::new_spanned(
        ty,
        "#[toolset] impl target must be a path type",
    ))
}
