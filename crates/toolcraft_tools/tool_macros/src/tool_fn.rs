//! Code generation for `#[tool]` on standalone async functions.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemFn;
use toolcraft_macro_utils::{ToolcraftCrate, doc_comment, resolve_crate_path};

use crate::common::{
    ToolOptions, generate_execute, generate_signature, generate_tool_methods, parse_params,
    strip_param_attrs, tool_struct_ident, validate_standalone_tool, validate_tool_signature,
};

/// Generates a `Tool` impl struct for a standalone `#[tool]` async function.
///
/// The macro consumes the original function and generates:
/// - A private `__tool_impl_<name>` async function with the original body
/// - A `<Name>Tool` struct implementing `Tool`
/// - A constructor `fn <name>() -> <Name>Tool`
pub(crate) fn generate_tool_fn(input: &ItemFn, options: &ToolOptions) -> syn::Result<TokenStream> {
    validate_tool_signature(&input.sig)?;
    validate_standalone_tool(&input.sig)?;

    let tt = resolve_crate_path(ToolcraftCrate::Tools);

    let fn_name = &input.sig.ident;
    let tool_name = options.name.clone().unwrap_or_else(|| fn_name.to_string());
    let struct_name = tool_struct_ident("", fn_name);
    let impl_fn_name = format_ident!("__tool_impl_{}", fn_name);

    let params = parse_params(&input.sig)?;
    let doc = doc_comment(&input.attrs);

    let signature_code = generate_signature(
        &tool_name,
        doc.as_deref(),
        &params,
        &input.sig.output,
        options,
        &tt,
    );
    let execute_code = generate_execute(&quote! { #impl_fn_name }, &params, &input.sig.output, &tt);
    let methods = generate_tool_methods(&signature_code, &execute_code, &tt);

    let mut impl_fn = input.clone();
    impl_fn.sig.ident = impl_fn_name;
    impl_fn.vis = syn::Visibility::Inherited;
    impl_fn.attrs.retain(|attr| !attr.path().is_ident("doc"));
    strip_param_attrs(&mut impl_fn.sig.inputs);

    let vis = &input.vis;
    let struct_doc = format!("The `{tool_name}` tool.");
    let ctor_doc = format!("Creates an instance of the `{tool_name}` tool.");

    Ok(quote! {
        #impl_fn

        #[doc = #struct_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #struct_name;

        impl #tt::Tool for #struct_name {
            #methods
        }

        #[doc = #ctor_doc]
        #[must_use]
        #vis fn #fn_name() -> #struct_name {
            #struct_name
        }
    })
}
