//! Shared utilities for tool macro code generation.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, FnArg, GenericArgument, Ident, Pat, PatType, PathArguments, ReturnType, Signature,
    Type,
};
use toolcraft_macro_utils::doc_comment;

/// Validates that a function signature is suitable for `#[tool]`.
///
/// Rejects non-async, generic, unsafe, and extern functions.
pub(crate) fn validate_tool_signature(sig: &Signature) -> syn::Result<()> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[tool] requires an async function",
        ));
    }

    if let Some(unsafety) = &sig.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "#[tool] cannot be applied to unsafe functions",
        ));
    }

    if let Some(abi) = &sig.abi {
        return Err(syn::Error::new_spanned(
            abi,
            "#[tool] cannot be applied to extern functions",
        ));
    }

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[tool] does not support generic parameters",
        ));
    }

    Ok(())
}

/// Validates that a standalone `#[tool]` function has no receiver.
pub(crate) fn validate_standalone_tool(sig: &Signature) -> syn::Result<()> {
    if let Some(FnArg::Receiver(receiver)) = sig.inputs.first() {
        return Err(syn::Error::new_spanned(
            receiver,
            "#[tool] standalone functions cannot have a `self` receiver; \
             use #[toolset] on an impl block instead",
        ));
    }
    Ok(())
}

/// Validates that a `#[tool]` method inside a `#[toolset]` takes `&self`.
pub(crate) fn validate_toolset_method(sig: &Signature) -> syn::Result<()> {
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) if receiver.mutability.is_some() => {
            Err(syn::Error::new_spanned(
                receiver,
                "#[tool] methods must take `&self`, not `&mut self`; \
                 toolset wraps self in Arc which only provides shared references",
            ))
        }
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_none() => {
            Err(syn::Error::new_spanned(
                receiver,
                "#[tool] methods must take `&self`, not `self` by value; \
                 toolset wraps self in Arc which only provides shared references",
            ))
        }
        Some(FnArg::Receiver(_)) => Ok(()),
        _ => Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[tool] methods in a #[toolset] must take `&self` as the first parameter",
        )),
    }
}

/// Options accepted inside `#[tool(...)]`.
#[derive(Debug, Default)]
pub(crate) struct ToolOptions {
    /// Overrides the tool name, which defaults to the function name.
    pub name: Option<String>,
    /// Adds the return type to the signature, which requires it to implement
    /// `Describe`.
    pub describe_return: bool,
}

impl ToolOptions {
    /// Parses one `key` or `key = value` entry.
    pub(crate) fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let value: syn::LitStr = meta.value()?.parse()?;
            self.name = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("describe_return") {
            self.describe_return = true;
            Ok(())
        } else {
            Err(meta.error("unsupported #[tool] option; expected `name` or `describe_return`"))
        }
    }

    /// Parses the options of a `#[tool]` attribute found on a method.
    pub(crate) fn from_attr(attr: &Attribute) -> syn::Result<Self> {
        let mut options = Self::default();
        if matches!(attr.meta, syn::Meta::List(_)) {
            attr.parse_nested_meta(|meta| options.parse(&meta))?;
        }
        Ok(options)
    }
}

/// Parsed information about a single function parameter.
#[derive(Debug, Clone)]
pub(crate) struct ParamInfo {
    /// Binding name, also the argument name on the wire.
    pub ident: Ident,
    /// Declared type.
    pub ty: Type,
    /// Description from doc comments.
    pub doc: Option<String>,
    /// Default value expression from `#[default(expr)]`.
    pub default_expr: Option<TokenStream>,
}

/// Parses every typed parameter of a signature, skipping the receiver.
pub(crate) fn parse_params(sig: &Signature) -> syn::Result<Vec<ParamInfo>> {
    sig.inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(parse_param(pat_type)),
            FnArg::Receiver(_) => None,
        })
        .collect()
}

fn parse_param(pat_type: &PatType) -> syn::Result<ParamInfo> {
    let Pat::Ident(pat_ident) = &*pat_type.pat else {
        return Err(syn::Error::new_spanned(
            &pat_type.pat,
            "#[tool] parameters must be plain identifiers",
        ));
    };

    if let Type::Reference(reference) = &*pat_type.ty {
        return Err(syn::Error::new_spanned(
            reference,
            "#[tool] parameters must be owned types",
        ));
    }

    Ok(ParamInfo {
        ident: pat_ident.ident.clone(),
        ty: (*pat_type.ty).clone(),
        doc: doc_comment(&pat_type.attrs),
        default_expr: default_expr(&pat_type.attrs)?,
    })
}

/// Extracts the default value from `#[default(expr)]`.
fn default_expr(attrs: &[Attribute]) -> syn::Result<Option<TokenStream>> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident("default"))
        .map(|attr| attr.parse_args::<syn::Expr>().map(|expr| quote!(#expr)))
        .transpose()
}

/// Removes the attributes consumed by the macros from a parameter list.
pub(crate) fn strip_param_attrs<'a>(inputs: impl IntoIterator<Item = &'a mut FnArg>) {
    for input in inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type
                .attrs
                .retain(|attr| !attr.path().is_ident("doc") && !attr.path().is_ident("default"));
        }
    }
}

/// Returns `T` when the return type is `Result<T, E>`.
fn result_ok_type(return_type: &ReturnType) -> Option<&Type> {
    if let ReturnType::Type(_, ty) = return_type {
        generic_inner(ty, "Result")
    } else {
        None
    }
}

/// Returns the single (or first) type argument of `Wrapper<T, ..>`.
fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == wrapper
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        Some(inner)
    } else {
        None
    }
}

/// Converts a `snake_case` string to `PascalCase`.
pub(crate) fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            }
        })
        .collect()
}

/// Generates the `signature()` body for a tool.
pub(crate) fn generate_signature(
    tool_name: &str,
    doc: Option<&str>,
    params: &[ParamInfo],
    output: &ReturnType,
    options: &ToolOptions,
    tt: &TokenStream,
) -> TokenStream {
    let ts = quote! { #tt::__private::toolcraft_schema };

    let doc_builder = doc.map(|doc| quote! { .with_doc(#doc) });

    let param_builders = params.iter().map(|param| {
        let name = param.ident.to_string();
        let ty = &param.ty;
        let doc = param.doc.as_ref().map(|doc| quote! { .with_doc(#doc) });
        let default = match &param.default_expr {
            Some(expr) => Some(quote! {
                .with_default(#ts::__private::default_value(#expr))
            }),
            None if generic_inner(ty, "Option").is_some() => Some(quote! {
                .with_default(#ts::__private::serde_json::Value::Null)
            }),
            None => None,
        };
        quote! {
            .param(#ts::Param::of::<#ty>(#name) #doc #default)
        }
    });

    let returns = if options.describe_return {
        let ty = match output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => Some(result_ok_type(output).unwrap_or(ty.as_ref())),
        };
        ty.map(|ty| quote! { .returns(<#ty as #ts::Describe>::describe()) })
    } else {
        None
    };

    quote! {
        #ts::Signature::new(#tool_name)
            #doc_builder
            #(#param_builders)*
            #returns
    }
}

/// Generates the `execute()` body for a tool.
///
/// `call_target` is the function or method to call, e.g.
/// `quote! { #impl_fn_name }` or `quote! { self.inner.#method_name }`.
pub(crate) fn generate_execute(
    call_target: &TokenStream,
    params: &[ParamInfo],
    output: &ReturnType,
    tt: &TokenStream,
) -> TokenStream {
    let extractions = params.iter().map(|param| {
        let ident = &param.ident;
        let name = ident.to_string();
        let ty = &param.ty;

        if let Some(inner) = generic_inner(ty, "Option") {
            quote! {
                let #ident: #ty = __args.get_optional::<#inner>(#name)?;
            }
        } else {
            quote! {
                let #ident: #ty = __args.get::<#ty>(#name)?;
            }
        }
    });

    let call_args = params.iter().map(|param| &param.ident);
    let serde_json = quote! { #tt::__private::serde_json };

    let result_handling = if result_ok_type(output).is_some() {
        quote! {
            match #call_target(#(#call_args),*).await {
                Ok(__value) => #serde_json::to_value(__value).map_err(#tt::ToolError::from),
                Err(__err) => Err(#tt::ToolError::from(__err)),
            }
        }
    } else {
        quote! {
            let __result = #call_target(#(#call_args),*).await;
            #serde_json::to_value(__result).map_err(#tt::ToolError::from)
        }
    };

    let unused = params.is_empty().then(|| quote! { let _ = __args; });

    quote! {
        #unused
        #(#extractions)*
        #result_handling
    }
}

/// Generates the `Tool` impl methods shared by standalone and toolset tools.
pub(crate) fn generate_tool_methods(
    signature_code: &TokenStream,
    execute_code: &TokenStream,
    tt: &TokenStream,
) -> TokenStream {
    quote! {
        fn signature(&self) -> #tt::__private::toolcraft_schema::Signature {
            #signature_code
        }

        fn execute(
            &self,
            __args: #tt::__private::toolcraft_schema::Arguments,
        ) -> #tt::ToolFuture<'_> {
            ::std::boxed::Box::pin(async move {
                #execute_code
            })
        }
    }
}

/// Name of the generated tool struct for a function.
pub(crate) fn tool_struct_ident(prefix: &str, fn_name: &Ident) -> Ident {
    format_ident!("{}{}Tool", prefix, to_pascal_case(&fn_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal_case("get_weather"), "GetWeather");
        assert_eq!(to_pascal_case("search"), "Search");
    }

    #[test]
    fn option_params_default_to_null() {
        let sig: Signature = parse_quote! {
            async fn forecast(city: String, days: Option<u8>)
        };
        let params = parse_params(&sig).unwrap();
        let tt = quote!(toolcraft_tools);
        let code = generate_signature(
            "forecast",
            None,
            &params,
            &sig.output,
            &ToolOptions::default(),
            &tt,
        )
        .to_string();

        assert_eq!(code.matches("with_default").count(), 1);
        assert!(code.contains("Null"));
    }

    #[test]
    fn reference_params_are_rejected() {
        let sig: Signature = parse_quote! {
            async fn echo(text: &str)
        };
        let err = parse_params(&sig).unwrap_err();
        assert!(err.to_string().contains("owned types"));
    }

    #[test]
    fn result_return_is_unwrapped_for_describe() {
        let output: ReturnType = parse_quote!(-> Result<Vec<String>, ToolError>);
        let ok: Type = parse_quote!(Vec<String>);
        assert_eq!(result_ok_type(&output), Some(&ok));
    }
}
