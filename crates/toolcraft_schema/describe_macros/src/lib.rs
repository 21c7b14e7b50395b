//! Derive macro for toolcraft type descriptors.
//!
//! Provides `#[derive(Describe)]` for structs with named fields and for
//! enums whose variants are all unit variants.

mod attrs;
mod expand;

use proc_macro::TokenStream;

/// Derives `Describe` for a record struct or a unit-only enum.
///
/// Structs become record descriptors: field doc comments become field
/// descriptions and the struct's doc comment becomes the record docs, where
/// Google `Attributes:` or rustdoc `# Fields` sections are also recognised.
/// Unit-only enums become literal sets.
///
/// # Attributes
///
/// - `#[describe(default = expr)]`: default value, written as a JSON literal
/// - `#[serde(default)]`, `#[serde(default = "path")]`: default from `Default` or a function
/// - `#[serde(rename = "...")]`, `#[serde(rename_all = "...")]`: wire names
/// - `#[serde(skip)]`, `#[serde(skip_deserializing)]`: leave the field out
///
/// `Option<T>` fields without a default get a `null` default, matching
/// serde's handling of missing optional fields.
///
/// # Example
///
/// ```ignore
/// use toolcraft_schema::Describe;
///
/// /// Paging window.
/// #[derive(Describe)]
/// struct Page {
///     /// Zero-based page index.
///     index: u32,
///     /// Items per page.
///     #[describe(default = 20)]
///     size: u32,
/// }
/// ```
#[proc_macro_derive(Describe, attributes(describe, serde))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    expand::derive_describe(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
