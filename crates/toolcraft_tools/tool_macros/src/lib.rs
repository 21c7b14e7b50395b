//! Procedural macros for the toolcraft tool framework.
//!
//! Provides `#[tool]` for standalone tool functions and `#[toolset]` for
//! grouped tools on impl blocks. Both build a `Signature` from the Rust
//! function: parameter names and types, `#[default(..)]` values, and doc
//! comments. The registry turns that signature into a schema at
//! registration time.

mod common;
mod tool_fn;
mod toolset;

use proc_macro::TokenStream;

/// Defines a standalone tool from an async function.
///
/// Generates a `<Name>Tool` struct implementing `Tool` and a constructor
/// function with the original name. Arguments reach the function already
/// validated, with defaults filled in.
///
/// # Options
///
/// - `#[tool(name = "...")]` overrides the tool name.
/// - `#[tool(describe_return)]` adds the return type (the `Ok` type of a
///   `Result`) to the schema; the type must implement `Describe`.
///
/// # Parameter Attributes
///
/// - `/// doc comment` becomes the parameter's description
/// - `#[default(value)]` makes the parameter optional with a default value
/// - `Option<T>` parameters without a default are optional and default to `null`
///
/// Parameters may also be documented in the function's own doc comment,
/// under a rustdoc `# Arguments` list or a Google-style `Args:` section.
///
/// # Example
///
/// ```
/// use toolcraft_tools::{tool, ToolError};
///
/// /// Search for documents.
/// #[tool]
/// async fn search(
///     /// The search query.
///     query: String,
///     /// Max results.
///     #[default(10)]
///     limit: usize,
/// ) -> Result<String, ToolError> {
///     Ok(format!("{limit} results for: {query}"))
/// }
/// ```
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut options = common::ToolOptions::default();
    let parser = syn::meta::parser(|meta| options.parse(&meta));
    syn::parse_macro_input!(attr with parser);

    let input = syn::parse_macro_input!(item as syn::ItemFn);
    tool_fn::generate_tool_fn(&input, &options)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Defines a toolset from an impl block containing `#[tool]` methods.
///
/// Generates a `Toolset` impl that provides all `#[tool]` methods as
/// individual `Tool` instances sharing one `Arc` of the value.
///
/// # Example
///
/// ```
/// use toolcraft_tools::{toolset, tool, ToolError};
///
/// struct FileTools {
///     root: String,
/// }
///
/// #[toolset]
/// impl FileTools {
///     /// List files.
///     #[tool]
///     async fn list_files(&self, path: String) -> Result<String, ToolError> {
///         Ok(format!("{}/{path}", self.root))
///     }
///
///     /// Read a file.
///     #[tool]
///     async fn read_file(&self, path: String) -> Result<String, ToolError> {
///         Ok(format!("contents of {}/{path}", self.root))
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn toolset(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    toolset::generate_toolset(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
