//! The core [`Tool`] trait and a closure-backed implementation.

use crate::error::ToolError;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use toolcraft_schema::{Arguments, Signature};

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// A tool that can be invoked by a model.
///
/// A tool describes itself with a [`Signature`], which the
/// [`ToolRegistry`](crate::ToolRegistry) turns into a schema at registration.
/// [`execute`](Tool::execute) only ever receives arguments that passed
/// evaluation against that schema, with defaults filled in.
pub trait Tool: Send + Sync + 'static {
    /// Returns the tool's name, parameters and documentation.
    fn signature(&self) -> Signature;

    /// Runs the tool with evaluated arguments.
    fn execute(&self, args: Arguments) -> ToolFuture<'_>;
}

/// A tool backed by an async closure.
///
/// # Example
///
/// ```
/// use toolcraft_schema::{Param, Signature};
/// use toolcraft_tools::{FunctionTool, ToolError};
///
/// let echo = FunctionTool::new(
///     Signature::new("echo").param(Param::of::<String>("text")),
///     |args| async move { args.get::<String>("text").map_err(ToolError::from) },
/// );
/// ```
pub struct FunctionTool<F> {
    signature: Signature,
    handler: F,
}

impl<F> FunctionTool<F> {
    /// Creates a tool from a signature and a handler.
    pub fn new<Fut, R>(signature: Signature, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
        R: Serialize,
    {
        Self { signature, handler }
    }
}

impl<F> core::fmt::Debug for FunctionTool<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.signature.name)
            .finish_non_exhaustive()
    }
}

impl<F, Fut, R> Tool for FunctionTool<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    R: Serialize,
{
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn execute(&self, args: Arguments) -> ToolFuture<'_> {
        let future = (self.handler)(args);
        Box::pin(async move { Ok(serde_json::to_value(future.await?)?) })
    }
}
