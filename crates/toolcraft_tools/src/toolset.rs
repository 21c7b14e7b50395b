//! Grouped tools sharing one receiver.

use crate::tool::Tool;

/// A group of tools backed by methods on one value.
///
/// Implemented by `#[toolset]` on an impl block: each `#[tool]` method
/// becomes a [`Tool`] holding a shared reference to the consumed value.
pub trait Toolset {
    /// Consumes the value and returns one tool per `#[tool]` method.
    fn tools(self) -> Vec<Box<dyn Tool>>;
}
