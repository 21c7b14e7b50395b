//! Typed tool schemas for language models.
//!
//! Describe a Rust function once, advertise it to any provider as JSON
//! Schema, and get back validated arguments instead of raw JSON.

pub use toolcraft_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use toolcraft_internal::prelude::*;
}
