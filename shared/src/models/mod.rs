//! Data models
//!
//! Shared between the client orchestrator and whatever renders its results.
//! All IDs are opaque strings assigned by the backend.

pub mod status;
pub mod tag;
pub mod zone;

// Re-exports
pub use status::*;
pub use tag::*;
pub use zone::*;
