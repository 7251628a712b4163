//! Core types used throughout the library.

pub mod job;
pub mod request;

// Re-export commonly used types
pub use job::*;
pub use request::*;
