//! Provider implementations for remote job services.

pub mod zoo;

// Re-export commonly used provider types
pub use zoo::ZooProvider;
