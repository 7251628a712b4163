//! Zoo (KittyCAD) API provider.

pub mod client;
pub mod types;

pub use client::ZooProvider;
