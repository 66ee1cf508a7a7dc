//! # Registry
//!
//! Component registration and discovery.

pub mod adapter_registry;

pub use adapter_registry::AdapterRegistry;
