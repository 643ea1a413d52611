//! Causa Core: shared types, traits, and errors.
//!
//! This crate provides the foundational types used across all Causa crates.
//! It has no internal Causa dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration abstraction and analysis inputs
//! - [`util`]: Shared helpers (lenient serde field deserializers)

#![doc = include_str!("../README.md")]

pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::{AnalysisTargets, ConfigProvider, InputSource};
