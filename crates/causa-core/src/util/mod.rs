//! Utility modules shared across Causa crates.
//!
//! # Modules
//!
//! - [`de`]: Serde field deserializers accepting environment-style strings

pub mod de;
