//! CLI framework for Causa.
//!
//! # Key Abstractions
//!
//! - [`CausaCli<C>`](app::CausaCli): application parameterized over a
//!   [`ConfigProvider`](causa_core::ConfigProvider)
//! - [`CliArgs`](cli::CliArgs): clap argument tree
//! - [`CausaConfig`](config::CausaConfig): confyg-backed configuration

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod graph_handlers;

pub use app::CausaCli;
pub use cli::CliArgs;
pub use config::CausaConfig;
