//! Dace library
//!
//! Core functionality for the Dace development scaffold: asset compilation,
//! manifest handling, chunk resolution and the server-side rendering
//! pipeline.

pub mod chunks;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod manifest;
pub mod pages;
pub mod ports;
pub mod render;
pub mod server;
pub mod state;
pub mod utils;

pub use chunks::{resolve_chunks, AssetKind, AssetRef};
pub use cli::Cli;
pub use config::Config;
pub use manifest::Manifest;
