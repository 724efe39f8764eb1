pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub use error::{Result, TmigError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
