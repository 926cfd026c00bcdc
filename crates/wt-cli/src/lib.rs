//! Work-time analyzer CLI library.
//!
//! This crate provides the CLI interface for the work-time analyzer.

mod cli;
mod config;
pub mod input;
pub mod output;

pub use cli::Cli;
pub use config::Config;
