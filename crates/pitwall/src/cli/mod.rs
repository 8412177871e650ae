//! CLI subcommands.

pub mod config;
pub mod coverage;
pub mod error;
pub mod resolve;
pub mod validate;
