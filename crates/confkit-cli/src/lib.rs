//! confkit CLI library
//!
//! Exposes the CLI entry point and the file and environment sources it
//! loads configuration from.

mod cli;
pub mod sources;

pub use cli::run;
