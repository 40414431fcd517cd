//! Subcommands
//!
//! Each command's `execute` returns the exit code instead of exiting, so
//! `main` can flush logging before the process ends.

pub mod export;
pub mod init;
pub mod reports;
pub mod validate;
