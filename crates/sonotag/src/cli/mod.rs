//! Subcommand implementations.

pub mod classify;
pub mod config;
pub mod models;
pub mod taxonomy;
