//! CLI library components for the MER metadata builder.

pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
