//! CLI command handlers

pub mod commands;

pub use commands::{recreate, validate, verify, OptionFlags};
