//! Command-line interface module
//!
//! Handles argument parsing and run-mode selection

pub mod args;

pub use args::*;
