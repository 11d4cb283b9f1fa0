//! Shared utilities
//!
//! Small helpers for filesystem housekeeping and path handling used
//! across features.

pub mod fs;
pub mod path;
