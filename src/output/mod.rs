//! Output persistence
//!
//! This module contains the writer for the end-of-run patient table and the
//! run summary.

pub mod writer;

// Re-export all public types for convenience
pub use writer::*;
