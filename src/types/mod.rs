//! Core types and identifiers for the care-trajectory simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: patient identifiers and run identifiers
//! - **Enums**: sex, viral-load results, patient lifecycle status, output formats
//! - **Configuration**: simulation parameters with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use hiv_care_simulator::types::*;
//!
//! let id = PatientId::new(17);
//! assert_eq!(id.to_string(), "PT_0000000017");
//!
//! assert!(ViralLoadResult::Copies(200).is_suppressed());
//!
//! let params = SimulationParameters {
//!     starting_pool_size: 250,
//!     ..Default::default()
//! };
//! assert!(params.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
