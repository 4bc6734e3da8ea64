//! Patient modeling and pool management
//!
//! This module contains the patient record, the patient pool that owns every
//! generated patient, and the generator interface new patients are drawn from.
//!
//! # Overview
//!
//! - **Patient**: demographics plus simulation tracking fields and state transitions
//! - **PatientPool**: index-addressable store with predicate views and `add_new_patients`
//! - **PatientGenerator**: source of new patients; `DemographicGenerator` is the default
//!
//! # Usage Example
//!
//! ```rust
//! use hiv_care_simulator::patient::*;
//! use hiv_care_simulator::types::SimulationParameters;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let params = SimulationParameters::default();
//! let mut generator = DemographicGenerator::from_parameters(&params)?;
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let mut pool = PatientPool::new();
//! let added = pool.add_new_patients(10, &mut generator, params.start_date, 1.5, 10, &mut rng)?;
//! assert!(added >= 10);
//! assert_eq!(pool.status_counts().inactive, added);
//! # Ok::<(), hiv_care_simulator::simulation::SimulationError>(())
//! ```

pub mod generator;
#[allow(clippy::module_inception)]
pub mod patient;
pub mod pool;

// Re-export all public types for convenience
pub use generator::*;
pub use patient::*;
pub use pool::*;
