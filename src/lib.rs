//! HIV Care Simulator
//!
//! Synthetic longitudinal care trajectories for a population of patients in an
//! HIV treatment program: admissions, clinic visits, viral-load results, loss to
//! follow-up and death over a configurable calendar period.
//!
//! # Overview
//!
//! The simulation is time-stepped over business days. Every business day a
//! tick admits new patients into idle clinic capacity and sees returning due
//! patients. When the clock crosses into a new month, a mortality draw runs
//! over everyone alive and not lost; when it crosses into a new ISO week,
//! due-flagging runs and then a sampled number of due patients are lost to
//! follow-up.
//!
//! ## Key Features
//!
//! - **Patient Pool**: every generated patient with their lifecycle state
//! - **Business-Day Clock**: weekday calendar with configurable holidays
//! - **Stochastic Processes**: Normal count processes and an age-binned mortality table
//! - **Reproducibility**: one seeded random source consumed in a fixed order
//! - **Output**: patient table as JSON Lines or CSV, plus a JSON run summary
//!
//! ## Quick Start
//!
//! ```rust
//! use hiv_care_simulator::*;
//! use chrono::NaiveDate;
//!
//! let params = SimulationParameters {
//!     seed: Some(7),
//!     starting_pool_size: 200,
//!     start_date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
//!     end_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
//!     ..Default::default()
//! };
//!
//! let mut orchestrator = SimulationOrchestrator::new(params)?;
//! let stats = orchestrator.run()?;
//! println!("{}", stats.generate_compact_summary());
//! # Ok::<(), SimulationError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums and configuration
//! - [`patient`]: patient records, the patient pool and patient generation
//! - [`simulation`]: calendar, processes, state, tick, updates and orchestration
//! - [`output`]: patient table and run summary writer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │   Patient   │    │   Output    │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Record      │◄───┤ Writer      │
//! │ Enums       │    │ Pool        │    │ Summary     │
//! │ Config      │    │ Generator   │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                  ▲                  ▲
//!        │                  │                  │
//!        │           ┌─────────────┐           │
//!        │           │ Simulation  │           │
//!        └───────────┤             ├───────────┘
//!                    │ Calendar    │
//!                    │ Processes   │
//!                    │ State, Tick │
//!                    │ Updates     │
//!                    │ Orchestrator│
//!                    └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod output;
pub mod patient;
pub mod simulation;
pub mod types;

// Core types and identifiers
pub use types::{
    ConfigValidationError,
    OutputFormat,
    // Identifiers
    PatientId,
    PatientStatus,
    RunId,
    // Enums
    Sex,
    // Configuration
    SimulationParameters,
    ViralLoadResult,
};

// Patients
pub use patient::{
    DemographicGenerator, Patient, PatientDemographics, PatientGenerator, PatientPool,
    StatusCounts,
};

// Simulation engine
pub use simulation::{
    run_simulation, simulation_tick, update_dead, update_due, update_ltfu, weekly_update,
    BoundaryCrossing, BusinessCalendar, LoggingConfig, RandomProcessBank, SimulationError,
    SimulationOrchestrator, SimulationResult, SimulationState, SimulationStatistics,
    WeekdayCalendar,
};

// Output
pub use output::{OutputWriter, RunSummary};
