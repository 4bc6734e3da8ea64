//! Simulation engine
//!
//! This module contains the simulated clock and calendar, the random processes,
//! the mutable simulation state, the daily tick, the periodic population
//! updates, the orchestrator that sequences them, statistics, error handling
//! and logging.
//!
//! # Overview
//!
//! - **SimulationOrchestrator**: advances the clock one business day at a time
//! - **simulation_tick**: daily admissions and returning visits
//! - **update_dead / weekly_update**: monthly mortality, weekly due-flagging then loss to follow-up
//! - **BusinessCalendar**: business-day queries; `WeekdayCalendar` is the default
//! - **RandomProcessBank**: count processes and the mortality table
//! - **SimulationStatistics**: run counters and monthly indicators
//!
//! # Usage Example
//!
//! ```rust
//! use hiv_care_simulator::simulation::*;
//! use hiv_care_simulator::types::SimulationParameters;
//! use chrono::NaiveDate;
//!
//! let params = SimulationParameters {
//!     seed: Some(42),
//!     starting_pool_size: 100,
//!     start_date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
//!     end_date: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
//!     ..Default::default()
//! };
//!
//! let state = run_simulation(&params)?;
//! assert_eq!(state.statistics().ticks_run, 20);
//! assert!(state.pool().check_invariants().is_ok());
//! # Ok::<(), SimulationError>(())
//! ```

pub mod calendar;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod processes;
pub mod state;
pub mod statistics;
pub mod tick;
pub mod updates;

// Re-export all public types for convenience
pub use calendar::*;
pub use error::*;
pub use logging::*;
pub use orchestrator::*;
pub use processes::*;
pub use state::*;
pub use statistics::*;
pub use tick::*;
pub use updates::*;
