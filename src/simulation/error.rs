//! Error types and handling
//!
//! This module contains the error types raised by the simulation engine.

use crate::types::ConfigValidationError;
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Parameters are invalid; raised before the first tick
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// The patient generator could not supply enough unique identifiers
    #[error(
        "Patient generation exhausted: needed {requested} unique patients, obtained {obtained} after {attempts} attempts"
    )]
    GenerationExhausted {
        /// Unique patients requested
        requested: usize,
        /// Unique patients accumulated before giving up
        obtained: usize,
        /// Generator batches attempted
        attempts: usize,
    },

    /// More eligible patients were required than the pool holds
    #[error("Capacity error: {context} requires {required} eligible patients but only {available} exist")]
    CapacityError {
        /// Operation that ran out of patients
        context: String,
        /// Patients required
        required: usize,
        /// Patients available
        available: usize,
    },

    /// The calendar could not produce a business day
    #[error("Calendar error: {0}")]
    CalendarError(String),

    /// A patient record violates a state invariant
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// I/O error
    #[error("IO error")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a capacity error
    pub fn capacity_error(context: impl Into<String>, required: usize, available: usize) -> Self {
        Self::CapacityError { context: context.into(), required, available }
    }

    /// Create a calendar error
    pub fn calendar_error(msg: impl Into<String>) -> Self {
        Self::CalendarError(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Only a capacity shortfall can be recovered from, by topping up the pool once.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimulationError::CapacityError { .. })
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::GenerationExhausted { .. } => "Generation Exhausted",
            SimulationError::CapacityError { .. } => "Capacity",
            SimulationError::CalendarError(_) => "Calendar",
            SimulationError::InvariantViolation(_) => "Invariant",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
