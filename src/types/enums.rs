//! Enumeration types for the care-trajectory simulator
//!
//! This module contains the enumeration types used throughout the simulation system:
//! patient sex, viral-load results, the patient lifecycle status, and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Viral loads below this many copies/mL are classified as suppressed
pub const SUPPRESSION_THRESHOLD_COPIES: u32 = 1000;

/// Recorded sex of a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Female
    Female,
    /// Male
    Male,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "F"),
            Sex::Male => write!(f, "M"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f" | "female" => Ok(Sex::Female),
            "m" | "male" => Ok(Sex::Male),
            _ => Err(format!("Unknown sex: {}", s)),
        }
    }
}

/// Result of a viral-load test
///
/// Results are reported either as a categorical classification or as a numeric
/// copies/mL value, which is classified against [`SUPPRESSION_THRESHOLD_COPIES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViralLoadResult {
    /// Reported as suppressed
    Suppressed,
    /// Reported as unsuppressed
    Unsuppressed,
    /// Reported as a numeric copies/mL value
    Copies(u32),
}

impl ViralLoadResult {
    /// Whether this result counts as virally suppressed
    pub fn is_suppressed(&self) -> bool {
        match self {
            ViralLoadResult::Suppressed => true,
            ViralLoadResult::Unsuppressed => false,
            ViralLoadResult::Copies(copies) => *copies < SUPPRESSION_THRESHOLD_COPIES,
        }
    }
}

impl fmt::Display for ViralLoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViralLoadResult::Suppressed => write!(f, "suppressed"),
            ViralLoadResult::Unsuppressed => write!(f, "unsuppressed"),
            ViralLoadResult::Copies(copies) => write!(f, "{}", copies),
        }
    }
}

impl FromStr for ViralLoadResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suppressed" | "supp" => Ok(ViralLoadResult::Suppressed),
            "unsuppressed" | "unsupp" => Ok(ViralLoadResult::Unsuppressed),
            other => other
                .parse::<u32>()
                .map(ViralLoadResult::Copies)
                .map_err(|_| format!("Unknown viral load result: {}", s)),
        }
    }
}

/// Mutually exclusive lifecycle status of a patient
///
/// `Dead` and `LostToFollowUp` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    /// Generated but not yet admitted into care
    Inactive,
    /// In care and not currently requiring a visit
    ActiveNotDue,
    /// In care and requiring a visit
    ActiveDue,
    /// Lost to follow-up
    LostToFollowUp,
    /// Died
    Dead,
}

impl PatientStatus {
    /// Whether the status can never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, PatientStatus::LostToFollowUp | PatientStatus::Dead)
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientStatus::Inactive => write!(f, "Inactive"),
            PatientStatus::ActiveNotDue => write!(f, "Active (not due)"),
            PatientStatus::ActiveDue => write!(f, "Active (due)"),
            PatientStatus::LostToFollowUp => write!(f, "Lost to follow-up"),
            PatientStatus::Dead => write!(f, "Dead"),
        }
    }
}

/// Output format for the end-of-run patient table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// JSON Lines, one patient per line
    Json,
    /// CSV with a header row
    Csv,
}

impl OutputFormat {
    /// File extension used for the patient table
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
