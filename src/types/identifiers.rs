//! Unique identifier types for the care-trajectory simulator
//!
//! This module contains the patient identifier, drawn by the patient generator
//! from a bounded numeric space, and the UUID-based run identifier stamped on
//! every output summary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a patient
///
/// Patient identifiers are drawn from a bounded numeric space by the generator,
/// so two draws can collide; the patient pool rejects duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId(pub u64);

impl PatientId {
    /// Create a patient ID from its numeric value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PT_{:010}", self.0)
    }
}

impl Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("PT_").unwrap_or(&s);
        let value = digits.parse::<u64>().map_err(serde::de::Error::custom)?;
        Ok(PatientId(value))
    }
}

/// Unique identifier for a single simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.0.simple())
    }
}

impl Serialize for RunId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("RUN_{}", self.0.simple()))
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let uuid_str = s.strip_prefix("RUN_").unwrap_or(&s);
        let uuid = Uuid::parse_str(uuid_str).map_err(serde::de::Error::custom)?;
        Ok(RunId(uuid))
    }
}
