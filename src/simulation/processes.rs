//! Stochastic processes driving the simulation
//!
//! This module contains the count processes (daily visits, daily new patients,
//! weekly loss to follow-up) and the age-binned mortality table.

use rand::distributions::Distribution;
use rand::RngCore;
use rand_distr::Normal;

use crate::simulation::error::{SimulationError, SimulationResult};
use crate::types::{age_bins, SimulationParameters};

/// A Normal-distributed count, rounded and clamped at zero
#[derive(Debug, Clone, Copy)]
pub struct CountProcess {
    name: &'static str,
    distribution: Normal<f64>,
}

impl CountProcess {
    /// Create a process with the given mean and standard deviation
    pub fn new(name: &'static str, mean: f64, std_dev: f64) -> SimulationResult<Self> {
        let distribution = Normal::new(mean, std_dev).map_err(|e| {
            SimulationError::configuration_error(format!(
                "{}: invalid Normal({}, {}): {}",
                name, mean, std_dev, e
            ))
        })?;
        Ok(Self { name, distribution })
    }

    /// Name used in log output
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Mean of the underlying distribution
    pub fn mean(&self) -> f64 {
        self.distribution.mean()
    }

    /// Draw one count
    ///
    /// Negative and non-finite draws become zero.
    pub fn sample(&self, rng: &mut dyn RngCore) -> usize {
        let value: f64 = self.distribution.sample(rng);
        if value.is_finite() && value > 0.0 {
            value.round() as usize
        } else {
            0
        }
    }
}

/// Monthly natural-death probability per ten-year age bucket
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityTable {
    probabilities: Vec<f64>,
    min_age: i64,
}

impl MortalityTable {
    /// Create a table whose first bucket starts at `min_age`
    pub fn new(probabilities: Vec<f64>, min_age: u32) -> SimulationResult<Self> {
        if probabilities.is_empty() {
            return Err(SimulationError::configuration_error(
                "death probability table must contain at least one bucket",
            ));
        }
        if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(SimulationError::configuration_error(format!(
                "death probability {} is outside [0, 1]",
                p
            )));
        }
        Ok(Self { probabilities, min_age: i64::from(min_age) })
    }

    /// Bucket index for an age in whole years
    ///
    /// Ages below the first bucket use bucket 0; ages past the last bucket use the last.
    pub fn bucket_for_age(&self, age_years: i64) -> usize {
        let offset = (age_years - self.min_age).max(0) / age_bins::WIDTH_YEARS;
        (offset as usize).min(self.probabilities.len() - 1)
    }

    /// Death probability for an age in whole years
    pub fn probability_for_age(&self, age_years: i64) -> f64 {
        self.probabilities[self.bucket_for_age(age_years)]
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Always false; construction rejects empty tables
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// All random processes of a run
#[derive(Debug, Clone)]
pub struct RandomProcessBank {
    /// Clinic visit capacity per business day
    pub visits_per_day: CountProcess,
    /// New-patient admissions per business day when demand exceeds capacity
    pub new_patients_per_day: CountProcess,
    /// Patients lost to follow-up per week
    pub ltfu_per_week: CountProcess,
    /// Natural-death probability by age
    pub mortality: MortalityTable,
}

impl RandomProcessBank {
    /// Build every process from the simulation parameters
    pub fn from_parameters(params: &SimulationParameters) -> SimulationResult<Self> {
        Ok(Self {
            visits_per_day: CountProcess::new(
                "visits_per_day",
                params.visits_per_day_mean,
                params.visits_per_day_sd,
            )?,
            new_patients_per_day: CountProcess::new(
                "new_patients_per_day",
                params.new_patients_per_day_mean,
                params.new_patients_per_day_sd,
            )?,
            ltfu_per_week: CountProcess::new(
                "ltfu_per_week",
                params.ltfu_per_week_mean,
                params.ltfu_per_week_sd,
            )?,
            mortality: MortalityTable::new(params.death_probabilities.clone(), params.min_age)?,
        })
    }
}
