//! Patient generation
//!
//! This module contains the interface the patient pool draws new patients from,
//! plus the default demographic generator driven by the simulation parameters.

use chrono::{Duration, Months, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

use crate::simulation::error::{SimulationError, SimulationResult};
use crate::types::{age_bins, PatientId, Sex, SimulationParameters};

/// Immutable attributes of a freshly generated patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDemographics {
    /// Identifier; may collide with patients already in the pool
    pub id: PatientId,
    /// Date of birth
    pub birthdate: NaiveDate,
    /// Recorded sex, `None` when the attribute is missing
    pub sex: Option<Sex>,
}

/// Source of new patients for the pool
///
/// Implementations are not required to produce unique identifiers; the pool
/// filters collisions and asks again. All randomness must come from `rng` so
/// runs stay reproducible.
pub trait PatientGenerator: Debug {
    /// Produce `count` patients, aged relative to `reference_date`
    fn generate(
        &mut self,
        count: usize,
        reference_date: NaiveDate,
        rng: &mut dyn RngCore,
    ) -> Vec<PatientDemographics>;

    /// Number of distinct identifiers the generator can ever produce, if bounded
    fn id_capacity(&self) -> Option<u64> {
        None
    }
}

/// Default generator: sex by ratio, age by weighted ten-year buckets
#[derive(Debug, Clone)]
pub struct DemographicGenerator {
    sex_ratio: f64,
    missing_data_probability: f64,
    min_age: u32,
    age_buckets: WeightedIndex<f64>,
    id_space: u64,
}

impl DemographicGenerator {
    /// Create a generator from the simulation parameters
    pub fn from_parameters(params: &SimulationParameters) -> SimulationResult<Self> {
        let age_buckets = WeightedIndex::new(&params.age_weights).map_err(|e| {
            SimulationError::configuration_error(format!("Invalid age weights: {}", e))
        })?;

        if params.id_space == 0 {
            return Err(SimulationError::configuration_error("Identifier space must be non-empty"));
        }

        Ok(Self {
            sex_ratio: params.sex_ratio,
            missing_data_probability: params.missing_data_probability,
            min_age: params.min_age,
            age_buckets,
            id_space: params.id_space,
        })
    }

    fn generate_birthdate(&self, reference_date: NaiveDate, rng: &mut dyn RngCore) -> NaiveDate {
        let bucket = self.age_buckets.sample(rng) as i64;
        let lower = i64::from(self.min_age) + bucket * age_bins::WIDTH_YEARS;
        let age_years = rng.gen_range(lower..lower + age_bins::WIDTH_YEARS);
        let extra_days = rng.gen_range(0..365);

        let months = u32::try_from(age_years * 12).unwrap_or(0);
        reference_date
            .checked_sub_months(Months::new(months))
            .and_then(|date| date.checked_sub_signed(Duration::days(extra_days)))
            .unwrap_or(reference_date)
    }
}

impl PatientGenerator for DemographicGenerator {
    fn generate(
        &mut self,
        count: usize,
        reference_date: NaiveDate,
        rng: &mut dyn RngCore,
    ) -> Vec<PatientDemographics> {
        debug!("Generating {} patients relative to {}", count, reference_date);

        (0..count)
            .map(|_| {
                let id = PatientId::new(rng.gen_range(1..=self.id_space));
                let birthdate = self.generate_birthdate(reference_date, rng);
                let sex = if rng.gen_bool(self.missing_data_probability) {
                    None
                } else if rng.gen_bool(self.sex_ratio) {
                    Some(Sex::Female)
                } else {
                    Some(Sex::Male)
                };
                PatientDemographics { id, birthdate, sex }
            })
            .collect()
    }

    fn id_capacity(&self) -> Option<u64> {
        Some(self.id_space)
    }
}
