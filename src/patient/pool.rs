//! Patient pool storage and growth
//!
//! This module contains the PatientPool, the index-addressable store of every
//! patient ever generated, and the `add_new_patients` growth operation.

use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

use crate::patient::{Patient, PatientDemographics, PatientGenerator};
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::types::{PatientId, PatientStatus};

/// Number of patients in each lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Generated but not admitted
    pub inactive: usize,
    /// In care, not due
    pub active_not_due: usize,
    /// In care, due
    pub active_due: usize,
    /// Lost to follow-up
    pub lost_to_follow_up: usize,
    /// Dead
    pub dead: usize,
}

impl StatusCounts {
    /// Total number of patients counted
    pub fn total(&self) -> usize {
        self.inactive + self.active_not_due + self.active_due + self.lost_to_follow_up + self.dead
    }

    /// Patients currently in care (due or not)
    pub fn in_care(&self) -> usize {
        self.active_not_due + self.active_due
    }
}

/// Every patient ever generated during a run
///
/// Patients are never removed; filtered views are returned as index sets into
/// the pool so callers mutate records in place through [`PatientPool::get_mut`].
#[derive(Debug, Clone, Default)]
pub struct PatientPool {
    patients: Vec<Patient>,
    ids: HashSet<PatientId>,
}

impl PatientPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of patients in the pool
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// Whether the pool holds no patients
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// All patients, in insertion order
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Patient at `index`
    pub fn get(&self, index: usize) -> Option<&Patient> {
        self.patients.get(index)
    }

    /// Mutable patient at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Patient> {
        self.patients.get_mut(index)
    }

    /// Whether a patient with this identifier exists
    pub fn contains(&self, id: PatientId) -> bool {
        self.ids.contains(&id)
    }

    /// Insert a patient, rejecting duplicate identifiers
    pub fn insert(&mut self, patient: Patient) -> SimulationResult<usize> {
        if !self.ids.insert(patient.id) {
            return Err(SimulationError::invariant_violation(format!(
                "duplicate patient id {}",
                patient.id
            )));
        }
        self.patients.push(patient);
        Ok(self.patients.len() - 1)
    }

    /// Indices of patients matching `predicate`, in pool order
    pub fn indices_where<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&Patient) -> bool,
    {
        self.patients
            .iter()
            .enumerate()
            .filter(|(_, patient)| predicate(patient))
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of patients matching `predicate`
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Patient) -> bool,
    {
        self.patients.iter().filter(|patient| predicate(patient)).count()
    }

    /// Inactive patients that can still be admitted
    pub fn admissible_indices(&self) -> Vec<usize> {
        self.indices_where(Patient::is_admissible)
    }

    /// Patients currently due for a visit
    pub fn due_indices(&self) -> Vec<usize> {
        self.indices_where(|patient| patient.due)
    }

    /// Patients eligible for the mortality draw
    pub fn at_risk_indices(&self) -> Vec<usize> {
        self.indices_where(Patient::is_at_risk)
    }

    /// Apply `update` to each patient in `indices`, in the given order
    ///
    /// Returns the number of patients updated; out-of-range indices are skipped.
    pub fn apply_to<F>(&mut self, indices: &[usize], mut update: F) -> usize
    where
        F: FnMut(&mut Patient),
    {
        let mut updated = 0;
        for &index in indices {
            if let Some(patient) = self.patients.get_mut(index) {
                update(patient);
                updated += 1;
            }
        }
        updated
    }

    /// Number of patients currently due
    pub fn due_count(&self) -> usize {
        self.count_where(|patient| patient.due)
    }

    /// Number of patients that can still be admitted
    pub fn admissible_count(&self) -> usize {
        self.count_where(Patient::is_admissible)
    }

    /// Tally of patients per lifecycle status
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for patient in &self.patients {
            match patient.status() {
                PatientStatus::Inactive => counts.inactive += 1,
                PatientStatus::ActiveNotDue => counts.active_not_due += 1,
                PatientStatus::ActiveDue => counts.active_due += 1,
                PatientStatus::LostToFollowUp => counts.lost_to_follow_up += 1,
                PatientStatus::Dead => counts.dead += 1,
            }
        }
        counts
    }

    /// Verify every per-patient invariant and pool-wide id uniqueness
    pub fn check_invariants(&self) -> SimulationResult<()> {
        if self.ids.len() != self.patients.len() {
            return Err(SimulationError::invariant_violation(format!(
                "{} patients but {} unique ids",
                self.patients.len(),
                self.ids.len()
            )));
        }
        for patient in &self.patients {
            patient.check_invariants().map_err(SimulationError::InvariantViolation)?;
        }
        Ok(())
    }

    /// Grow the pool by at least `n` never-before-seen patients
    ///
    /// Batches are requested from `generator` sized to the outstanding count
    /// scaled by `growth_rate`; identifiers colliding with the pool or with
    /// earlier patients in the same call are discarded. Every unique patient
    /// accumulated is inserted as inactive, so the excess beyond `n` stays in
    /// the pool as an admission reserve. `n` is floored at 1.
    ///
    /// Returns the number of patients inserted. Fails with
    /// [`SimulationError::GenerationExhausted`] once `max_attempts` batches
    /// have not produced `n` unique patients, or straight away when the
    /// generator's identifier space cannot hold `n` more patients; the pool is
    /// left untouched.
    #[instrument(skip(self, generator, rng), fields(pool_size = self.patients.len()))]
    pub fn add_new_patients(
        &mut self,
        n: usize,
        generator: &mut dyn PatientGenerator,
        reference_date: NaiveDate,
        growth_rate: f64,
        max_attempts: usize,
        rng: &mut dyn RngCore,
    ) -> SimulationResult<usize> {
        let requested = n.max(1);
        if let Some(capacity) = generator.id_capacity() {
            let remaining = capacity.saturating_sub(self.ids.len() as u64);
            if requested as u64 > remaining {
                warn!(
                    "Cannot generate {} patients: only {} identifiers left of {}",
                    requested, remaining, capacity
                );
                return Err(SimulationError::GenerationExhausted {
                    requested,
                    obtained: 0,
                    attempts: 0,
                });
            }
        }

        let mut accumulated: Vec<PatientDemographics> = Vec::new();
        let mut batch_ids: HashSet<PatientId> = HashSet::new();
        let mut attempts = 0;

        while accumulated.len() < requested {
            if attempts >= max_attempts {
                warn!(
                    "Patient generation exhausted after {} attempts ({} of {} unique)",
                    attempts,
                    accumulated.len(),
                    requested
                );
                return Err(SimulationError::GenerationExhausted {
                    requested,
                    obtained: accumulated.len(),
                    attempts,
                });
            }
            attempts += 1;

            let outstanding = requested - accumulated.len();
            let batch_size = ((outstanding as f64 * growth_rate).ceil() as usize).max(outstanding);
            let batch = generator.generate(batch_size, reference_date, rng);

            let before = accumulated.len();
            for demographics in batch {
                if !self.ids.contains(&demographics.id) && batch_ids.insert(demographics.id) {
                    accumulated.push(demographics);
                }
            }
            debug!(
                "Generation attempt {}: requested {}, kept {} unique",
                attempts,
                batch_size,
                accumulated.len() - before
            );
        }

        let added = accumulated.len();
        for demographics in accumulated {
            self.insert(Patient::new(demographics))?;
        }

        debug!("Added {} patients ({} requested), pool size now {}", added, requested, self.len());
        Ok(added)
    }
}
