//! Core patient record and state transitions
//!
//! This module contains the Patient struct: immutable demographic attributes
//! supplied by the generator plus the tracking fields the simulation mutates.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::patient::PatientDemographics;
use crate::types::{PatientId, PatientStatus, Sex, ViralLoadResult};

/// One row of the patient pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Unique identifier, assigned at generation
    pub id: PatientId,
    /// Date of birth
    pub birthdate: NaiveDate,
    /// Recorded sex, if known
    pub sex: Option<Sex>,
    /// False once the patient has died
    pub alive: bool,
    /// Date of death, set exactly once
    pub death_date: Option<NaiveDate>,
    /// Admitted into the simulated care cohort
    pub active: bool,
    /// Requires a clinic visit
    pub due: bool,
    /// Lost to follow-up
    pub ltfu: bool,
    /// Date the patient was admitted into care
    pub admitted_dt: Option<NaiveDate>,
    /// Date the patient was lost to follow-up
    pub ltfu_dt: Option<NaiveDate>,
    /// Date of the first recorded visit
    pub first_visit_dt: Option<NaiveDate>,
    /// Date of the most recent visit
    pub last_visit_dt: Option<NaiveDate>,
    /// Timestamp of the most recent visit
    pub last_visit_at: Option<DateTime<FixedOffset>>,
    /// Most recent viral-load result
    pub last_vl: Option<ViralLoadResult>,
    /// Date of the most recent suppressed result
    pub last_supp_vl_dt: Option<NaiveDate>,
    /// Number of visits recorded
    pub visit_count: u32,
}

impl Patient {
    /// Create a not-yet-admitted patient from generated demographics
    pub fn new(demographics: PatientDemographics) -> Self {
        Self {
            id: demographics.id,
            birthdate: demographics.birthdate,
            sex: demographics.sex,
            alive: true,
            death_date: None,
            active: false,
            due: false,
            ltfu: false,
            admitted_dt: None,
            ltfu_dt: None,
            first_visit_dt: None,
            last_visit_dt: None,
            last_visit_at: None,
            last_vl: None,
            last_supp_vl_dt: None,
            visit_count: 0,
        }
    }

    /// Current lifecycle status
    pub fn status(&self) -> PatientStatus {
        if !self.alive {
            PatientStatus::Dead
        } else if self.ltfu {
            PatientStatus::LostToFollowUp
        } else if !self.active {
            PatientStatus::Inactive
        } else if self.due {
            PatientStatus::ActiveDue
        } else {
            PatientStatus::ActiveNotDue
        }
    }

    /// Age in whole years on the given date
    pub fn age_on(&self, date: NaiveDate) -> i64 {
        let mut years = i64::from(date.year()) - i64::from(self.birthdate.year());
        if (date.month(), date.day()) < (self.birthdate.month(), self.birthdate.day()) {
            years -= 1;
        }
        years
    }

    /// Alive and not lost to follow-up
    pub fn is_at_risk(&self) -> bool {
        self.alive && !self.ltfu
    }

    /// Can be admitted into care
    pub fn is_admissible(&self) -> bool {
        !self.active && self.is_at_risk()
    }

    /// Candidate for due-flagging
    pub fn is_in_care(&self) -> bool {
        self.active && self.is_at_risk()
    }

    /// Whether the last viral-load result was suppressed; unknown counts as unsuppressed
    pub fn is_suppressed(&self) -> bool {
        self.last_vl.map(|vl| vl.is_suppressed()).unwrap_or(false)
    }

    /// Admit the patient into care
    pub fn admit(&mut self, date: NaiveDate) {
        self.active = true;
        self.admitted_dt = Some(date);
    }

    /// Record a clinic visit with its viral-load result
    pub fn record_visit(&mut self, at: DateTime<FixedOffset>, result: ViralLoadResult) {
        let date = at.date_naive();
        self.due = false;
        self.first_visit_dt.get_or_insert(date);
        self.last_visit_dt = Some(date);
        self.last_visit_at = Some(at);
        self.last_vl = Some(result);
        if result.is_suppressed() {
            self.last_supp_vl_dt = Some(date);
        }
        self.visit_count += 1;
    }

    /// Flag the patient as requiring a visit
    pub fn mark_due(&mut self) {
        self.due = true;
    }

    /// Record the patient's death
    pub fn mark_dead(&mut self, date: NaiveDate) {
        self.alive = false;
        self.due = false;
        self.death_date = Some(date);
    }

    /// Record the patient as lost to follow-up
    pub fn mark_lost(&mut self, date: NaiveDate) {
        self.ltfu = true;
        self.due = false;
        self.ltfu_dt = Some(date);
    }

    /// Check the per-patient state invariants
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.death_date.is_some() == self.alive {
            return Err(format!(
                "{}: death_date must be set iff the patient is dead (alive={}, death_date={:?})",
                self.id, self.alive, self.death_date
            ));
        }
        if self.due && !(self.active && self.alive && !self.ltfu) {
            return Err(format!("{}: due patient must be active, alive and not lost", self.id));
        }
        if self.ltfu && !self.alive {
            return Err(format!("{}: patient is both dead and lost to follow-up", self.id));
        }
        if self.ltfu && !self.active {
            return Err(format!("{}: lost patient was never admitted", self.id));
        }
        Ok(())
    }
}
