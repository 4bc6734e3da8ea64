//! Statistics collection and reporting
//!
//! This module contains run-level counters and the per-month indicator rows
//! downstream care-continuum reporting aggregates from.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Indicator counts for one calendar month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyIndicators {
    /// Returning visits recorded in the month
    pub visit_this_month: usize,
    /// Patients admitted into care in the month
    pub new_patients_this_month: usize,
    /// Patients lost to follow-up in the month
    pub ltfu_this_month: usize,
    /// Patients who died in the month
    pub deaths_this_month: usize,
    /// Visits in the month whose viral-load result was suppressed
    pub vl_suppressed_patients_this_month: usize,
    /// Patients in care when the month closed
    pub active_patients_end_of_month: usize,
}

/// Key used for monthly indicator rows, e.g. `2021-03`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Counters accumulated over one simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStatistics {
    /// Business-day ticks executed
    pub ticks_run: usize,
    /// Month boundaries crossed (mortality updates run)
    pub month_boundaries: usize,
    /// Week boundaries crossed (weekly updates run)
    pub week_boundaries: usize,
    /// Patients generated into the pool, including the starting pool
    pub patients_generated: usize,
    /// Times the pool had to be topped up during a tick
    pub pool_top_ups: usize,
    /// Patients admitted into care
    pub admissions: usize,
    /// Returning visits recorded
    pub visits: usize,
    /// Visits with a suppressed viral-load result
    pub suppressed_results: usize,
    /// Patients flagged due
    pub flagged_due: usize,
    /// Patients lost to follow-up
    pub lost_to_follow_up: usize,
    /// Patients who died
    pub deaths: usize,
    /// Wall-clock duration of the run
    pub simulation_duration: Duration,
    /// Indicator rows keyed by [`month_key`]
    pub monthly: BTreeMap<String, MonthlyIndicators>,
}

impl SimulationStatistics {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicator row for the month containing `date`
    pub fn month_mut(&mut self, date: NaiveDate) -> &mut MonthlyIndicators {
        self.monthly.entry(month_key(date)).or_default()
    }

    /// Record the outcome of one tick
    pub fn record_tick(&mut self, date: NaiveDate, admitted: usize, visits: usize, suppressed: usize) {
        self.ticks_run += 1;
        self.admissions += admitted;
        self.visits += visits;
        self.suppressed_results += suppressed;

        let month = self.month_mut(date);
        month.new_patients_this_month += admitted;
        month.visit_this_month += visits;
        month.vl_suppressed_patients_this_month += suppressed;
    }

    /// Count one death in the month of its death date
    pub fn record_death(&mut self, death_date: NaiveDate) {
        self.deaths += 1;
        self.month_mut(death_date).deaths_this_month += 1;
    }

    /// Record a month boundary and the in-care count of the month that closed
    pub fn record_month_end(&mut self, closed_month: NaiveDate, active: usize) {
        self.month_boundaries += 1;
        self.month_mut(closed_month).active_patients_end_of_month = active;
    }

    /// Record a week boundary
    pub fn record_week(&mut self, date: NaiveDate, newly_due: usize, lost: usize) {
        self.week_boundaries += 1;
        self.flagged_due += newly_due;
        self.lost_to_follow_up += lost;
        self.month_mut(date).ltfu_this_month += lost;
    }

    /// Record the in-care count for the month the run ended in
    pub fn record_final_month(&mut self, date: NaiveDate, active: usize) {
        self.month_mut(date).active_patients_end_of_month = active;
    }

    /// Percentage of visits with a suppressed result
    pub fn suppression_percentage(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            (self.suppressed_results as f64 / self.visits as f64) * 100.0
        }
    }

    /// Average returning visits per tick
    pub fn average_visits_per_day(&self) -> f64 {
        if self.ticks_run == 0 {
            0.0
        } else {
            self.visits as f64 / self.ticks_run as f64
        }
    }

    /// Multi-line report for the end of a run
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Simulation Summary Report ===\n\n");
        report.push_str(&format!(
            "Simulation Duration: {:.2} seconds\n",
            self.simulation_duration.as_secs_f64()
        ));
        report.push_str(&format!("Business Days Simulated: {}\n", self.ticks_run));
        report.push_str(&format!(
            "Boundaries Crossed: {} months, {} weeks\n\n",
            self.month_boundaries, self.week_boundaries
        ));

        report.push_str("Population:\n");
        report.push_str(&format!("  - Patients Generated: {}\n", self.patients_generated));
        report.push_str(&format!("  - Pool Top-ups: {}\n", self.pool_top_ups));
        report.push_str(&format!("  - Admissions: {}\n\n", self.admissions));

        report.push_str("Care Events:\n");
        report.push_str(&format!(
            "  - Visits: {} (avg {:.1}/day)\n",
            self.visits,
            self.average_visits_per_day()
        ));
        report.push_str(&format!(
            "  - Suppressed Results: {} ({:.1}%)\n",
            self.suppressed_results,
            self.suppression_percentage()
        ));
        report.push_str(&format!("  - Flagged Due: {}\n", self.flagged_due));
        report.push_str(&format!("  - Lost to Follow-up: {}\n", self.lost_to_follow_up));
        report.push_str(&format!("  - Deaths: {}\n", self.deaths));

        if !self.monthly.is_empty() {
            report.push_str("\nMonthly Indicators:\n");
            report.push_str("  month    visits  new  ltfu  deaths  suppressed  active\n");
            for (month, row) in &self.monthly {
                report.push_str(&format!(
                    "  {}  {:>6}  {:>3}  {:>4}  {:>6}  {:>10}  {:>6}\n",
                    month,
                    row.visit_this_month,
                    row.new_patients_this_month,
                    row.ltfu_this_month,
                    row.deaths_this_month,
                    row.vl_suppressed_patients_this_month,
                    row.active_patients_end_of_month
                ));
            }
        }

        report
    }

    /// One-line summary suitable for logging
    pub fn generate_compact_summary(&self) -> String {
        format!(
            "Simulation: {} days, {} admissions, {} visits ({:.1}% suppressed), {} lost, {} deaths",
            self.ticks_run,
            self.admissions,
            self.visits,
            self.suppression_percentage(),
            self.lost_to_follow_up,
            self.deaths
        )
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}
