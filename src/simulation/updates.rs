//! Periodic population updates
//!
//! This module contains the monthly mortality update and the weekly pair of
//! due-flagging followed by loss to follow-up.

use chrono::{Duration, Months};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::simulation::error::SimulationResult;
use crate::simulation::state::SimulationState;
use crate::types::SimulationParameters;

/// What one weekly update did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyOutcome {
    /// Patients newly flagged due
    pub newly_due: usize,
    /// Patients due after flagging, before any loss
    pub due: usize,
    /// Patients lost to follow-up
    pub lost: usize,
}

/// Apply the monthly natural-death draw to every patient alive and not lost
///
/// One Bernoulli draw per eligible patient, in pool order, with the probability
/// of the patient's age bucket on the current date. The death date is drawn
/// uniformly between the last known appearance (last visit, else one month
/// before today, never before admission) and today.
///
/// Each death is counted in the monthly indicators under the month of its
/// death date. Returns the number of deaths.
#[instrument(skip_all, fields(date = %state.current_date))]
pub fn update_dead(state: &mut SimulationState) -> SimulationResult<usize> {
    let current = state.current_date;
    let fallback = current.checked_sub_months(Months::new(1)).unwrap_or(current);
    let at_risk = state.pool.at_risk_indices();

    let mortality = &state.processes.mortality;
    let rng = &mut state.rng;
    let statistics = &mut state.statistics;
    let mut deaths = 0;

    state.pool.apply_to(&at_risk, |patient| {
        let probability = mortality.probability_for_age(patient.age_on(current));
        if !rng.gen_bool(probability) {
            return;
        }

        let mut lower = patient.last_visit_dt.unwrap_or(fallback);
        if let Some(admitted) = patient.admitted_dt {
            lower = lower.max(admitted);
        }
        let lower = lower.min(current);
        let span = (current - lower).num_days();
        let death_date = lower + Duration::days(rng.gen_range(0..=span));

        patient.mark_dead(death_date);
        statistics.record_death(death_date);
        deaths += 1;
    });

    debug!("Mortality update on {}: {} of {} at risk died", current, deaths, at_risk.len());
    Ok(deaths)
}

/// Flag in-care patients who need a visit
///
/// Patients never seen are due immediately; otherwise a patient is due once
/// the days since the last visit reach the revisit period for their last
/// suppression status. Already-due patients are left alone.
///
/// Returns the number of patients newly flagged.
#[instrument(skip_all, fields(date = %state.current_date))]
pub fn update_due(state: &mut SimulationState, params: &SimulationParameters) -> usize {
    let current = state.current_date;
    let candidates = state.pool.indices_where(|patient| patient.is_in_care() && !patient.due);

    let newly_due: Vec<usize> = candidates
        .into_iter()
        .filter(|&index| {
            state.pool.get(index).map_or(false, |patient| match patient.last_visit_dt {
                None => true,
                Some(last_visit) => {
                    let elapsed = (current - last_visit).num_days();
                    elapsed >= params.revisit_threshold_days(patient.is_suppressed())
                }
            })
        })
        .collect();

    let flagged = state.pool.apply_to(&newly_due, |patient| patient.mark_due());
    debug!("Due update on {}: {} newly due", current, flagged);
    flagged
}

/// Move a sampled number of due patients to lost to follow-up
///
/// The target is drawn from the weekly process and clamped to the due count;
/// patients are chosen uniformly without replacement.
///
/// Returns the number of patients lost.
#[instrument(skip_all, fields(date = %state.current_date))]
pub fn update_ltfu(state: &mut SimulationState) -> SimulationResult<usize> {
    let current = state.current_date;
    let target = state.processes.ltfu_per_week.sample(&mut state.rng);
    let due = state.pool.due_indices();
    let count = target.min(due.len());

    if count == 0 {
        debug!("LTFU update on {}: target {}, none lost", current, target);
        return Ok(0);
    }

    let selected: Vec<usize> = index::sample(&mut state.rng, due.len(), count)
        .into_iter()
        .map(|i| due[i])
        .collect();
    let lost = state.pool.apply_to(&selected, |patient| patient.mark_lost(current));

    debug!("LTFU update on {}: target {}, {} of {} due lost", current, target, lost, due.len());
    Ok(lost)
}

/// Due-flagging then loss to follow-up, as one step
pub fn weekly_update(
    state: &mut SimulationState,
    params: &SimulationParameters,
) -> SimulationResult<WeeklyOutcome> {
    let newly_due = update_due(state, params);
    let due = state.pool.due_count();
    let lost = update_ltfu(state)?;

    info!(
        "Weekly update on {}: {} newly due, {} due, {} lost to follow-up",
        state.current_date, newly_due, due, lost
    );
    Ok(WeeklyOutcome { newly_due, due, lost })
}
