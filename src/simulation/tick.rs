//! Daily tick
//!
//! This module contains the per-business-day step: sample clinic capacity,
//! admit new patients into idle capacity, and see returning due patients.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rand::seq::index;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::state::SimulationState;
use crate::types::{SimulationParameters, ViralLoadResult, SUPPRESSION_THRESHOLD_COPIES};

/// Lowest numeric viral load reported, copies/mL
const MIN_REPORTED_COPIES: u32 = 20;
/// Upper bound (exclusive) of numeric unsuppressed results, copies/mL
const MAX_REPORTED_COPIES: u32 = 500_000;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Simulated date of the tick
    pub date: NaiveDate,
    /// Sampled visit capacity
    pub capacity: usize,
    /// Patients due when the tick started
    pub due: usize,
    /// Patients admitted into care
    pub admitted: usize,
    /// Returning visits the capacity allows, `min(capacity, due)`
    pub returning: usize,
    /// Returning visits actually recorded
    pub visits: usize,
    /// Recorded visits with a suppressed result
    pub suppressed: usize,
    /// Patients generated to top up the pool
    pub generated: usize,
}

/// Run one business day
///
/// Draw order is fixed: capacity, then the new-patient count when demand
/// meets capacity, then admission selection, then per-visit draws.
///
/// # Errors
///
/// [`SimulationError::CapacityError`] when the inactive reserve cannot cover
/// the admissions even after one top-up, and any error from the top-up itself.
#[instrument(skip_all, fields(date = %state.current_date))]
pub fn simulation_tick(
    state: &mut SimulationState,
    params: &SimulationParameters,
) -> SimulationResult<TickOutcome> {
    let date = state.current_date;
    let capacity = state.processes.visits_per_day.sample(&mut state.rng);
    let due = state.pool.due_count();

    let admissions = if due >= capacity {
        state.processes.new_patients_per_day.sample(&mut state.rng)
    } else {
        capacity - due
    };
    let returning = capacity.min(due);

    let mut generated = 0;
    let available = state.pool.admissible_count();
    if available < admissions {
        debug!("Topping up pool: {} admissions, {} eligible", admissions, available);
        generated = state.add_new_patients(admissions - available, params)?;
        state.statistics.pool_top_ups += 1;
    }

    let eligible = state.pool.admissible_indices();
    if eligible.len() < admissions {
        warn!("Admission shortfall after top-up: {} of {}", eligible.len(), admissions);
        return Err(SimulationError::capacity_error("admission", admissions, eligible.len()));
    }
    let admitted_indices: Vec<usize> = index::sample(&mut state.rng, eligible.len(), admissions)
        .into_iter()
        .map(|i| eligible[i])
        .collect();
    let admitted = state.pool.apply_to(&admitted_indices, |patient| patient.admit(date));

    let (visits, suppressed) = if params.apply_returning_visits && returning > 0 {
        see_returning_patients(state, params, returning)?
    } else {
        (0, 0)
    };

    state.statistics.record_tick(date, admitted, visits, suppressed);

    let outcome =
        TickOutcome { date, capacity, due, admitted, returning, visits, suppressed, generated };
    debug!(
        "Tick {}: capacity {}, due {}, admitted {}, visits {}",
        date, capacity, due, admitted, visits
    );
    Ok(outcome)
}

/// Record visits for `returning` due patients chosen uniformly
fn see_returning_patients(
    state: &mut SimulationState,
    params: &SimulationParameters,
    returning: usize,
) -> SimulationResult<(usize, usize)> {
    let due = state.pool.due_indices();
    if due.len() < returning {
        return Err(SimulationError::capacity_error("returning visits", returning, due.len()));
    }

    let seen: Vec<usize> = index::sample(&mut state.rng, due.len(), returning)
        .into_iter()
        .map(|i| due[i])
        .collect();

    let date = state.current_date;
    let time_zone = state.time_zone;
    let rng = &mut state.rng;
    let mut suppressed = 0;
    let mut failure = None;

    let visits = state.pool.apply_to(&seen, |patient| {
        if failure.is_some() {
            return;
        }
        match visit_timestamp(date, params, time_zone, rng) {
            Ok(at) => {
                let result = draw_viral_load(params, rng);
                if result.is_suppressed() {
                    suppressed += 1;
                }
                patient.record_visit(at, result);
            }
            Err(e) => failure = Some(e),
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok((visits, suppressed)),
    }
}

/// Timestamp uniformly inside the clinic day
fn visit_timestamp(
    date: NaiveDate,
    params: &SimulationParameters,
    time_zone: FixedOffset,
    rng: &mut dyn RngCore,
) -> SimulationResult<DateTime<FixedOffset>> {
    let window = (params.day_end_time - params.day_start_time).num_seconds().max(1);
    let local = date.and_time(params.day_start_time) + Duration::seconds(rng.gen_range(0..window));
    local.and_local_timezone(time_zone).single().ok_or_else(|| {
        SimulationError::calendar_error(format!("cannot place {} in {}", local, time_zone))
    })
}

/// Draw a viral-load result, reported numerically with `numeric_vl_probability`
fn draw_viral_load(params: &SimulationParameters, rng: &mut dyn RngCore) -> ViralLoadResult {
    let suppressed = rng.gen_bool(params.suppression_probability);
    if rng.gen_bool(params.numeric_vl_probability) {
        let copies = if suppressed {
            rng.gen_range(MIN_REPORTED_COPIES..SUPPRESSION_THRESHOLD_COPIES)
        } else {
            rng.gen_range(SUPPRESSION_THRESHOLD_COPIES..MAX_REPORTED_COPIES)
        };
        ViralLoadResult::Copies(copies)
    } else if suppressed {
        ViralLoadResult::Suppressed
    } else {
        ViralLoadResult::Unsuppressed
    }
}
