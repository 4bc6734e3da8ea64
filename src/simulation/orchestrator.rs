//! Main simulation orchestrator
//!
//! This module contains the SimulationOrchestrator, which drives the daily
//! tick across business days and fires the monthly and weekly updates when the
//! clock crosses a boundary.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::state::SimulationState;
use crate::simulation::statistics::SimulationStatistics;
use crate::simulation::tick::{simulation_tick, TickOutcome};
use crate::simulation::updates::{update_dead, weekly_update, WeeklyOutcome};
use crate::types::{RunId, SimulationParameters};
use crate::{perf_span, sim_event};

/// Calendar boundaries crossed between two consecutive simulated dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryCrossing {
    /// Calendar month (year and month) changed
    pub month: bool,
    /// ISO week (week-numbering year and week) changed
    pub week: bool,
}

impl BoundaryCrossing {
    /// Boundaries crossed moving from `previous` to `next`
    pub fn between(previous: NaiveDate, next: NaiveDate) -> Self {
        Self {
            month: (previous.year(), previous.month()) != (next.year(), next.month()),
            week: previous.iso_week() != next.iso_week(),
        }
    }
}

/// What one loop step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// The daily tick
    pub tick: TickOutcome,
    /// Clock after advancing
    pub advanced_to: NaiveDate,
    /// Boundaries crossed by the advance
    pub crossing: BoundaryCrossing,
    /// Deaths, when a month boundary was crossed
    pub deaths: Option<usize>,
    /// Weekly update, when a week boundary was crossed
    pub weekly: Option<WeeklyOutcome>,
}

/// Drives one simulation run from start date to end date
#[derive(Debug)]
pub struct SimulationOrchestrator {
    params: SimulationParameters,
    state: SimulationState,
    run_id: RunId,
}

impl SimulationOrchestrator {
    /// Create an orchestrator with default calendar and generator
    #[instrument(skip(params), fields(start = %params.start_date, end = %params.end_date))]
    pub fn new(params: SimulationParameters) -> SimulationResult<Self> {
        let state = SimulationState::new(&params)?;
        Ok(Self::with_state(params, state))
    }

    /// Create an orchestrator around an already built state
    pub fn with_state(params: SimulationParameters, state: SimulationState) -> Self {
        let run_id = RunId::new();
        info!(
            "Simulation {} initialized: {} to {}, {} patients in pool",
            run_id,
            state.current_date,
            params.end_date,
            state.pool.len()
        );
        Self { params, state, run_id }
    }

    /// Identifier of this run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Parameters of this run
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Current state
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable access to the current state
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Consume the orchestrator, keeping the final state
    pub fn into_state(self) -> SimulationState {
        self.state
    }

    /// Counters accumulated so far
    pub fn statistics(&self) -> &SimulationStatistics {
        &self.state.statistics
    }

    /// Whether the clock has reached the end date
    pub fn is_finished(&self) -> bool {
        self.state.current_date >= self.params.end_date
    }

    /// Run one tick, advance one business day, and fire crossed boundaries
    ///
    /// Mortality runs on a month change; due-flagging then loss to follow-up
    /// run on a week change. Both use the advanced date.
    pub fn step(&mut self) -> SimulationResult<StepOutcome> {
        let tick = simulation_tick(&mut self.state, &self.params)?;

        let previous = self.state.current_date;
        let advanced_to = self.state.calendar.add_business_days(previous, 1)?;
        if advanced_to <= previous {
            return Err(SimulationError::calendar_error(format!(
                "calendar moved from {} to {}",
                previous, advanced_to
            )));
        }
        self.state.current_date = advanced_to;

        let crossing = BoundaryCrossing::between(previous, advanced_to);

        let deaths = if crossing.month {
            let deaths = update_dead(&mut self.state)?;
            let in_care = self.state.pool.status_counts().in_care();
            self.state.statistics.record_month_end(previous, in_care);
            sim_event!(
                info,
                "Month boundary",
                date = tracing::field::display(advanced_to),
                deaths = deaths,
                in_care = in_care,
            );
            Some(deaths)
        } else {
            None
        };

        let weekly = if crossing.week {
            let outcome = weekly_update(&mut self.state, &self.params)?;
            self.state.statistics.record_week(advanced_to, outcome.newly_due, outcome.lost);
            Some(outcome)
        } else {
            None
        };

        if cfg!(debug_assertions) {
            self.state.pool.check_invariants()?;
        }

        Ok(StepOutcome { tick, advanced_to, crossing, deaths, weekly })
    }

    /// Step until the clock reaches the end date
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn run(&mut self) -> SimulationResult<&SimulationStatistics> {
        let span = perf_span!("simulation_run", end = tracing::field::display(self.params.end_date));
        let _enter = span.enter();
        let started = Instant::now();

        while !self.is_finished() {
            let outcome = self.step()?;
            debug!(
                "Advanced to {} (month boundary: {}, week boundary: {})",
                outcome.advanced_to, outcome.crossing.month, outcome.crossing.week
            );
        }

        let in_care = self.state.pool.status_counts().in_care();
        let final_date = self.state.current_date;
        let statistics = &mut self.state.statistics;
        statistics.record_final_month(final_date, in_care);
        statistics.simulation_duration = started.elapsed();

        info!("{}", statistics.generate_compact_summary());
        Ok(&self.state.statistics)
    }
}

/// Build a state from `params`, run it to the end date, and return the final state
pub fn run_simulation(params: &SimulationParameters) -> SimulationResult<SimulationState> {
    let mut orchestrator = SimulationOrchestrator::new(params.clone())?;
    orchestrator.run()?;
    Ok(orchestrator.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_boundary_crossing_month_and_week() {
        // Friday 2021-01-29 to Monday 2021-02-01
        let crossing = BoundaryCrossing::between(date(2021, 1, 29), date(2021, 2, 1));
        assert!(crossing.month);
        assert!(crossing.week);

        let crossing = BoundaryCrossing::between(date(2021, 1, 5), date(2021, 1, 6));
        assert_eq!(crossing, BoundaryCrossing::default());

        // Month changes mid-week
        let crossing = BoundaryCrossing::between(date(2021, 3, 31), date(2021, 4, 1));
        assert!(crossing.month);
        assert!(!crossing.week);
    }

    #[test]
    fn test_boundary_crossing_same_week_number_different_year() {
        // ISO week 1 of 2020 and of 2021 are distinct weeks
        let crossing = BoundaryCrossing::between(date(2019, 12, 31), date(2021, 1, 4));
        assert!(crossing.week);
    }

    #[test]
    fn test_step_advances_one_business_day() {
        let params = SimulationParameters {
            seed: Some(8),
            starting_pool_size: 100,
            start_date: date(2021, 1, 8),
            end_date: date(2021, 2, 1),
            ..Default::default()
        };
        let mut orchestrator = SimulationOrchestrator::new(params).unwrap();

        let outcome = orchestrator.step().unwrap();
        assert_eq!(outcome.tick.date, date(2021, 1, 8));
        assert_eq!(outcome.advanced_to, date(2021, 1, 11));
        assert!(outcome.crossing.week);
        assert!(outcome.weekly.is_some());
        assert!(outcome.deaths.is_none());
    }

    #[test]
    fn test_run_stops_at_end_date() {
        let params = SimulationParameters {
            seed: Some(9),
            starting_pool_size: 100,
            start_date: date(2021, 1, 4),
            end_date: date(2021, 2, 1),
            ..Default::default()
        };
        let mut orchestrator = SimulationOrchestrator::new(params).unwrap();
        let ticks = orchestrator.run().unwrap().ticks_run;

        assert_eq!(ticks, 20);
        assert!(orchestrator.is_finished());
        assert_eq!(orchestrator.state().current_date(), date(2021, 2, 1));
        assert_eq!(orchestrator.statistics().month_boundaries, 1);
        assert_eq!(orchestrator.statistics().week_boundaries, 4);
    }
}
