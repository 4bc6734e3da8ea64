//! Simulation state
//!
//! This module contains the single mutable aggregate of a run: the patient
//! pool, the simulated clock, the calendar, the patient generator, the random
//! processes, and the one seeded random source every draw goes through.

use chrono::{FixedOffset, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::patient::{DemographicGenerator, PatientGenerator, PatientPool};
use crate::simulation::calendar::{BusinessCalendar, WeekdayCalendar};
use crate::simulation::error::SimulationResult;
use crate::simulation::processes::RandomProcessBank;
use crate::simulation::statistics::SimulationStatistics;
use crate::types::SimulationParameters;

/// Mutable state of one simulation run
///
/// Created once per run and mutated in place by the tick and the periodic
/// updates. Nothing else holds a reference to the pool or the random source.
#[derive(Debug)]
pub struct SimulationState {
    pub(crate) pool: PatientPool,
    pub(crate) current_date: NaiveDate,
    pub(crate) calendar: Box<dyn BusinessCalendar>,
    pub(crate) generator: Box<dyn PatientGenerator>,
    pub(crate) processes: RandomProcessBank,
    pub(crate) rng: StdRng,
    pub(crate) time_zone: FixedOffset,
    pub(crate) statistics: SimulationStatistics,
}

impl SimulationState {
    /// Create the state with the weekday calendar and demographic generator
    pub fn new(params: &SimulationParameters) -> SimulationResult<Self> {
        let calendar = WeekdayCalendar::with_holidays(params.holidays.iter().copied());
        let generator = DemographicGenerator::from_parameters(params)?;
        Self::with_components(params, Box::new(calendar), Box::new(generator))
    }

    /// Create the state with a custom calendar and generator
    ///
    /// Validates the parameters, seeds the random source, moves the clock to
    /// the first business day on or after the start date and generates the
    /// starting pool.
    #[instrument(skip_all, fields(starting_pool_size = params.starting_pool_size))]
    pub fn with_components(
        params: &SimulationParameters,
        calendar: Box<dyn BusinessCalendar>,
        generator: Box<dyn PatientGenerator>,
    ) -> SimulationResult<Self> {
        params.validate()?;

        let rng = if let Some(seed) = params.seed {
            info!("Using deterministic seed: {}", seed);
            StdRng::seed_from_u64(seed)
        } else {
            debug!("Using entropy-based random seed");
            StdRng::from_entropy()
        };

        let current_date = calendar.first_business_day_on_or_after(params.start_date)?;
        let time_zone = params.time_zone_offset()?;

        let mut state = Self {
            pool: PatientPool::new(),
            current_date,
            calendar,
            generator,
            processes: RandomProcessBank::from_parameters(params)?,
            rng,
            time_zone,
            statistics: SimulationStatistics::new(),
        };

        let generated = state.add_new_patients(params.starting_pool_size, params)?;
        info!(
            "Simulation state ready: {} patients generated, clock at {}",
            generated, state.current_date
        );
        Ok(state)
    }

    /// Replace the patient pool
    pub fn with_pool(mut self, pool: PatientPool) -> Self {
        self.pool = pool;
        self
    }

    /// Grow the pool by at least `n` new patients, aged relative to the current date
    pub fn add_new_patients(
        &mut self,
        n: usize,
        params: &SimulationParameters,
    ) -> SimulationResult<usize> {
        let added = self.pool.add_new_patients(
            n,
            self.generator.as_mut(),
            self.current_date,
            params.pool_growth_rate,
            params.max_generation_attempts,
            &mut self.rng,
        )?;
        self.statistics.patients_generated += added;
        Ok(added)
    }

    /// The patient pool
    pub fn pool(&self) -> &PatientPool {
        &self.pool
    }

    /// Mutable access to the patient pool
    pub fn pool_mut(&mut self) -> &mut PatientPool {
        &mut self.pool
    }

    /// Current simulated date
    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Move the clock; the caller is responsible for landing on a business day
    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    /// The business-day calendar
    pub fn calendar(&self) -> &dyn BusinessCalendar {
        self.calendar.as_ref()
    }

    /// The random processes
    pub fn processes(&self) -> &RandomProcessBank {
        &self.processes
    }

    /// Time zone used for event timestamps
    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Counters accumulated so far
    pub fn statistics(&self) -> &SimulationStatistics {
        &self.statistics
    }

    /// Mutable access to the counters
    pub fn statistics_mut(&mut self) -> &mut SimulationStatistics {
        &mut self.statistics
    }
}
