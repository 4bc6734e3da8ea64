//! Configuration structures for the care-trajectory simulator
//!
//! This module contains the immutable simulation parameters, their validation logic,
//! and the command line / configuration file layers they are assembled from.

use super::OutputFormat;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Age binning constants for the mortality table
pub mod age_bins {
    /// Width of one age bucket in years
    pub const WIDTH_YEARS: i64 = 10;
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hiv-care-simulator",
    version = "0.1.0",
    about = "HIV care simulator - Generates synthetic patient care trajectories",
    long_about = "Simulates the longitudinal care trajectory of a population of patients in an HIV treatment program, producing synthetic per-patient histories (visits, viral-load results, loss to follow-up, death) for testing care-continuum analytics.

EXAMPLES:
    # Run with default settings
    hiv-care-simulator

    # Use a configuration file
    hiv-care-simulator --config params.json

    # Override specific settings
    hiv-care-simulator --start-date 2021-01-04 --end-date 2022-01-03 --seed 7

    # Generate configuration template
    hiv-care-simulator --print-config > my-params.json

    # Validate configuration without running
    hiv-care-simulator --config my-params.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Directory the output files are written to
    #[arg(short, long, help = "Output directory (created if missing)")]
    pub output_path: Option<String>,

    /// Output format for the patient table
    #[arg(long, help = "Output format (json or csv)")]
    pub output_format: Option<String>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// First simulated date
    #[arg(long, help = "Simulation start date (YYYY-MM-DD)")]
    pub start_date: Option<NaiveDate>,

    /// Date the simulation stops at
    #[arg(long, help = "Simulation end date (YYYY-MM-DD)")]
    pub end_date: Option<NaiveDate>,

    /// Number of patients generated before the first tick
    #[arg(long, help = "Starting patient pool size")]
    pub starting_pool_size: Option<usize>,

    /// Over-generation factor applied when the pool is topped up
    #[arg(long, help = "Pool growth rate (>= 1.0)")]
    pub pool_growth_rate: Option<f64>,

    /// Mean clinic visit capacity per business day
    #[arg(long, help = "Mean visits per day")]
    pub visits_per_day_mean: Option<f64>,

    /// Standard deviation of clinic visit capacity per business day
    #[arg(long, help = "Standard deviation of visits per day")]
    pub visits_per_day_sd: Option<f64>,

    /// Mean new-patient admissions per business day
    #[arg(long, help = "Mean new patients per day")]
    pub new_patients_per_day_mean: Option<f64>,

    /// Standard deviation of new-patient admissions per business day
    #[arg(long, help = "Standard deviation of new patients per day")]
    pub new_patients_per_day_sd: Option<f64>,

    /// Mean patients lost to follow-up per week
    #[arg(long, help = "Mean patients lost to follow-up per week")]
    pub ltfu_per_week_mean: Option<f64>,

    /// Standard deviation of patients lost to follow-up per week
    #[arg(long, help = "Standard deviation of patients lost to follow-up per week")]
    pub ltfu_per_week_sd: Option<f64>,

    /// Revisit period for suppressed patients, in days
    #[arg(long, help = "Minimum revisit period for suppressed patients (days)")]
    pub suppressed_revisit_days: Option<i64>,

    /// Revisit period for unsuppressed or unknown patients, in days
    #[arg(long, help = "Minimum revisit period for non-suppressed patients (days)")]
    pub unsuppressed_revisit_days: Option<i64>,

    /// Leave due patients unseen, reproducing the reference tick behavior
    #[arg(long, help = "Do not apply returning visits during the daily tick")]
    pub skip_returning_visits: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Directory for daily-rolling JSON log files
    #[arg(long, help = "Also write JSON logs to daily-rolling files in this directory")]
    pub log_dir: Option<String>,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Directory the output files are written to
    pub output_path: Option<String>,
    /// Output format for the patient table
    pub output_format: Option<String>,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// First simulated date
    pub start_date: Option<NaiveDate>,
    /// Date the simulation stops at
    pub end_date: Option<NaiveDate>,
    /// Start of the simulated clinic day
    pub day_start_time: Option<NaiveTime>,
    /// End of the simulated clinic day
    pub day_end_time: Option<NaiveTime>,
    /// UTC offset used for event timestamps
    pub time_zone: Option<String>,
    /// Number of patients generated before the first tick
    pub starting_pool_size: Option<usize>,
    /// Over-generation factor applied when the pool is topped up
    pub pool_growth_rate: Option<f64>,
    /// Probability that a generated patient is female
    pub sex_ratio: Option<f64>,
    /// Relative weights of the generated age buckets
    pub age_weights: Option<Vec<f64>>,
    /// Lower edge of the first age bucket
    pub min_age: Option<u32>,
    /// Mean clinic visit capacity per business day
    pub visits_per_day_mean: Option<f64>,
    /// Standard deviation of clinic visit capacity
    pub visits_per_day_sd: Option<f64>,
    /// Mean new-patient admissions per business day
    pub new_patients_per_day_mean: Option<f64>,
    /// Standard deviation of new-patient admissions
    pub new_patients_per_day_sd: Option<f64>,
    /// Mean patients lost to follow-up per week
    pub ltfu_per_week_mean: Option<f64>,
    /// Standard deviation of patients lost to follow-up per week
    pub ltfu_per_week_sd: Option<f64>,
    /// Revisit period for suppressed patients, in days
    pub suppressed_revisit_days: Option<i64>,
    /// Revisit period for unsuppressed or unknown patients, in days
    pub unsuppressed_revisit_days: Option<i64>,
    /// Monthly natural-death probability per age bucket
    pub death_probabilities: Option<Vec<f64>>,
    /// Probability that a generated attribute is left missing
    pub missing_data_probability: Option<f64>,
    /// Probability that a viral-load result is reported numerically
    pub numeric_vl_probability: Option<f64>,
    /// Probability that a viral-load test comes back suppressed
    pub suppression_probability: Option<f64>,
    /// Whether the daily tick applies returning visits
    pub apply_returning_visits: Option<bool>,
    /// Non-business days in addition to weekends
    pub holidays: Option<Vec<NaiveDate>>,
    /// Size of the numeric space patient identifiers are drawn from
    pub id_space: Option<u64>,
    /// Generator batches attempted before giving up on unique identifiers
    pub max_generation_attempts: Option<usize>,
}

/// Immutable parameters of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Directory the output files are written to
    pub output_path: String,

    /// Output format for the patient table
    pub output_format: String,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// First simulated date (rolled forward to a business day)
    pub start_date: NaiveDate,

    /// Date the simulation stops at
    pub end_date: NaiveDate,

    /// Start of the simulated clinic day
    pub day_start_time: NaiveTime,

    /// End of the simulated clinic day
    pub day_end_time: NaiveTime,

    /// UTC offset used for event timestamps, e.g. `+02:00`
    pub time_zone: String,

    /// Number of patients generated before the first tick
    pub starting_pool_size: usize,

    /// Over-generation factor applied when the pool is topped up
    pub pool_growth_rate: f64,

    /// Probability that a generated patient is female
    pub sex_ratio: f64,

    /// Relative weights of the generated age buckets
    pub age_weights: Vec<f64>,

    /// Lower edge of the first age bucket
    pub min_age: u32,

    /// Mean clinic visit capacity per business day
    pub visits_per_day_mean: f64,

    /// Standard deviation of clinic visit capacity
    pub visits_per_day_sd: f64,

    /// Mean new-patient admissions per business day
    pub new_patients_per_day_mean: f64,

    /// Standard deviation of new-patient admissions
    pub new_patients_per_day_sd: f64,

    /// Mean patients lost to follow-up per week
    pub ltfu_per_week_mean: f64,

    /// Standard deviation of patients lost to follow-up per week
    pub ltfu_per_week_sd: f64,

    /// Revisit period for suppressed patients, in days
    pub suppressed_revisit_days: i64,

    /// Revisit period for unsuppressed or unknown patients, in days
    pub unsuppressed_revisit_days: i64,

    /// Monthly natural-death probability per age bucket
    pub death_probabilities: Vec<f64>,

    /// Probability that a generated attribute is left missing
    pub missing_data_probability: f64,

    /// Probability that a viral-load result is reported numerically
    pub numeric_vl_probability: f64,

    /// Probability that a viral-load test comes back suppressed
    pub suppression_probability: f64,

    /// Whether the daily tick applies returning visits
    pub apply_returning_visits: bool,

    /// Non-business days in addition to weekends
    pub holidays: Vec<NaiveDate>,

    /// Size of the numeric space patient identifiers are drawn from
    pub id_space: u64,

    /// Generator batches attempted before giving up on unique identifiers
    pub max_generation_attempts: usize,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation parameters
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// End date does not come after start date
    #[error("Invalid date range: end date ({end}) must be after start date ({start})")]
    InvalidDateRange {
        /// Configured start date
        start: NaiveDate,
        /// Configured end date
        end: NaiveDate,
    },

    /// Starting pool size is zero
    #[error("Starting pool size must be greater than 0, got {0}")]
    InvalidPoolSize(usize),

    /// Growth rate below one or not finite
    #[error("Pool growth rate must be a finite value >= 1.0, got {0}")]
    InvalidGrowthRate(f64),

    /// Probability value is out of range
    #[error("Invalid probability for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidProbability {
        /// Name of the field with the invalid probability
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Distribution parameter is negative or not finite
    #[error("Invalid distribution parameter {field}: {value} (must be finite and >= 0)")]
    InvalidDistributionParameter {
        /// Name of the field with the invalid parameter
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Revisit period is not positive
    #[error("Invalid revisit period for {field}: {value} days (must be > 0)")]
    InvalidRevisitPeriod {
        /// Name of the field with the invalid period
        field: String,
        /// The invalid value
        value: i64,
    },

    /// A table that must have entries is empty
    #[error("{0} must contain at least one entry")]
    EmptyTable(String),

    /// Age weights are negative or sum to zero
    #[error("Age weights must be non-negative with a positive sum, got {0:?}")]
    InvalidAgeWeights(Vec<f64>),

    /// Clinic day does not start before it ends
    #[error("Invalid clinic day: start ({start}) must be before end ({end})")]
    InvalidDayWindow {
        /// Configured day start
        start: NaiveTime,
        /// Configured day end
        end: NaiveTime,
    },

    /// Time zone is not a recognised UTC offset
    #[error("Invalid time zone {0:?} (expected a UTC offset such as +02:00)")]
    InvalidTimeZone(String),

    /// Output format is unknown
    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// Identifier space cannot hold the starting pool
    #[error("Identifier space {id_space} is too small for a starting pool of {pool_size}")]
    InvalidIdSpace {
        /// Configured identifier space
        id_space: u64,
        /// Configured starting pool size
        pool_size: usize,
    },

    /// Daily count mean is larger than the identifier space
    #[error("{field} ({value}) cannot exceed the identifier space of {id_space}")]
    CountExceedsIdSpace {
        /// Name of the count field
        field: String,
        /// The configured mean
        value: f64,
        /// Configured identifier space
        id_space: u64,
    },

    /// Generation retry budget is zero
    #[error("Maximum generation attempts must be greater than 0")]
    InvalidGenerationAttempts,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            output_path: "output".to_string(),
            output_format: "json".to_string(),
            seed: None,
            start_date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default(),
            day_start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            day_end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            time_zone: "+00:00".to_string(),
            starting_pool_size: 1_000,
            pool_growth_rate: 1.5,
            sex_ratio: 0.55,
            age_weights: vec![0.15, 0.30, 0.25, 0.15, 0.10, 0.05],
            min_age: 15,
            visits_per_day_mean: 20.0,
            visits_per_day_sd: 5.0,
            new_patients_per_day_mean: 2.0,
            new_patients_per_day_sd: 1.0,
            ltfu_per_week_mean: 3.0,
            ltfu_per_week_sd: 1.5,
            suppressed_revisit_days: 180,
            unsuppressed_revisit_days: 90,
            death_probabilities: vec![0.0004, 0.0006, 0.0009, 0.0015, 0.0025, 0.0045, 0.0080],
            missing_data_probability: 0.02,
            numeric_vl_probability: 0.3,
            suppression_probability: 0.85,
            apply_returning_visits: true,
            holidays: Vec::new(),
            id_space: 100_000_000,
            max_generation_attempts: 10,
        }
    }
}

impl SimulationParameters {
    /// Create parameters from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create parameters from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut params = Self::default();

        if let Some(config_path) = &args.config {
            params = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut params, args);

        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create parameters from a config file, merging with defaults
    fn from_config_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            output_path: file.output_path.unwrap_or(defaults.output_path),
            output_format: file.output_format.unwrap_or(defaults.output_format),
            seed: file.seed.or(defaults.seed),
            start_date: file.start_date.unwrap_or(defaults.start_date),
            end_date: file.end_date.unwrap_or(defaults.end_date),
            day_start_time: file.day_start_time.unwrap_or(defaults.day_start_time),
            day_end_time: file.day_end_time.unwrap_or(defaults.day_end_time),
            time_zone: file.time_zone.unwrap_or(defaults.time_zone),
            starting_pool_size: file.starting_pool_size.unwrap_or(defaults.starting_pool_size),
            pool_growth_rate: file.pool_growth_rate.unwrap_or(defaults.pool_growth_rate),
            sex_ratio: file.sex_ratio.unwrap_or(defaults.sex_ratio),
            age_weights: file.age_weights.unwrap_or(defaults.age_weights),
            min_age: file.min_age.unwrap_or(defaults.min_age),
            visits_per_day_mean: file.visits_per_day_mean.unwrap_or(defaults.visits_per_day_mean),
            visits_per_day_sd: file.visits_per_day_sd.unwrap_or(defaults.visits_per_day_sd),
            new_patients_per_day_mean: file
                .new_patients_per_day_mean
                .unwrap_or(defaults.new_patients_per_day_mean),
            new_patients_per_day_sd: file
                .new_patients_per_day_sd
                .unwrap_or(defaults.new_patients_per_day_sd),
            ltfu_per_week_mean: file.ltfu_per_week_mean.unwrap_or(defaults.ltfu_per_week_mean),
            ltfu_per_week_sd: file.ltfu_per_week_sd.unwrap_or(defaults.ltfu_per_week_sd),
            suppressed_revisit_days: file
                .suppressed_revisit_days
                .unwrap_or(defaults.suppressed_revisit_days),
            unsuppressed_revisit_days: file
                .unsuppressed_revisit_days
                .unwrap_or(defaults.unsuppressed_revisit_days),
            death_probabilities: file.death_probabilities.unwrap_or(defaults.death_probabilities),
            missing_data_probability: file
                .missing_data_probability
                .unwrap_or(defaults.missing_data_probability),
            numeric_vl_probability: file
                .numeric_vl_probability
                .unwrap_or(defaults.numeric_vl_probability),
            suppression_probability: file
                .suppression_probability
                .unwrap_or(defaults.suppression_probability),
            apply_returning_visits: file
                .apply_returning_visits
                .unwrap_or(defaults.apply_returning_visits),
            holidays: file.holidays.unwrap_or(defaults.holidays),
            id_space: file.id_space.unwrap_or(defaults.id_space),
            max_generation_attempts: file
                .max_generation_attempts
                .unwrap_or(defaults.max_generation_attempts),
        }
    }

    /// Apply CLI argument overrides to parameters
    fn apply_cli_overrides(params: &mut Self, args: CliArgs) {
        if let Some(value) = args.output_path {
            params.output_path = value;
        }
        if let Some(value) = args.output_format {
            params.output_format = value;
        }
        if let Some(value) = args.seed {
            params.seed = Some(value);
        }
        if let Some(value) = args.start_date {
            params.start_date = value;
        }
        if let Some(value) = args.end_date {
            params.end_date = value;
        }
        if let Some(value) = args.starting_pool_size {
            params.starting_pool_size = value;
        }
        if let Some(value) = args.pool_growth_rate {
            params.pool_growth_rate = value;
        }
        if let Some(value) = args.visits_per_day_mean {
            params.visits_per_day_mean = value;
        }
        if let Some(value) = args.visits_per_day_sd {
            params.visits_per_day_sd = value;
        }
        if let Some(value) = args.new_patients_per_day_mean {
            params.new_patients_per_day_mean = value;
        }
        if let Some(value) = args.new_patients_per_day_sd {
            params.new_patients_per_day_sd = value;
        }
        if let Some(value) = args.ltfu_per_week_mean {
            params.ltfu_per_week_mean = value;
        }
        if let Some(value) = args.ltfu_per_week_sd {
            params.ltfu_per_week_sd = value;
        }
        if let Some(value) = args.suppressed_revisit_days {
            params.suppressed_revisit_days = value;
        }
        if let Some(value) = args.unsuppressed_revisit_days {
            params.unsuppressed_revisit_days = value;
        }
        if args.skip_returning_visits {
            params.apply_returning_visits = false;
        }
    }

    /// Save parameters to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print parameters as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.end_date <= self.start_date {
            return Err(ConfigValidationError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if self.day_start_time >= self.day_end_time {
            return Err(ConfigValidationError::InvalidDayWindow {
                start: self.day_start_time,
                end: self.day_end_time,
            });
        }

        self.time_zone_offset()?;
        self.get_output_format().map_err(ConfigValidationError::InvalidOutputFormat)?;

        if self.starting_pool_size == 0 {
            return Err(ConfigValidationError::InvalidPoolSize(self.starting_pool_size));
        }

        if !self.pool_growth_rate.is_finite() || self.pool_growth_rate < 1.0 {
            return Err(ConfigValidationError::InvalidGrowthRate(self.pool_growth_rate));
        }

        if self.id_space < self.starting_pool_size as u64 {
            return Err(ConfigValidationError::InvalidIdSpace {
                id_space: self.id_space,
                pool_size: self.starting_pool_size,
            });
        }

        if self.max_generation_attempts == 0 {
            return Err(ConfigValidationError::InvalidGenerationAttempts);
        }

        self.validate_probability("sex_ratio", self.sex_ratio)?;
        self.validate_probability("missing_data_probability", self.missing_data_probability)?;
        self.validate_probability("numeric_vl_probability", self.numeric_vl_probability)?;
        self.validate_probability("suppression_probability", self.suppression_probability)?;

        self.validate_distribution_parameter("visits_per_day_mean", self.visits_per_day_mean)?;
        self.validate_distribution_parameter("visits_per_day_sd", self.visits_per_day_sd)?;
        self.validate_distribution_parameter(
            "new_patients_per_day_mean",
            self.new_patients_per_day_mean,
        )?;
        self.validate_distribution_parameter("new_patients_per_day_sd", self.new_patients_per_day_sd)?;
        self.validate_distribution_parameter("ltfu_per_week_mean", self.ltfu_per_week_mean)?;
        self.validate_distribution_parameter("ltfu_per_week_sd", self.ltfu_per_week_sd)?;
        self.validate_count_mean("visits_per_day_mean", self.visits_per_day_mean)?;
        self.validate_count_mean("new_patients_per_day_mean", self.new_patients_per_day_mean)?;

        self.validate_revisit_period("suppressed_revisit_days", self.suppressed_revisit_days)?;
        self.validate_revisit_period("unsuppressed_revisit_days", self.unsuppressed_revisit_days)?;

        if self.death_probabilities.is_empty() {
            return Err(ConfigValidationError::EmptyTable("death_probabilities".to_string()));
        }
        for (bucket, probability) in self.death_probabilities.iter().enumerate() {
            self.validate_probability(&format!("death_probabilities[{}]", bucket), *probability)?;
        }

        if self.age_weights.is_empty() {
            return Err(ConfigValidationError::EmptyTable("age_weights".to_string()));
        }
        let weight_sum: f64 = self.age_weights.iter().sum();
        if self.age_weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weight_sum <= 0.0 {
            return Err(ConfigValidationError::InvalidAgeWeights(self.age_weights.clone()));
        }

        Ok(())
    }

    fn validate_probability(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidProbability {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_distribution_parameter(
        &self,
        field: &str,
        value: f64,
    ) -> Result<(), ConfigValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigValidationError::InvalidDistributionParameter {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_count_mean(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if value > self.id_space as f64 {
            return Err(ConfigValidationError::CountExceedsIdSpace {
                field: field.to_string(),
                value,
                id_space: self.id_space,
            });
        }
        Ok(())
    }

    fn validate_revisit_period(&self, field: &str, value: i64) -> Result<(), ConfigValidationError> {
        if value <= 0 {
            return Err(ConfigValidationError::InvalidRevisitPeriod {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Get the output format as an enum value
    pub fn get_output_format(&self) -> Result<OutputFormat, String> {
        self.output_format.parse()
    }

    /// Parse the configured time zone as a fixed UTC offset
    pub fn time_zone_offset(&self) -> Result<FixedOffset, ConfigValidationError> {
        parse_utc_offset(&self.time_zone)
            .ok_or_else(|| ConfigValidationError::InvalidTimeZone(self.time_zone.clone()))
    }

    /// Revisit threshold in days for a patient with the given suppression status
    pub fn revisit_threshold_days(&self, suppressed: bool) -> i64 {
        if suppressed {
            self.suppressed_revisit_days
        } else {
            self.unsuppressed_revisit_days
        }
    }
}

/// Parse `Z`, `UTC`, or a `+HH:MM` / `-HH:MM` offset
fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_parameters_default() {
        let params = SimulationParameters::default();

        assert_eq!(params.output_path, "output");
        assert_eq!(params.output_format, "json");
        assert!(params.seed.is_none());
        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert_eq!(params.starting_pool_size, 1_000);
        assert_eq!(params.pool_growth_rate, 1.5);
        assert_eq!(params.suppressed_revisit_days, 180);
        assert_eq!(params.unsuppressed_revisit_days, 90);
        assert_eq!(params.death_probabilities.len(), 7);
        assert!(params.apply_returning_visits);
    }

    #[test]
    fn test_default_parameters_validate() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_dates() {
        let args = CliArgs::try_parse_from([
            "test",
            "--start-date",
            "2023-03-06",
            "--end-date",
            "2023-04-03",
            "--seed",
            "9",
        ])
        .unwrap();
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2023, 3, 6));
        assert_eq!(args.end_date, NaiveDate::from_ymd_opt(2023, 4, 3));
        assert_eq!(args.seed, Some(9));

        assert!(CliArgs::try_parse_from(["test", "--start-date", "not-a-date"]).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut args = empty_args();
        args.starting_pool_size = Some(250);
        args.visits_per_day_mean = Some(12.0);
        args.seed = Some(54321);
        args.skip_returning_visits = true;

        let params = SimulationParameters::from_cli_args(args).unwrap();

        assert_eq!(params.starting_pool_size, 250);
        assert_eq!(params.visits_per_day_mean, 12.0);
        assert_eq!(params.seed, Some(54321));
        assert!(!params.apply_returning_visits);
        // Non-overridden fields keep their defaults
        assert_eq!(params.ltfu_per_week_mean, 3.0);
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "start_date": "2020-06-01",
            "end_date": "2020-09-01",
            "starting_pool_size": 300,
            "death_probabilities": [0.0, 0.0, 0.5],
            "holidays": ["2020-07-03"],
            "time_zone": "-05:00",
            "seed": 12345
        }"#;

        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let params = SimulationParameters::from_file(temp_file.path()).unwrap();

        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());
        assert_eq!(params.starting_pool_size, 300);
        assert_eq!(params.death_probabilities, vec![0.0, 0.0, 0.5]);
        assert_eq!(params.holidays, vec![NaiveDate::from_ymd_opt(2020, 7, 3).unwrap()]);
        assert_eq!(params.seed, Some(12345));
        assert_eq!(params.time_zone_offset().unwrap().local_minus_utc(), -5 * 3600);
        // Unspecified fields fall back to defaults
        assert_eq!(params.visits_per_day_mean, 20.0);
    }

    #[test]
    fn test_config_file_not_found() {
        let result = SimulationParameters::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_config_file_unsupported_extension() {
        let temp_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = SimulationParameters::from_file(temp_file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_date_range() {
        let mut params = SimulationParameters::default();
        params.end_date = params.start_date;

        match params.validate() {
            Err(ConfigValidationError::InvalidDateRange { .. }) => {}
            other => panic!("Expected InvalidDateRange error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_death_probabilities() {
        let mut params = SimulationParameters::default();
        params.death_probabilities = vec![0.1, -0.2];

        match params.validate() {
            Err(ConfigValidationError::InvalidProbability { field, value }) => {
                assert_eq!(field, "death_probabilities[1]");
                assert_eq!(value, -0.2);
            }
            other => panic!("Expected InvalidProbability error, got {:?}", other),
        }

        params.death_probabilities.clear();
        assert!(matches!(params.validate(), Err(ConfigValidationError::EmptyTable(_))));
    }

    #[test]
    fn test_validation_age_weights() {
        let mut params = SimulationParameters::default();
        params.age_weights = vec![0.0, 0.0];
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidAgeWeights(_))));

        params.age_weights = vec![1.0, -1.0, 2.0];
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidAgeWeights(_))));
    }

    #[test]
    fn test_validation_negative_standard_deviation() {
        let mut params = SimulationParameters::default();
        params.ltfu_per_week_sd = -1.0;

        match params.validate() {
            Err(ConfigValidationError::InvalidDistributionParameter { field, .. }) => {
                assert_eq!(field, "ltfu_per_week_sd");
            }
            other => panic!("Expected InvalidDistributionParameter error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_growth_rate_and_pool() {
        let mut params = SimulationParameters::default();
        params.pool_growth_rate = 0.5;
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidGrowthRate(_))));

        let mut params = SimulationParameters::default();
        params.starting_pool_size = 0;
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidPoolSize(0))));

        let mut params = SimulationParameters::default();
        params.id_space = 10;
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidIdSpace { .. })));
    }

    #[test]
    fn test_validation_revisit_period() {
        let mut params = SimulationParameters::default();
        params.suppressed_revisit_days = 0;
        assert!(matches!(
            params.validate(),
            Err(ConfigValidationError::InvalidRevisitPeriod { .. })
        ));
    }

    #[test]
    fn test_validation_day_window_and_time_zone() {
        let mut params = SimulationParameters::default();
        params.day_end_time = params.day_start_time;
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidDayWindow { .. })));

        let mut params = SimulationParameters::default();
        params.time_zone = "Mars/Olympus".to_string();
        assert!(matches!(params.validate(), Err(ConfigValidationError::InvalidTimeZone(_))));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+02:30").unwrap().local_minus_utc(), 9000);
        assert_eq!(parse_utc_offset("-08:00").unwrap().local_minus_utc(), -28800);
        assert!(parse_utc_offset("0200").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }

    #[test]
    fn test_revisit_threshold_days() {
        let params = SimulationParameters::default();
        assert_eq!(params.revisit_threshold_days(true), 180);
        assert_eq!(params.revisit_threshold_days(false), 90);
    }

    #[test]
    fn test_parameters_serialization() {
        let params = SimulationParameters::default();
        let json = params.print_json().unwrap();
        let deserialized: SimulationParameters = serde_json::from_str(&json).unwrap();

        assert_eq!(params.start_date, deserialized.start_date);
        assert_eq!(params.death_probabilities, deserialized.death_probabilities);
        assert_eq!(params.day_end_time, deserialized.day_end_time);
    }
}
