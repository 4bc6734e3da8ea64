//! Tests for CLI argument parsing and configuration layering
//!
//! Configuration is assembled from defaults, then an optional JSON file, then
//! command line overrides.

use chrono::NaiveDate;
use clap::Parser;
use hiv_care_simulator::types::config::{CliArgs, ConfigError, SimulationParameters};
use hiv_care_simulator::types::{ConfigValidationError, OutputFormat};
use std::fs;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_no_arguments_gives_defaults() {
    let args = CliArgs::try_parse_from(["test"]).unwrap();
    assert!(args.config.is_none());
    assert!(!args.skip_returning_visits);
    assert!(!args.dry_run);
    assert!(args.log_dir.is_none());

    let params = SimulationParameters::from_cli_args(args).unwrap();
    let defaults = SimulationParameters::default();
    assert_eq!(params.start_date, defaults.start_date);
    assert_eq!(params.starting_pool_size, defaults.starting_pool_size);
    assert!(params.apply_returning_visits);
    assert!(params.validate().is_ok());
}

#[test]
fn test_cli_overrides_defaults() {
    let args = CliArgs::try_parse_from([
        "test",
        "--seed",
        "12",
        "--start-date",
        "2022-03-07",
        "--end-date",
        "2022-09-05",
        "--starting-pool-size",
        "750",
        "--visits-per-day-mean",
        "12.5",
        "--ltfu-per-week-sd",
        "0",
        "--suppressed-revisit-days",
        "365",
        "--output-format",
        "csv",
        "--skip-returning-visits",
    ])
    .unwrap();

    let params = SimulationParameters::from_cli_args(args).unwrap();
    assert_eq!(params.seed, Some(12));
    assert_eq!(params.start_date, date(2022, 3, 7));
    assert_eq!(params.end_date, date(2022, 9, 5));
    assert_eq!(params.starting_pool_size, 750);
    assert_eq!(params.visits_per_day_mean, 12.5);
    assert_eq!(params.ltfu_per_week_sd, 0.0);
    assert_eq!(params.suppressed_revisit_days, 365);
    assert_eq!(params.get_output_format().unwrap(), OutputFormat::Csv);
    assert!(!params.apply_returning_visits);
}

#[test]
fn test_malformed_date_is_rejected() {
    assert!(CliArgs::try_parse_from(["test", "--start-date", "2022-13-01"]).is_err());
    assert!(CliArgs::try_parse_from(["test", "--seed", "minus-one"]).is_err());
}

#[test]
fn test_config_file_then_cli_layering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.json");
    fs::write(
        &path,
        r#"{
            "seed": 5,
            "starting_pool_size": 420,
            "time_zone": "-05:00",
            "holidays": ["2021-01-18"],
            "death_probabilities": [0.001, 0.002]
        }"#,
    )
    .unwrap();

    let args = CliArgs::try_parse_from([
        "test",
        "--config",
        path.to_str().unwrap(),
        "--starting-pool-size",
        "99",
    ])
    .unwrap();
    let params = SimulationParameters::from_cli_args(args).unwrap();

    // From the file
    assert_eq!(params.seed, Some(5));
    assert_eq!(params.time_zone, "-05:00");
    assert_eq!(params.holidays, vec![date(2021, 1, 18)]);
    assert_eq!(params.death_probabilities, vec![0.001, 0.002]);
    // CLI wins over the file
    assert_eq!(params.starting_pool_size, 99);
    // Defaults fill the rest
    assert_eq!(params.unsuppressed_revisit_days, SimulationParameters::default().unsuppressed_revisit_days);
    assert!(params.validate().is_ok());
}

#[test]
fn test_save_and_reload_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    let params = SimulationParameters {
        seed: Some(77),
        pool_growth_rate: 2.0,
        holidays: vec![date(2021, 12, 24)],
        ..Default::default()
    };

    params.save_to_file(&path).unwrap();
    let loaded = SimulationParameters::from_file(&path).unwrap();
    assert_eq!(loaded.seed, Some(77));
    assert_eq!(loaded.pool_growth_rate, 2.0);
    assert_eq!(loaded.holidays, params.holidays);
}

#[test]
fn test_missing_and_unsupported_config_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = SimulationParameters::from_file(dir.path().join("absent.json"));
    assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

    let yaml = dir.path().join("params.yaml");
    fs::write(&yaml, "seed: 1").unwrap();
    let unsupported = SimulationParameters::from_file(&yaml);
    assert!(matches!(unsupported, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn test_print_config_is_loadable_json() {
    let json = SimulationParameters::default().print_json().unwrap();
    let parsed: SimulationParameters = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.death_probabilities, SimulationParameters::default().death_probabilities);
}

#[test]
fn test_validation_errors() {
    let reversed = SimulationParameters {
        start_date: date(2021, 6, 1),
        end_date: date(2021, 1, 4),
        ..Default::default()
    };
    assert!(matches!(reversed.validate(), Err(ConfigValidationError::InvalidDateRange { .. })));

    let bad_probability = SimulationParameters { suppression_probability: 1.5, ..Default::default() };
    assert!(matches!(
        bad_probability.validate(),
        Err(ConfigValidationError::InvalidProbability { .. })
    ));

    let bad_growth = SimulationParameters { pool_growth_rate: 0.5, ..Default::default() };
    assert!(matches!(bad_growth.validate(), Err(ConfigValidationError::InvalidGrowthRate(_))));

    let bad_sd = SimulationParameters { visits_per_day_sd: -1.0, ..Default::default() };
    assert!(matches!(
        bad_sd.validate(),
        Err(ConfigValidationError::InvalidDistributionParameter { .. })
    ));

    let bad_zone = SimulationParameters { time_zone: "Mars/Olympus".to_string(), ..Default::default() };
    assert!(matches!(bad_zone.validate(), Err(ConfigValidationError::InvalidTimeZone(_))));

    let bad_format = SimulationParameters { output_format: "xml".to_string(), ..Default::default() };
    assert!(matches!(bad_format.validate(), Err(ConfigValidationError::InvalidOutputFormat(_))));

    let empty_table = SimulationParameters { death_probabilities: vec![], ..Default::default() };
    assert!(matches!(empty_table.validate(), Err(ConfigValidationError::EmptyTable(_))));
}

#[test]
fn test_time_zone_offsets() {
    let params = SimulationParameters { time_zone: "+05:30".to_string(), ..Default::default() };
    assert_eq!(params.time_zone_offset().unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);

    let utc = SimulationParameters { time_zone: "UTC".to_string(), ..Default::default() };
    assert_eq!(utc.time_zone_offset().unwrap().local_minus_utc(), 0);
}

#[test]
fn test_count_means_beyond_id_space_are_rejected() {
    let args = CliArgs::try_parse_from(["test", "--visits-per-day-mean", "1e19"]).unwrap();
    let params = SimulationParameters::from_cli_args(args).unwrap();
    assert!(matches!(
        params.validate(),
        Err(ConfigValidationError::CountExceedsIdSpace { ref field, .. }) if field == "visits_per_day_mean"
    ));

    let new_patients = SimulationParameters {
        id_space: 1_000,
        starting_pool_size: 100,
        new_patients_per_day_mean: 1_000.5,
        ..Default::default()
    };
    assert!(matches!(
        new_patients.validate(),
        Err(ConfigValidationError::CountExceedsIdSpace { id_space: 1_000, .. })
    ));
}
