// HIV Care Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/hiv-care-simulator
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/hiv-care-simulator --starting-pool-size 5000 --seed 42 --verbose
// ```

use anyhow::{anyhow, Context};
use clap::Parser;
use hiv_care_simulator::output::{OutputWriter, RunSummary};
use hiv_care_simulator::simulation::{LoggingConfig, LoggingGuard, SimulationOrchestrator};
use hiv_care_simulator::types::config::CliArgs;
use hiv_care_simulator::types::SimulationParameters;
use std::process;
use tracing::{error, info, Level};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    if args.print_config {
        match SimulationParameters::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let _logging_guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting HIV Care Simulator");

    if let Err(e) = run(args) {
        error!("Simulation failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    info!("HIV Care Simulator completed successfully");
}

/// Install logging according to the verbosity flags
fn init_logging(args: &CliArgs) -> anyhow::Result<LoggingGuard> {
    let level = if args.debug {
        Level::DEBUG
    } else if args.verbose {
        Level::INFO
    } else {
        // Default: minimal logging for normal users
        Level::WARN
    };

    let mut config = LoggingConfig::new().with_level(level);
    if args.debug || args.verbose {
        config = config.with_span_events();
    }
    if let Some(dir) = &args.log_dir {
        config = config.with_file_logging(dir.clone());
    }

    config.init().map_err(|e| anyhow!("{}", e))
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let dry_run = args.dry_run;

    let params =
        SimulationParameters::from_cli_args(args).context("Failed to load configuration")?;
    params.validate().context("Configuration validation failed")?;
    let format = params.get_output_format().map_err(|e| anyhow!(e))?;

    info!("Configuration loaded and validated successfully");

    // Output location must be usable before any simulated day runs
    let writer = OutputWriter::new(&params.output_path, format)
        .with_context(|| format!("Failed to create output directory {}", params.output_path))?;

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&params);
        return Ok(());
    }

    print_startup_banner(&params);

    eprintln!("Generating starting patient pool...");
    let mut orchestrator = SimulationOrchestrator::new(params.clone())
        .context("Failed to initialize simulation")?;

    eprintln!("Running simulation...");
    orchestrator.run().context("Simulation run failed")?;

    let state = orchestrator.state();
    let patients_path = writer.write_patients(state.pool()).context("Failed to write patients")?;

    let summary = RunSummary {
        run_id: orchestrator.run_id(),
        final_date: state.current_date(),
        status_counts: state.pool().status_counts(),
        statistics: state.statistics().clone(),
        parameters: params.clone(),
    };
    let summary_path = writer.write_summary(&summary).context("Failed to write run summary")?;

    eprintln!("{}", state.statistics().generate_summary_report());
    eprintln!("Patients written to: {}", patients_path.display());
    eprintln!("Summary written to: {}", summary_path.display());

    Ok(())
}

/// Print startup banner and configuration summary
fn print_startup_banner(params: &SimulationParameters) {
    eprintln!("HIV Care Simulator");
    eprintln!("==================");
    eprintln!("Synthetic care trajectories for an HIV treatment program");
    eprintln!();

    print_configuration_summary(params);
}

fn print_configuration_summary(params: &SimulationParameters) {
    eprintln!("Configuration:");
    eprintln!("  Period: {} to {}", params.start_date, params.end_date);
    eprintln!("  Starting Pool: {} patients", params.starting_pool_size);
    eprintln!("  Pool Growth Rate: {:.2}", params.pool_growth_rate);
    eprintln!(
        "  Visits per Day: {:.1} (sd {:.1})",
        params.visits_per_day_mean, params.visits_per_day_sd
    );
    eprintln!(
        "  New Patients per Day: {:.1} (sd {:.1})",
        params.new_patients_per_day_mean, params.new_patients_per_day_sd
    );
    eprintln!(
        "  Lost to Follow-up per Week: {:.1} (sd {:.1})",
        params.ltfu_per_week_mean, params.ltfu_per_week_sd
    );
    eprintln!(
        "  Revisit Days: {} suppressed, {} unsuppressed",
        params.suppressed_revisit_days, params.unsuppressed_revisit_days
    );
    eprintln!("  Returning Visits: {}", if params.apply_returning_visits { "on" } else { "off" });
    eprintln!("  Output: {} ({})", params.output_path, params.output_format);
    if let Some(seed) = params.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}
