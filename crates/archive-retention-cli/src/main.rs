mod commands;
mod logging;
mod progress;

use std::process;

use archive_retention_core::{
    config, Error, RetentionEngine, RetentionPolicy, RunStatus, RunSummary, SilentReporter,
};
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, warn};

/// Exit code for "another instance holds the run lock". Distinct from both
/// generic failure and the terminated-by-signal code carried by RunStatus.
const EXIT_LOCK_CONTENTION: i32 = 9;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();
    process::exit(run(args));
}

fn run(args: Cli) -> i32 {
    let mut config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return RunStatus::Failed.exit_code();
        }
    };

    if let Some(path) = args.lock_file {
        config.lock_file = path;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let policy = RetentionPolicy::new(
        args.archive_path,
        args.retention_days,
        args.include_extensions,
        args.execute,
        &config,
    );

    let engine =
        RetentionEngine::new(policy, config).with_force_clear_lock(args.force_clear_lock);

    let cancel = engine.cancel_token();
    if let Err(err) = ctrlc::set_handler(move || {
        eprintln!();
        cancel.cancel();
    }) {
        warn!("Could not install interrupt handler: {}", err);
    }

    let result = if args.quiet {
        engine.run(&SilentReporter)
    } else {
        let reporter = CliReporter::new(args.show_scan_progress, args.show_delete_progress);
        engine.run(&reporter)
    };

    match result {
        Ok(summary) => {
            print_summary(&summary);
            summary.status.exit_code()
        }
        Err(Error::LockHeld { pid }) => {
            error!(
                "Another instance is already running{}; exiting",
                pid.map(|p| format!(" (pid {})", p)).unwrap_or_default()
            );
            EXIT_LOCK_CONTENTION
        }
        Err(err) => {
            error!("Error: {}", err);
            RunStatus::Failed.exit_code()
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let deleted_label = if summary.execute {
        "deleted"
    } else {
        "would delete"
    };
    println!();
    println!(
        "{} scanned, {} eligible, {} {}, {} freed, {} errors",
        format!("{}", summary.scanned).green(),
        format!("{}", summary.eligible).green(),
        format!("{}", summary.deleted).red(),
        deleted_label,
        format!("{}", summary.bytes_freed).red(),
        format!("{}", summary.errors).yellow(),
    );
    if summary.adjusted {
        println!(
            "{}",
            format!(
                "Retention raised from {} to the configured minimum of {} days",
                summary.requested_days, summary.effective_days
            )
            .yellow()
        );
    }
    println!(
        "Status: {} ({:.2}s)",
        summary.status.to_string().bold(),
        summary.duration.as_secs_f64()
    );
}
