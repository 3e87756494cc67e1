//! Seaguard Simulator CLI
//!
//! Run vessel tracking scenarios with periodic dead-reckoning and
//! collision prediction.

use clap::Parser;
use seaguard_core::RunConfig;
use seaguard_sim::scenarios::ScenarioId;
use seaguard_sim::{ScenarioReport, ScenarioRunner};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Seaguard vessel tracking and collision prediction CLI
#[derive(Parser, Debug)]
#[command(name = "seaguard-sim")]
#[command(about = "Run vessel tracking and collision prediction scenarios", long_about = None)]
struct Args {
    /// Scenario to run (crossing, head_on, overlap, convoy, traffic, all)
    #[arg(short = 'S', long, default_value = "crossing")]
    scenario: String,

    /// Master seed for traffic generation and sensor noise
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Seconds between refresh/detection cycles
    #[arg(short, long, default_value = "1.0")]
    update_interval: f64,

    /// Lookahead horizon for predicted conflicts, in seconds
    #[arg(short, long, default_value = "1.0")]
    prediction_interval: f64,

    /// Run duration in seconds (0 = run until Ctrl-C)
    #[arg(short, long, default_value = "10.0")]
    duration: f64,

    /// Position noise std-dev for the simulated sensor feed, meters
    /// (0 = feed disabled)
    #[arg(long, default_value = "0.0")]
    sensor_noise: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: crossing, head_on, overlap, convoy, traffic, all");
            std::process::exit(1);
        })]
    };

    let config = RunConfig {
        update_interval: Duration::from_secs_f64(args.update_interval),
        prediction_interval: Duration::from_secs_f64(args.prediction_interval),
        run_duration: (args.duration > 0.0).then(|| Duration::from_secs_f64(args.duration)),
    };

    let mut runner = ScenarioRunner::new(args.seed).with_config(config);
    if args.sensor_noise > 0.0 {
        runner = runner.with_sensor_noise(args.sensor_noise);
    }

    if !args.json {
        info!("Seaguard Simulator v0.1.0");
    }

    let mut reports: Vec<ScenarioReport> = Vec::new();
    let mut failed_count = 0;

    for scenario in &scenarios {
        let report = match runner.run(*scenario).await {
            Ok(report) => report,
            Err(e) => {
                error!("✗ {} aborted: {}", scenario.name(), e);
                std::process::exit(1);
            }
        };

        if !args.json {
            if report.passed {
                info!(
                    "✓ {} PASSED ({} current / {} predicted conflicts)",
                    scenario.name(),
                    report.current_conflicts,
                    report.predicted_conflicts
                );
            } else {
                error!(
                    "✗ {} FAILED: {}",
                    scenario.name(),
                    report.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        if !report.passed {
            failed_count += 1;
        }
        reports.push(report);
    }

    // Summary
    let total = reports.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": reports,
        });
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    } else if failed_count == 0 {
        info!("✅ All {} scenario runs passed!", total);
    } else {
        error!("❌ {}/{} scenario runs failed!", failed_count, total);
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
