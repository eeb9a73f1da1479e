//! empty-statistics-client: paced control-update load generator

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use loadgen_client::{ClientConfig, RunSummary, run_session};
use loadgen_scheduler::run_with_class;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "empty-statistics-client")]
#[command(about = "Send paced empty control updates and report round-trip latency")]
#[command(version)]
struct Cli {
    /// Path to the YAML client configuration.
    ///
    /// A relative `robot_client_metadata_path` inside it is resolved against
    /// the directory holding this file, not the working directory.
    config: PathBuf,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            if let Err(print_err) = e.print() {
                eprintln!("{print_err}");
            }
            return code;
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            info!(
                iterations = summary.iterations,
                warnings = summary.warnings,
                windows = summary.windows_folded,
                "Global: max {:.3} ms, min {:.3} ms, avg {:.3} ms",
                summary.global.max,
                summary.global.min,
                summary.global.avg,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("empty_statistics_client={log_level},loadgen={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let config = ClientConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        server = %config.endpoint_uri(),
        real_time = config.use_real_time,
        "Starting empty statistics client"
    );

    let setup = config.rt_setup();
    let outcome = run_with_class("control-loop", &setup, move || run_session(&config))
        .context("Control loop thread failed")?;
    Ok(outcome?)
}
