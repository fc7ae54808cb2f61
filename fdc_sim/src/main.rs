//! # FDC Simulator
//!
//! Line-command front end for the damper controller core. Reads textual
//! commands from stdin, executes them against a single [`Controller`]
//! instance and prints the results — the accelerated model responds
//! instantly, so the loop is purely synchronous.
//!
//! State persists across runs: an existing state file is loaded at
//! startup and the current state is saved on `exit` or end of input.

use std::io::BufRead;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use fdc_common::config::{load_config, ControllerConfig};
use fdc_common::consts::DEFAULT_STATE_FILE;
use fdc_controller::command::{self, CommandOutcome};
use fdc_controller::controller::Controller;

/// FDC Simulator — multi-zone fire/smoke damper controller
#[derive(Parser, Debug)]
#[command(name = "fdc_sim")]
#[command(author = "FDC")]
#[command(version)]
#[command(about = "Line-command simulator for the FDC damper controller")]
struct Args {
    /// Path to the controller configuration TOML. Defaults apply when
    /// omitted (two-zone fire-mode controller).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// State file loaded at startup and saved on exit.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("FDC Simulator v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("FDC Simulator shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => ControllerConfig::default(),
    };
    info!(
        "Config OK: model={}, mode={}, zones={}",
        config.model,
        config.mode,
        config.zone_count()
    );

    let mut controller = Controller::new(config);

    if args.state_file.exists() {
        match controller.load_state(&args.state_file) {
            Ok(()) => info!("State restored from {}", args.state_file.display()),
            Err(e) => warn!(
                "Could not restore state from {}: {e}. Starting fresh.",
                args.state_file.display()
            ),
        }
    }

    println!("FDC Controller Simulation started (accelerated mode). Waiting for commands...");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match command::parse(&line) {
            Ok(cmd) => match command::execute(&mut controller, cmd) {
                CommandOutcome::Continue(output) => println!("{output}"),
                CommandOutcome::Exit => {
                    println!("Simulation exited.");
                    break;
                }
            },
            // Unknown/malformed commands are informational, never fatal.
            Err(e) => println!("{e}"),
        }
    }

    // Final save also runs on plain end-of-input, mirroring `exit`.
    controller.save_state(&args.state_file)?;
    info!("State saved to {}", args.state_file.display());

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
