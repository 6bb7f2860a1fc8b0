//! `sectornet` – perception-to-decision command line front end.
//!
//! ```text
//! sectornet [--config <path>] <check | init | once <file> | run | help>
//! ```
//!
//! Decisions are written to stdout as one JSON object per line.  The banner,
//! status messages and logs go to stderr so the stream can be piped.

mod config;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use sectornet_runtime::telemetry::{LogFormat, init_tracing};
use sectornet_runtime::{Controller, DecisionPipeline};
use sectornet_types::Observation;

/// Sector sensing and bounded network control.
#[derive(Parser, Debug)]
#[command(name = "sectornet", version, long_about = None)]
struct Args {
    /// Config file (default: ~/.sectornet/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Build the pipeline from the config and report its shape
    Check,
    /// Write a default config if none exists
    Init,
    /// Decide on one JSON observation
    Once {
        /// File holding one JSON observation
        file: PathBuf,
    },
    /// Read JSON-lines observations on stdin, write decisions to stdout
    Run,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _telemetry = init_tracing("sectornet", LogFormat::from_env());

    let config_path = args.config.unwrap_or_else(config::config_path);

    let result = match args.command {
        None => {
            print_banner();
            eprintln!("{}", Args::command().render_help());
            eprintln!(
                "  Default config: {}",
                config::config_path().display().to_string().dimmed()
            );
            Ok(())
        }
        Some(Command::Init) => cmd_init(&config_path),
        Some(Command::Check) => cmd_check(&config_path),
        Some(Command::Once { file }) => cmd_once(&config_path, &file),
        Some(Command::Run) => cmd_run(&config_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_init(path: &Path) -> Result<(), String> {
    if path.exists() {
        eprintln!(
            "  Config already present at {}; leaving it untouched.",
            path.display().to_string().bold()
        );
        return Ok(());
    }
    config::save_to(&config::Config::default(), path)?;
    eprintln!(
        "  {} Default config written to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn cmd_check(path: &Path) -> Result<(), String> {
    print_banner();
    let pipeline = load_pipeline(path)?;

    let swimmers = pipeline.swimmer_sensor();
    eprintln!(
        "  Swimmer sensor : {} sectors, radius {} (saturation {}), {:?}",
        swimmers.sector_count(),
        swimmers.sensing_radius(),
        swimmers.saturation_radius(),
        swimmers.normalization()
    );
    match pipeline.vehicle_sensor() {
        Some(v) => eprintln!(
            "  Vehicle sensor : {} sectors, radius {} (saturation {}), {:?}",
            v.sector_count(),
            v.sensing_radius(),
            v.saturation_radius(),
            v.normalization()
        ),
        None => eprintln!("  Vehicle sensor : {}", "disabled".dimmed()),
    }
    match pipeline.controller() {
        Some(Controller::Network(net)) => eprintln!(
            "  Controller     : network {:?}, outputs {:?}",
            net.layer_sizes(),
            net.output_activations()
        ),
        Some(Controller::FollowCenterOfMass { speed }) => {
            eprintln!("  Controller     : centre-of-mass follower at speed {speed}")
        }
        None => eprintln!("  Controller     : {}", "none (sense only)".dimmed()),
    }
    eprintln!(
        "  Input width    : {}",
        pipeline.expected_input_width().to_string().bold()
    );
    eprintln!("\n  {} Pipeline OK", "✓".green().bold());
    Ok(())
}

fn cmd_once(path: &Path, observation_file: &Path) -> Result<(), String> {
    let pipeline = load_pipeline(path)?;
    let raw = fs::read_to_string(observation_file).map_err(|e| {
        format!(
            "Failed to read observation at {}: {}",
            observation_file.display(),
            e
        )
    })?;
    let obs: Observation =
        serde_json::from_str(&raw).map_err(|e| format!("Failed to parse observation: {}", e))?;
    let record = pipeline.process(&obs).map_err(|e| e.to_string())?;
    let line = serde_json::to_string(&record).map_err(|e| e.to_string())?;
    println!("{line}");
    Ok(())
}

fn cmd_run(path: &Path) -> Result<(), String> {
    let pipeline = load_pipeline(path)?;

    // First Ctrl-C stops after the current line; a second one exits at once.
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if shutdown_clone.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!();
        eprintln!(
            "{}",
            "⚠  Ctrl-C received – stopping after the current observation …"
                .yellow()
                .bold()
        );
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will terminate immediately");
    }

    info!(
        input_width = pipeline.expected_input_width(),
        "processing observations from stdin"
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    let (processed, skipped) = run_stream(&pipeline, stdin.lock(), stdout.lock(), &shutdown)
        .map_err(|e| format!("stream I/O failed: {e}"))?;
    info!(processed, skipped, "observation stream finished");
    Ok(())
}

/// Drive the pipeline over a JSON-lines stream.  Returns the number of
/// records written and the number of lines skipped.
fn run_stream<R: BufRead, W: Write>(
    pipeline: &DecisionPipeline,
    input: R,
    mut output: W,
    shutdown: &AtomicBool,
) -> io::Result<(usize, usize)> {
    let mut processed = 0;
    let mut skipped = 0;

    for (index, line) in input.lines().enumerate() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;

        let obs: Observation = match serde_json::from_str(&line) {
            Ok(o) => o,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed observation");
                skipped += 1;
                continue;
            }
        };
        let record = match pipeline.process(&obs) {
            Ok(r) => r,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping observation the pipeline rejected");
                skipped += 1;
                continue;
            }
        };

        serde_json::to_writer(&mut output, &record).map_err(io::Error::other)?;
        output.write_all(b"\n")?;
        output.flush()?;
        processed += 1;
    }
    Ok((processed, skipped))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Load the config (defaults when the file is absent) and build the pipeline.
fn load_pipeline(path: &Path) -> Result<DecisionPipeline, String> {
    let cfg = match config::load(path)? {
        Some(cfg) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        None => {
            warn!(path = %path.display(), "no config found; using defaults");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg)?;
            cfg
        }
    };
    cfg.build_pipeline()
}

fn print_banner() {
    eprintln!();
    eprintln!("{}", r#"   ____         __           _  __    __ "#.bold().cyan());
    eprintln!("{}", r#"  / __/__ ____/ /____  ____/ |/ /__ / /_"#.bold().cyan());
    eprintln!("{}", r#" _\ \/ -_) __/ __/ _ \/ __/    / -_) __/"#.bold().cyan());
    eprintln!("{}", r#"/___/\__/\__/\__/\___/_/ /_/|_/\__/\__/ "#.bold().cyan());
    eprintln!();
    eprintln!(
        "  {} {}",
        "SectorNet".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!("  Sector sensing and bounded network control");
    eprintln!();
}
