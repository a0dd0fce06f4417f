//! `tofsight` – depth presence and position tracker.
//!
//! Runs the full pipeline against a simulated multizone sensor and prints
//! one line per cycle:
//!
//! ```text
//! tofsight [run]                              process frames until Ctrl-C / max_frames
//! tofsight export-model <path> [int8|float32] write the built-in graph asset
//! tofsight init-config                        write ~/.tofsight/config.toml with defaults
//! ```
//!
//! Ctrl-C sets a shared shutdown flag; the loop finishes its current cycle
//! and exits cleanly.

mod config;

use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use tofsight_hal::{SimSensor, TargetSweep};
use tofsight_inference::reference_model;
use tofsight_runtime::{Pipeline, run_loop};
use tofsight_types::{CycleOutcome, CycleReport, Encoding, TofError};

use crate::config::{Config, OutputFormat};

/// Depth of the simulated target surface.
const SIM_TARGET_MM: u16 = 150;
const SIM_NOISE_MM: u16 = 4;
const SIM_NOISE_SEED: u64 = 0x5eed;

fn main() -> ExitCode {
    let _telemetry = tofsight_runtime::init_tracing("tofsight");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("run") => run(),
        Some("export-model") => export_model(&args[1..]),
        Some("init-config") => init_config(),
        Some("help" | "-h" | "--help") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            println!("{}: unknown command '{}'", "Error".red(), other);
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn run() -> Result<(), TofError> {
    print_banner();

    let cfg = config::load()?;
    println!(
        "  Config: {} (encoding {}, arena {} bytes)",
        config::config_path().display().to_string().bold(),
        cfg.encoding.to_string().cyan(),
        cfg.arena_bytes
    );

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this cycle …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; use max_frames to bound the run");
    }

    let asset = load_asset(&cfg);
    let mut pipeline = Pipeline::new(cfg.to_pipeline_config(), asset.as_deref());
    if pipeline.inference_available() {
        println!("  Inference: {}", "ready".green());
    } else {
        println!(
            "  Inference: {} (position fixed at 0.5)",
            "unavailable".yellow()
        );
    }
    println!();

    let mut sensor = SimSensor::new("sim_tof")
        .with_background(*cfg.background().frame())
        .with_target(TargetSweep {
            depth_mm: SIM_TARGET_MM,
            width: 1,
            frames_per_column: cfg.ranging_frequency_hz.max(1),
        })
        .with_noise(SIM_NOISE_MM, SIM_NOISE_SEED)
        .with_ranging_frequency(cfg.ranging_frequency_hz, cfg.poll_interval_ms);

    let processed = run_loop(
        &mut sensor,
        &mut pipeline,
        &shutdown,
        &cfg.to_loop_config(),
        |report| println!("{}", render_report(report, &cfg)),
    )?;

    println!();
    println!("  {} {} frame(s) processed.", "✓".green().bold(), processed);
    Ok(())
}

fn export_model(args: &[String]) -> Result<(), TofError> {
    let Some(path) = args.first() else {
        return Err(TofError::Config(
            "usage: tofsight export-model <path> [int8|float32]".to_string(),
        ));
    };
    let encoding: Encoding = match args.get(1) {
        Some(s) => s.parse()?,
        None => Encoding::default(),
    };
    let bytes = reference_model::presence_model(encoding)
        .map_err(|e| TofError::InferenceUnavailable(e.to_string()))?;
    std::fs::write(path, &bytes)
        .map_err(|e| TofError::Config(format!("failed to write {path}: {e}")))?;
    info!(path = %path, %encoding, bytes = bytes.len(), "model exported");
    println!(
        "  {} {} model written to {} ({} bytes)",
        "✓".green().bold(),
        encoding,
        path.bold(),
        bytes.len()
    );
    Ok(())
}

fn init_config() -> Result<(), TofError> {
    let path = config::config_path();
    if path.exists() {
        println!("  Config already exists at {}", path.display().to_string().bold());
        return Ok(());
    }
    config::save(&Config::default())?;
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// The configured asset file, or the built-in model. `None` runs the
/// pipeline without inference.
fn load_asset(cfg: &Config) -> Option<Vec<u8>> {
    match &cfg.model_path {
        Some(path) => read_asset(path),
        None => reference_model::presence_model(cfg.encoding)
            .map_err(|e| warn!(error = %e, "built-in model unavailable"))
            .ok(),
    }
}

fn read_asset(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => {
            info!(path = %path.display(), bytes = bytes.len(), "model asset loaded");
            Some(bytes)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read model asset");
            None
        }
    }
}

fn render_report(report: &CycleReport, cfg: &Config) -> String {
    match cfg.output_format {
        OutputFormat::Json => serde_json::to_string(report)
            .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        OutputFormat::Text => {
            let mut out = String::new();
            if cfg.print_matrix {
                for row in report.smoothed.rows() {
                    let cells: Vec<String> = row.iter().map(|mm| format!("{mm:4}")).collect();
                    out.push_str(&cells.join(" "));
                    out.push('\n');
                }
            }
            out.push_str(&render_outcome(&report.outcome));
            out
        }
    }
}

fn render_outcome(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Estimate {
            validity,
            position,
            inference_us,
        } => {
            let line = format!("valid = {validity:.3} | x = {position:.3}");
            let timing = format!("({inference_us} µs)").dimmed();
            if *validity > tofsight_types::VALIDITY_THRESHOLD {
                format!("{} {}", line.green(), timing)
            } else {
                format!("{line} {timing}")
            }
        }
        CycleOutcome::InferenceUnavailable => {
            format!("{} | x = 0.500", "inference unavailable".yellow())
        }
        CycleOutcome::InferenceFailed { reason } => {
            format!("{}: {} | x = 0.500", "inference failed".red(), reason)
        }
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  tofsight [run]                              process frames");
    println!("  tofsight export-model <path> [int8|float32] write the built-in model");
    println!("  tofsight init-config                        write default config");
}

fn print_banner() {
    println!();
    println!("{}", r#"  _        __     _      _     _   "#.bold().cyan());
    println!("{}", r#" | |_ ___ / _|___(_)__ _| |_  | |_ "#.bold().cyan());
    println!("{}", r#" |  _/ _ \  _(_-<| / _` | ' \ |  _|"#.bold().cyan());
    println!("{}", r#"  \__\___/_| /__/|_\__, |_||_| \__|"#.bold().cyan());
    println!("{}", r#"                   |___/           "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "tofsight".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  8×8 time-of-flight presence tracker");
    println!();
}
