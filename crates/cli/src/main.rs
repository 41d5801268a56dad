//! The `padforge` binary: load settings, assemble the engine over the
//! available backends, run until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padforge_engine::{AssignmentSet, Engine, EngineConfig, EngineEvent, SlotAssignment};
use padforge_settings::Settings;

mod demo;

#[derive(Parser)]
#[command(name = "padforge", version, about = "Input translation engine")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the engine (the default)
    Run {
        /// Directory holding PadForge.xml
        #[arg(long, default_value = ".")]
        settings_dir: PathBuf,

        /// Polling period in microseconds
        #[arg(long)]
        period_us: Option<u64>,

        /// Run against scripted in-memory devices instead of hardware
        #[arg(long)]
        demo: bool,
    },
    /// Load the settings document, report link problems, and exit
    Check {
        /// Directory holding PadForge.xml
        #[arg(long, default_value = ".")]
        settings_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command.unwrap_or(Command::Run {
        settings_dir: PathBuf::from("."),
        period_us: None,
        demo: false,
    }) {
        Command::Run {
            settings_dir,
            period_us,
            demo,
        } => run(settings_dir, period_us, demo),
        Command::Check { settings_dir } => check(settings_dir),
    }
}

fn run(settings_dir: PathBuf, period_us: Option<u64>, demo: bool) -> Result<()> {
    let settings = Settings::load_or_default(&settings_dir)
        .with_context(|| format!("loading settings from {}", settings_dir.display()))?;
    for problem in settings.validate_links() {
        tracing::warn!("{problem}");
    }

    let period_us = period_us
        .or(settings.app.poll_period_us)
        .unwrap_or(1_000);
    let config = EngineConfig {
        period: Duration::from_micros(period_us),
        ..EngineConfig::default()
    };

    let mut engine = if demo {
        demo::build_engine(config)?
    } else {
        build_platform_engine(config)?
    };

    engine
        .handles()
        .assignments
        .publish(assignments_from(&settings));

    let events = engine.handles().events.subscribe();
    let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("installing interrupt handler")?;

    engine.start().context("starting engine")?;
    tracing::info!("running; press ctrl-c to stop");

    loop {
        crossbeam::select! {
            recv(stop_rx) -> _ => break,
            recv(events) -> event => match event {
                Ok(EngineEvent::FrequencyUpdated(hz)) => {
                    tracing::debug!("pipeline at {hz:.1} Hz");
                }
                Ok(EngineEvent::ErrorOccurred(e)) => {
                    tracing::warn!(stage = %e.stage, device = ?e.device, "{}", e.message);
                }
                Ok(EngineEvent::DevicesChanged) => {
                    let devices = engine.handles().devices.lock();
                    tracing::info!(online = devices.iter().filter(|d| d.is_online()).count(),
                        total = devices.len(), "device set changed");
                }
                Ok(EngineEvent::StateChanged(_)) => {}
                Err(_) => break,
            },
        }
        if engine.missing_driver() {
            tracing::warn!("virtual controller bus not installed; output disabled");
        }
        if !engine.is_running() {
            break;
        }
    }

    engine.stop();
    Ok(())
}

fn check(settings_dir: PathBuf) -> Result<()> {
    let settings = Settings::load_or_default(&settings_dir)
        .with_context(|| format!("loading settings from {}", settings_dir.display()))?;
    let problems = settings.validate_links();
    println!(
        "{} devices, {} settings, {} mappings",
        settings.devices.len(),
        settings.user_settings.len(),
        settings.pad_settings.len()
    );
    if problems.is_empty() {
        println!("all checksum links resolve");
        Ok(())
    } else {
        for problem in &problems {
            println!("problem: {problem}");
        }
        anyhow::bail!("{} unresolved checksum links", problems.len());
    }
}

/// Resolve each user setting's checksum into a shared mapping
/// configuration and hand the engine its assignment list.
fn assignments_from(settings: &Settings) -> AssignmentSet {
    let configs: std::collections::HashMap<u64, Arc<padforge_mapping::MappingConfig>> = settings
        .pad_settings
        .iter()
        .map(|c| (c.checksum(), Arc::new(c.clone())))
        .collect();

    let list = settings
        .user_settings
        .iter()
        .filter_map(|setting| {
            let Some(config) = configs.get(&setting.map_checksum) else {
                tracing::warn!(device = %setting.instance_id,
                    checksum = setting.map_checksum, "setting skipped: mapping missing");
                return None;
            };
            Some(SlotAssignment {
                instance_id: setting.instance_id.clone(),
                slot: setting.slot,
                config: Arc::clone(config),
                enabled: setting.enabled,
                sort_order: setting.sort_order,
            })
        })
        .collect();

    AssignmentSet::new(list)
}

/// The real OS backends plug in here per platform; until one is linked
/// in, running without `--demo` is a configuration error rather than a
/// silent no-op engine.
fn build_platform_engine(_config: EngineConfig) -> Result<Engine> {
    anyhow::bail!(
        "no platform input backend is built into this binary; run with --demo \
         or link a platform backend crate"
    )
}
