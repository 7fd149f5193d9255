//! Weightless CLI - run the controller headless on the demo level

use clap::{Parser, Subcommand};
use rapier3d::prelude::vector;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};

use weightless::config::{ConfigError, ControllerConfig};
use weightless::game::crosshair::LoggedCrosshair;
use weightless::game::{Simulation, TickInput, TickReport};
use weightless::save::{SaveError, SaveManager};

const LEVEL_NAME: &str = "demo";

#[derive(Parser)]
#[command(name = "weightless")]
#[command(about = "Zero-gravity character controller sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo level headless from an input script
    Run {
        /// Controller config: a TOML file, or a directory holding weightless.toml
        #[arg(short, long, env = "WEIGHTLESS_CONFIG")]
        config: Option<PathBuf>,
        /// JSON array of per-tick inputs
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Number of ticks to run (default: script length)
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Directory holding save slots
        #[arg(long, default_value = "saves")]
        save_dir: PathBuf,
        /// Restore the player from this slot before running
        #[arg(long)]
        load_slot: Option<usize>,
        /// Save the final position to this slot
        #[arg(long)]
        save_slot: Option<usize>,
    },
    /// List occupied save slots
    Saves {
        #[arg(long, default_value = "saves")]
        save_dir: PathBuf,
        /// Delete this slot instead of listing
        #[arg(long)]
        delete: Option<usize>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("Failed to read script {}: {source}", .path.display())]
    ScriptIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script {}: {source}", .path.display())]
    ScriptParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Player body is missing, nothing to save")]
    NoPlayer,
}

fn main() -> ExitCode {
    weightless::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            script,
            ticks,
            save_dir,
            load_slot,
            save_slot,
        } => run(config, script, ticks, save_dir, load_slot, save_slot),
        Commands::Saves { save_dir, delete } => saves(save_dir, delete),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_script(path: &Path) -> Result<Vec<TickInput>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ScriptIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::ScriptParse {
        path: path.to_path_buf(),
        source,
    })
}

fn run(
    config_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
    ticks: Option<u64>,
    save_dir: PathBuf,
    load_slot: Option<usize>,
    save_slot: Option<usize>,
) -> Result<(), CliError> {
    let config = match &config_path {
        Some(path) if path.is_dir() => ControllerConfig::from_dir(path)?,
        Some(path) => ControllerConfig::from_file(path)?,
        None => ControllerConfig::default(),
    };
    let script = match &script_path {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    let ticks = ticks.unwrap_or(script.len() as u64);

    let (mut simulation, level) = Simulation::with_demo_level(&config)?;
    simulation
        .player_mut()
        .set_crosshair(Box::new(LoggedCrosshair::new()));
    info!(handles = level.handles.len(), ticks, "Starting simulation");

    let saves = SaveManager::new(&save_dir);
    if let Some(slot) = load_slot {
        let data = saves.load(slot)?;
        let [x, y, z] = data.position;
        simulation.restore(vector![x, y, z]);
    }

    let mut last: Option<TickReport> = None;
    for tick in 0..ticks {
        let input = script.get(tick as usize).copied().unwrap_or_default();
        let report = simulation.tick(&input);
        if last.map_or(true, |prev| prev != report) {
            info!(
                tick,
                regime = ?report.regime,
                grabbing = report.grabbing,
                gravity = report.gravity_enabled,
                target = report.target_available,
                "State changed"
            );
        }
        last = Some(report);
    }

    let position = simulation.player_position().ok_or(CliError::NoPlayer)?;
    info!(
        x = position.x,
        y = position.y,
        z = position.z,
        ticks = simulation.tick_count(),
        "Simulation finished"
    );

    if let Some(slot) = save_slot {
        saves.save(slot, [position.x, position.y, position.z], LEVEL_NAME)?;
    }
    Ok(())
}

fn saves(save_dir: PathBuf, delete: Option<usize>) -> Result<(), CliError> {
    let saves = SaveManager::new(save_dir);
    if let Some(slot) = delete {
        if !saves.delete(slot)? {
            info!(slot, "Slot already empty");
        }
        return Ok(());
    }

    let infos = saves.all_infos();
    if infos.is_empty() {
        info!(dir = %saves.dir().display(), "No saves");
    }
    for save in infos {
        info!(slot = save.slot, level = %save.level, saved_at = %save.saved_at, "Save");
    }
    Ok(())
}
