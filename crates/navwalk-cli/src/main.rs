//! navwalk CLI - headless host for the navwalk navigator.
//!
//! - `navwalk inspect` - load a navmesh and print zone statistics
//! - `navwalk replay` - replay a scripted pointer session and report the outcome

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use navwalk::{Navigator, PointerOutcome, Zone};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod mesh;
mod script;

use config::ViewerConfig;
use script::Script;

#[derive(Parser)]
#[command(name = "navwalk")]
#[command(about = "Click-to-walk navigation over a navmesh", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics for a navmesh file (.json or .obj)
    Inspect {
        #[arg(long)]
        map: PathBuf,

        /// Viewer config (for the weld tolerance)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a pointer script against a navmesh
    Replay {
        /// Navmesh file; defaults to the config's `map`
        #[arg(long)]
        map: Option<PathBuf>,

        #[arg(long)]
        script: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Inspect { map, config } => inspect(&map, config.as_deref()),
        Commands::Replay {
            map,
            script,
            config,
        } => run_replay(map, &script, config.as_deref()),
    }
}

fn inspect(map: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = ViewerConfig::load_or_default(config_path)?;
    let geometry = mesh::load_geometry(map)?;
    let zone = Zone::build_with_tolerance(&geometry, config.navigator.weld_tolerance)
        .with_context(|| format!("Failed to index navmesh {}", map.display()))?;

    println!("Navmesh: {}", map.display());
    println!();
    println!("Input triangles: {}", geometry.triangle_count());
    println!("Vertices (welded): {}", zone.vertex_count());
    println!("Nodes: {}", zone.node_count());
    println!("Groups: {}", zone.group_count());
    for group in 0..zone.group_count() {
        let id = navwalk::GroupId(group as u32);
        println!("  - group {}: {} nodes", group, zone.group_nodes(id).len());
    }
    Ok(())
}

fn run_replay(map: Option<PathBuf>, script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = ViewerConfig::load_or_default(config_path)?;
    let map = map
        .or_else(|| config.map.clone())
        .context("No navmesh given: pass --map or set `map` in the config")?;
    let script = Script::load(script_path)?;
    let geometry = mesh::load_geometry(&map)?;

    let mut navigator = Navigator::new(config.navigator.clone());
    navigator
        .load_terrain(&geometry)
        .with_context(|| format!("Failed to index navmesh {}", map.display()))?;
    tracing::info!(map = %map.display(), steps = script.steps.len(), "Starting replay");

    let report = script::replay(&mut navigator, &script, config.frame_dt);

    println!("Replay: {}", script_path.display());
    println!();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        println!("  [{}] {}", i, describe(outcome));
    }
    println!();
    println!("Frames: {}", report.frames);
    println!(
        "Walks: {} started, {} stops, {} position updates",
        report.walk.starts, report.walk.stops, report.walk.updates
    );
    let p = report.final_position;
    println!("Final position: [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z);
    println!("Final state: {:?}", report.final_state);
    Ok(())
}

fn describe(outcome: &PointerOutcome) -> String {
    match outcome {
        PointerOutcome::Ignored(reason) => format!("ignored ({reason:?})"),
        PointerOutcome::Placed(p) => format!("placed at [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z),
        PointerOutcome::Teleported(p) => {
            format!("teleported to [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z)
        }
        PointerOutcome::Walking { waypoints } => format!("walking, {waypoints} waypoints"),
        PointerOutcome::Unreachable { clamped: Some(p) } => {
            format!("unreachable, clamped to [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z)
        }
        PointerOutcome::Unreachable { clamped: None } => "unreachable".to_string(),
    }
}
