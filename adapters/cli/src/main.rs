#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line driver for the snail maze lattice.
//!
//! `run` simulates populations headlessly and prints a JSON summary, `maze`
//! prints a generated maze as ASCII and `mesh` reports the geometry built
//! for one.

mod ascii;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use snail_maze_core::Variant;
use snail_maze_system_generation::generate;
use snail_maze_system_mesher::mesh;
use tracing_subscriber::EnvFilter;

use crate::run::{Population, RunFile};

#[derive(Debug, Parser)]
#[command(name = "snail-maze", about = "Headless snail maze lattice driver")]
struct Cli {
    /// Tracing filter directive, e.g. `debug` or `snail_maze_lattice=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Simulate populations and print a JSON summary.
    Run(RunArgs),
    /// Print a generated maze as ASCII art.
    Maze(MazeArgs),
    /// Print vertex and index counts of a maze mesh as JSON.
    Mesh(MazeArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Snail variant key, e.g. `random-walk` or `tremaux`.
    #[arg(long, default_value = "random-walk")]
    variant: Variant,
    /// Number of slots.
    #[arg(long, default_value_t = 10)]
    count: u32,
    /// Simulated seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,
    /// Slots per page row.
    #[arg(long)]
    width: Option<u32>,
    /// Lattice seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Upgrade mask bits.
    #[arg(long, default_value_t = 0)]
    upgrades: u32,
    /// Reward multiplier.
    #[arg(long, default_value_t = 1)]
    multiplier: u32,
    /// TOML run file listing populations; replaces the single population
    /// described by the other flags.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MazeArgs {
    /// Maze width in cells.
    #[arg(long, default_value_t = 10)]
    width: u32,
    /// Maze height in cells.
    #[arg(long, default_value_t = 10)]
    height: u32,
    /// Generator seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Debug, Serialize)]
struct MeshSummary {
    width: u32,
    height: u32,
    seed: u64,
    vertices: usize,
    indices: usize,
    quads: usize,
}

/// Entry point for the snail maze command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;
    match cli.mode {
        Mode::Run(args) => run_command(args),
        Mode::Maze(args) => {
            let maze = generate(args.width, args.height, args.seed)
                .context("cannot generate maze")?;
            print!("{}", ascii::draw(&maze));
            Ok(())
        }
        Mode::Mesh(args) => {
            let maze = generate(args.width, args.height, args.seed)
                .context("cannot generate maze")?;
            let mesh = mesh(&maze);
            let summary = MeshSummary {
                width: args.width,
                height: args.height,
                seed: args.seed,
                vertices: mesh.vertices.len(),
                indices: mesh.indices.len(),
                quads: mesh.quad_count(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log level `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn run_command(args: RunArgs) -> Result<()> {
    let (populations, seconds, seed) = match &args.config {
        Some(path) => {
            let file = RunFile::load(path)?;
            (
                file.population,
                file.seconds.unwrap_or(args.seconds),
                file.seed.unwrap_or(args.seed),
            )
        }
        None => (
            vec![Population {
                variant: args.variant,
                count: args.count,
                width: args.width,
                upgrades: args.upgrades,
                multiplier: args.multiplier,
                tick_rate: 1,
            }],
            args.seconds,
            args.seed,
        ),
    };
    let summary = run::simulate(&populations, seconds, seed)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
