use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use snail_maze_core::{Command, Event, Upgrades, Variant};
use snail_maze_worker::{Machine, WorkerConfig};
use tracing::{debug, info};

/// Simulated interval between worker timer ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// One population entry of a run file or of the command line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Population {
    /// Variant populating the lattice.
    pub(crate) variant: Variant,
    /// Number of slots.
    pub(crate) count: u32,
    /// Slots per page row; the variant default when absent.
    #[serde(default)]
    pub(crate) width: Option<u32>,
    /// Upgrade mask bits.
    #[serde(default)]
    pub(crate) upgrades: u32,
    /// Reward multiplier.
    #[serde(default = "default_multiplier")]
    pub(crate) multiplier: u32,
    /// Simulated speed-up.
    #[serde(default = "default_multiplier")]
    pub(crate) tick_rate: u32,
}

const fn default_multiplier() -> u32 {
    1
}

/// Scenario description read from `--config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunFile {
    /// Simulated seconds; overrides the command line.
    #[serde(default)]
    pub(crate) seconds: Option<u64>,
    /// Lattice seed; overrides the command line.
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Populations to simulate side by side.
    #[serde(default)]
    pub(crate) population: Vec<Population>,
}

impl RunFile {
    /// Parses a run file from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid run file")
    }

    /// Reads and parses the run file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read run file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Summary of one simulated population.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct PopulationSummary {
    variant: Variant,
    count: u32,
    score: u64,
    solves: u64,
    width_px: u32,
    height_px: u32,
    page_count: u32,
}

/// Summary printed after a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct RunSummary {
    seconds: u64,
    seed: u64,
    currency: u64,
    populations: Vec<PopulationSummary>,
}

impl RunSummary {
    /// Total currency earned.
    #[cfg(test)]
    pub(crate) const fn currency(&self) -> u64 {
        self.currency
    }
}

/// Simulates every population for `seconds` of worker time.
///
/// Each population runs in its own [`Machine`] driven by a simulated clock,
/// so the summary only depends on the inputs.
pub(crate) fn simulate(populations: &[Population], seconds: u64, seed: u64) -> Result<RunSummary> {
    if populations.is_empty() {
        bail!("nothing to simulate: no populations given");
    }
    let mut summaries = Vec::with_capacity(populations.len());
    for population in populations {
        summaries.push(simulate_population(population, seconds, seed)?);
    }
    let currency = summaries
        .iter()
        .fold(0_u64, |total, summary| total.saturating_add(summary.score));
    info!(seconds, seed, currency, "run finished");
    Ok(RunSummary {
        seconds,
        seed,
        currency,
        populations: summaries,
    })
}

fn simulate_population(population: &Population, seconds: u64, seed: u64) -> Result<PopulationSummary> {
    let variant = population.variant;
    let mut machine = Machine::new(
        WorkerConfig::new()
            .with_tick_interval(TICK_INTERVAL)
            .with_seed(seed),
    );
    let mut events = Vec::new();

    machine.handle(Command::Setup { variant }, 0, &mut events);
    if !machine.is_ready() {
        bail!("failed to set up the {variant} lattice");
    }
    let mut setup = vec![
        Command::SetUpgrades {
            upgrades: Upgrades::new(population.upgrades, population.multiplier),
        },
        Command::SetTickRate {
            multiplier: population.tick_rate,
        },
        Command::Resize {
            delta: i64::from(population.count),
        },
    ];
    if let Some(width) = population.width {
        setup.push(Command::SetWidth { width });
    }
    for command in setup {
        machine.handle(command, 0, &mut events);
    }

    let interval = u64::try_from(TICK_INTERVAL.as_micros()).unwrap_or(u64::MAX);
    let ticks = seconds.saturating_mul(1_000_000) / interval;
    for tick in 1..=ticks {
        machine.on_timer(tick * interval, &mut events);
    }
    machine.handle(Command::QueryCount, ticks * interval, &mut events);

    let mut summary = PopulationSummary {
        variant,
        count: population.count,
        score: 0,
        solves: 0,
        width_px: 0,
        height_px: 0,
        page_count: 0,
    };
    for event in events {
        match event {
            Event::Score { delta, solves, .. } => {
                summary.score = summary.score.saturating_add(delta);
                summary.solves = summary.solves.saturating_add(solves);
            }
            Event::PopulationUpdated {
                width_px,
                height_px,
                page_count,
                ..
            } => {
                summary.width_px = width_px;
                summary.height_px = height_px;
                summary.page_count = page_count;
            }
            Event::RenderedPages { .. } => {}
        }
    }
    debug!(%variant, score = summary.score, solves = summary.solves, "population simulated");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(variant: Variant, count: u32) -> Population {
        Population {
            variant,
            count,
            width: None,
            upgrades: 0,
            multiplier: 1,
            tick_rate: 1,
        }
    }

    #[test]
    fn run_file_fills_defaults() {
        let file = RunFile::parse(
            r#"
            seconds = 30

            [[population]]
            variant = "tremaux"
            count = 12
            width = 4

            [[population]]
            variant = "flying"
            count = 1
            upgrades = 7
            multiplier = 3
            "#,
        )
        .expect("valid run file");
        assert_eq!(file.seconds, Some(30));
        assert_eq!(file.seed, None);
        assert_eq!(file.population.len(), 2);
        assert_eq!(file.population[0].width, Some(4));
        assert_eq!(file.population[0].multiplier, 1);
        assert_eq!(file.population[1].variant, Variant::Flying);
        assert_eq!(file.population[1].tick_rate, 1);
    }

    #[test]
    fn run_file_rejects_unknown_variants() {
        let error = RunFile::parse(
            r#"
            [[population]]
            variant = "teleporting-wizard"
            count = 1
            "#,
        );
        assert!(error.is_err());
    }

    #[test]
    fn simulation_is_deterministic() {
        let populations = [
            population(Variant::RandomWalk, 5),
            population(Variant::HoldLeft, 3),
        ];
        let first = simulate(&populations, 20, 11).expect("simulates");
        let second = simulate(&populations, 20, 11).expect("simulates");
        assert_eq!(first, second);
    }

    #[test]
    fn flying_swarm_scores_every_flight() {
        // One flight takes 2.5 simulated seconds; ten seconds fit four.
        let summary = simulate(&[population(Variant::Flying, 2)], 10, 0).expect("simulates");
        let flights = 4;
        assert_eq!(summary.currency(), 2 * flights * 6 * Variant::Flying.base_reward());
        assert_eq!(summary.populations[0].solves, 2 * flights * 6);
        assert_eq!(summary.populations[0].page_count, 1);
    }

    #[test]
    fn empty_runs_are_rejected() {
        assert!(simulate(&[], 10, 0).is_err());
    }
}
