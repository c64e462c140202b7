use rand::Rng;
use snail_maze_core::{CellCoord, Direction, Maze, Upgrades, SNAIL_MOVEMENT_TIME};

use crate::{AgentSprite, Scene, StepContext, StepOutcome, Tone};

/// Largest pixel offset of a swarm member from the flight line.
const SPREAD: i8 = 3;

/// Flies a swarm straight from the entry to the exit, ignoring walls.
///
/// Every flight is slow but credits one solve per swarm member.
#[derive(Clone, Debug)]
pub struct Flying {
    swarm: Vec<[i8; 2]>,
    exit: CellCoord,
}

impl Flying {
    pub(crate) fn new() -> Self {
        Self {
            swarm: Vec::new(),
            exit: CellCoord::default(),
        }
    }

    /// Number of snails in the swarm.
    #[must_use]
    pub fn swarm_size(&self) -> usize {
        self.swarm.len()
    }

    pub(crate) fn setup(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) {
        let mut size = 6;
        if ctx.upgrades.has(1) {
            size += 3;
        }
        if ctx.upgrades.has(2) {
            size += 5;
        }
        self.exit = maze.exit();
        self.swarm = (0..size)
            .map(|_| {
                [
                    ctx.rng.gen_range(-SPREAD..=SPREAD),
                    ctx.rng.gen_range(-SPREAD..=SPREAD),
                ]
            })
            .collect();
    }

    pub(crate) fn step_duration(upgrades: Upgrades) -> u64 {
        let flight = SNAIL_MOVEMENT_TIME * 10;
        if upgrades.has(0) {
            flight / 2
        } else {
            flight
        }
    }

    pub(crate) fn step(&self) -> StepOutcome {
        StepOutcome::Solved {
            solves: self.swarm.len() as u32,
        }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        scene
            .agents
            .extend(self.swarm.iter().map(|offset| AgentSprite {
                from: CellCoord::default(),
                to: self.exit,
                heading: Direction::Right,
                tone: Tone::Swarm,
                offset: *offset,
            }));
    }
}
