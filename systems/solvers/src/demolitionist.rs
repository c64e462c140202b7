use rand::seq::index::sample;
use snail_maze_core::{CellCoord, Direction, Maze, Upgrades, SNAIL_MOVEMENT_TIME};

use crate::{Agent, AgentSprite, BombSprite, BombState, Scene, StepContext, StepOutcome, Tone};

/// Steps a detonation lasts once the fuse has burnt down.
const BLAST_STEPS: u32 = 2;

/// Speed gained per destroyed tile walked over, in microseconds.
const RUBBLE_SPEEDUP: u64 = 50;

/// Fastest possible step.
const MIN_STEP: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bomb {
    cell: CellCoord,
    fuse: u32,
    blast: u32,
}

/// Blows up random cells, then walks the shortest route through the rubble.
///
/// Upgrade bit 0 shortens fuses, bit 1 plants twenty bombs instead of five
/// and bit 2 speeds the snail up for every destroyed tile it crosses.
#[derive(Clone, Debug)]
pub struct Demolitionist {
    agent: Agent,
    bombs: Vec<Bomb>,
    destroyed: Vec<bool>,
    guidance: Vec<Option<Direction>>,
    walked_rubble: u64,
}

impl Demolitionist {
    pub(crate) fn new() -> Self {
        Self {
            agent: Agent::at_entry(),
            bombs: Vec::new(),
            destroyed: Vec::new(),
            guidance: Vec::new(),
            walked_rubble: 0,
        }
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Destroyed tiles walked over since the last fresh maze.
    #[must_use]
    pub const fn walked_rubble(&self) -> u64 {
        self.walked_rubble
    }

    pub(crate) fn setup(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) {
        self.agent = Agent::at_entry();
        self.destroyed = vec![false; maze.cell_count()];
        self.guidance.clear();
        self.walked_rubble = 0;

        let wanted = if ctx.upgrades.has(1) { 20 } else { 5 };
        let fuse = if ctx.upgrades.has(0) { 5 } else { 10 };
        let amount = wanted.min(maze.cell_count());
        self.bombs = sample(ctx.rng, maze.cell_count(), amount)
            .into_iter()
            .map(|index| Bomb {
                cell: maze.cell_at(index),
                fuse,
                blast: BLAST_STEPS,
            })
            .collect();
    }

    pub(crate) fn step_duration(&self, upgrades: Upgrades) -> u64 {
        if upgrades.has(2) {
            SNAIL_MOVEMENT_TIME
                .saturating_sub(RUBBLE_SPEEDUP.saturating_mul(self.walked_rubble))
                .max(MIN_STEP)
        } else {
            SNAIL_MOVEMENT_TIME
        }
    }

    pub(crate) fn step(&mut self, maze: &mut Maze) -> StepOutcome {
        if !self.bombs.is_empty() {
            self.agent.hold();
            return self.burn_fuses(maze);
        }

        if self.guidance.is_empty() {
            self.guidance = maze.directions_toward(maze.exit());
        }
        let heading = maze
            .index(self.agent.cell)
            .and_then(|index| self.guidance.get(index).copied().flatten());
        match heading {
            Some(heading) => {
                if self.agent.move_toward(maze, heading) {
                    let rubble = maze
                        .index(self.agent.cell)
                        .and_then(|index| self.destroyed.get(index).copied())
                        .unwrap_or(false);
                    if rubble {
                        self.walked_rubble += 1;
                    }
                }
            }
            None => self.agent.hold(),
        }

        if self.agent.cell == maze.exit() {
            StepOutcome::Solved { solves: 1 }
        } else {
            StepOutcome::Moved
        }
    }

    fn burn_fuses(&mut self, maze: &mut Maze) -> StepOutcome {
        let mut detonated = Vec::new();
        self.bombs.retain_mut(|bomb| {
            if bomb.fuse > 0 {
                bomb.fuse -= 1;
            } else {
                bomb.blast = bomb.blast.saturating_sub(1);
            }
            let done = bomb.fuse == 0 && bomb.blast == 0;
            if done {
                detonated.push(bomb.cell);
            }
            !done
        });
        if detonated.is_empty() {
            return StepOutcome::Moved;
        }

        for cell in detonated {
            for direction in Direction::ALL {
                let _ = maze.carve(cell, direction);
            }
            if let Some(flag) = maze.index(cell).and_then(|index| self.destroyed.get_mut(index)) {
                *flag = true;
            }
        }
        self.guidance.clear();
        StepOutcome::MazeChanged
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        scene.bombs.extend(self.bombs.iter().map(|bomb| BombSprite {
            cell: bomb.cell,
            state: if bomb.fuse > 0 {
                BombState::Lit
            } else {
                BombState::Exploding
            },
        }));
        scene.agents.push(AgentSprite::of(&self.agent, Tone::Active));
    }
}
