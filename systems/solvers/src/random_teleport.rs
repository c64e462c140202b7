use rand::Rng;
use snail_maze_core::{CellCoord, Maze};

use crate::{Agent, AgentSprite, Charge, Scene, StepContext, StepOutcome, Tone};

/// Steps spent charging between jumps.
pub const TELEPORT_INTERVAL: u32 = 6;

/// Charges in place, then jumps to a uniformly random cell.
#[derive(Clone, Debug)]
pub struct RandomTeleport {
    agent: Agent,
    charge: u32,
}

impl RandomTeleport {
    pub(crate) const fn new() -> Self {
        Self {
            agent: Agent::at_entry(),
            charge: 0,
        }
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn setup(&mut self) {
        self.agent = Agent::at_entry();
        self.charge = 0;
    }

    pub(crate) fn step(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        self.agent.hold();
        self.charge += 1;
        if self.charge >= TELEPORT_INTERVAL {
            self.charge = 0;
            let target = CellCoord::new(
                ctx.rng.gen_range(0..maze.width().max(1)),
                ctx.rng.gen_range(0..maze.height().max(1)),
            );
            self.agent.teleport(target);
        }

        if self.agent.cell == maze.exit() {
            StepOutcome::Solved { solves: 1 }
        } else {
            StepOutcome::Moved
        }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        scene.agents.push(AgentSprite::of(&self.agent, Tone::Active));
        scene.charge = Some(Charge {
            cell: self.agent.cell,
            elapsed: self.charge,
            period: TELEPORT_INTERVAL,
        });
    }
}
