use rand::{seq::IteratorRandom, Rng};
use snail_maze_core::{Direction, Maze};

use crate::{Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone};

/// Chance, in tenths, contributed by each random-walk upgrade bit.
const GUIDANCE_TENTHS: [u32; 3] = [1, 2, 3];

/// Wanders uniformly among open directions.
///
/// Upgrade bits 0, 1 and 2 add 10 %, 20 % and 30 % odds of taking the step a
/// shortest route would take instead.
#[derive(Clone, Debug)]
pub struct RandomWalk {
    agent: Agent,
    guidance: Vec<Option<Direction>>,
}

impl RandomWalk {
    pub(crate) fn new() -> Self {
        Self {
            agent: Agent::at_entry(),
            guidance: Vec::new(),
        }
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn setup(&mut self, maze: &Maze) {
        self.agent = Agent::at_entry();
        self.guidance = maze.directions_toward(maze.exit());
    }

    pub(crate) fn step(&mut self, maze: &mut Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        let chance: u32 = GUIDANCE_TENTHS
            .iter()
            .enumerate()
            .filter(|(bit, _)| ctx.upgrades.has(*bit as u32))
            .map(|(_, tenths)| tenths)
            .sum();

        let guided = if chance > 0 && ctx.rng.gen_range(0..10) < chance {
            maze.index(self.agent.cell)
                .and_then(|index| self.guidance.get(index).copied().flatten())
        } else {
            None
        };

        let heading = guided.or_else(|| {
            Direction::ALL
                .into_iter()
                .filter(|direction| maze.can_move(self.agent.cell, *direction))
                .choose(ctx.rng)
        });

        match heading {
            Some(heading) => {
                let _ = self.agent.move_toward(maze, heading);
            }
            None => self.agent.hold(),
        }

        if self.agent.cell == maze.exit() {
            StepOutcome::Solved { solves: 1 }
        } else {
            StepOutcome::Moved
        }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        scene.agents.push(AgentSprite::of(&self.agent, Tone::Active));
    }
}
