use rand::seq::SliceRandom;
use snail_maze_core::{Direction, Maze};

use crate::{Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone};

/// Never turns back; spawns a clone down every side branch instead.
///
/// A snail keeps its heading while the way ahead is open and only turns when
/// it runs into a wall. Surviving snails keep their order in
/// [`Clones::active`]; clones spawned during a step are appended after them.
/// Active clones are capped by [`StepContext::clone_capacity`]. A clone that
/// hits a dead end stops and stays on screen greyed out. When every clone has
/// stopped without reaching the exit the party restarts from the entry.
#[derive(Clone, Debug)]
pub struct Clones {
    active: Vec<Agent>,
    stopped: Vec<Agent>,
}

impl Clones {
    pub(crate) fn new() -> Self {
        Self {
            active: vec![Agent::at_entry()],
            stopped: Vec::new(),
        }
    }

    /// Clones still exploring.
    #[must_use]
    pub fn active(&self) -> &[Agent] {
        &self.active
    }

    /// Clones stuck in dead ends.
    #[must_use]
    pub fn stopped(&self) -> &[Agent] {
        &self.stopped
    }

    pub(crate) fn setup(&mut self) {
        self.active.clear();
        self.active.push(Agent::at_entry());
        self.stopped.clear();
    }

    pub(crate) fn step(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        let capacity = ctx.clone_capacity.max(1);
        let mut survivors = Vec::with_capacity(self.active.len());
        let mut spawned = Vec::new();
        let mut pending = self.active.len();

        for mut agent in self.active.drain(..) {
            pending -= 1;
            let mut sides: Vec<Direction> = [
                agent.heading.rotate_counter_clockwise(),
                agent.heading.rotate_clockwise(),
            ]
            .into_iter()
            .filter(|direction| maze.can_move(agent.cell, *direction))
            .collect();
            sides.shuffle(ctx.rng);

            // Forward wins whenever it is open; a blocked agent hands off to a side.
            let heading = if maze.can_move(agent.cell, agent.heading) {
                agent.heading
            } else if let Some(turn) = sides.pop() {
                turn
            } else {
                agent.hold();
                agent.active = false;
                self.stopped.push(agent);
                continue;
            };

            for branch in sides {
                if survivors.len() + spawned.len() + pending + 1 >= capacity {
                    break;
                }
                let mut clone = Agent::at(agent.cell, branch);
                let _ = clone.move_forward(maze);
                spawned.push(clone);
            }
            let _ = agent.move_toward(maze, heading);
            survivors.push(agent);
        }
        survivors.append(&mut spawned);
        self.active = survivors;

        if self.active.iter().any(|agent| agent.cell == maze.exit()) {
            return StepOutcome::Solved { solves: 1 };
        }
        if self.active.is_empty() {
            self.setup();
        }
        StepOutcome::Moved
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        for agent in self.stopped.iter().chain(&self.active) {
            scene.agents.push(AgentSprite::of(agent, Tone::Active));
        }
    }
}
