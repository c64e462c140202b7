use rand::seq::index::sample;
use snail_maze_core::{CellCoord, Direction, Maze};

use crate::{agent::direction_between, Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone};

/// Leads a growing party through the maze, rescuing lost snails on the way.
///
/// Half as many snails as the maze is wide get lost on random cells. The
/// leader walks to each of them along shortest routes, the rescued fall in
/// line behind, and the maze only counts as solved once the whole party has
/// reached the exit.
#[derive(Clone, Debug)]
pub struct Rpg {
    leader: Agent,
    party: Vec<Agent>,
    lost: Vec<CellCoord>,
    guidance: Vec<Option<Direction>>,
    heading_for: Option<CellCoord>,
}

impl Rpg {
    pub(crate) fn new() -> Self {
        Self {
            leader: Agent::at_entry(),
            party: Vec::new(),
            lost: Vec::new(),
            guidance: Vec::new(),
            heading_for: None,
        }
    }

    /// Snails still waiting to be rescued.
    #[must_use]
    pub fn lost(&self) -> &[CellCoord] {
        &self.lost
    }

    /// Rescued snails following the leader.
    #[must_use]
    pub fn party(&self) -> &[Agent] {
        &self.party
    }

    pub(crate) fn setup(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) {
        self.leader = Agent::at_entry();
        self.party.clear();
        self.lost.clear();
        self.guidance.clear();
        self.heading_for = None;

        // Entry and exit never hold lost snails.
        let cells = maze.cell_count();
        if cells <= 2 {
            return;
        }
        let candidates = cells - 2;
        let amount = (maze.width() as usize / 2).min(candidates);
        self.lost.extend(
            sample(ctx.rng, candidates, amount)
                .into_iter()
                .map(|index| maze.cell_at(index + 1)),
        );
    }

    pub(crate) fn step(&mut self, maze: &Maze) -> StepOutcome {
        if self.leader.cell == maze.exit() && self.lost.is_empty() {
            return StepOutcome::Solved { solves: 1 };
        }

        let target = self.lost.last().copied().unwrap_or(maze.exit());
        if self.heading_for != Some(target) {
            self.guidance = maze.directions_toward(target);
            self.heading_for = Some(target);
        }

        let mut vacated = self.leader.cell;
        match maze
            .index(self.leader.cell)
            .and_then(|index| self.guidance.get(index).copied().flatten())
        {
            Some(heading) => {
                let _ = self.leader.move_toward(maze, heading);
            }
            None => self.leader.hold(),
        }
        if self.leader.cell == vacated {
            self.party.iter_mut().for_each(Agent::hold);
        } else {
            for follower in &mut self.party {
                let from = follower.cell;
                if let Some(heading) = direction_between(from, vacated) {
                    follower.heading = heading;
                }
                follower.previous = from;
                follower.cell = vacated;
                vacated = from;
            }
        }

        let here = self.leader.cell;
        let before = self.lost.len();
        self.lost.retain(|cell| *cell != here);
        for _ in self.lost.len()..before {
            self.party.push(Agent::at(here, self.leader.heading));
        }
        StepOutcome::Moved
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        for cell in &self.lost {
            scene
                .agents
                .push(AgentSprite::of(&Agent::at(*cell, Direction::Down), Tone::Lost));
        }
        for follower in self.party.iter().rev() {
            scene.agents.push(AgentSprite::of(follower, Tone::Active));
        }
        scene.agents.push(AgentSprite::of(&self.leader, Tone::Active));
    }
}
