use rand::{
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
};
use snail_maze_core::{CellCoord, Direction, Maze, SNAIL_MOVEMENT_TIME};

use crate::{Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone};

/// Distinct wall masks times exit quadrants.
const SITUATIONS: usize = 16 * 4;

/// Weight added to every decision on a loop-erased solving route.
const REINFORCEMENT: u32 = 2;

/// Upper bound on any single weight.
const WEIGHT_CEILING: u32 = 1 << 16;

/// Direction weights shared by every learning snail of a lattice.
///
/// Decisions are keyed by the open directions around the snail and the
/// quadrant the exit lies in, so experience transfers between mazes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearningMemory {
    weights: Vec<[u32; 4]>,
}

impl Default for LearningMemory {
    fn default() -> Self {
        Self {
            weights: vec![[1; 4]; SITUATIONS],
        }
    }
}

impl LearningMemory {
    /// Weight of taking `direction` in `situation`.
    #[must_use]
    pub fn weight(&self, situation: usize, direction: Direction) -> u32 {
        self.weights
            .get(situation)
            .map_or(1, |weights| weights[direction.index()])
    }

    /// Sum of every stored weight.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.weights
            .iter()
            .flat_map(|weights| weights.iter())
            .map(|weight| u64::from(*weight))
            .sum()
    }

    fn reinforce(&mut self, situation: usize, direction: Direction) {
        if let Some(weights) = self.weights.get_mut(situation) {
            let weight = &mut weights[direction.index()];
            *weight = weight.saturating_add(REINFORCEMENT).min(WEIGHT_CEILING);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Decision {
    cell: CellCoord,
    situation: usize,
    direction: Direction,
}

/// Weighted walk that reinforces the decisions of every solving route.
#[derive(Clone, Debug)]
pub struct Learning {
    agent: Agent,
    trail: Vec<Decision>,
}

impl Learning {
    pub(crate) fn new() -> Self {
        Self {
            agent: Agent::at_entry(),
            trail: Vec::new(),
        }
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn setup(&mut self) {
        self.agent = Agent::at_entry();
        self.trail.clear();
    }

    pub(crate) const fn step_duration(&self) -> u64 {
        SNAIL_MOVEMENT_TIME / 2
    }

    pub(crate) fn step(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        let cell = self.agent.cell;
        let walls = maze.walls(cell);
        let situation = situation(walls.bits(), cell, maze.exit());

        let back = self.agent.heading.flip();
        let mut options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| maze.can_move(cell, *direction))
            .collect();
        if options.len() > 1 {
            options.retain(|direction| *direction != back);
        }

        let weights = options
            .iter()
            .map(|direction| ctx.memory.weight(situation, *direction));
        let chosen = match WeightedIndex::new(weights) {
            Ok(distribution) => options.get(distribution.sample(ctx.rng)).copied(),
            Err(_) => options.choose(ctx.rng).copied(),
        };

        let Some(direction) = chosen else {
            self.agent.hold();
            return self.finish(maze, ctx);
        };

        // Erase the loop closed by returning to an earlier cell.
        if let Some(position) = self.trail.iter().position(|decision| decision.cell == cell) {
            self.trail.truncate(position);
        }
        self.trail.push(Decision {
            cell,
            situation,
            direction,
        });
        let _ = self.agent.move_toward(maze, direction);
        self.finish(maze, ctx)
    }

    fn finish(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        if self.agent.cell != maze.exit() {
            return StepOutcome::Moved;
        }
        for decision in self.trail.drain(..) {
            ctx.memory.reinforce(decision.situation, decision.direction);
        }
        StepOutcome::Solved { solves: 1 }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        scene.agents.push(AgentSprite::of(&self.agent, Tone::Active));
    }
}

fn situation(wall_bits: u8, cell: CellCoord, exit: CellCoord) -> usize {
    let right = usize::from(exit.column() > cell.column());
    let below = usize::from(exit.row() > cell.row());
    usize::from(wall_bits & 0b1111) * 4 + right + below * 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SolverRng;
    use rand::SeedableRng;
    use snail_maze_core::Upgrades;
    use snail_maze_system_generation::generate;

    fn solve_once(learning: &mut Learning, maze: &Maze, ctx: &mut StepContext<'_>) -> usize {
        learning.setup();
        (1..=1_000_000)
            .find(|_| learning.step(maze, ctx).is_solved())
            .expect("weighted walk solves")
    }

    #[test]
    fn solving_reinforces_shared_memory() {
        let maze = generate(9, 9, 4).expect("valid dimensions");
        let mut rng = SolverRng::seed_from_u64(4);
        let mut memory = LearningMemory::default();
        let before = memory.total();
        let mut ctx = StepContext {
            upgrades: Upgrades::default(),
            rng: &mut rng,
            memory: &mut memory,
            clone_capacity: 1,
        };
        let mut learning = Learning::new();
        let _ = solve_once(&mut learning, &maze, &mut ctx);
        assert!(ctx.memory.total() > before);
        assert!(learning.trail.is_empty());
    }

    #[test]
    fn reinforced_trail_is_loop_erased() {
        let maze = generate(9, 9, 8).expect("valid dimensions");
        let shortest = maze.solve_sequence(maze.entry(), maze.exit()).len() as u64;
        let mut rng = SolverRng::seed_from_u64(8);
        let mut memory = LearningMemory::default();
        let before = memory.total();
        let mut ctx = StepContext {
            upgrades: Upgrades::default(),
            rng: &mut rng,
            memory: &mut memory,
            clone_capacity: 1,
        };
        let mut learning = Learning::new();
        let _ = solve_once(&mut learning, &maze, &mut ctx);
        // Perfect mazes have a single simple route, so exactly its moves are rewarded.
        assert_eq!(
            ctx.memory.total() - before,
            shortest * u64::from(REINFORCEMENT)
        );
    }

    #[test]
    fn situation_encodes_walls_and_exit_quadrant() {
        let exit = CellCoord::new(4, 4);
        assert_eq!(situation(0, CellCoord::new(0, 0), exit), 3);
        assert_eq!(situation(0, CellCoord::new(4, 0), exit), 2);
        assert_eq!(situation(0b1111, exit, exit), 60);
    }
}
