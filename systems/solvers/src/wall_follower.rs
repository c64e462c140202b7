use snail_maze_core::{Direction, Maze};

use crate::{Agent, AgentSprite, Scene, StepOutcome, Tone};

/// Hand kept on the wall by a [`WallFollower`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    /// Prefers counter-clockwise turns.
    Left,
    /// Prefers clockwise turns.
    Right,
}

impl Hand {
    const fn toward(self, heading: Direction) -> Direction {
        match self {
            Self::Left => heading.rotate_counter_clockwise(),
            Self::Right => heading.rotate_clockwise(),
        }
    }

    const fn away(self, heading: Direction) -> Direction {
        match self {
            Self::Left => heading.rotate_clockwise(),
            Self::Right => heading.rotate_counter_clockwise(),
        }
    }
}

/// Keeps one hand on the wall.
///
/// Turns toward the held wall whenever it opens up, otherwise rotates away
/// from it until the way forward is clear. Solves every simply connected
/// maze; loops around a detached pillar are never escaped.
#[derive(Clone, Debug)]
pub struct WallFollower {
    agent: Agent,
    hand: Hand,
}

impl WallFollower {
    pub(crate) const fn new(hand: Hand) -> Self {
        Self {
            agent: Agent::at_entry(),
            hand,
        }
    }

    /// Hand kept on the wall.
    #[must_use]
    pub const fn hand(&self) -> Hand {
        self.hand
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn setup(&mut self) {
        self.agent = Agent::at_entry();
    }

    pub(crate) fn step(&mut self, maze: &Maze) -> StepOutcome {
        let cell = self.agent.cell;
        let preferred = self.hand.toward(self.agent.heading);
        if maze.can_move(cell, preferred) {
            self.agent.heading = preferred;
        } else {
            for _ in 0..4 {
                if maze.can_move(cell, self.agent.heading) {
                    break;
                }
                self.agent.heading = self.hand.away(self.agent.heading);
            }
        }
        let _ = self.agent.move_forward(maze);

        if self.agent.cell == maze.exit() {
            StepOutcome::Solved { solves: 1 }
        } else {
            StepOutcome::Moved
        }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        let tone = match self.hand {
            Hand::Left => Tone::Active,
            Hand::Right => Tone::Mirrored,
        };
        scene.agents.push(AgentSprite::of(&self.agent, tone));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_support::steps_to_solve, Policy};
    use snail_maze_core::{CellCoord, MazeDimensions, Upgrades, Variant};
    use snail_maze_system_generation::generate;

    /// Fully open 4x4 room with a sealed pillar at (1, 1).
    fn pillar_room() -> Maze {
        let mut maze = Maze::closed(MazeDimensions::new(4, 4).expect("valid dimensions"));
        let pillar = CellCoord::new(1, 1);
        for row in 0..4 {
            for column in 0..4 {
                let cell = CellCoord::new(column, row);
                for direction in [Direction::Right, Direction::Down] {
                    let touches_pillar = cell == pillar
                        || maze.neighbor(cell, direction) == Some(pillar);
                    if !touches_pillar {
                        let _ = maze.carve(cell, direction);
                    }
                }
            }
        }
        maze
    }

    #[test]
    fn both_hands_solve_generated_mazes() {
        for variant in [Variant::HoldLeft, Variant::Inverted] {
            for seed in 0..24 {
                let mut maze = generate(9, 9, seed).expect("valid dimensions");
                let mut policy = Policy::new(variant);
                let steps =
                    steps_to_solve(&mut policy, &mut maze, Upgrades::default(), seed, 4 * 81);
                assert!(steps.is_some(), "{variant} failed on seed {seed}");
            }
        }
    }

    #[test]
    fn hold_left_circles_a_detached_pillar_forever() {
        let maze = pillar_room();
        let mut follower = WallFollower::new(Hand::Left);
        follower.agent = Agent::at(CellCoord::new(1, 0), Direction::Left);

        let mut visited = Vec::new();
        for _ in 0..10_000 {
            assert_eq!(follower.step(&maze), StepOutcome::Moved);
            if !visited.contains(&follower.agent.cell) {
                visited.push(follower.agent.cell);
            }
        }
        assert_eq!(visited.len(), 8, "agent should only orbit the pillar");
        assert!(!visited.contains(&maze.exit()));
    }
}
