use snail_maze_core::{CellCoord, Maze, SNAIL_MOVEMENT_TIME};

use crate::{
    agent::direction_between, Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone, Tremaux,
};

/// Steps the replaying snail waits between cells.
const REPLAY_STRIDE: u32 = 8;

#[derive(Clone, Debug)]
enum Phase {
    /// A ghost explores the maze at full speed.
    Scouting(Tremaux),
    /// The discovered route is drawn back from the exit.
    Tracing { revealed: usize },
    /// The snail walks the route at regular speed.
    Replaying { walker: Agent, position: usize, wait: u32 },
}

/// Scouts the maze ahead of time, then replays the shortest route.
///
/// Every step lasts an eighth of the usual movement time; the replaying
/// snail only advances every [`REPLAY_STRIDE`] steps.
#[derive(Clone, Debug)]
pub struct TimeTravel {
    phase: Phase,
    route: Vec<CellCoord>,
}

impl TimeTravel {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Scouting(Tremaux::new()),
            route: Vec::new(),
        }
    }

    /// Cells of the route found by the scout, entry first.
    #[must_use]
    pub fn route(&self) -> &[CellCoord] {
        &self.route
    }

    pub(crate) fn setup(&mut self, maze: &Maze) {
        let mut scout = Tremaux::new();
        scout.setup(maze);
        self.phase = Phase::Scouting(scout);
        self.route.clear();
    }

    pub(crate) const fn step_duration(&self) -> u64 {
        SNAIL_MOVEMENT_TIME / 8
    }

    pub(crate) fn step(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        match &mut self.phase {
            Phase::Scouting(scout) => {
                if scout.step(maze, ctx).is_solved() {
                    self.route = route_cells(maze);
                    self.phase = Phase::Tracing { revealed: 0 };
                }
                StepOutcome::Moved
            }
            Phase::Tracing { revealed } => {
                *revealed += 1;
                if *revealed >= self.route.len() {
                    self.phase = Phase::Replaying {
                        walker: Agent::at_entry(),
                        position: 0,
                        wait: 0,
                    };
                }
                StepOutcome::Moved
            }
            Phase::Replaying {
                walker,
                position,
                wait,
            } => {
                walker.hold();
                *wait += 1;
                if *wait >= REPLAY_STRIDE {
                    *wait = 0;
                    if let Some(next) = self.route.get(*position + 1).copied() {
                        if let Some(heading) = direction_between(walker.cell, next) {
                            walker.heading = heading;
                        }
                        walker.previous = walker.cell;
                        walker.cell = next;
                        *position += 1;
                    }
                }
                if walker.cell == maze.exit() {
                    StepOutcome::Solved { solves: 1 }
                } else {
                    StepOutcome::Moved
                }
            }
        }
    }

    pub(crate) fn scene(&self, scene: &mut Scene) {
        match &self.phase {
            Phase::Scouting(scout) => scout.scene(scene, Tone::Mirrored),
            Phase::Tracing { revealed } => {
                let start = self.route.len().saturating_sub(*revealed);
                scene.path.extend_from_slice(&self.route[start..]);
            }
            Phase::Replaying { walker, .. } => {
                scene.path.extend_from_slice(&self.route);
                scene.agents.push(AgentSprite::of(walker, Tone::Active));
            }
        }
    }
}

/// Cells along the shortest route from entry to exit, both included.
fn route_cells(maze: &Maze) -> Vec<CellCoord> {
    let mut cell = maze.entry();
    let mut cells = vec![cell];
    for direction in maze.solve_sequence(maze.entry(), maze.exit()) {
        match maze.neighbor(cell, direction) {
            Some(next) => {
                cell = next;
                cells.push(cell);
            }
            None => break,
        }
    }
    cells
}
