use rand::{seq::SliceRandom, Rng};
use snail_maze_core::{CellCoord, Direction, Maze, Upgrades, SNAIL_MOVEMENT_TIME};

use crate::{Agent, AgentSprite, Scene, StepContext, StepOutcome, Tone, TrailMark};

/// Upgrade bit that doubles speed while backtracking.
const HASTY_RETREAT_BIT: u32 = 2;

/// Denominator of the compass odds granted by upgrade bits 0 and 1.
const COMPASS_ODDS: u32 = 12;

/// Marks junction passages and never walks a passage more than twice.
#[derive(Clone, Debug)]
pub struct Tremaux {
    agent: Agent,
    marks: Vec<[u8; 4]>,
    guidance: Vec<Option<Direction>>,
    width: u32,
    backtracking: bool,
}

impl Tremaux {
    pub(crate) fn new() -> Self {
        Self {
            agent: Agent::at_entry(),
            marks: Vec::new(),
            guidance: Vec::new(),
            width: 0,
            backtracking: false,
        }
    }

    /// Current agent state.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Reports whether the agent is retracing an explored passage.
    #[must_use]
    pub const fn is_backtracking(&self) -> bool {
        self.backtracking
    }

    pub(crate) fn setup(&mut self, maze: &Maze) {
        self.agent = Agent::at_entry();
        self.marks = vec![[0; 4]; maze.cell_count()];
        self.guidance = maze.directions_toward(maze.exit());
        self.width = maze.width();
        self.backtracking = false;
    }

    pub(crate) fn step_duration(&self, upgrades: Upgrades) -> u64 {
        if self.backtracking && upgrades.has(HASTY_RETREAT_BIT) {
            SNAIL_MOVEMENT_TIME / 2
        } else {
            SNAIL_MOVEMENT_TIME
        }
    }

    pub(crate) fn step(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        let cell = self.agent.cell;
        let back = self.agent.heading.flip();
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| maze.can_move(cell, *direction))
            .collect();

        let heading = match maze.index(cell) {
            Some(index) if open.len() > 2 => Some(self.choose_at_junction(index, back, &open, ctx)),
            _ => self.choose_in_passage(back, &open, ctx),
        };

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

    fn choose_in_passage(
        &mut self,
        back: Direction,
        open: &[Direction],
        ctx: &mut StepContext<'_>,
    ) -> Option<Direction> {
        let onward: Vec<Direction> = open.iter().copied().filter(|d| *d != back).collect();
        if let Some(direction) = onward.choose(ctx.rng) {
            return Some(*direction);
        }
        // Dead end.
        let direction = open.first().copied()?;
        self.backtracking = true;
        Some(direction)
    }

    fn choose_at_junction(
        &mut self,
        index: usize,
        back: Direction,
        open: &[Direction],
        ctx: &mut StepContext<'_>,
    ) -> Direction {
        let arrived = open.contains(&back);
        if arrived {
            let mark = &mut self.marks[index][back.index()];
            *mark = mark.saturating_add(1);
        }
        let marks = self.marks[index];
        let total: u32 = marks.iter().map(|count| u32::from(*count)).sum();

        let chosen = if total <= 1 {
            // First visit: any passage but the one just used.
            self.backtracking = false;
            let fresh: Vec<Direction> = open
                .iter()
                .copied()
                .filter(|d| !arrived || *d != back)
                .collect();
            self.pick(index, &fresh, ctx)
        } else if arrived && marks[back.index()] < 2 {
            self.backtracking = true;
            back
        } else {
            let fewest = open
                .iter()
                .map(|d| marks[d.index()])
                .min()
                .unwrap_or_default();
            let candidates: Vec<Direction> = open
                .iter()
                .copied()
                .filter(|d| marks[d.index()] == fewest)
                .collect();
            self.backtracking = fewest > 0;
            self.pick(index, &candidates, ctx)
        };

        let mark = &mut self.marks[index][chosen.index()];
        *mark = mark.saturating_add(1);
        chosen
    }

    /// Picks among `candidates`, following the compass when upgrades allow.
    fn pick(&self, index: usize, candidates: &[Direction], ctx: &mut StepContext<'_>) -> Direction {
        let odds = (ctx.upgrades.mask() & 0b11) << 1;
        if odds > 0 && ctx.rng.gen_range(0..COMPASS_ODDS) < odds {
            let toward_exit = self.guidance.get(index).copied().flatten();
            if let Some(direction) = toward_exit.filter(|d| candidates.contains(d)) {
                return direction;
            }
        }
        candidates
            .choose(ctx.rng)
            .copied()
            .unwrap_or(self.agent.heading)
    }

    pub(crate) fn scene(&self, scene: &mut Scene, tone: Tone) {
        scene.agents.push(AgentSprite::of(&self.agent, tone));
        let width = self.width.max(1) as usize;
        for (index, marks) in self.marks.iter().enumerate() {
            let cell = CellCoord::new((index % width) as u32, (index / width) as u32);
            for direction in Direction::ALL {
                let count = marks[direction.index()];
                if count > 0 {
                    scene.marks.push(TrailMark {
                        cell,
                        direction,
                        count,
                    });
                }
            }
        }
    }
}
