use snail_maze_core::{CellCoord, Direction, Maze};

/// Position and orientation of a single snail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Agent {
    /// Cell currently occupied.
    pub cell: CellCoord,
    /// Cell occupied before the most recent step, used for interpolation.
    pub previous: CellCoord,
    /// Direction the snail faces.
    pub heading: Direction,
    /// Inactive snails are drawn greyed out and no longer move.
    pub active: bool,
}

impl Agent {
    /// Creates an active agent resting at `cell`.
    #[must_use]
    pub const fn at(cell: CellCoord, heading: Direction) -> Self {
        Self {
            cell,
            previous: cell,
            heading,
            active: true,
        }
    }

    /// Creates an active agent on the entry cell facing right.
    #[must_use]
    pub const fn at_entry() -> Self {
        Self::at(CellCoord::new(0, 0), Direction::Right)
    }

    /// Steps one cell along `heading` if no wall blocks the way.
    pub fn move_forward(&mut self, maze: &Maze) -> bool {
        self.previous = self.cell;
        match maze.step(self.cell, self.heading) {
            Some(next) => {
                self.cell = next;
                true
            }
            None => false,
        }
    }

    /// Turns towards `heading` and steps.
    pub fn move_toward(&mut self, maze: &Maze, heading: Direction) -> bool {
        self.heading = heading;
        self.move_forward(maze)
    }

    /// Places the agent on `cell` without interpolation.
    pub fn teleport(&mut self, cell: CellCoord) {
        self.cell = cell;
        self.previous = cell;
    }

    /// Spends a step without moving.
    pub fn hold(&mut self) {
        self.previous = self.cell;
    }
}

/// Direction leading from `from` to the orthogonally adjacent `to`.
pub(crate) fn direction_between(from: CellCoord, to: CellCoord) -> Option<Direction> {
    let (fc, fr) = (from.column(), from.row());
    let (tc, tr) = (to.column(), to.row());
    if fc == tc && tr.checked_add(1) == Some(fr) {
        Some(Direction::Up)
    } else if fc == tc && fr.checked_add(1) == Some(tr) {
        Some(Direction::Down)
    } else if fr == tr && tc.checked_add(1) == Some(fc) {
        Some(Direction::Left)
    } else if fr == tr && fc.checked_add(1) == Some(tc) {
        Some(Direction::Right)
    } else {
        None
    }
}
