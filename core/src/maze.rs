//! Wall-bitmask grid shared by the generator, the mesher and every solver.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, Direction};

/// Errors raised when constructing mazes from caller-provided parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum MazeError {
    /// Either dimension was zero.
    #[error("maze dimensions must be positive (received {width}x{height})")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// The provided wall masks do not cover the requested grid.
    #[error("expected {expected} wall masks but received {actual}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of masks supplied by the caller.
        actual: usize,
    },
}

/// Validated, non-empty maze dimensions measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MazeDimensions {
    width: u32,
    height: u32,
}

impl MazeDimensions {
    /// Validates the provided dimensions, rejecting zero-sized axes.
    pub const fn new(width: u32, height: u32) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Creates square dimensions, used by lattice variants.
    pub const fn square(size: u32) -> Result<Self, MazeError> {
        Self::new(size, size)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Four-bit wall mask stored per cell.
///
/// Bit layout: up = 8, down = 4, left = 2, right = 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Walls(u8);

impl Walls {
    /// Mask with every wall present.
    pub const ALL: Self = Self(0b1111);
    /// Mask with no walls present.
    pub const NONE: Self = Self(0);

    /// Wraps raw mask bits, discarding anything above the low nibble.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw mask bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Reports whether the wall facing `direction` is present.
    #[must_use]
    pub const fn has(self, direction: Direction) -> bool {
        self.0 & direction.wall_bit() != 0
    }

    /// Returns the mask with the wall facing `direction` removed.
    #[must_use]
    pub const fn without(self, direction: Direction) -> Self {
        Self(self.0 & !direction.wall_bit())
    }

    /// Returns the mask with the wall facing `direction` added.
    #[must_use]
    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | direction.wall_bit())
    }

    /// Directions without a wall, in `Direction::ALL` order.
    pub fn open_directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| !self.has(*direction))
    }

    /// Number of open sides.
    #[must_use]
    pub const fn open_count(self) -> u32 {
        4 - self.0.count_ones()
    }
}

/// Immutable-once-built grid of wall masks.
///
/// The default value is the empty 0x0 maze, which only the mesher accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Maze {
    width: u32,
    height: u32,
    cells: Vec<Walls>,
}

impl Maze {
    /// Creates a maze of the provided dimensions with every wall present.
    #[must_use]
    pub fn closed(dimensions: MazeDimensions) -> Self {
        Self {
            width: dimensions.width(),
            height: dimensions.height(),
            cells: vec![Walls::ALL; dimensions.cell_count()],
        }
    }

    /// Builds a maze from explicit row-major wall masks.
    ///
    /// Masks are taken verbatim; callers are responsible for agreeing walls.
    pub fn from_walls(width: u32, height: u32, cells: Vec<Walls>) -> Result<Self, MazeError> {
        let dimensions = MazeDimensions::new(width, height)?;
        if cells.len() != dimensions.cell_count() {
            return Err(MazeError::CellCountMismatch {
                expected: dimensions.cell_count(),
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the maze has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell the agents start from.
    #[must_use]
    pub const fn entry(&self) -> CellCoord {
        CellCoord::new(0, 0)
    }

    /// Cell that completes the maze.
    #[must_use]
    pub const fn exit(&self) -> CellCoord {
        CellCoord::new(self.width.saturating_sub(1), self.height.saturating_sub(1))
    }

    /// Row-major wall masks.
    #[must_use]
    pub fn cells(&self) -> &[Walls] {
        &self.cells
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Row-major index of an in-bounds cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.row() as usize * self.width as usize + cell.column() as usize)
    }

    /// Cell stored at the provided row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> CellCoord {
        let width = self.width.max(1) as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// Wall mask of the cell; out-of-bounds cells report every wall.
    #[must_use]
    pub fn walls(&self, cell: CellCoord) -> Walls {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(Walls::ALL)
    }

    /// Adjacent cell in `direction`, ignoring walls.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let next = match direction {
            Direction::Up => CellCoord::new(cell.column(), cell.row().checked_sub(1)?),
            Direction::Down => CellCoord::new(cell.column(), cell.row().checked_add(1)?),
            Direction::Left => CellCoord::new(cell.column().checked_sub(1)?, cell.row()),
            Direction::Right => CellCoord::new(cell.column().checked_add(1)?, cell.row()),
        };
        self.contains(next).then_some(next)
    }

    /// Reports whether an agent may leave `cell` heading `direction`.
    #[must_use]
    pub fn can_move(&self, cell: CellCoord, direction: Direction) -> bool {
        !self.walls(cell).has(direction) && self.neighbor(cell, direction).is_some()
    }

    /// Cell reached by leaving `cell` in `direction`, if no wall blocks it.
    #[must_use]
    pub fn step(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        if self.walls(cell).has(direction) {
            return None;
        }
        self.neighbor(cell, direction)
    }

    /// Removes the wall between `cell` and its neighbour in `direction`.
    ///
    /// Both facing bits are cleared together. Perimeter walls are never
    /// removed; the call returns `false` in that case.
    pub fn carve(&mut self, cell: CellCoord, direction: Direction) -> bool {
        let Some(next) = self.neighbor(cell, direction) else {
            return false;
        };
        let (Some(from), Some(to)) = (self.index(cell), self.index(next)) else {
            return false;
        };
        self.cells[from] = self.cells[from].without(direction);
        self.cells[to] = self.cells[to].without(direction.flip());
        true
    }

    /// Breadth-first distances from `target` to every cell.
    ///
    /// Unreachable cells report `u32::MAX`.
    #[must_use]
    pub fn distances_from(&self, target: CellCoord) -> Vec<u32> {
        let mut distances = vec![u32::MAX; self.cells.len()];
        let Some(start) = self.index(target) else {
            return distances;
        };
        distances[start] = 0;
        let mut queue = VecDeque::from([target]);
        while let Some(cell) = queue.pop_front() {
            let Some(index) = self.index(cell) else {
                continue;
            };
            let next_distance = distances[index].saturating_add(1);
            for direction in self.walls(cell).open_directions() {
                let Some(next) = self.neighbor(cell, direction) else {
                    continue;
                };
                let Some(next_index) = self.index(next) else {
                    continue;
                };
                if distances[next_index] == u32::MAX {
                    distances[next_index] = next_distance;
                    queue.push_back(next);
                }
            }
        }
        distances
    }

    /// For every cell, the first direction of a shortest route to `target`.
    ///
    /// `None` marks the target itself and unreachable cells.
    #[must_use]
    pub fn directions_toward(&self, target: CellCoord) -> Vec<Option<Direction>> {
        let distances = self.distances_from(target);
        (0..self.cells.len())
            .map(|index| {
                let cell = self.cell_at(index);
                let here = distances[index];
                if here == 0 || here == u32::MAX {
                    return None;
                }
                self.walls(cell).open_directions().find(|direction| {
                    self.neighbor(cell, *direction)
                        .and_then(|next| self.index(next))
                        .is_some_and(|next| distances[next] < here)
                })
            })
            .collect()
    }

    /// Sequence of moves along a shortest route from `from` to `to`.
    ///
    /// Empty when the cells coincide or no route exists.
    #[must_use]
    pub fn solve_sequence(&self, from: CellCoord, to: CellCoord) -> Vec<Direction> {
        let directions = self.directions_toward(to);
        let mut moves = Vec::new();
        let mut cell = from;
        while let Some(direction) = self.index(cell).and_then(|index| directions[index]) {
            moves.push(direction);
            match self.neighbor(cell, direction) {
                Some(next) => cell = next,
                None => break,
            }
        }
        moves
    }

    /// Number of cells reachable from the entry.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances_from(self.entry())
            .into_iter()
            .filter(|distance| *distance != u32::MAX)
            .count()
    }

    /// Reports whether every pair of adjacent cells agrees on their shared wall.
    #[must_use]
    pub fn walls_agree(&self) -> bool {
        (0..self.cells.len()).all(|index| {
            let cell = self.cell_at(index);
            [Direction::Right, Direction::Down].into_iter().all(|direction| {
                match self.neighbor(cell, direction) {
                    Some(next) => {
                        self.walls(cell).has(direction) == self.walls(next).has(direction.flip())
                    }
                    None => true,
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        let mut maze = Maze::closed(MazeDimensions::new(3, 1).expect("valid dimensions"));
        assert!(maze.carve(CellCoord::new(0, 0), Direction::Right));
        assert!(maze.carve(CellCoord::new(1, 0), Direction::Right));
        maze
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            MazeDimensions::new(0, 4),
            Err(MazeError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert!(MazeDimensions::new(3, 0).is_err());
    }

    #[test]
    fn carve_clears_both_facing_bits() {
        let maze = corridor();
        assert!(!maze.walls(CellCoord::new(0, 0)).has(Direction::Right));
        assert!(!maze.walls(CellCoord::new(1, 0)).has(Direction::Left));
        assert!(maze.walls_agree());
    }

    #[test]
    fn carve_refuses_perimeter_walls() {
        let mut maze = corridor();
        assert!(!maze.carve(CellCoord::new(0, 0), Direction::Up));
        assert!(!maze.carve(CellCoord::new(2, 0), Direction::Right));
        assert!(maze.walls(CellCoord::new(0, 0)).has(Direction::Up));
    }

    #[test]
    fn solve_sequence_follows_corridor() {
        let maze = corridor();
        assert_eq!(
            maze.solve_sequence(maze.entry(), maze.exit()),
            vec![Direction::Right, Direction::Right]
        );
        assert!(maze.solve_sequence(maze.exit(), maze.exit()).is_empty());
    }

    #[test]
    fn distances_mark_sealed_cells_unreachable() {
        let maze = Maze::closed(MazeDimensions::new(2, 2).expect("valid dimensions"));
        let distances = maze.distances_from(maze.entry());
        assert_eq!(distances[0], 0);
        assert!(distances[1..].iter().all(|distance| *distance == u32::MAX));
        assert_eq!(maze.reachable_count(), 1);
    }

    #[test]
    fn open_directions_follow_mask() {
        let walls = Walls::ALL.without(Direction::Down).without(Direction::Right);
        assert_eq!(walls.bits(), 0b1010);
        assert_eq!(
            walls.open_directions().collect::<Vec<_>>(),
            vec![Direction::Down, Direction::Right]
        );
        assert_eq!(walls.open_count(), 2);
    }

    #[test]
    fn from_walls_checks_cell_count() {
        let error = Maze::from_walls(2, 2, vec![Walls::ALL; 3]).expect_err("short mask list");
        assert_eq!(
            error,
            MazeError::CellCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn maze_round_trips_through_bincode() {
        let maze = corridor();
        let bytes = bincode::serialize(&maze).expect("serialize");
        let restored: Maze = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, maze);
    }
}
