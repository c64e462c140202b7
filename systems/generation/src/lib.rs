#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic maze generation.
//!
//! Mazes are carved by a randomized depth-first walk from the entry cell,
//! backtracking whenever the current cell has no unvisited neighbour. A repair
//! pass then joins any cell the walk missed to an adjacent visited cell and
//! carves a fresh sub-maze from it, so the result is always connected. The
//! walk uses an explicit stack, keeping memory use flat for large grids.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snail_maze_core::{CellCoord, Direction, Maze, MazeDimensions, MazeError};

/// Fixed order used when the repair pass looks for a visited neighbour.
const REPAIR_ORDER: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// Generates a `width` x `height` maze from `seed`.
///
/// The same arguments always produce the same grid.
pub fn generate(width: u32, height: u32, seed: u64) -> Result<Maze, MazeError> {
    let dimensions = MazeDimensions::new(width, height)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(generate_with(dimensions, &mut rng))
}

/// Generates a maze of validated dimensions, drawing randomness from `rng`.
#[must_use]
pub fn generate_with<R: Rng + ?Sized>(dimensions: MazeDimensions, rng: &mut R) -> Maze {
    let mut maze = Maze::closed(dimensions);
    let mut carver = Carver::new(dimensions.cell_count());

    let entry = maze.entry();
    carver.walk(&mut maze, entry, rng);

    for index in 0..maze.cell_count() {
        if carver.visited[index] {
            continue;
        }
        let cell = maze.cell_at(index);
        let anchor = REPAIR_ORDER.into_iter().find(|direction| {
            maze.neighbor(cell, *direction)
                .and_then(|next| maze.index(next))
                .is_some_and(|next| carver.visited[next])
        });
        if let Some(direction) = anchor {
            let _ = maze.carve(cell, direction);
            carver.walk(&mut maze, cell, rng);
        }
    }

    maze
}

/// Regenerates `maze` in place with the same dimensions.
pub fn regenerate<R: Rng + ?Sized>(maze: &mut Maze, rng: &mut R) -> Result<(), MazeError> {
    let dimensions = MazeDimensions::new(maze.width(), maze.height())?;
    *maze = generate_with(dimensions, rng);
    Ok(())
}

struct Carver {
    visited: Vec<bool>,
    stack: Vec<CellCoord>,
}

impl Carver {
    fn new(cell_count: usize) -> Self {
        Self {
            visited: vec![false; cell_count],
            stack: Vec::with_capacity(cell_count),
        }
    }

    fn walk<R: Rng + ?Sized>(&mut self, maze: &mut Maze, start: CellCoord, rng: &mut R) {
        let Some(start_index) = maze.index(start) else {
            return;
        };
        self.visited[start_index] = true;
        self.stack.clear();
        self.stack.push(start);

        while let Some(&cell) = self.stack.last() {
            let mut order = Direction::ALL;
            order.shuffle(rng);

            let next = order.into_iter().find_map(|direction| {
                let neighbor = maze.neighbor(cell, direction)?;
                let index = maze.index(neighbor)?;
                (!self.visited[index]).then_some((direction, neighbor, index))
            });

            match next {
                Some((direction, neighbor, index)) => {
                    let _ = maze.carve(cell, direction);
                    self.visited[index] = true;
                    self.stack.push(neighbor);
                }
                None => {
                    let _ = self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_maze_is_trivially_connected() {
        let maze = generate(1, 1, 7).expect("valid dimensions");
        assert_eq!(maze.cell_count(), 1);
        assert_eq!(maze.entry(), maze.exit());
        assert_eq!(maze.reachable_count(), 1);
    }

    #[test]
    fn zero_dimensions_fail() {
        assert_eq!(
            generate(0, 5, 1),
            Err(MazeError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
        assert!(generate(5, 0, 1).is_err());
    }

    #[test]
    fn perfect_maze_has_one_fewer_passage_than_cells() {
        let maze = generate(8, 6, 99).expect("valid dimensions");
        let passages: u32 = maze
            .cells()
            .iter()
            .map(|walls| walls.open_count())
            .sum::<u32>()
            / 2;
        assert_eq!(passages as usize, maze.cell_count() - 1);
    }

    #[test]
    fn regenerate_keeps_dimensions() {
        let mut maze = generate(4, 3, 5).expect("valid dimensions");
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        regenerate(&mut maze, &mut rng).expect("dimensions stay valid");
        assert_eq!((maze.width(), maze.height()), (4, 3));
        assert_eq!(maze.reachable_count(), 12);
    }
}
