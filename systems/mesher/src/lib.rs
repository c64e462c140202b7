#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Converts wall-bitmask mazes into indexed quad geometry.
//!
//! Coordinates are expressed in cell units with the origin at the top-left
//! corner of the maze and `y` growing downwards. Every quad contributes four
//! vertices (top-left, top-right, bottom-right, bottom-left) and two
//! triangles wound `0-1-2`, `2-3-0`.

use glam::Vec2;
use snail_maze_core::{CellCoord, Direction, Maze};

/// Thickness of a wall quad measured in cell units.
pub const WALL_THICKNESS: f32 = 0.1;

/// Indexed triangle geometry ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Quad corners in cell units.
    pub vertices: Vec<Vec2>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of quads contained in the mesh.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Reports whether the mesh carries no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn push_quad(&mut self, origin: Vec2, size: Vec2) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}

/// Builds floor and wall geometry for `maze`.
///
/// Interior walls are emitted once, from the cell below or to the right of
/// the shared edge. The outer boundary is emitted as four perimeter quads.
/// A maze without cells yields an empty mesh.
#[must_use]
pub fn mesh(maze: &Maze) -> Mesh {
    let mut mesh = Mesh::default();
    if maze.width() == 0 || maze.height() == 0 {
        return mesh;
    }

    for index in 0..maze.cell_count() {
        let cell = maze.cell_at(index);
        mesh.push_quad(cell_origin(cell), Vec2::ONE);
    }

    for index in 0..maze.cell_count() {
        let cell = maze.cell_at(index);
        let walls = maze.walls(cell);
        let origin = cell_origin(cell);
        if cell.row() > 0 && walls.has(Direction::Up) {
            mesh.push_quad(
                origin - Vec2::new(0.0, WALL_THICKNESS / 2.0),
                Vec2::new(1.0, WALL_THICKNESS),
            );
        }
        if cell.column() > 0 && walls.has(Direction::Left) {
            mesh.push_quad(
                origin - Vec2::new(WALL_THICKNESS / 2.0, 0.0),
                Vec2::new(WALL_THICKNESS, 1.0),
            );
        }
    }

    let width = maze.width() as f32;
    let height = maze.height() as f32;
    let half = WALL_THICKNESS / 2.0;
    mesh.push_quad(
        Vec2::new(-half, -half),
        Vec2::new(width + WALL_THICKNESS, WALL_THICKNESS),
    );
    mesh.push_quad(
        Vec2::new(-half, height - half),
        Vec2::new(width + WALL_THICKNESS, WALL_THICKNESS),
    );
    mesh.push_quad(
        Vec2::new(-half, half),
        Vec2::new(WALL_THICKNESS, height - WALL_THICKNESS),
    );
    mesh.push_quad(
        Vec2::new(width - half, half),
        Vec2::new(WALL_THICKNESS, height - WALL_THICKNESS),
    );

    mesh
}

fn cell_origin(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}
