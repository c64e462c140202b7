use snail_maze_core::{CellCoord, Direction, Maze};

/// Draws `maze` with `+`, `-` and `|` characters, marking the entry `S` and
/// the exit `E`.
pub(crate) fn draw(maze: &Maze) -> String {
    let mut out = String::new();
    for row in 0..maze.height() {
        out.push('+');
        for column in 0..maze.width() {
            let walls = maze.walls(CellCoord::new(column, row));
            out.push_str(if walls.has(Direction::Up) { "--" } else { "  " });
            out.push('+');
        }
        out.push('\n');

        for column in 0..maze.width() {
            let cell = CellCoord::new(column, row);
            let walls = maze.walls(cell);
            if column == 0 {
                out.push(if walls.has(Direction::Left) { '|' } else { ' ' });
            }
            out.push_str(if cell == maze.entry() {
                "S "
            } else if cell == maze.exit() {
                "E "
            } else {
                "  "
            });
            out.push(if walls.has(Direction::Right) { '|' } else { ' ' });
        }
        out.push('\n');
    }

    if let Some(last) = maze.height().checked_sub(1) {
        out.push('+');
        for column in 0..maze.width() {
            let walls = maze.walls(CellCoord::new(column, last));
            out.push_str(if walls.has(Direction::Down) { "--" } else { "  " });
            out.push('+');
        }
        out.push('\n');
    }
    out
}
