use snail_maze_core::{CellCoord, Direction, Maze, Upgrades, ANIMATION_TIME, TILE_PIXELS};
use snail_maze_rendering::{byte_len, palette, Canvas, Color};
use snail_maze_system_solvers::{BombState, Policy, Scene, Tone};

/// Page geometry and the time-dependent inputs shared by every slot.
pub(crate) struct Layout {
    pub(crate) tile: u32,
    pub(crate) clock: u64,
    pub(crate) upgrades: Upgrades,
}

/// Borrowed state of one slot.
pub(crate) struct SlotView<'a> {
    pub(crate) maze: &'a Maze,
    pub(crate) background: &'a [u8],
    pub(crate) policy: &'a Policy,
    pub(crate) timer: u64,
}

/// Draws every slot in row-major position order and clears the positions
/// left over past the last slot.
pub(crate) fn page<'a>(
    canvas: &mut Canvas<'_>,
    layout: &Layout,
    slots: impl Iterator<Item = SlotView<'a>>,
) {
    let tile = layout.tile.max(1);
    let columns = (canvas.width() / tile).max(1) as usize;
    let positions = columns * (canvas.height() / tile) as usize;
    let origin = |position: usize| {
        (
            (position % columns) as i64 * i64::from(tile),
            (position / columns) as i64 * i64::from(tile),
        )
    };

    let mut scene = Scene::default();
    let mut drawn = 0;
    for (position, slot) in slots.enumerate() {
        scene.clear();
        slot.policy.scene(&mut scene);
        let progress = step_progress(slot.timer, slot.policy.step_duration(layout.upgrades));
        draw_slot(canvas, layout, origin(position), &slot, &scene, progress);
        drawn = position + 1;
    }
    for position in drawn..positions {
        let (x, y) = origin(position);
        canvas.fill_rect(x, y, tile, tile, palette::BACKGROUND);
    }
}

/// Renders the static part of a slot: background and walls.
pub(crate) fn background(maze: &Maze, tile: u32) -> Vec<u8> {
    let mut pixels = vec![0; byte_len(tile, tile)];
    if let Ok(mut canvas) = Canvas::new(&mut pixels, tile, tile) {
        canvas.fill(palette::BACKGROUND);
        draw_walls(&mut canvas, maze, (0, 0));
    }
    pixels
}

/// Fraction of the current step elapsed, in tenths.
fn step_progress(timer: u64, duration: u64) -> i64 {
    let tenths = timer.saturating_mul(10) / duration.max(1);
    tenths.min(10) as i64
}

fn draw_slot(
    canvas: &mut Canvas<'_>,
    layout: &Layout,
    (x, y): (i64, i64),
    slot: &SlotView<'_>,
    scene: &Scene,
    progress: i64,
) {
    let tile = i64::from(TILE_PIXELS);
    let at = |cell: CellCoord| {
        (
            x + i64::from(cell.column()) * tile,
            y + i64::from(cell.row()) * tile,
        )
    };

    canvas.blit(x, y, slot.background, layout.tile);

    for cell in &scene.path {
        let (cx, cy) = at(*cell);
        canvas.fill_rect(cx + 3, cy + 3, 5, 5, palette::PATH);
    }

    let goal = if (layout.clock / ANIMATION_TIME) % 2 == 0 {
        palette::GOAL
    } else {
        palette::GOAL_DIM
    };
    let (gx, gy) = at(slot.maze.exit());
    canvas.fill_rect(gx + 3, gy + 3, 5, 5, goal);

    for mark in &scene.marks {
        let (cx, cy) = at(mark.cell);
        let length = 2 * u32::from(mark.count.min(2));
        match mark.direction {
            Direction::Up => canvas.fill_rect(cx + 4, cy + 1, length, 1, palette::MARK),
            Direction::Down => canvas.fill_rect(cx + 4, cy + 9, length, 1, palette::MARK),
            Direction::Left => canvas.fill_rect(cx + 1, cy + 4, 1, length, palette::MARK),
            Direction::Right => canvas.fill_rect(cx + 9, cy + 4, 1, length, palette::MARK),
        }
    }

    for bomb in &scene.bombs {
        let (cx, cy) = at(bomb.cell);
        match bomb.state {
            BombState::Lit => canvas.fill_rect(cx + 3, cy + 3, 5, 5, palette::BOMB),
            BombState::Exploding => canvas.fill_rect(cx + 1, cy + 1, 9, 9, palette::BLAST),
        }
    }

    if let Some(charge) = scene.charge {
        let (cx, cy) = at(charge.cell);
        let filled = 9 * charge.elapsed.min(charge.period) / charge.period.max(1);
        canvas.fill_rect(cx + 1, cy + 8, filled, 1, palette::CHARGE);
    }

    for sprite in &scene.agents {
        let (fx, fy) = at(sprite.from);
        let (tx, ty) = at(sprite.to);
        let sx = fx + (tx - fx) * progress / 10 + i64::from(sprite.offset[0]);
        let sy = fy + (ty - fy) * progress / 10 + i64::from(sprite.offset[1]);
        canvas.draw_snail(sx, sy, TILE_PIXELS + 1, sprite.heading, tone_color(sprite.tone));
    }
}

fn draw_walls(canvas: &mut Canvas<'_>, maze: &Maze, (x, y): (i64, i64)) {
    let tile = i64::from(TILE_PIXELS);
    let span = TILE_PIXELS + 1;
    for (index, walls) in maze.cells().iter().enumerate() {
        let cell = maze.cell_at(index);
        let cx = x + i64::from(cell.column()) * tile;
        let cy = y + i64::from(cell.row()) * tile;
        if walls.has(Direction::Up) {
            canvas.fill_rect(cx, cy, span, 1, palette::WALL);
        }
        if walls.has(Direction::Down) {
            canvas.fill_rect(cx, cy + tile, span, 1, palette::WALL);
        }
        if walls.has(Direction::Left) {
            canvas.fill_rect(cx, cy, 1, span, palette::WALL);
        }
        if walls.has(Direction::Right) {
            canvas.fill_rect(cx + tile, cy, 1, span, palette::WALL);
        }
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Active => palette::SNAIL,
        Tone::Idle => palette::IDLE,
        Tone::Lost => palette::LOST,
        Tone::Mirrored => palette::SNAIL.inverted(),
        Tone::Swarm => palette::SWARM,
    }
}
