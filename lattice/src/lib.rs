#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative population state for one snail variant.
//!
//! A [`Lattice`] owns an ordered run of slots, each pairing a maze with the
//! policy solving it. Every slot carries its own seeded generator and movement
//! timer, so advancing the lattice is deterministic and independent of how
//! elapsed time is split across calls. Read-only access lives in [`query`].

use rand::SeedableRng;
use snail_maze_core::{Maze, MazeDimensions, MazeError, Upgrades, Variant, PAGE_ROWS, TILE_PIXELS};
use snail_maze_rendering::RenderError;
use snail_maze_system_generation::generate_with;
use snail_maze_system_solvers::{LearningMemory, Policy, SolverRng, StepContext, StepOutcome};
use thiserror::Error;
use tracing::{debug, info};

mod render;

/// Most steps a single slot takes during one [`Lattice::tick`].
///
/// Elapsed time beyond this backlog is dropped, so a long pause in the
/// caller's clock costs a bounded amount of work.
pub const MAX_STEPS_PER_TICK: u64 = 16_384;

/// Errors reported by lattice operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// The variant's maze size is unusable.
    #[error(transparent)]
    InvalidDimensions(#[from] MazeError),
    /// A render request was rejected before any byte was written.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Construction parameters of a lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatticeConfig {
    /// Variant simulated by every slot.
    pub variant: Variant,
    /// Slots per page row.
    pub width: u32,
    /// Seed every slot generator is derived from.
    pub seed: u64,
}

impl LatticeConfig {
    /// Configuration using the variant's default page width and seed zero.
    #[must_use]
    pub const fn new(variant: Variant) -> Self {
        Self {
            variant,
            width: variant.default_width(),
            seed: 0,
        }
    }

    /// Overrides the page width.
    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Overrides the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Totals produced by a single [`Lattice::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TickSummary {
    /// Mazes solved across every slot.
    pub solves: u64,
    /// Score earned by those solves.
    pub score: u64,
}

#[derive(Clone, Debug)]
struct Slot {
    maze: Maze,
    policy: Policy,
    rng: SolverRng,
    timer: u64,
    solves: u64,
    /// Walls drawn over the background, redrawn whenever `maze` changes.
    background: Vec<u8>,
}

/// Resizable pool of same-variant maze slots.
#[derive(Clone, Debug)]
pub struct Lattice {
    variant: Variant,
    dimensions: MazeDimensions,
    width: u32,
    seed: u64,
    spawned: u64,
    slots: Vec<Slot>,
    memory: LearningMemory,
    upgrades: Upgrades,
    clock: u64,
}

impl Lattice {
    /// Creates an empty lattice.
    pub fn new(config: LatticeConfig) -> Result<Self, LatticeError> {
        let dimensions = MazeDimensions::square(config.variant.maze_size())?;
        info!(
            variant = %config.variant,
            width = config.width,
            seed = config.seed,
            "lattice created"
        );
        Ok(Self {
            variant: config.variant,
            dimensions,
            width: config.width.max(1),
            seed: config.seed,
            spawned: 0,
            slots: Vec::new(),
            memory: LearningMemory::default(),
            upgrades: Upgrades::default(),
            clock: 0,
        })
    }

    /// Adds `delta` slots, or removes up to `-delta` slots from the tail.
    ///
    /// Never fails; removal clamps at an empty population. Returns the new
    /// slot count.
    pub fn resize(&mut self, delta: i64) -> usize {
        let before = self.slots.len();
        if delta >= 0 {
            let added = usize::try_from(delta).unwrap_or(usize::MAX);
            self.slots.reserve(added.min(1 << 16));
            for _ in 0..added {
                let slot = self.spawn_slot();
                self.slots.push(slot);
            }
        } else {
            let removed = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
            self.slots.truncate(before.saturating_sub(removed));
        }
        debug!(
            variant = %self.variant,
            before,
            after = self.slots.len(),
            "lattice resized"
        );
        self.slots.len()
    }

    fn spawn_slot(&mut self) -> Slot {
        let serial = self.spawned;
        self.spawned += 1;
        let mut rng = SolverRng::seed_from_u64(slot_seed(self.seed, serial));
        let maze = generate_with(self.dimensions, &mut rng);
        let mut policy = Policy::new(self.variant);
        let mut ctx = StepContext {
            upgrades: self.upgrades,
            rng: &mut rng,
            memory: &mut self.memory,
            clone_capacity: self.slots.len().saturating_add(1),
        };
        policy.setup(&maze, &mut ctx);
        let background = render::background(&maze, self.tile_pixels());
        Slot {
            maze,
            policy,
            rng,
            timer: 0,
            solves: 0,
            background,
        }
    }

    /// Changes how many slots a page row holds; `0` is treated as `1`.
    ///
    /// Only the page layout changes; slot state is untouched.
    pub fn set_width(&mut self, width: u32) {
        self.width = width.max(1);
        debug!(variant = %self.variant, width = self.width, "lattice width changed");
    }

    /// Replaces the active upgrades; they apply from the next step on.
    pub fn set_upgrades(&mut self, upgrades: Upgrades) {
        self.upgrades = upgrades;
        debug!(
            variant = %self.variant,
            mask = upgrades.mask(),
            multiplier = upgrades.reward_multiplier(),
            "lattice upgrades changed"
        );
    }

    /// Advances every slot by `dt` simulated microseconds.
    ///
    /// Each slot steps once per elapsed step duration and carries the
    /// remainder into the next call, taking at most [`MAX_STEPS_PER_TICK`]
    /// steps. Solved mazes are regenerated in place.
    pub fn tick(&mut self, dt: u64) -> TickSummary {
        self.clock = self.clock.saturating_add(dt);
        let upgrades = self.upgrades;
        let clone_capacity = self.slots.len().max(1);
        let dimensions = self.dimensions;
        let tile = self.tile_pixels();
        let memory = &mut self.memory;

        let mut solves = 0_u64;
        for slot in &mut self.slots {
            let backlog = slot
                .policy
                .step_duration(upgrades)
                .saturating_mul(MAX_STEPS_PER_TICK);
            slot.timer = slot.timer.saturating_add(dt).min(backlog);
            let mut redraw = false;
            for _ in 0..MAX_STEPS_PER_TICK {
                let duration = slot.policy.step_duration(upgrades);
                if slot.timer < duration {
                    break;
                }
                slot.timer -= duration;

                let mut ctx = StepContext {
                    upgrades,
                    rng: &mut slot.rng,
                    memory: &mut *memory,
                    clone_capacity,
                };
                let outcome = slot.policy.step(&mut slot.maze, &mut ctx);
                redraw |= outcome == StepOutcome::MazeChanged;
                if outcome.is_solved() {
                    redraw = true;
                    let credited = u64::from(outcome.solves());
                    solves = solves.saturating_add(credited);
                    slot.solves = slot.solves.saturating_add(credited);
                    slot.maze = generate_with(dimensions, ctx.rng);
                    slot.policy.setup(&slot.maze, &mut ctx);
                }
            }
            if redraw {
                slot.background = render::background(&slot.maze, tile);
            }
        }

        TickSummary {
            solves,
            score: self.variant.reward(solves, upgrades),
        }
    }

    /// Renders `count` slots starting at `start` into one page buffer.
    ///
    /// The buffer must hold exactly one page of RGBA pixels (see
    /// [`query::dimensions`]). Slots are laid out row-major, `width` per row;
    /// positions past the population stay background. The request is
    /// rejected before any byte is written when the buffer size is wrong,
    /// `start` lies past the population or `count` exceeds one page.
    pub fn render(&self, buffer: &mut [u8], start: usize, count: usize) -> Result<(), LatticeError> {
        let len = self.slots.len();
        if start > len {
            return Err(RenderError::SlotRangeOutOfBounds { start, count, len }.into());
        }
        let page_size = self.page_size();
        if count > page_size {
            return Err(RenderError::SlotRangeOutOfBounds {
                start,
                count,
                len: page_size,
            }
            .into());
        }
        let (width_px, height_px) = self.page_pixels();
        let mut canvas = snail_maze_rendering::Canvas::new(buffer, width_px, height_px)?;

        let end = start.saturating_add(count).min(len);
        render::page(
            &mut canvas,
            &render::Layout {
                tile: self.tile_pixels(),
                clock: self.clock,
                upgrades: self.upgrades,
            },
            self.slots[start..end]
                .iter()
                .map(|slot| render::SlotView {
                    maze: &slot.maze,
                    background: &slot.background,
                    policy: &slot.policy,
                    timer: slot.timer,
                }),
        );
        Ok(())
    }

    fn tile_pixels(&self) -> u32 {
        self.dimensions.width() * TILE_PIXELS + 1
    }

    fn page_size(&self) -> usize {
        self.width as usize * PAGE_ROWS as usize
    }

    fn page_pixels(&self) -> (u32, u32) {
        let tile = self.tile_pixels();
        (self.width * tile, PAGE_ROWS * tile)
    }
}

/// Derives the generator seed of the `serial`-th slot ever spawned.
fn slot_seed(seed: u64, serial: u64) -> u64 {
    seed ^ serial.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Query functions that provide read-only access to the lattice state.
pub mod query {
    use snail_maze_core::{Maze, Upgrades, Variant};
    use snail_maze_system_solvers::Scene;

    use super::Lattice;

    /// Number of slots.
    #[must_use]
    pub fn count(lattice: &Lattice) -> usize {
        lattice.slots.len()
    }

    /// Pixel width and height of one page.
    #[must_use]
    pub fn dimensions(lattice: &Lattice) -> (u32, u32) {
        lattice.page_pixels()
    }

    /// Bytes of an RGBA buffer holding one page.
    #[must_use]
    pub fn page_bytes(lattice: &Lattice) -> usize {
        let (width, height) = lattice.page_pixels();
        snail_maze_rendering::byte_len(width, height)
    }

    /// Slots laid out on one page.
    #[must_use]
    pub fn page_size(lattice: &Lattice) -> usize {
        lattice.page_size()
    }

    /// Pages needed to show every slot.
    #[must_use]
    pub fn page_count(lattice: &Lattice) -> usize {
        lattice.slots.len().div_ceil(lattice.page_size())
    }

    /// Slots per page row.
    #[must_use]
    pub fn width(lattice: &Lattice) -> u32 {
        lattice.width
    }

    /// Cumulative solves of every slot, in slot order.
    #[must_use]
    pub fn solve_counts(lattice: &Lattice) -> Vec<u64> {
        lattice.slots.iter().map(|slot| slot.solves).collect()
    }

    /// Variant simulated by the lattice.
    #[must_use]
    pub fn variant(lattice: &Lattice) -> Variant {
        lattice.variant
    }

    /// Upgrades currently applied.
    #[must_use]
    pub fn upgrades(lattice: &Lattice) -> Upgrades {
        lattice.upgrades
    }

    /// Simulated microseconds elapsed since creation.
    #[must_use]
    pub fn clock(lattice: &Lattice) -> u64 {
        lattice.clock
    }

    /// Maze of the slot at `index`.
    #[must_use]
    pub fn maze(lattice: &Lattice, index: usize) -> Option<&Maze> {
        lattice.slots.get(index).map(|slot| &slot.maze)
    }

    /// Movement progress carried by the slot at `index`, in microseconds.
    #[must_use]
    pub fn timer(lattice: &Lattice, index: usize) -> Option<u64> {
        lattice.slots.get(index).map(|slot| slot.timer)
    }

    /// Drawable state of the slot at `index`.
    #[must_use]
    pub fn scene(lattice: &Lattice, index: usize) -> Option<Scene> {
        lattice.slots.get(index).map(|slot| {
            let mut scene = Scene::default();
            slot.policy.scene(&mut scene);
            scene
        })
    }
}
