#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the snail maze engine.
//!
//! This crate defines the maze grid every other crate builds on together with
//! the message surface between a lattice worker and the collaborator that
//! drives it. Collaborators submit [`Command`] values, the worker applies them
//! to its lattice session, and answers asynchronously with [`Event`] values.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod maze;

pub use maze::{Maze, MazeDimensions, MazeError, Walls};

/// Simulated microseconds a snail needs for a single step at base speed.
pub const SNAIL_MOVEMENT_TIME: u64 = 250_000;

/// Simulated microseconds per half cycle of the idle animation.
pub const ANIMATION_TIME: u64 = 500_000;

/// Edge length of one maze cell in rendered pixels.
pub const TILE_PIXELS: u32 = 10;

/// Number of slot rows laid out on a single page.
pub const PAGE_ROWS: u32 = 4;

/// Cardinal directions an agent may face or move in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in mask order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Bit used for this side in a [`Walls`] mask.
    #[must_use]
    pub const fn wall_bit(self) -> u8 {
        match self {
            Self::Up => 0b1000,
            Self::Down => 0b0100,
            Self::Left => 0b0010,
            Self::Right => 0b0001,
        }
    }

    /// Position of the direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    /// Direction after a quarter turn clockwise.
    #[must_use]
    pub const fn rotate_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Direction after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotate_counter_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
        }
    }

    /// Opposite direction.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Location of a single maze cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Solver variants a lattice can be populated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Picks a random open direction every step.
    RandomWalk,
    /// Charges in place and periodically jumps to a random cell.
    RandomTeleport,
    /// Biases its choices with weights learnt across the whole lattice.
    Learning,
    /// Follows the wall on its left hand.
    HoldLeft,
    /// Follows the wall on its right hand.
    Inverted,
    /// Marks junction exits and never re-enters a twice-marked passage.
    Tremaux,
    /// Rescues lost snails before heading for the exit.
    Rpg,
    /// Scouts with Tremaux at accelerated time, then replays the route.
    TimeTravel,
    /// Cannot turn; clones itself at every side opening.
    Clone,
    /// Blows up walls and walks the shortest route through the rubble.
    Demolitionist,
    /// A swarm that flies straight over the maze.
    Flying,
}

impl Variant {
    /// Every variant in shop order.
    pub const ALL: [Self; 11] = [
        Self::RandomWalk,
        Self::RandomTeleport,
        Self::Learning,
        Self::HoldLeft,
        Self::Inverted,
        Self::Tremaux,
        Self::Rpg,
        Self::TimeTravel,
        Self::Clone,
        Self::Demolitionist,
        Self::Flying,
    ];

    /// Stable kebab-case identifier.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RandomWalk => "random-walk",
            Self::RandomTeleport => "random-teleport",
            Self::Learning => "learning",
            Self::HoldLeft => "hold-left",
            Self::Inverted => "inverted",
            Self::Tremaux => "tremaux",
            Self::Rpg => "rpg",
            Self::TimeTravel => "time-travel",
            Self::Clone => "clone",
            Self::Demolitionist => "demolitionist",
            Self::Flying => "flying",
        }
    }

    /// Edge length, in cells, of the square mazes this variant solves.
    #[must_use]
    pub const fn maze_size(self) -> u32 {
        match self {
            Self::RandomWalk => 5,
            Self::RandomTeleport => 7,
            Self::Learning | Self::HoldLeft | Self::Inverted => 9,
            Self::Tremaux | Self::Rpg | Self::Flying => 11,
            Self::TimeTravel => 13,
            Self::Demolitionist => 15,
            Self::Clone => 20,
        }
    }

    /// Fragments awarded for a single solve before upgrades.
    #[must_use]
    pub const fn base_reward(self) -> u64 {
        match self {
            Self::RandomWalk => 25,
            Self::RandomTeleport => 74,
            Self::Learning | Self::HoldLeft => 405,
            Self::Inverted => 4_000,
            Self::Tremaux => 25_000,
            Self::Rpg => 121_000,
            Self::TimeTravel => 253_500,
            Self::Clone => 1_600_000,
            Self::Demolitionist => 38_000_000,
            Self::Flying => 4_000_000,
        }
    }

    /// Default number of slots per page row used by the worker at setup.
    #[must_use]
    pub const fn default_width(self) -> u32 {
        match self {
            Self::RandomWalk => 8,
            Self::RandomTeleport => 5,
            Self::HoldLeft => 4,
            Self::Clone => 2,
            _ => 3,
        }
    }

    /// Fragments earned by `solves` solves under the provided upgrades.
    ///
    /// Integer arithmetic keeps repeated ticks free of rounding drift.
    #[must_use]
    pub const fn reward(self, solves: u64, upgrades: Upgrades) -> u64 {
        solves
            .saturating_mul(self.base_reward())
            .saturating_mul(upgrades.reward_multiplier() as u64)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error produced when parsing an unknown variant key.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown snail variant `{0}`")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.key() == value)
            .ok_or_else(|| UnknownVariant(value.to_owned()))
    }
}

/// Upgrade state applied to a lattice.
///
/// The mask bits are interpreted per variant; the reward multiplier scales
/// every solve uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Upgrades {
    mask: u32,
    reward_multiplier: u32,
}

impl Upgrades {
    /// Creates upgrade state; a zero multiplier is treated as one.
    #[must_use]
    pub const fn new(mask: u32, reward_multiplier: u32) -> Self {
        let reward_multiplier = if reward_multiplier == 0 {
            1
        } else {
            reward_multiplier
        };
        Self {
            mask,
            reward_multiplier,
        }
    }

    /// Upgrade state carrying only behavioural bits.
    #[must_use]
    pub const fn from_mask(mask: u32) -> Self {
        Self::new(mask, 1)
    }

    /// Behavioural upgrade bits.
    #[must_use]
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// Reports whether the given bit index is owned.
    #[must_use]
    pub const fn has(&self, bit: u32) -> bool {
        bit < 32 && self.mask & (1 << bit) != 0
    }

    /// Multiplier applied to every solve reward.
    #[must_use]
    pub const fn reward_multiplier(&self) -> u32 {
        self.reward_multiplier
    }
}

impl Default for Upgrades {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

/// Caller-owned pixel buffer addressed by page index.
///
/// Buffers travel by move into the worker and back, never by copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageBuffer {
    /// Zero-based page index.
    pub page: u32,
    /// RGBA bytes sized for exactly one page.
    pub buffer: Vec<u8>,
}

impl PageBuffer {
    /// Pairs a page index with its buffer.
    #[must_use]
    pub fn new(page: u32, buffer: Vec<u8>) -> Self {
        Self { page, buffer }
    }
}

/// Commands accepted by a lattice worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Builds the lattice for the provided variant, leaving the inbox drained.
    Setup {
        /// Variant every slot will run.
        variant: Variant,
    },
    /// Changes how many slots are laid out per page row.
    SetWidth {
        /// Slots per row.
        width: u32,
    },
    /// Scales simulated time per timer interval.
    SetTickRate {
        /// Integer speed multiplier; zero pauses the lattice.
        multiplier: u32,
    },
    /// Replaces the active upgrade state.
    SetUpgrades {
        /// New upgrade state.
        upgrades: Upgrades,
    },
    /// Grows (positive) or shrinks (negative) the population.
    Resize {
        /// Signed change in slot count.
        delta: i64,
    },
    /// Removes every slot.
    Reset,
    /// Fills the provided page buffers and hands them back.
    RequestRender {
        /// Pages to render, in request order.
        pages: Vec<PageBuffer>,
    },
    /// Asks for a fresh [`Event::PopulationUpdated`].
    QueryCount,
}

/// Events emitted by a lattice worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Score accumulated since the previous flush. Only sent when non-zero.
    Score {
        /// Variant that earned the score.
        variant: Variant,
        /// Fragments earned.
        delta: u64,
        /// Solves counted in this flush.
        solves: u64,
        /// Cumulative per-slot solve counters.
        solve_counts: Vec<u64>,
    },
    /// Page buffers returned after rendering.
    RenderedPages {
        /// Variant that rendered the pages.
        variant: Variant,
        /// Filled buffers in request order.
        pages: Vec<PageBuffer>,
    },
    /// Page layout changed or was queried.
    PopulationUpdated {
        /// Variant whose layout is described.
        variant: Variant,
        /// Width of one page in pixels.
        width_px: u32,
        /// Height of one page in pixels.
        height_px: u32,
        /// Number of pages needed to show every slot.
        page_count: u32,
    },
}
