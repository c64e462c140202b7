#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Solver policies that move snails through mazes.
//!
//! Every variant is a case of the closed [`Policy`] sum type. The lattice owns
//! one policy per slot, calls [`Policy::setup`] whenever that slot receives a
//! fresh maze and [`Policy::step`] once per elapsed
//! [`Policy::step_duration`]. Policies never regenerate mazes themselves; they
//! report [`StepOutcome::Solved`] and let the owner decide.

use rand_chacha::ChaCha8Rng;
use snail_maze_core::{Maze, Upgrades, Variant};

mod agent;
mod clones;
mod demolitionist;
mod flying;
mod learning;
mod random_teleport;
mod random_walk;
mod rpg;
mod scene;
mod time_travel;
mod tremaux;
mod wall_follower;

pub use agent::Agent;
pub use clones::Clones;
pub use demolitionist::Demolitionist;
pub use flying::Flying;
pub use learning::{Learning, LearningMemory};
pub use random_teleport::{RandomTeleport, TELEPORT_INTERVAL};
pub use random_walk::RandomWalk;
pub use rpg::Rpg;
pub use scene::{AgentSprite, BombSprite, BombState, Charge, Scene, Tone, TrailMark};
pub use time_travel::TimeTravel;
pub use tremaux::Tremaux;
pub use wall_follower::{Hand, WallFollower};

/// Random number generator threaded through every policy.
pub type SolverRng = ChaCha8Rng;

/// Shared inputs available to a policy while it steps.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Upgrade state active for the owning lattice.
    pub upgrades: Upgrades,
    /// Randomness source owned by the slot being stepped.
    pub rng: &'a mut SolverRng,
    /// Direction weights shared by every learning slot of the lattice.
    pub memory: &'a mut LearningMemory,
    /// Maximum number of simultaneously active clones per slot.
    pub clone_capacity: usize,
}

/// Result of advancing a policy by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Agents moved or waited; the maze is unchanged.
    Moved,
    /// The maze walls changed and the slot background must be redrawn.
    MazeChanged,
    /// The maze was completed.
    Solved {
        /// Number of solves credited by this step.
        solves: u32,
    },
}

impl StepOutcome {
    /// Solves credited by the outcome.
    #[must_use]
    pub const fn solves(self) -> u32 {
        match self {
            Self::Solved { solves } => solves,
            Self::Moved | Self::MazeChanged => 0,
        }
    }

    /// Reports whether the maze was completed.
    #[must_use]
    pub const fn is_solved(self) -> bool {
        matches!(self, Self::Solved { .. })
    }
}

/// Closed set of solver policies, one case per [`Variant`].
#[derive(Clone, Debug)]
pub enum Policy {
    /// Uniform random walk.
    RandomWalk(RandomWalk),
    /// Charge-and-jump teleporter.
    RandomTeleport(RandomTeleport),
    /// Lattice-wide weighted walk.
    Learning(Learning),
    /// Left-hand wall follower.
    HoldLeft(WallFollower),
    /// Right-hand wall follower.
    Inverted(WallFollower),
    /// Tremaux junction marking.
    Tremaux(Tremaux),
    /// Rescue party.
    Rpg(Rpg),
    /// Accelerated scouting followed by replay.
    TimeTravel(TimeTravel),
    /// Forward-only cloning.
    Clone(Clones),
    /// Wall demolition.
    Demolitionist(Demolitionist),
    /// Flying swarm.
    Flying(Flying),
}

impl Policy {
    /// Creates the idle policy for `variant`; call [`Policy::setup`] before stepping.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        match variant {
            Variant::RandomWalk => Self::RandomWalk(RandomWalk::new()),
            Variant::RandomTeleport => Self::RandomTeleport(RandomTeleport::new()),
            Variant::Learning => Self::Learning(Learning::new()),
            Variant::HoldLeft => Self::HoldLeft(WallFollower::new(Hand::Left)),
            Variant::Inverted => Self::Inverted(WallFollower::new(Hand::Right)),
            Variant::Tremaux => Self::Tremaux(Tremaux::new()),
            Variant::Rpg => Self::Rpg(Rpg::new()),
            Variant::TimeTravel => Self::TimeTravel(TimeTravel::new()),
            Variant::Clone => Self::Clone(Clones::new()),
            Variant::Demolitionist => Self::Demolitionist(Demolitionist::new()),
            Variant::Flying => Self::Flying(Flying::new()),
        }
    }

    /// Variant implemented by the policy.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        match self {
            Self::RandomWalk(_) => Variant::RandomWalk,
            Self::RandomTeleport(_) => Variant::RandomTeleport,
            Self::Learning(_) => Variant::Learning,
            Self::HoldLeft(_) => Variant::HoldLeft,
            Self::Inverted(_) => Variant::Inverted,
            Self::Tremaux(_) => Variant::Tremaux,
            Self::Rpg(_) => Variant::Rpg,
            Self::TimeTravel(_) => Variant::TimeTravel,
            Self::Clone(_) => Variant::Clone,
            Self::Demolitionist(_) => Variant::Demolitionist,
            Self::Flying(_) => Variant::Flying,
        }
    }

    /// Resets agent state for a freshly generated maze.
    pub fn setup(&mut self, maze: &Maze, ctx: &mut StepContext<'_>) {
        match self {
            Self::RandomWalk(policy) => policy.setup(maze),
            Self::RandomTeleport(policy) => policy.setup(),
            Self::Learning(policy) => policy.setup(),
            Self::HoldLeft(policy) | Self::Inverted(policy) => policy.setup(),
            Self::Tremaux(policy) => policy.setup(maze),
            Self::Rpg(policy) => policy.setup(maze, ctx),
            Self::TimeTravel(policy) => policy.setup(maze),
            Self::Clone(policy) => policy.setup(),
            Self::Demolitionist(policy) => policy.setup(maze, ctx),
            Self::Flying(policy) => policy.setup(maze, ctx),
        }
    }

    /// Advances the policy by a single step.
    pub fn step(&mut self, maze: &mut Maze, ctx: &mut StepContext<'_>) -> StepOutcome {
        match self {
            Self::RandomWalk(policy) => policy.step(maze, ctx),
            Self::RandomTeleport(policy) => policy.step(maze, ctx),
            Self::Learning(policy) => policy.step(maze, ctx),
            Self::HoldLeft(policy) | Self::Inverted(policy) => policy.step(maze),
            Self::Tremaux(policy) => policy.step(maze, ctx),
            Self::Rpg(policy) => policy.step(maze),
            Self::TimeTravel(policy) => policy.step(maze, ctx),
            Self::Clone(policy) => policy.step(maze, ctx),
            Self::Demolitionist(policy) => policy.step(maze),
            Self::Flying(policy) => policy.step(),
        }
    }

    /// Simulated microseconds the next step takes.
    #[must_use]
    pub fn step_duration(&self, upgrades: Upgrades) -> u64 {
        let duration = match self {
            Self::Learning(policy) => policy.step_duration(),
            Self::Tremaux(policy) => policy.step_duration(upgrades),
            Self::TimeTravel(policy) => policy.step_duration(),
            Self::Demolitionist(policy) => policy.step_duration(upgrades),
            Self::Flying(_) => Flying::step_duration(upgrades),
            Self::RandomWalk(_)
            | Self::RandomTeleport(_)
            | Self::HoldLeft(_)
            | Self::Inverted(_)
            | Self::Rpg(_)
            | Self::Clone(_) => snail_maze_core::SNAIL_MOVEMENT_TIME,
        };
        duration.max(1)
    }

    /// Appends the drawable state of the policy to `scene`.
    pub fn scene(&self, scene: &mut Scene) {
        match self {
            Self::RandomWalk(policy) => policy.scene(scene),
            Self::RandomTeleport(policy) => policy.scene(scene),
            Self::Learning(policy) => policy.scene(scene),
            Self::HoldLeft(policy) | Self::Inverted(policy) => policy.scene(scene),
            Self::Tremaux(policy) => policy.scene(scene, Tone::Active),
            Self::Rpg(policy) => policy.scene(scene),
            Self::TimeTravel(policy) => policy.scene(scene),
            Self::Clone(policy) => policy.scene(scene),
            Self::Demolitionist(policy) => policy.scene(scene),
            Self::Flying(policy) => policy.scene(scene),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_policy() {
        for variant in Variant::ALL {
            assert_eq!(Policy::new(variant).variant(), variant);
        }
    }

    #[test]
    fn step_durations_follow_variant_speed() {
        let base = snail_maze_core::SNAIL_MOVEMENT_TIME;
        let upgrades = Upgrades::default();
        assert_eq!(
            Policy::new(Variant::RandomWalk).step_duration(upgrades),
            base
        );
        assert_eq!(
            Policy::new(Variant::Learning).step_duration(upgrades),
            base / 2
        );
        assert_eq!(
            Policy::new(Variant::TimeTravel).step_duration(upgrades),
            base / 8
        );
        assert_eq!(
            Policy::new(Variant::Flying).step_duration(upgrades),
            base * 10
        );
        assert_eq!(
            Policy::new(Variant::Flying).step_duration(Upgrades::from_mask(1)),
            base * 5
        );
    }

    #[test]
    fn outcome_reports_solves() {
        assert_eq!(StepOutcome::Solved { solves: 3 }.solves(), 3);
        assert_eq!(StepOutcome::MazeChanged.solves(), 0);
        assert!(!StepOutcome::Moved.is_solved());
    }
}
