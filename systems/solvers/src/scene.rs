use snail_maze_core::{CellCoord, Direction};

use crate::Agent;

/// Colour role of a drawn snail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Regular moving snail.
    Active,
    /// Snail that is waiting or has stopped.
    Idle,
    /// Lost snail awaiting rescue.
    Lost,
    /// Right-handed snail drawn with the inverted palette.
    Mirrored,
    /// Member of a flying swarm.
    Swarm,
}

/// Snail interpolated between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AgentSprite {
    /// Cell the sprite leaves.
    pub from: CellCoord,
    /// Cell the sprite arrives at once the step completes.
    pub to: CellCoord,
    /// Facing direction.
    pub heading: Direction,
    /// Colour role.
    pub tone: Tone,
    /// Pixel offset applied after interpolation.
    pub offset: [i8; 2],
}

impl AgentSprite {
    /// Sprite for `agent`, greyed out when it is inactive.
    #[must_use]
    pub fn of(agent: &Agent, tone: Tone) -> Self {
        Self {
            from: agent.previous,
            to: agent.cell,
            heading: agent.heading,
            tone: if agent.active { tone } else { Tone::Idle },
            offset: [0, 0],
        }
    }
}

/// Tremaux mark drawn along one side of a junction cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrailMark {
    /// Junction cell.
    pub cell: CellCoord,
    /// Side carrying the mark.
    pub direction: Direction,
    /// Number of times the passage was marked.
    pub count: u8,
}

/// Lifecycle of a demolition charge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BombState {
    /// Fuse still burning.
    Lit,
    /// Blast in progress.
    Exploding,
}

/// Bomb drawn on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BombSprite {
    /// Cell holding the bomb.
    pub cell: CellCoord,
    /// Current lifecycle state.
    pub state: BombState,
}

/// Progress bar shown under a charging teleporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Charge {
    /// Cell the bar is drawn under.
    pub cell: CellCoord,
    /// Steps charged so far.
    pub elapsed: u32,
    /// Steps needed for a full charge.
    pub period: u32,
}

/// Everything a policy wants drawn on top of its maze.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene {
    /// Snails, drawn last.
    pub agents: Vec<AgentSprite>,
    /// Junction marks.
    pub marks: Vec<TrailMark>,
    /// Cells highlighted as a known route.
    pub path: Vec<CellCoord>,
    /// Pending bombs.
    pub bombs: Vec<BombSprite>,
    /// Optional teleport charge bar.
    pub charge: Option<Charge>,
}

impl Scene {
    /// Empties the scene while keeping allocations.
    pub fn clear(&mut self) {
        self.agents.clear();
        self.marks.clear();
        self.path.clear();
        self.bombs.clear();
        self.charge = None;
    }
}
