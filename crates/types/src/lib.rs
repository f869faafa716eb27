//! Core types shared across the workspace
//!
//! Pure data types with no external dependencies. All coordinates follow the
//! kernel convention: row 0 is the bottom of the board, x grows rightward.

/// Board dimensions
pub const BOARD_WIDTH: u8 = 10;
pub const BOARD_HEIGHT: u8 = 20;

/// Canonical spawn anchor (bottom-left corner of the piece's tile map).
///
/// Spawn maps occupy the upper rows of their box, so a freshly spawned piece
/// sits in the top rows of the visible field.
pub const SPAWN_X: i8 = 3;
pub const SPAWN_Y: i8 = (BOARD_HEIGHT as i8) - 3;

/// Maximum number of lock-delay resets granted per piece. Once spent, the
/// next grounded lock-delay expiry commits the piece no matter what.
pub const LOCK_RESET_LIMIT: u8 = 15;

/// Preview-queue depth used when the lobby does not override it.
pub const DEFAULT_NUM_PREVIEWS: usize = 5;

/// The falling shapes: the seven canonical tetrominoes plus the non-rotating
/// garbage block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    L,
    J,
    S,
    Z,
    T,
    Garbage,
}

impl PieceKind {
    /// The seven spawnable shapes, in bag order.
    pub const BAG: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
    ];

    /// The cell tag this shape stamps into the board when it locks.
    pub fn tile(&self) -> Tile {
        match self {
            PieceKind::I => Tile::I,
            PieceKind::O => Tile::O,
            PieceKind::L => Tile::L,
            PieceKind::J => Tile::J,
            PieceKind::S => Tile::S,
            PieceKind::Z => Tile::Z,
            PieceKind::T => Tile::T,
            PieceKind::Garbage => Tile::Garbage,
        }
    }

    /// Parse a shape name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "l" => Some(PieceKind::L),
            "j" => Some(PieceKind::J),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "t" => Some(PieceKind::T),
            "garbage" => Some(PieceKind::Garbage),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::L => "l",
            PieceKind::J => "j",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::T => "t",
            PieceKind::Garbage => "garbage",
        }
    }
}

/// State of a single board cell.
///
/// Everything except `Empty` behaves identically for collision and
/// line-clear purposes; the shape tags exist so renderers can colour locked
/// cells by the piece that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Empty,
    Garbage,
    I,
    O,
    L,
    J,
    S,
    Z,
    T,
}

impl Tile {
    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty)
    }

    pub fn is_filled(&self) -> bool {
        !self.is_empty()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

/// The four orientation states, cyclic under rotation.
///
/// `E` is the spawn orientation; `R` is one clockwise step from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    E,
    R,
    R2,
    R3,
}

impl Orientation {
    /// One clockwise step
    pub fn cw(&self) -> Self {
        match self {
            Orientation::E => Orientation::R,
            Orientation::R => Orientation::R2,
            Orientation::R2 => Orientation::R3,
            Orientation::R3 => Orientation::E,
        }
    }

    /// One counter-clockwise step
    pub fn ccw(&self) -> Self {
        match self {
            Orientation::E => Orientation::R3,
            Orientation::R3 => Orientation::R2,
            Orientation::R2 => Orientation::R,
            Orientation::R => Orientation::E,
        }
    }

    /// Two steps; the direction taken is immaterial.
    pub fn half(&self) -> Self {
        match self {
            Orientation::E => Orientation::R2,
            Orientation::R => Orientation::R3,
            Orientation::R2 => Orientation::E,
            Orientation::R3 => Orientation::R,
        }
    }

    /// The orientation reached by applying `spin` from here.
    pub fn apply(&self, spin: Spin) -> Self {
        match spin {
            Spin::Cw => self.cw(),
            Spin::Ccw => self.ccw(),
            Spin::Half => self.half(),
        }
    }

    /// Stable index used to address per-orientation tables.
    pub fn index(&self) -> usize {
        match self {
            Orientation::E => 0,
            Orientation::R => 1,
            Orientation::R2 => 2,
            Orientation::R3 => 3,
        }
    }

    pub const ALL: [Orientation; 4] = [
        Orientation::E,
        Orientation::R,
        Orientation::R2,
        Orientation::R3,
    ];
}

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Cw,
    Ccw,
    Half,
}

/// Single-step movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Down,
}

/// Discrete player inputs consumed by a match session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    RotateHalf,
    Hold,
}

/// Numeric match settings agreed in the lobby and distributed to every
/// participant alongside the rotation-system rules.
///
/// Gravity is measured in cells per second; `gravity_increase` is added to
/// the current gravity every `gravity_increase_interval` seconds. The lock
/// delay is the grounded time, in seconds, before a piece commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub num_previews: usize,
    pub init_gravity: f64,
    pub gravity_increase: f64,
    pub gravity_increase_interval: f64,
    pub lock_delay: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            num_previews: DEFAULT_NUM_PREVIEWS,
            init_gravity: 1.0,
            gravity_increase: 0.5,
            gravity_increase_interval: 30.0,
            lock_delay: 0.5,
        }
    }
}
