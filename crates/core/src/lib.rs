//! Simulation kernel - pure, deterministic, and testable
//!
//! Everything needed to run one player's falling-block board: shape tables,
//! the rotation/movement state machine, line clearing, garbage injection,
//! and the match-session orchestrator that ties them together. The kernel
//! has no I/O, no clocks, and no ambient randomness - byte-identical inputs
//! and configuration produce byte-identical boards, which is what lets a
//! server and every client simulate the same match independently without
//! drifting apart.
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 playfield with collision tests, line clears, garbage
//! - [`piece`]: one falling unit - rotate through kick tables, move, lock
//! - [`rotation`]: shape table plus the external rotation-rules loader
//! - [`queue`]: seeded 7-bag shape generation and preview window
//! - [`garbage`]: FIFO of pending attacks awaiting injection
//! - [`session`]: the orchestrator driving spawn, gravity, lock and garbage
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gridfall_core::{MatchSession, RotationSystem};
//! use gridfall_types::{Command, MatchConfig};
//!
//! let rules = Arc::new(RotationSystem::standard());
//! let mut session = MatchSession::new(rules, MatchConfig::default(), 12345);
//! session.start();
//!
//! session.command(Command::MoveLeft);
//! session.command(Command::RotateCw);
//! session.command(Command::HardDrop);
//!
//! assert!(session.take_last_event().is_some());
//! ```

pub mod board;
pub mod garbage;
pub mod piece;
pub mod queue;
pub mod rotation;
pub mod session;

pub use gridfall_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use garbage::{GarbageEntry, GarbageQueue};
pub use piece::Piece;
pub use queue::{PieceQueue, SimpleRng};
pub use rotation::{ConfigError, KickSet, RotationSystem, ShapeData, TileMap};
pub use session::{LockEvent, MatchSession, SessionState};
