//! Match session - the simulation orchestrator for one player's board
//!
//! Drives spawn-from-queue, gravity ticks, lock commitment and garbage
//! application on top of the piece/board kernel. One session is owned and
//! driven by exactly one authority - the server, or a client predicting its
//! own board - and everything here is synchronous: operations run to
//! completion, there is no internal locking, and timing policy arrives as
//! configuration, never as a blocking wait. Sessions for distinct players
//! share no mutable state and may be advanced in parallel by their owners.

use std::sync::Arc;

use gridfall_types::{
    Command, Direction, MatchConfig, PieceKind, Spin, BOARD_HEIGHT, BOARD_WIDTH,
    LOCK_RESET_LIMIT,
};

use crate::board::Board;
use crate::garbage::{GarbageEntry, GarbageQueue};
use crate::piece::Piece;
use crate::queue::{PieceQueue, SimpleRng};
use crate::rotation::RotationSystem;

/// Whether the session is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    ToppedOut,
}

/// What happened at the most recent lock commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    pub piece: PieceKind,
    pub lines_cleared: u8,
    /// Kick index of the last successful rotation before the lock, if the
    /// final action on the piece was a rotation. External scoring uses this
    /// for spin bonuses.
    pub kick: Option<usize>,
    /// Garbage rows injected between this lock and the next spawn.
    pub garbage_received: u8,
    pub topped_out: bool,
}

/// One player's running simulation.
#[derive(Debug, Clone)]
pub struct MatchSession {
    rules: Arc<RotationSystem>,
    config: MatchConfig,
    board: Board,
    queue: PieceQueue,
    garbage: GarbageQueue,
    /// Gap-column stream; seeded alongside the piece queue so replicas of
    /// this board place garbage gaps identically.
    rng: SimpleRng,
    active: Option<Piece>,
    held: Option<PieceKind>,
    can_hold: bool,
    gravity: f64,
    gravity_timer: f64,
    ramp_timer: f64,
    lock_timer: f64,
    lock_resets: u8,
    last_kick: Option<usize>,
    lines_cleared: u32,
    last_event: Option<LockEvent>,
    state: SessionState,
    started: bool,
}

impl MatchSession {
    pub fn new(rules: Arc<RotationSystem>, config: MatchConfig, seed: u32) -> Self {
        Self {
            rules,
            config,
            board: Board::new(),
            queue: PieceQueue::new(seed),
            garbage: GarbageQueue::new(),
            rng: SimpleRng::new(seed ^ 0x9e37_79b9),
            active: None,
            held: None,
            can_hold: true,
            gravity: config.init_gravity,
            gravity_timer: 0.0,
            ramp_timer: 0.0,
            lock_timer: 0.0,
            lock_resets: 0,
            last_kick: None,
            lines_cleared: 0,
            last_event: None,
            state: SessionState::Running,
            started: false,
        }
    }

    /// Spawn the first piece and begin play.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let kind = self.queue.draw();
        self.spawn_piece(kind);
    }

    /// Advance timers by `dt` seconds: gravity ramp, gravity descent while
    /// airborne, lock delay while grounded (forced lock on expiry).
    pub fn tick(&mut self, dt: f64) {
        if !self.started || self.state == SessionState::ToppedOut {
            return;
        }

        if self.config.gravity_increase > 0.0 && self.config.gravity_increase_interval > 0.0 {
            self.ramp_timer += dt;
            while self.ramp_timer >= self.config.gravity_increase_interval {
                self.ramp_timer -= self.config.gravity_increase_interval;
                self.gravity += self.config.gravity_increase;
            }
        }

        let Some(piece) = self.active.as_mut() else {
            return;
        };

        if piece.test_collision(&self.board, 0, -1) {
            self.gravity_timer = 0.0;
            self.lock_timer += dt;
            if self.lock_timer >= self.config.lock_delay {
                self.lock_active();
            }
        } else {
            self.gravity_timer += dt * self.gravity;
            while self.gravity_timer >= 1.0 {
                self.gravity_timer -= 1.0;
                if !piece.gravity(&self.board) {
                    break;
                }
            }
        }
    }

    /// Apply one discrete input. Returns whether it changed anything.
    pub fn command(&mut self, command: Command) -> bool {
        if !self.started || self.state == SessionState::ToppedOut {
            return false;
        }
        match command {
            Command::MoveLeft => self.shift_active(Direction::Left),
            Command::MoveRight => self.shift_active(Direction::Right),
            Command::SoftDrop => self.shift_active(Direction::Down),
            Command::HardDrop => self.hard_drop_active(),
            Command::RotateCw => self.rotate_active(Spin::Cw),
            Command::RotateCcw => self.rotate_active(Spin::Ccw),
            Command::RotateHalf => self.rotate_active(Spin::Half),
            Command::Hold => self.hold(),
        }
    }

    /// Buffer an opponent's attack; it lands after the current piece locks.
    pub fn queue_garbage(&mut self, entry: GarbageEntry) {
        self.garbage.push(entry);
    }

    fn shift_active(&mut self, direction: Direction) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        if !piece.shift(direction, &self.board) {
            return false;
        }
        let grounded = piece.test_collision(&self.board, 0, -1);
        self.last_kick = None;
        if grounded {
            self.reset_lock_timer();
        }
        true
    }

    fn rotate_active(&mut self, spin: Spin) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        match piece.rotate(spin, &self.board) {
            Some(index) => {
                self.last_kick = Some(index);
                self.reset_lock_timer();
                true
            }
            None => false,
        }
    }

    fn reset_lock_timer(&mut self) {
        if self.lock_resets < LOCK_RESET_LIMIT {
            self.lock_timer = 0.0;
            self.lock_resets += 1;
        }
    }

    fn hard_drop_active(&mut self) -> bool {
        let Some(mut piece) = self.active.take() else {
            return false;
        };
        piece.hard_drop(&mut self.board);
        self.finish_lock(piece);
        true
    }

    /// Forced lock at lock-delay expiry.
    fn lock_active(&mut self) {
        let Some(mut piece) = self.active.take() else {
            return;
        };
        if !piece.place(&mut self.board) {
            // The re-check caught a cell filled under the piece since the
            // last move; nothing legal remains for this board.
            self.state = SessionState::ToppedOut;
            self.last_event = Some(LockEvent {
                piece: piece.kind(),
                lines_cleared: 0,
                kick: self.last_kick,
                garbage_received: 0,
                topped_out: true,
            });
            return;
        }
        self.finish_lock(piece);
    }

    /// Post-placement bookkeeping: line clears, pending garbage, next spawn.
    fn finish_lock(&mut self, piece: Piece) {
        // A piece that locked entirely above the visible field is a loss.
        let out_of_field = piece.cells().all(|(_, y)| y >= BOARD_HEIGHT as i8);

        let cleared = self.board.clear_full_rows();
        self.lines_cleared += cleared.len() as u32;

        let mut topped = out_of_field;
        let mut received: u8 = 0;
        if !topped {
            // FIFO layout: each attack lands directly above the one queued
            // before it, so the oldest garbage ends up closest to the floor.
            let mut base: usize = 0;
            while let Some(entry) = self.garbage.pop() {
                let gap = self.rng.next_range(BOARD_WIDTH as u32) as u8;
                if !self.board.inject_garbage_at(base, entry.lines, gap) {
                    topped = true;
                    break;
                }
                base += entry.lines as usize;
                received = received.saturating_add(entry.lines);
            }
        }

        let kick = self.last_kick;
        self.can_hold = true;

        if topped {
            self.state = SessionState::ToppedOut;
            self.active = None;
        } else {
            let kind = self.queue.draw();
            self.spawn_piece(kind);
        }

        self.last_event = Some(LockEvent {
            piece: piece.kind(),
            lines_cleared: cleared.len() as u8,
            kick,
            garbage_received: received,
            topped_out: self.state == SessionState::ToppedOut,
        });
    }

    fn spawn_piece(&mut self, kind: PieceKind) {
        let piece = self.rules.spawn(kind);
        if self.board.collides(piece.tile_map(), piece.x(), piece.y()) {
            self.state = SessionState::ToppedOut;
            self.active = None;
        } else {
            self.active = Some(piece);
        }
        self.gravity_timer = 0.0;
        self.lock_timer = 0.0;
        self.lock_resets = 0;
        self.last_kick = None;
    }

    fn hold(&mut self) -> bool {
        if !self.can_hold {
            return false;
        }
        let Some(active) = self.active.take() else {
            return false;
        };
        let kind = active.kind();
        let next = match self.held.replace(kind) {
            Some(stored) => stored,
            None => self.queue.draw(),
        };
        self.spawn_piece(next);
        self.can_hold = false;
        self.state == SessionState::Running
    }

    // ---- read API ----

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn held(&self) -> Option<PieceKind> {
        self.held
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    /// Upcoming shapes, as deep as the configured preview window.
    pub fn preview(&mut self) -> Vec<PieceKind> {
        let count = self.config.num_previews;
        self.queue.preview(count)
    }

    pub fn garbage_pending(&self) -> u32 {
        self.garbage.pending_lines()
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn rules(&self) -> &Arc<RotationSystem> {
        &self.rules
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topped_out(&self) -> bool {
        self.state == SessionState::ToppedOut
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Take and clear the most recent lock event.
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }
}
