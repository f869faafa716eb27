//! Piece module - the live state of one falling unit
//!
//! A piece is an anchor position (bottom-left corner of its tile map), an
//! orientation, and a reference to its immutable shape definition. Rotation
//! walks the shape's kick table in order and commits the first offset that
//! fits; movement is a single-step translate-and-test. Once `place` stamps
//! the piece into the board it is spent - its cells live on only as board
//! state.

use std::sync::Arc;

use gridfall_types::{Direction, Orientation, PieceKind, Spin};

use crate::board::Board;
use crate::rotation::{ShapeData, TileMap};

/// One falling piece. Exactly one non-placed piece exists per board.
#[derive(Debug, Clone)]
pub struct Piece {
    shape: Arc<ShapeData>,
    x: i8,
    y: i8,
    orientation: Orientation,
    placed: bool,
}

impl Piece {
    pub(crate) fn new(shape: Arc<ShapeData>, x: i8, y: i8) -> Self {
        Self {
            shape,
            x,
            y,
            orientation: Orientation::E,
            placed: false,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.shape.kind()
    }

    pub fn x(&self) -> i8 {
        self.x
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// The occupancy grid for the current orientation.
    pub fn tile_map(&self) -> &TileMap {
        self.shape.map(self.orientation)
    }

    /// Absolute board coordinates of the occupied cells.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        let (x, y) = (self.x, self.y);
        self.tile_map().occupied().map(move |(dx, dy)| (x + dx, y + dy))
    }

    /// Attempt a rotation, resolving blocked positions through the shape's
    /// kick table for `spin`, indexed by the current orientation.
    ///
    /// Offsets are tried strictly in table order; the first collision-free
    /// candidate commits orientation and anchor, and its index is returned
    /// (0 means the identity offset - no kick was needed). If every offset
    /// collides the piece is left completely unchanged and `None` is
    /// returned; retrying without the board changing cannot succeed.
    pub fn rotate(&mut self, spin: Spin, board: &Board) -> Option<usize> {
        let target = self.orientation.apply(spin);
        let map = self.shape.map(target);
        let offsets = self.shape.kicks().offsets(spin, self.orientation);

        for (index, &(dx, dy)) in offsets.iter().enumerate() {
            let x = self.x + dx;
            let y = self.y + dy;
            if !board.collides(map, x, y) {
                self.orientation = target;
                self.x = x;
                self.y = y;
                return Some(index);
            }
        }
        None
    }

    /// Translate one step in `direction`; commits and returns true only when
    /// the moved grid is collision-free.
    pub fn shift(&mut self, direction: Direction, board: &Board) -> bool {
        let (dx, dy) = match direction {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
        };
        if board.collides(self.tile_map(), self.x + dx, self.y + dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// One gravity step. The caller owns the timing.
    pub fn gravity(&mut self, board: &Board) -> bool {
        self.shift(Direction::Down, board)
    }

    /// Collision test for the current grid translated by `(dx, dy)`.
    pub fn test_collision(&self, board: &Board, dx: i8, dy: i8) -> bool {
        board.collides(self.tile_map(), self.x + dx, self.y + dy)
    }

    /// Drop straight down to the resting position and commit placement
    /// there. Returns the number of rows descended.
    pub fn hard_drop(&mut self, board: &mut Board) -> u8 {
        let mut rows = 0;
        while self.shift(Direction::Down, board) {
            rows += 1;
        }
        let placed = self.place(board);
        debug_assert!(placed, "descent stops on the last collision-free anchor");
        rows
    }

    /// Stamp the piece's cells into the board and mark it placed.
    ///
    /// Re-validates the current position first: on collision nothing is
    /// mutated and false is returned, letting an integration layer that
    /// raced a lock-delay expiry against a late move re-check safely.
    pub fn place(&mut self, board: &mut Board) -> bool {
        if board.collides(self.tile_map(), self.x, self.y) {
            return false;
        }
        let tile = self.kind().tile();
        // Cells above the top of the board have nowhere to go; the session
        // treats a fully out-of-field lock as a top-out.
        for (x, y) in self.cells() {
            board.set(x, y, tile);
        }
        self.placed = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_types::{Tile, BOARD_HEIGHT, BOARD_WIDTH, SPAWN_Y};

    use crate::rotation::RotationSystem;

    fn rules() -> RotationSystem {
        RotationSystem::standard()
    }

    #[test]
    fn spawn_position_and_orientation() {
        let piece = rules().spawn(PieceKind::S);
        assert_eq!(piece.orientation(), Orientation::E);
        assert_eq!(piece.x(), gridfall_types::SPAWN_X);
        assert_eq!(piece.y(), SPAWN_Y);
        assert!(!piece.is_placed());
    }

    #[test]
    fn rotate_on_empty_board_needs_no_kick() {
        let board = Board::new();
        for kind in PieceKind::BAG {
            let mut piece = rules().spawn(kind);
            assert_eq!(piece.rotate(Spin::Cw, &board), Some(0), "{:?}", kind);
            assert_eq!(piece.orientation(), Orientation::R);
        }
    }

    #[test]
    fn rotate_cw_then_ccw_restores_state() {
        let board = Board::new();
        for kind in PieceKind::BAG {
            let mut piece = rules().spawn(kind);
            let (x, y) = (piece.x(), piece.y());
            piece.rotate(Spin::Cw, &board).unwrap();
            piece.rotate(Spin::Ccw, &board).unwrap();
            assert_eq!(piece.orientation(), Orientation::E);
            assert_eq!((piece.x(), piece.y()), (x, y));
        }
    }

    #[test]
    fn rejected_rotation_leaves_piece_unchanged() {
        let mut board = Board::new();
        // Box the piece in on every side except where it already is.
        for x in 0..BOARD_WIDTH as i8 {
            for y in 0..BOARD_HEIGHT as i8 {
                board.set(x, y, Tile::Garbage);
            }
        }
        // Carve a vertical 1x4 slot at column 4.
        for y in 2..6 {
            board.set(4, y, Tile::Empty);
        }
        let mut piece = rules().spawn(PieceKind::I);
        // Teleport the I piece into the slot in its vertical orientation.
        piece.x = 2;
        piece.y = 2;
        piece.orientation = Orientation::R;
        assert!(!board.collides(piece.tile_map(), piece.x, piece.y));

        let before = (piece.x(), piece.y(), piece.orientation());
        assert_eq!(piece.rotate(Spin::Cw, &board), None);
        assert_eq!((piece.x(), piece.y(), piece.orientation()), before);
    }

    #[test]
    fn wall_kick_shifts_off_the_wall() {
        let board = Board::new();
        let mut piece = rules().spawn(PieceKind::T);
        piece.orientation = Orientation::R;
        // Hug the left wall in the R orientation (occupied column 1), then
        // rotate so the target grid would poke through the wall.
        piece.x = -1;
        piece.y = 5;
        assert!(!board.collides(piece.tile_map(), piece.x, piece.y));

        let kick = piece.rotate(Spin::Half, &board);
        // Identity-only half table: flipping T at the wall must fail...
        assert_eq!(kick, None);

        // ...while a CW rotation resolves through a non-identity kick.
        let kick = piece.rotate(Spin::Cw, &board).unwrap();
        assert!(kick > 0);
        assert_eq!(piece.orientation(), Orientation::R2);
    }

    #[test]
    fn shift_blocked_by_walls() {
        let board = Board::new();
        let mut piece = rules().spawn(PieceKind::O);
        let mut steps = 0;
        while piece.shift(Direction::Left, &board) {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert!(!piece.shift(Direction::Left, &board));
        assert_eq!(piece.x(), -1);
    }

    #[test]
    fn gravity_descends_one_row() {
        let board = Board::new();
        let mut piece = rules().spawn(PieceKind::T);
        let y = piece.y();
        assert!(piece.gravity(&board));
        assert_eq!(piece.y(), y - 1);
    }

    #[test]
    fn hard_drop_rests_on_floor() {
        let mut board = Board::new();
        let mut piece = rules().spawn(PieceKind::O);
        let rows = piece.hard_drop(&mut board);
        assert!(piece.is_placed());
        assert_eq!(rows as i8, SPAWN_Y);
        // O occupies map rows 0-1, so after the drop the bottom two rows
        // carry its cells.
        assert_eq!(board.get(4, 0), Some(Tile::O));
        assert_eq!(board.get(5, 1), Some(Tile::O));
    }

    #[test]
    fn hard_drop_stacks_on_filled_cells() {
        let mut board = Board::new();
        for x in 0..BOARD_WIDTH as i8 {
            board.set(x, 0, Tile::Garbage);
        }
        let mut piece = rules().spawn(PieceKind::O);
        piece.hard_drop(&mut board);
        assert_eq!(board.get(4, 1), Some(Tile::O));
        assert_eq!(board.get(4, 2), Some(Tile::O));
    }

    #[test]
    fn place_rejects_collision_without_mutation() {
        let mut board = Board::new();
        board.set(4, SPAWN_Y + 1, Tile::Garbage);
        let before = board.clone();

        let mut piece = rules().spawn(PieceKind::O);
        assert!(piece.test_collision(&board, 0, 0));
        assert!(!piece.place(&mut board));
        assert!(!piece.is_placed());
        assert_eq!(board, before);
    }

    #[test]
    fn place_stamps_shape_tag() {
        let mut board = Board::new();
        let mut piece = rules().spawn(PieceKind::S);
        assert!(piece.place(&mut board));
        assert!(piece.is_placed());
        let stamped: Vec<_> = board.cells().iter().filter(|t| t.is_filled()).collect();
        assert_eq!(stamped.len(), 4);
        assert!(stamped.iter().all(|&&t| t == Tile::S));
    }
}
