//! Board module - the playfield grid
//!
//! A 10x20 grid of tiles with row 0 at the bottom. Flat array storage for
//! cache locality and zero-allocation operations. Cells change only through
//! piece placement, line clears, and garbage shifts; the dimensions are fixed
//! at construction.
//!
//! Rows above the stored grid are legal airspace: a piece may occupy and
//! rotate through them (this is what makes spawning and spinning near the
//! ceiling possible), but nothing can be stored there.

use arrayvec::ArrayVec;

use gridfall_types::{Tile, BOARD_HEIGHT, BOARD_WIDTH};

use crate::rotation::TileMap;

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// The playfield - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Flat array of tiles, row-major order (y * WIDTH + x), row 0 bottom
    cells: [Tile; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [Tile::Empty; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get the tile at (x, y); `None` if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Tile> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set the tile at (x, y); returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, tile: Tile) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = tile;
                true
            }
            None => false,
        }
    }

    /// Collision test for a tile map anchored at (x, y).
    ///
    /// An occupied map cell collides when it falls below the floor, outside
    /// the side walls, or on a filled board cell. Cells above the top of the
    /// board never collide.
    pub fn collides(&self, map: &TileMap, x: i8, y: i8) -> bool {
        for (dx, dy) in map.occupied() {
            let cx = x + dx;
            let cy = y + dy;
            if cx < 0 || cx >= BOARD_WIDTH as i8 || cy < 0 {
                return true;
            }
            if cy >= BOARD_HEIGHT as i8 {
                continue;
            }
            if self.cells[(cy as usize) * (BOARD_WIDTH as usize) + (cx as usize)].is_filled() {
                return true;
            }
        }
        false
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|tile| tile.is_filled())
    }

    /// Remove every full row in one pass and return their indices
    /// (bottom to top).
    ///
    /// Rows above each removed row shift down by the number of removed rows
    /// below them; fresh empty rows enter at the top. Two-pointer compaction,
    /// no allocation.
    pub fn clear_full_rows(&mut self) -> ArrayVec<usize, 4> {
        let mut cleared = ArrayVec::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = 0usize;

        for read_y in 0..BOARD_HEIGHT as usize {
            if self.is_row_full(read_y) {
                cleared.push(read_y);
            } else {
                if write_y != read_y {
                    let src = read_y * width;
                    self.cells.copy_within(src..src + width, write_y * width);
                }
                write_y += 1;
            }
        }

        for y in write_y..BOARD_HEIGHT as usize {
            let start = y * width;
            for tile in &mut self.cells[start..start + width] {
                *tile = Tile::Empty;
            }
        }

        cleared
    }

    /// Insert `lines` garbage rows at the bottom, each fully filled except
    /// the single `gap` column; existing rows shift upward.
    ///
    /// Returns false when the shift would push any filled cell above the top
    /// of the board - the top-out condition. The board is left untouched in
    /// that case.
    pub fn inject_garbage(&mut self, lines: u8, gap: u8) -> bool {
        self.inject_garbage_at(0, lines, gap)
    }

    /// Insert garbage rows starting at `row`, shifting only the rows at or
    /// above it. Draining a garbage queue uses this with a running base so
    /// the first-queued attack ends up closest to the floor.
    pub fn inject_garbage_at(&mut self, row: usize, lines: u8, gap: u8) -> bool {
        debug_assert!((gap as usize) < BOARD_WIDTH as usize);
        let n = lines as usize;
        if n == 0 {
            return true;
        }
        let width = BOARD_WIDTH as usize;
        let height = BOARD_HEIGHT as usize;
        if row + n > height {
            return false;
        }

        for y in height - n..height {
            let start = y * width;
            if self.cells[start..start + width].iter().any(|t| t.is_filled()) {
                return false;
            }
        }

        for y in (row + n..height).rev() {
            let src = (y - n) * width;
            self.cells.copy_within(src..src + width, y * width);
        }
        for y in row..row + n {
            for x in 0..width {
                self.cells[y * width + x] = if x == gap as usize {
                    Tile::Empty
                } else {
                    Tile::Garbage
                };
            }
        }
        true
    }

    /// Reference to the internal tile array (row-major, row 0 first)
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for tile in &mut self.cells {
            *tile = Tile::Empty;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
