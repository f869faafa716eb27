//! Board tests - line clearing and garbage behavior

use gridfall::core::Board;
use gridfall::types::{Tile, BOARD_HEIGHT, BOARD_WIDTH};

fn fill_row(board: &mut Board, y: i8, tile: Tile) {
    for x in 0..BOARD_WIDTH as i8 {
        board.set(x, y, tile);
    }
}

#[test]
fn test_new_board_is_empty() {
    let board = Board::new();
    assert_eq!(board.width(), BOARD_WIDTH);
    assert_eq!(board.height(), BOARD_HEIGHT);
    assert!(board.cells().iter().all(|t| t.is_empty()));
}

#[test]
fn test_bottom_row_clear_shifts_everything_down_once() {
    let mut board = Board::new();
    fill_row(&mut board, 0, Tile::Garbage);

    // Arbitrary partial pattern above the full row.
    board.set(0, 1, Tile::I);
    board.set(7, 1, Tile::J);
    board.set(3, 2, Tile::S);
    board.set(9, 5, Tile::Z);

    let cleared = board.clear_full_rows();
    assert_eq!(cleared.as_slice(), &[0]);

    // Every surviving cell dropped exactly one row, column preserved.
    assert_eq!(board.get(0, 0), Some(Tile::I));
    assert_eq!(board.get(7, 0), Some(Tile::J));
    assert_eq!(board.get(3, 1), Some(Tile::S));
    assert_eq!(board.get(9, 4), Some(Tile::Z));

    // One fresh empty row entered at the top.
    let top = (BOARD_HEIGHT - 1) as i8;
    for x in 0..BOARD_WIDTH as i8 {
        assert_eq!(board.get(x, top), Some(Tile::Empty));
    }
}

#[test]
fn test_all_full_rows_clear_simultaneously() {
    let mut board = Board::new();
    fill_row(&mut board, 1, Tile::L);
    fill_row(&mut board, 3, Tile::T);
    board.set(2, 0, Tile::I);
    board.set(2, 2, Tile::O);
    board.set(2, 4, Tile::S);

    let cleared = board.clear_full_rows();
    assert_eq!(cleared.as_slice(), &[1, 3]);

    // Markers drop by the number of full rows below them.
    assert_eq!(board.get(2, 0), Some(Tile::I));
    assert_eq!(board.get(2, 1), Some(Tile::O));
    assert_eq!(board.get(2, 2), Some(Tile::S));
}

#[test]
fn test_partially_filled_rows_survive() {
    let mut board = Board::new();
    for x in 0..(BOARD_WIDTH - 1) as i8 {
        board.set(x, 0, Tile::Z);
    }
    assert!(board.clear_full_rows().is_empty());
    assert_eq!(board.get(0, 0), Some(Tile::Z));
}

#[test]
fn test_garbage_rows_carry_exactly_one_gap() {
    let mut board = Board::new();
    assert!(board.inject_garbage(4, 7));

    for y in 0..4 {
        let gaps = (0..BOARD_WIDTH as i8)
            .filter(|&x| board.get(x, y) == Some(Tile::Empty))
            .count();
        assert_eq!(gaps, 1);
        assert_eq!(board.get(7, y), Some(Tile::Empty));
    }
    assert!(board.cells()[4 * BOARD_WIDTH as usize..]
        .iter()
        .all(|t| t.is_empty()));
}

#[test]
fn test_garbage_never_clips_the_stack() {
    let mut board = Board::new();
    // A full-height column makes any garbage insertion overflow.
    for y in 0..BOARD_HEIGHT as i8 {
        board.set(4, y, Tile::J);
    }
    let before = board.clone();
    assert!(!board.inject_garbage(1, 2));
    assert_eq!(board, before);
}

#[test]
fn test_sequential_garbage_batches_stack_bottom_up() {
    let mut board = Board::new();
    board.set(5, 0, Tile::T);

    // Queue order [3, 2]: the first batch must end directly above the
    // floor, the second directly above it.
    assert!(board.inject_garbage_at(0, 3, 0));
    assert!(board.inject_garbage_at(3, 2, 9));

    for y in 0..3 {
        assert_eq!(board.get(0, y), Some(Tile::Empty));
        assert_eq!(board.get(9, y), Some(Tile::Garbage));
    }
    for y in 3..5 {
        assert_eq!(board.get(9, y), Some(Tile::Empty));
        assert_eq!(board.get(0, y), Some(Tile::Garbage));
    }
    assert_eq!(board.get(5, 5), Some(Tile::T));
}
