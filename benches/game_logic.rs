use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridfall::core::{Board, MatchSession, RotationSystem};
use gridfall::types::{MatchConfig, PieceKind, Spin, Tile, BOARD_WIDTH};

fn bench_tick(c: &mut Criterion) {
    let mut session = MatchSession::new(
        Arc::new(RotationSystem::standard()),
        MatchConfig::default(),
        12345,
    );
    session.start();

    c.bench_function("session_tick_16ms", |b| {
        b.iter(|| {
            session.tick(black_box(0.016));
        })
    });
}

fn bench_rotate(c: &mut Criterion) {
    let rules = RotationSystem::standard();
    let board = Board::new();
    let mut piece = rules.spawn(PieceKind::T);

    c.bench_function("rotate_cw", |b| {
        b.iter(|| {
            black_box(piece.rotate(Spin::Cw, &board));
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 0..4 {
                for x in 0..BOARD_WIDTH as i8 {
                    board.set(x, y, Tile::I);
                }
            }
            board.clear_full_rows();
        })
    });
}

fn bench_garbage_injection(c: &mut Criterion) {
    c.bench_function("inject_4_garbage_rows", |b| {
        b.iter(|| {
            let mut board = Board::new();
            board.inject_garbage(black_box(4), 3);
        })
    });
}

fn bench_hard_drop(c: &mut Criterion) {
    let rules = RotationSystem::standard();

    c.bench_function("hard_drop", |b| {
        b.iter(|| {
            let mut board = Board::new();
            let mut piece = rules.spawn(black_box(PieceKind::L));
            piece.hard_drop(&mut board);
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_rotate,
    bench_line_clear,
    bench_garbage_injection,
    bench_hard_drop
);
criterion_main!(benches);
