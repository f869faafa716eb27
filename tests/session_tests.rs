//! Session tests - orchestration, garbage flow, determinism, top-out

use std::sync::Arc;

use gridfall::core::{GarbageEntry, MatchSession, RotationSystem};
use gridfall::types::{Command, MatchConfig, Tile, BOARD_WIDTH};

fn session_with(config: MatchConfig, seed: u32) -> MatchSession {
    MatchSession::new(Arc::new(RotationSystem::standard()), config, seed)
}

fn session(seed: u32) -> MatchSession {
    session_with(MatchConfig::default(), seed)
}

fn gap_column(s: &MatchSession, y: i8) -> i8 {
    (0..BOARD_WIDTH as i8)
        .find(|&x| s.board().get(x, y) == Some(Tile::Empty))
        .expect("garbage row has a gap")
}

#[test]
fn test_garbage_queue_applies_fifo_bottom_up() {
    let mut s = session(31);
    s.start();
    s.queue_garbage(GarbageEntry::new("ada", 3));
    s.queue_garbage(GarbageEntry::new("bob", 2));
    assert_eq!(s.garbage_pending(), 5);

    assert!(s.command(Command::HardDrop));
    let event = s.take_last_event().unwrap();
    assert_eq!(event.garbage_received, 5);
    assert_eq!(s.garbage_pending(), 0);

    // Five garbage rows: rows 0-2 from the first attack, rows 3-4 from the
    // second, each row all-garbage except one gap.
    for y in 0..5 {
        let garbage = (0..BOARD_WIDTH as i8)
            .filter(|&x| s.board().get(x, y) == Some(Tile::Garbage))
            .count();
        assert_eq!(garbage, BOARD_WIDTH as usize - 1, "row {}", y);
    }
    // One gap column per attack, constant across that attack's rows.
    let first = gap_column(&s, 0);
    assert_eq!(gap_column(&s, 1), first);
    assert_eq!(gap_column(&s, 2), first);
    let second = gap_column(&s, 3);
    assert_eq!(gap_column(&s, 4), second);
}

#[test]
fn test_garbage_waits_for_the_active_piece() {
    let mut s = session(5);
    s.start();
    s.queue_garbage(GarbageEntry::new("ada", 2));

    // Nothing lands while the piece is still falling.
    s.tick(0.25);
    assert!(s.board().cells().iter().all(|t| t.is_empty()));
    assert_eq!(s.garbage_pending(), 2);

    assert!(s.command(Command::HardDrop));
    assert_eq!(s.garbage_pending(), 0);
    assert_eq!(
        s.board()
            .cells()
            .iter()
            .filter(|t| **t == Tile::Garbage)
            .count(),
        2 * (BOARD_WIDTH as usize - 1)
    );
}

#[test]
fn test_distributed_rules_text_keeps_replicas_in_lockstep() {
    // One side runs the compiled-in rules; the other reloads them from the
    // serialized text, exactly as a match participant would.
    let host_rules = RotationSystem::standard();
    let text = host_rules.to_json();
    let client_rules = RotationSystem::from_json(&text).unwrap();

    let mut a = MatchSession::new(Arc::new(host_rules), MatchConfig::default(), 1234);
    let mut b = MatchSession::new(Arc::new(client_rules), MatchConfig::default(), 1234);
    a.start();
    b.start();

    for step in 0..400 {
        let cmd = match step % 7 {
            0 => Command::RotateCw,
            1 => Command::MoveLeft,
            2 => Command::SoftDrop,
            3 => Command::RotateCcw,
            4 => Command::MoveRight,
            5 => Command::Hold,
            _ => Command::HardDrop,
        };
        assert_eq!(a.command(cmd), b.command(cmd), "step {}", step);
        a.tick(0.1);
        b.tick(0.1);
        assert_eq!(a.board().cells(), b.board().cells(), "step {}", step);
        assert_eq!(a.lines_cleared(), b.lines_cleared());
        assert_eq!(a.topped_out(), b.topped_out());
        if a.topped_out() {
            break;
        }
    }
}

#[test]
fn test_relentless_stacking_eventually_tops_out() {
    let mut s = session(2);
    s.start();
    let mut drops = 0;
    while !s.topped_out() {
        assert!(s.command(Command::HardDrop));
        drops += 1;
        assert!(drops < 300, "session never topped out");
    }
    // A dead session refuses further play.
    assert!(!s.command(Command::MoveLeft));
    assert!(!s.command(Command::HardDrop));
    s.tick(10.0);
    assert!(s.topped_out());
}

#[test]
fn test_preview_depth_follows_config() {
    let config = MatchConfig {
        num_previews: 7,
        ..MatchConfig::default()
    };
    let mut s = session_with(config, 9);
    assert_eq!(s.preview().len(), 7);

    // The preview is stable across draws: what is promised is what spawns.
    let upcoming = s.preview();
    s.start();
    assert_eq!(s.active().unwrap().kind(), upcoming[0]);
    s.command(Command::HardDrop);
    if !s.topped_out() {
        assert_eq!(s.active().unwrap().kind(), upcoming[1]);
    }
}

#[test]
fn test_gravity_ramp_accelerates_over_time() {
    let config = MatchConfig {
        init_gravity: 1.0,
        gravity_increase: 2.0,
        gravity_increase_interval: 1.0,
        ..MatchConfig::default()
    };
    let mut s = session_with(config, 4);
    s.start();
    assert_eq!(s.gravity(), 1.0);
    s.tick(0.5);
    s.tick(0.5);
    assert_eq!(s.gravity(), 3.0);
    s.tick(0.5);
    s.tick(0.5);
    assert_eq!(s.gravity(), 5.0);
}

#[test]
fn test_lines_cleared_matches_lock_events() {
    let mut s = session(14);
    s.start();
    assert_eq!(s.lines_cleared(), 0);

    let mut total = 0u32;
    for _ in 0..40 {
        if !s.command(Command::HardDrop) {
            break;
        }
        total += s.take_last_event().unwrap().lines_cleared as u32;
    }
    assert_eq!(s.lines_cleared(), total);
}
