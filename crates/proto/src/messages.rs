//! Protocol message types - line-delimited JSON
//!
//! The lobby/match messages exchanged between a host and its clients. The
//! transport underneath (a reliable-datagram layer) is external; this module
//! only defines the payloads and their JSON encoding.
//!
//! The one correctness-critical field is `MatchSettings::rotation_rules`:
//! the rotation-system configuration travels as text inside the lobby-state
//! message and must reach every participant byte-identical, because each
//! side replays the match simulation locally from it.

use serde::{Deserialize, Serialize};

use gridfall_core::rotation::{ConfigError, RotationSystem};
use gridfall_core::Board;
use gridfall_types::{MatchConfig, PieceKind, Tile, BOARD_HEIGHT, BOARD_WIDTH};

// ============== Client -> Host Messages ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message after connecting; claims a display name.
    Connect { name: String },
    /// Ready/spectator state for the lobby screen.
    Ready { ready: bool, spectating: bool },
    /// Acknowledges a `Countdown::Prepare`; the host starts the match once
    /// every participant has confirmed.
    ConfirmStart,
    /// Attack rows produced by this player's line clears.
    Garbage { sender: String, lines: Vec<u8> },
    /// Periodic own-board state (also carries the top-out flag).
    Board(BoardUpdate),
}

// ============== Host -> Client Messages ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full lobby state: who is here, and the complete match settings
    /// including the rotation rules every participant must load.
    LobbyState {
        players: Vec<PlayerInfo>,
        settings: MatchSettings,
        starting: bool,
    },
    /// Incremental player change.
    PlayerUpdate {
        name: String,
        ready: bool,
        spectating: bool,
        disconnected: bool,
    },
    /// Prepare/start handshake; `seed` feeds every participant's piece
    /// queue so the shape sequence is shared.
    Countdown { phase: CountdownPhase, seed: u32 },
    /// Garbage routed from an opponent.
    Garbage { from: String, lines: Vec<u8> },
    /// Another player's board, relayed for spectating/rendering.
    Board(BoardUpdate),
    /// Match over; everyone returns to the lobby.
    GameEnd { winner: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    Prepare,
    Start,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub ready: bool,
    pub spectating: bool,
}

/// The numeric match settings plus the rotation-rules text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    pub init_gravity: f64,
    pub gravity_increase: f64,
    pub gravity_increase_interval: f64,
    pub lock_delay: f64,
    pub num_previews: usize,
    /// Rotation-system configuration, distributed verbatim. Participants
    /// with divergent rules text would desynchronize the match.
    pub rotation_rules: String,
}

impl MatchSettings {
    pub fn new(config: MatchConfig, rules: &RotationSystem) -> Self {
        Self {
            init_gravity: config.init_gravity,
            gravity_increase: config.gravity_increase,
            gravity_increase_interval: config.gravity_increase_interval,
            lock_delay: config.lock_delay,
            num_previews: config.num_previews,
            rotation_rules: rules.to_json(),
        }
    }

    /// The numeric half of the settings.
    pub fn config(&self) -> MatchConfig {
        MatchConfig {
            num_previews: self.num_previews,
            init_gravity: self.init_gravity,
            gravity_increase: self.gravity_increase,
            gravity_increase_interval: self.gravity_increase_interval,
            lock_delay: self.lock_delay,
        }
    }

    /// Parse the carried rotation rules. A failure here must abort match
    /// setup - pieces cannot be built from an incomplete table.
    pub fn rules(&self) -> Result<RotationSystem, ConfigError> {
        RotationSystem::from_json(&self.rotation_rules)
    }
}

/// One player's board as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardUpdate {
    pub player: String,
    pub topped_out: bool,
    /// Cell tags, row-major with row 0 = bottom row.
    pub cells: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    /// Upcoming shape names, front of the queue first.
    pub queue: Vec<String>,
    pub hold: Option<String>,
}

impl BoardUpdate {
    /// Capture a board plus queue/hold state for transmission.
    pub fn capture(
        player: &str,
        board: &Board,
        queue: &[PieceKind],
        hold: Option<PieceKind>,
        topped_out: bool,
    ) -> Self {
        let mut cells = [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        for y in 0..BOARD_HEIGHT as usize {
            for x in 0..BOARD_WIDTH as usize {
                let tile = board
                    .get(x as i8, y as i8)
                    .unwrap_or(Tile::Empty);
                cells[y][x] = tile_to_wire(tile);
            }
        }
        Self {
            player: player.to_string(),
            topped_out,
            cells,
            queue: queue.iter().map(|k| k.as_str().to_string()).collect(),
            hold: hold.map(|k| k.as_str().to_string()),
        }
    }

    /// Decode one cell; `None` for unknown tags or out-of-range positions.
    pub fn tile(&self, x: usize, y: usize) -> Option<Tile> {
        self.cells
            .get(y)
            .and_then(|row| row.get(x))
            .and_then(|&tag| wire_to_tile(tag))
    }
}

/// Cell tag encoding: 0 empty, 1 garbage, 2..=8 the seven shapes.
pub fn tile_to_wire(tile: Tile) -> u8 {
    match tile {
        Tile::Empty => 0,
        Tile::Garbage => 1,
        Tile::I => 2,
        Tile::O => 3,
        Tile::L => 4,
        Tile::J => 5,
        Tile::S => 6,
        Tile::Z => 7,
        Tile::T => 8,
    }
}

pub fn wire_to_tile(tag: u8) -> Option<Tile> {
    match tag {
        0 => Some(Tile::Empty),
        1 => Some(Tile::Garbage),
        2 => Some(Tile::I),
        3 => Some(Tile::O),
        4 => Some(Tile::L),
        5 => Some(Tile::J),
        6 => Some(Tile::S),
        7 => Some(Tile::Z),
        8 => Some(Tile::T),
        _ => None,
    }
}

// ============== Encoding ==============

/// Encode a message as one JSON line (newline included).
pub fn encode_client(msg: &ClientMessage) -> String {
    let mut line = serde_json::to_string(msg).expect("client messages serialize to plain json");
    line.push('\n');
    line
}

pub fn encode_server(msg: &ServerMessage) -> String {
    let mut line = serde_json::to_string(msg).expect("server messages serialize to plain json");
    line.push('\n');
    line
}

/// Parse one line received from a client.
pub fn parse_client(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}

/// Parse one line received from the host.
pub fn parse_server(line: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}
