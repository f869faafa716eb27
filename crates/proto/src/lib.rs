//! Lobby and match protocol - messages plus host/client state machines
//!
//! Everything a match exchanges over the wire, minus the wire itself: the
//! reliable transport underneath is an external collaborator, so both state
//! machines here consume decoded messages and return the messages they want
//! delivered.
//!
//! # Message flow
//!
//! ```text
//! Client -> Host: {"type":"connect","name":"ada"}
//! Host -> Client: {"type":"lobby_state","players":[...],"settings":{...,"rotation_rules":"..."}}
//! Client -> Host: {"type":"ready","ready":true,"spectating":false}
//! Host -> All:    {"type":"countdown","phase":"prepare","seed":4242}
//! Client -> Host: {"type":"confirm_start"}
//! Host -> All:    {"type":"countdown","phase":"start","seed":4242}
//! Client -> Host: {"type":"garbage","sender":"ada","lines":[2,1]}
//! Host -> Other:  {"type":"garbage","from":"ada","lines":[2,1]}
//! ```
//!
//! The `rotation_rules` text inside the lobby state is the contract that
//! keeps a match deterministic: every participant parses the same bytes into
//! the same [`gridfall_core::RotationSystem`], and every piece queue runs
//! from the seed carried by the countdown. A client that fails to parse the
//! rules aborts match setup instead of guessing.

pub mod lobby;
pub mod messages;

pub use gridfall_core as core;
pub use gridfall_types as types;

// Re-export the protocol surface for convenience
pub use lobby::{ClientLobby, Handled, HostLobby, LobbyError, LobbyEvent, LobbyPhase, Outbound};
pub use messages::{
    encode_client, encode_server, parse_client, parse_server, tile_to_wire, wire_to_tile,
    BoardUpdate, ClientMessage, CountdownPhase, MatchSettings, PlayerInfo, ServerMessage,
};
