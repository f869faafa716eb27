//! Lobby state machines - host and client sides, transport-free
//!
//! Both sides consume already-decoded messages and hand back the messages
//! they want sent, so any reliable transport can drive them. The host is the
//! authority: it owns the match settings (including the rotation rules it
//! distributes), runs the prepare/start handshake, routes garbage between
//! players and declares the winner. The client mirrors lobby state, loads
//! the received rules, and owns the local simulation session once the match
//! starts.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use gridfall_core::rotation::{ConfigError, RotationSystem};
use gridfall_core::{GarbageEntry, MatchSession};
use gridfall_types::MatchConfig;

use crate::messages::{
    BoardUpdate, ClientMessage, CountdownPhase, MatchSettings, PlayerInfo, ServerMessage,
};

/// Protocol-level failure on the client side. Any of these aborts match
/// setup; none of them is recoverable by retrying the same message.
#[derive(Debug, Error)]
pub enum LobbyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("message out of order: {0}")]
    OutOfOrder(&'static str),
}

/// Where a lobby currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    Idle,
    Preparing,
    InGame,
}

// ============== Host side ==============

/// A message the host wants delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    To(String, ServerMessage),
    Broadcast(ServerMessage),
}

struct PlayerSlot {
    info: PlayerInfo,
    alive: bool,
    confirmed: bool,
}

/// Authoritative lobby: one per hosted match.
pub struct HostLobby {
    settings: MatchSettings,
    players: Vec<PlayerSlot>,
    phase: LobbyPhase,
    seed: u32,
}

impl HostLobby {
    /// `seed` feeds every participant's piece queue for this match; the
    /// host picks it once per game.
    pub fn new(config: MatchConfig, rules: &RotationSystem, seed: u32) -> Self {
        Self {
            settings: MatchSettings::new(config, rules),
            players: Vec::new(),
            phase: LobbyPhase::Idle,
            seed,
        }
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter().map(|slot| &slot.info)
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut PlayerSlot> {
        self.players.iter_mut().find(|slot| slot.info.name == name)
    }

    fn lobby_state(&self, starting: bool) -> ServerMessage {
        ServerMessage::LobbyState {
            players: self.players.iter().map(|slot| slot.info.clone()).collect(),
            settings: self.settings.clone(),
            starting,
        }
    }

    /// Process one message from the named connection.
    pub fn handle(&mut self, from: &str, msg: ClientMessage) -> Vec<Outbound> {
        match msg {
            ClientMessage::Connect { name } => self.connect(name),
            ClientMessage::Ready { ready, spectating } => self.ready(from, ready, spectating),
            ClientMessage::ConfirmStart => self.confirm_start(from),
            ClientMessage::Garbage { sender, lines } => self.route_garbage(&sender, lines),
            ClientMessage::Board(update) => self.board_update(update),
        }
    }

    fn connect(&mut self, name: String) -> Vec<Outbound> {
        if self.slot_mut(&name).is_none() {
            self.players.push(PlayerSlot {
                info: PlayerInfo {
                    name: name.clone(),
                    ready: false,
                    spectating: false,
                },
                alive: false,
                confirmed: false,
            });
        }
        // The newcomer needs the full state (settings included); everyone
        // else just learns about the new player.
        vec![
            Outbound::To(name.clone(), self.lobby_state(false)),
            Outbound::Broadcast(ServerMessage::PlayerUpdate {
                name,
                ready: false,
                spectating: false,
                disconnected: false,
            }),
        ]
    }

    fn ready(&mut self, from: &str, ready: bool, spectating: bool) -> Vec<Outbound> {
        let Some(slot) = self.slot_mut(from) else {
            return Vec::new();
        };
        slot.info.ready = ready;
        slot.info.spectating = spectating;
        let update = ServerMessage::PlayerUpdate {
            name: from.to_string(),
            ready,
            spectating,
            disconnected: false,
        };

        let mut out = vec![Outbound::Broadcast(update)];
        if self.phase == LobbyPhase::Idle && self.all_ready() {
            self.phase = LobbyPhase::Preparing;
            for slot in &mut self.players {
                slot.confirmed = false;
            }
            out.push(Outbound::Broadcast(ServerMessage::Countdown {
                phase: CountdownPhase::Prepare,
                seed: self.seed,
            }));
        }
        out
    }

    fn all_ready(&self) -> bool {
        let participants: Vec<_> = self
            .players
            .iter()
            .filter(|slot| !slot.info.spectating)
            .collect();
        participants.len() >= 2 && participants.iter().all(|slot| slot.info.ready)
    }

    fn confirm_start(&mut self, from: &str) -> Vec<Outbound> {
        if self.phase != LobbyPhase::Preparing {
            return Vec::new();
        }
        if let Some(slot) = self.slot_mut(from) {
            slot.confirmed = true;
        }
        let all_confirmed = self
            .players
            .iter()
            .filter(|slot| !slot.info.spectating)
            .all(|slot| slot.confirmed);
        if !all_confirmed {
            return Vec::new();
        }

        self.phase = LobbyPhase::InGame;
        for slot in &mut self.players {
            slot.alive = !slot.info.spectating;
            slot.info.ready = false;
        }
        vec![Outbound::Broadcast(ServerMessage::Countdown {
            phase: CountdownPhase::Start,
            seed: self.seed,
        })]
    }

    /// Deliver an attack to every other live player.
    fn route_garbage(&mut self, sender: &str, lines: Vec<u8>) -> Vec<Outbound> {
        if self.phase != LobbyPhase::InGame {
            return Vec::new();
        }
        self.players
            .iter()
            .filter(|slot| slot.alive && slot.info.name != sender)
            .map(|slot| {
                Outbound::To(
                    slot.info.name.clone(),
                    ServerMessage::Garbage {
                        from: sender.to_string(),
                        lines: lines.clone(),
                    },
                )
            })
            .collect()
    }

    fn board_update(&mut self, update: BoardUpdate) -> Vec<Outbound> {
        if self.phase != LobbyPhase::InGame {
            return Vec::new();
        }
        if update.topped_out {
            if let Some(slot) = self.slot_mut(&update.player) {
                slot.alive = false;
            }
        }
        let mut out = vec![Outbound::Broadcast(ServerMessage::Board(update))];

        let alive: Vec<_> = self
            .players
            .iter()
            .filter(|slot| slot.alive)
            .map(|slot| slot.info.name.clone())
            .collect();
        if alive.len() <= 1 {
            self.phase = LobbyPhase::Idle;
            let winner = alive.into_iter().next().unwrap_or_default();
            out.push(Outbound::Broadcast(ServerMessage::GameEnd { winner }));
        }
        out
    }

    /// A connection dropped; everyone learns, and an in-game drop counts as
    /// a top-out for winner determination.
    pub fn disconnect(&mut self, name: &str) -> Vec<Outbound> {
        let Some(pos) = self.players.iter().position(|slot| slot.info.name == name) else {
            return Vec::new();
        };
        let was_alive = self.players[pos].alive;
        self.players.remove(pos);

        let mut out = vec![Outbound::Broadcast(ServerMessage::PlayerUpdate {
            name: name.to_string(),
            ready: false,
            spectating: false,
            disconnected: true,
        })];

        if self.phase == LobbyPhase::InGame && was_alive {
            let alive: Vec<_> = self
                .players
                .iter()
                .filter(|slot| slot.alive)
                .map(|slot| slot.info.name.clone())
                .collect();
            if alive.len() <= 1 {
                self.phase = LobbyPhase::Idle;
                let winner = alive.into_iter().next().unwrap_or_default();
                out.push(Outbound::Broadcast(ServerMessage::GameEnd { winner }));
            }
        }
        out
    }
}

// ============== Client side ==============

/// Something the application layer should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    LobbyUpdated,
    MatchPreparing,
    MatchStarted,
    GarbageIncoming { from: String, total: u32 },
    BoardUpdated { player: String },
    MatchEnded { winner: String },
}

/// What a handled message produced: replies to send plus local events.
#[derive(Debug, Default)]
pub struct Handled {
    pub replies: Vec<ClientMessage>,
    pub events: Vec<LobbyEvent>,
}

/// Client-side mirror of the lobby plus the local simulation session.
pub struct ClientLobby {
    name: String,
    players: Vec<PlayerInfo>,
    config: Option<MatchConfig>,
    rules: Option<Arc<RotationSystem>>,
    remote_boards: HashMap<String, BoardUpdate>,
    session: Option<MatchSession>,
    phase: LobbyPhase,
}

impl ClientLobby {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: Vec::new(),
            config: None,
            rules: None,
            remote_boards: HashMap::new(),
            session: None,
            phase: LobbyPhase::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn rules(&self) -> Option<&Arc<RotationSystem>> {
        self.rules.as_ref()
    }

    /// The local simulation, once the match has started.
    pub fn session(&mut self) -> Option<&mut MatchSession> {
        self.session.as_mut()
    }

    pub fn remote_board(&self, player: &str) -> Option<&BoardUpdate> {
        self.remote_boards.get(player)
    }

    /// Process one message from the host.
    ///
    /// A `ConfigError` from the carried rotation rules is fatal: the caller
    /// must abort match setup and surface it, never fall back to defaults.
    pub fn handle(&mut self, msg: ServerMessage) -> Result<Handled, LobbyError> {
        let mut handled = Handled::default();
        match msg {
            ServerMessage::LobbyState {
                players, settings, ..
            } => {
                // Load the distributed rules up front so a bad configuration
                // fails here, in the lobby, rather than at match start.
                let rules = settings.rules()?;
                self.rules = Some(Arc::new(rules));
                self.config = Some(settings.config());
                self.players = players;
                handled.events.push(LobbyEvent::LobbyUpdated);
            }
            ServerMessage::PlayerUpdate {
                name,
                ready,
                spectating,
                disconnected,
            } => {
                if disconnected {
                    self.players.retain(|p| p.name != name);
                    self.remote_boards.remove(&name);
                } else {
                    match self.players.iter_mut().find(|p| p.name == name) {
                        Some(player) => {
                            player.ready = ready;
                            player.spectating = spectating;
                        }
                        None => self.players.push(PlayerInfo {
                            name,
                            ready,
                            spectating,
                        }),
                    }
                }
                handled.events.push(LobbyEvent::LobbyUpdated);
            }
            ServerMessage::Countdown { phase, seed } => match phase {
                CountdownPhase::Prepare => {
                    if self.rules.is_none() {
                        return Err(LobbyError::OutOfOrder(
                            "countdown received before lobby state",
                        ));
                    }
                    self.phase = LobbyPhase::Preparing;
                    handled.replies.push(ClientMessage::ConfirmStart);
                    handled.events.push(LobbyEvent::MatchPreparing);
                }
                CountdownPhase::Start => {
                    let (Some(rules), Some(config)) = (self.rules.clone(), self.config) else {
                        return Err(LobbyError::OutOfOrder(
                            "match start received before lobby state",
                        ));
                    };
                    let mut session = MatchSession::new(rules, config, seed);
                    session.start();
                    self.session = Some(session);
                    self.remote_boards.clear();
                    self.phase = LobbyPhase::InGame;
                    handled.events.push(LobbyEvent::MatchStarted);
                }
            },
            ServerMessage::Garbage { from, lines } => {
                let total: u32 = lines.iter().map(|&l| l as u32).sum();
                if let Some(session) = self.session.as_mut() {
                    for amount in lines {
                        session.queue_garbage(GarbageEntry::new(from.clone(), amount));
                    }
                }
                handled
                    .events
                    .push(LobbyEvent::GarbageIncoming { from, total });
            }
            ServerMessage::Board(update) => {
                if update.player != self.name {
                    let player = update.player.clone();
                    self.remote_boards.insert(player.clone(), update);
                    handled.events.push(LobbyEvent::BoardUpdated { player });
                }
            }
            ServerMessage::GameEnd { winner } => {
                self.phase = LobbyPhase::Idle;
                self.session = None;
                handled.events.push(LobbyEvent::MatchEnded { winner });
            }
        }
        Ok(handled)
    }
}
