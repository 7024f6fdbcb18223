//! Wire types exchanged between a lobby client and the game server.
//!
//! Everything here is plain data: requests the client sends, responses the
//! server correlates back to a request id, and events the server pushes on
//! its own schedule. The game's rules are not modeled; game states and room
//! payloads travel as opaque byte blobs.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a running game instance.
///
/// Assigned by the server when a room is created and never changes after
/// that. The client treats it as opaque: it is only compared, hashed, and
/// echoed back in requests.
///
/// `#[serde(transparent)]` makes it serialize as the bare string
/// (`"room-1"`) rather than a wrapper object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credential that lets one participant take one prepared slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationToken(pub String);

impl From<&str> for ReservationToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ReservationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies which game plugin the server should run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameType(pub String);

impl From<&str> for GameType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GameType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Describes one slot of a prepared game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// Name shown for whoever takes the slot.
    pub display_name: String,
    /// Whether the server may enforce move timeouts on this slot.
    pub can_timeout: bool,
}

impl SlotDescriptor {
    /// Creates a slot with the given display name.
    pub fn new(display_name: impl Into<String>, can_timeout: bool) -> Self {
        Self {
            display_name: display_name.into(),
            can_timeout,
        }
    }
}

/// A request from the client to the server.
///
/// Internally tagged: `{"type": "PrepareGame", "game_type": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Present the administrator secret. Not acknowledged.
    Authenticate { password: String },

    /// Create a room with fixed slots; answered with
    /// [`ResponseBody::Prepared`] or [`ResponseBody::Error`].
    PrepareGame {
        game_type: GameType,
        slots: Vec<SlotDescriptor>,
        paused: bool,
    },

    /// Join any open room (or have one created). Answered with a
    /// [`LobbyEvent::GameJoined`].
    JoinAnyGame { game_type: Option<GameType> },

    /// Take a prepared slot.
    JoinPreparedGame { reservation: ReservationToken },

    /// Observe a room: receive its state updates and control it.
    Observe { room_id: RoomId },

    /// Enable or disable move-timeout enforcement for one slot.
    ControlTimeout {
        room_id: RoomId,
        enabled: bool,
        slot: usize,
    },

    /// Pause the room.
    Pause { room_id: RoomId },

    /// Resume a paused room.
    Resume { room_id: RoomId },
}

/// A request plus the id the server echoes in its [`Response`].
///
/// Every frame carries an id, even for fire-and-forget requests. Servers
/// only answer the ones that have a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub request: Request,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Successful answer to a prepare-game request.
///
/// `reservations[i]` belongs to `slots[i]` of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePrepared {
    pub room_id: RoomId,
    pub reservations: Vec<ReservationToken>,
}

/// Body of a correlated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseBody {
    /// A game was prepared.
    Prepared(GamePrepared),
    /// The request was rejected.
    Error { message: String },
}

/// A response correlated to a [`RequestFrame`] by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub body: ResponseBody,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Why a player ended with the score they did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreCause {
    #[default]
    Regular,
    Left,
    RuleViolation,
    SoftTimeout,
    HardTimeout,
    Unknown,
}

/// One player's line in a [`GameResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub name: String,
    #[serde(default)]
    pub cause: ScoreCause,
    pub points: i64,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameResult {
    /// Name of the winner; `None` on a draw.
    pub winner: Option<String>,
    #[serde(default)]
    pub scores: Vec<PlayerScore>,
}

/// A message the server pushes without being asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyEvent {
    /// A new game state for an observed room.
    NewState { room_id: RoomId, state: Vec<u8> },
    /// A room-scoped error.
    Error { room_id: RoomId, message: String },
    /// Opaque room message not covered by the other kinds.
    RoomMessage { room_id: RoomId, payload: Vec<u8> },
    /// A prepared game was announced to everyone.
    GamePrepared(GamePrepared),
    /// A client left a room.
    GameLeft { room_id: RoomId },
    /// A client joined a room.
    GameJoined { room_id: RoomId },
    /// A room finished.
    GameOver { room_id: RoomId, result: GameResult },
    /// A room was paused; `next_player` moves once it resumes.
    GamePaused { room_id: RoomId, next_player: String },
    /// Our observation of a room started.
    GameObserved { room_id: RoomId },
}

impl LobbyEvent {
    /// Returns the room this event concerns.
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::NewState { room_id, .. }
            | Self::Error { room_id, .. }
            | Self::RoomMessage { room_id, .. }
            | Self::GameLeft { room_id }
            | Self::GameJoined { room_id }
            | Self::GameOver { room_id, .. }
            | Self::GamePaused { room_id, .. }
            | Self::GameObserved { room_id } => room_id,
            Self::GamePrepared(prepared) => &prepared.room_id,
        }
    }

    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewState { .. } => "new-state",
            Self::Error { .. } => "error",
            Self::RoomMessage { .. } => "room-message",
            Self::GamePrepared(_) => "game-prepared",
            Self::GameLeft { .. } => "game-left",
            Self::GameJoined { .. } => "game-joined",
            Self::GameOver { .. } => "game-over",
            Self::GamePaused { .. } => "game-paused",
            Self::GameObserved { .. } => "game-observed",
        }
    }
}

/// Anything the server sends: a correlated response or a pushed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerFrame {
    Response(Response),
    Event(LobbyEvent),
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("room-1")).unwrap();
        assert_eq!(json, "\"room-1\"");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::from("room-7").to_string(), "room-7");
    }

    #[test]
    fn test_prepare_game_json_format() {
        let req = Request::PrepareGame {
            game_type: GameType::from("blokus"),
            slots: vec![
                SlotDescriptor::new("One", false),
                SlotDescriptor::new("Two", false),
            ],
            paused: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "PrepareGame");
        assert_eq!(json["game_type"], "blokus");
        assert_eq!(json["slots"][1]["display_name"], "Two");
        assert_eq!(json["paused"], true);
    }

    #[test]
    fn test_control_timeout_json_format() {
        let req = Request::ControlTimeout {
            room_id: RoomId::from("r"),
            enabled: false,
            slot: 2,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "ControlTimeout");
        assert_eq!(json["enabled"], false);
        assert_eq!(json["slot"], 2);
    }

    #[test]
    fn test_request_frame_nests_request() {
        let frame = RequestFrame {
            id: 9,
            request: Request::Pause {
                room_id: RoomId::from("r"),
            },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["request"]["type"], "Pause");
    }

    #[test]
    fn test_prepared_response_decodes() {
        let json = r#"{
            "type": "Response",
            "data": {
                "id": 3,
                "body": {
                    "type": "Prepared",
                    "room_id": "room-1",
                    "reservations": ["r1", "r2"]
                }
            }
        }"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        let ServerFrame::Response(resp) = frame else {
            panic!("expected a response");
        };
        assert_eq!(resp.id, 3);
        assert_eq!(
            resp.body,
            ResponseBody::Prepared(GamePrepared {
                room_id: RoomId::from("room-1"),
                reservations: vec!["r1".into(), "r2".into()],
            })
        );
    }

    #[test]
    fn test_game_joined_event_decodes() {
        let json = r#"{"type":"Event","data":{"type":"GameJoined","room_id":"room-7"}}"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Event(LobbyEvent::GameJoined {
                room_id: RoomId::from("room-7")
            })
        );
    }

    #[test]
    fn test_game_result_defaults_missing_scores() {
        let json = r#"{"winner": null}"#;
        let result: GameResult = serde_json::from_str(json).unwrap();
        assert_eq!(result, GameResult::default());
    }

    #[test]
    fn test_score_cause_wire_names() {
        let json = serde_json::to_string(&ScoreCause::SoftTimeout).unwrap();
        assert_eq!(json, "\"SOFT_TIMEOUT\"");
    }

    #[test]
    fn test_event_room_id_and_kind() {
        let event = LobbyEvent::GamePrepared(GamePrepared {
            room_id: RoomId::from("p"),
            reservations: vec![],
        });
        assert_eq!(event.room_id().as_str(), "p");
        assert_eq!(event.kind(), "game-prepared");

        let event = LobbyEvent::GamePaused {
            room_id: RoomId::from("q"),
            next_player: "Two".into(),
        };
        assert_eq!(event.room_id().as_str(), "q");
        assert_eq!(event.kind(), "game-paused");
    }
}
