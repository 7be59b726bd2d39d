//! Protocol module - JSON message types for the session server
//!
//! Implements a line-delimited JSON protocol. Every message has `type`, `seq`
//! (sequence number, echoed back in the response) and `ts` (timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::core::{
    GameError, LeaderboardRecord, LineClear, PieceInstance, PlaceOutcome, SessionId,
    SessionSnapshot, SlotSet,
};
use crate::types::{PieceColor, GRID_SIZE, SLOT_COUNT};

// ============== Client -> Server Messages ==============

/// Create (or restart) a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Place a held piece with its top-left corner at (row, col)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub session_id: String,
    pub piece: PieceRef,
    pub row: i32,
    pub col: i32,
}

/// Piece as referenced by a placement; only `shape` is used for matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub shape: Vec<Vec<u8>>,
}

/// Request carrying only a session id (`request_pieces`, `get_state`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopRecordMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecordMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    #[serde(default)]
    pub name: String,
    pub score: u32,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    #[serde(rename = "state")]
    State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacedType {
    #[serde(rename = "placed")]
    Placed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PiecesType {
    #[serde(rename = "pieces")]
    Pieces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "record")]
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "invalid_request")]
    InvalidRequest,
    #[serde(rename = "invalid_piece")]
    InvalidPiece,
    #[serde(rename = "invalid_placement")]
    InvalidPlacement,
    #[serde(rename = "premature_replenish")]
    PrematureReplenish,
    #[serde(rename = "record_not_higher")]
    RecordNotHigher,
    #[serde(rename = "session_over")]
    SessionOver,
    #[serde(rename = "internal")]
    Internal,
}

impl From<&GameError> for ErrorCode {
    fn from(value: &GameError) -> Self {
        match value {
            GameError::NotFound(_) => Self::NotFound,
            GameError::InvalidRequest(_) => Self::InvalidRequest,
            GameError::InvalidPiece => Self::InvalidPiece,
            GameError::InvalidPlacement { .. } => Self::InvalidPlacement,
            GameError::PrematureReplenish { .. } => Self::PrematureReplenish,
            GameError::RecordNotHigher { .. } => Self::RecordNotHigher,
            GameError::SessionOver => Self::SessionOver,
            GameError::Internal(_) => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorLower {
    #[serde(rename = "red")]
    Red,
    #[serde(rename = "orange")]
    Orange,
    #[serde(rename = "yellow")]
    Yellow,
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "teal")]
    Teal,
    #[serde(rename = "blue")]
    Blue,
    #[serde(rename = "purple")]
    Purple,
    #[serde(rename = "pink")]
    Pink,
}

impl From<PieceColor> for ColorLower {
    fn from(value: PieceColor) -> Self {
        match value {
            PieceColor::Red => Self::Red,
            PieceColor::Orange => Self::Orange,
            PieceColor::Yellow => Self::Yellow,
            PieceColor::Green => Self::Green,
            PieceColor::Teal => Self::Teal,
            PieceColor::Blue => Self::Blue,
            PieceColor::Purple => Self::Purple,
            PieceColor::Pink => Self::Pink,
        }
    }
}

/// A dealt piece as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub id: u64,
    pub color: ColorLower,
    pub shape: Vec<Vec<u8>>,
}

impl From<&PieceInstance> for PieceSnapshot {
    fn from(value: &PieceInstance) -> Self {
        Self {
            id: value.id.0,
            color: ColorLower::from(value.color),
            shape: value.shape.to_rows(),
        }
    }
}

/// Slot set on the wire; used slots are `null`
pub type PiecesSnapshot = [Option<PieceSnapshot>; SLOT_COUNT];

pub fn pieces_snapshot(slots: &SlotSet) -> PiecesSnapshot {
    std::array::from_fn(|i| slots.get(i).map(PieceSnapshot::from))
}

/// Board on the wire: 8 rows of 8 cells, 0 = empty, 1 = filled
pub type BoardSnapshot = [[u8; GRID_SIZE]; GRID_SIZE];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineClearedSnapshot {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl From<&LineClear> for LineClearedSnapshot {
    fn from(value: &LineClear) -> Self {
        Self {
            rows: value.rows.to_vec(),
            cols: value.cols.to_vec(),
        }
    }
}

/// Leaderboard record; also the persisted file layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub name: String,
    pub score: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl From<&LeaderboardRecord> for RecordSnapshot {
    fn from(value: &LeaderboardRecord) -> Self {
        Self {
            name: value.name.clone(),
            score: value.score,
            timestamp: value.timestamp_ms,
        }
    }
}

impl From<RecordSnapshot> for LeaderboardRecord {
    fn from(value: RecordSnapshot) -> Self {
        Self {
            name: value.name,
            score: value.score,
            timestamp_ms: value.timestamp,
        }
    }
}

/// Full session state (response to `init` and `get_state`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMessage {
    #[serde(rename = "type")]
    pub msg_type: StateType,
    pub seq: u64,
    pub ts: u64,
    pub session_id: String,
    pub board: BoardSnapshot,
    pub score: u32,
    pub pieces: PiecesSnapshot,
    pub is_game_over: bool,
}

/// Successful placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedMessage {
    #[serde(rename = "type")]
    pub msg_type: PlacedType,
    pub seq: u64,
    pub ts: u64,
    pub board: BoardSnapshot,
    pub score: u32,
    pub pieces: PiecesSnapshot,
    pub line_cleared: LineClearedSnapshot,
    pub is_game_over: bool,
    pub needs_new_pieces: bool,
}

/// Freshly dealt round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecesMessage {
    #[serde(rename = "type")]
    pub msg_type: PiecesType,
    pub seq: u64,
    pub ts: u64,
    pub pieces: PiecesSnapshot,
    pub is_game_over: bool,
}

/// Top record; `record` is `null` when none is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMessage {
    #[serde(rename = "type")]
    pub msg_type: RecordType,
    pub seq: u64,
    pub ts: u64,
    pub record: Option<RecordSnapshot>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
    /// Pieces still held, for `premature_replenish`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<usize>,
    /// Score to beat, for `record_not_higher`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
}

/// Any server response
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    State(StateMessage),
    Placed(PlacedMessage),
    Pieces(PiecesMessage),
    Record(RecordMessage),
    Error(ErrorMessage),
}

// ============== Message Parsing ==============

/// Parse a JSON request line
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "init")]
        Init(InitMessage),
        #[serde(rename = "place")]
        Place(PlaceMessage),
        #[serde(rename = "request_pieces")]
        RequestPieces(SessionMessage),
        #[serde(rename = "get_state")]
        GetState(SessionMessage),
        #[serde(rename = "get_top_record")]
        GetTopRecord(TopRecordMessage),
        #[serde(rename = "save_top_record")]
        SaveTopRecord(SaveRecordMessage),
    }

    const KNOWN_TYPES: [&str; 6] = [
        "init",
        "place",
        "request_pieces",
        "get_state",
        "get_top_record",
        "save_top_record",
    ];

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Init(m)) => Ok(ParsedMessage::Init(m)),
        Ok(InboundMessage::Place(m)) => Ok(ParsedMessage::Place(m)),
        Ok(InboundMessage::RequestPieces(m)) => Ok(ParsedMessage::RequestPieces(m)),
        Ok(InboundMessage::GetState(m)) => Ok(ParsedMessage::GetState(m)),
        Ok(InboundMessage::GetTopRecord(m)) => Ok(ParsedMessage::GetTopRecord(m)),
        Ok(InboundMessage::SaveTopRecord(m)) => Ok(ParsedMessage::SaveTopRecord(m)),
        Err(e) => {
            // Unknown message type is reported separately from malformed known ones.
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let tagged = serde_json::from_str::<TypeOnly>(json)?;
            let msg_type = tagged.msg_type.unwrap_or_default();
            if !KNOWN_TYPES.contains(&msg_type.as_str()) {
                return Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: tagged.seq.unwrap_or(0),
                    msg_type,
                }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Init(InitMessage),
    Place(PlaceMessage),
    RequestPieces(SessionMessage),
    GetState(SessionMessage),
    GetTopRecord(TopRecordMessage),
    SaveTopRecord(SaveRecordMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
    pub msg_type: String,
}

/// Pull `"seq": <digits>` out of a line that failed to parse
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

// ============== Utility Functions ==============

/// Create a session state message
pub fn create_state(seq: u64, session_id: &SessionId, snapshot: &SessionSnapshot) -> StateMessage {
    StateMessage {
        msg_type: StateType::State,
        seq,
        ts: current_timestamp_ms(),
        session_id: session_id.to_string(),
        board: snapshot.grid.to_rows(),
        score: snapshot.score,
        pieces: pieces_snapshot(&snapshot.slots),
        is_game_over: snapshot.is_game_over(),
    }
}

/// Create a placement result message
pub fn create_placed(seq: u64, outcome: &PlaceOutcome) -> PlacedMessage {
    PlacedMessage {
        msg_type: PlacedType::Placed,
        seq,
        ts: current_timestamp_ms(),
        board: outcome.grid.to_rows(),
        score: outcome.score,
        pieces: pieces_snapshot(&outcome.slots),
        line_cleared: LineClearedSnapshot::from(&outcome.line_clear),
        is_game_over: outcome.lifecycle.is_over(),
        needs_new_pieces: outcome.needs_replenish,
    }
}

/// Create a new-round message
pub fn create_pieces(seq: u64, snapshot: &SessionSnapshot) -> PiecesMessage {
    PiecesMessage {
        msg_type: PiecesType::Pieces,
        seq,
        ts: current_timestamp_ms(),
        pieces: pieces_snapshot(&snapshot.slots),
        is_game_over: snapshot.is_game_over(),
    }
}

/// Create a top-record message
pub fn create_record(seq: u64, record: Option<&LeaderboardRecord>) -> RecordMessage {
    RecordMessage {
        msg_type: RecordType::Record,
        seq,
        ts: current_timestamp_ms(),
        record: record.map(RecordSnapshot::from),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
        remaining: None,
        current: None,
    }
}

/// Create an error message from a rejected operation
pub fn create_game_error(seq: u64, err: &GameError) -> ErrorMessage {
    let mut msg = create_error(seq, ErrorCode::from(err), &err.to_string());
    match err {
        GameError::PrematureReplenish { remaining } => msg.remaining = Some(*remaining),
        GameError::RecordNotHigher { current, .. } => msg.current = Some(*current),
        _ => {}
    }
    msg
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init_without_session_id() {
        let json = r#"{"type":"init","seq":1,"ts":1234567890}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Init(msg) => {
                assert_eq!(msg.seq, 1);
                assert!(msg.session_id.is_none());
            }
            other => panic!("Expected Init message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_place() {
        let json = r#"{"type":"place","seq":2,"ts":1,"session_id":"abc","piece":{"id":9,"color":"red","shape":[[1,1,1,1]]},"row":0,"col":3}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Place(msg) => {
                assert_eq!(msg.session_id, "abc");
                assert_eq!(msg.piece.shape, vec![vec![1, 1, 1, 1]]);
                assert_eq!((msg.row, msg.col), (0, 3));
            }
            other => panic!("Expected Place message, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_coordinate_is_parse_error() {
        let json = r#"{"type":"place","seq":7,"session_id":"abc","piece":{"shape":[[1]]},"row":"zero","col":0}"#;
        assert!(parse_message(json).is_err());
        assert_eq!(extract_seq_best_effort(json), Some(7));
    }

    #[test]
    fn test_unknown_type_is_not_hard_error() {
        let json = r#"{"type":"dance","seq":4}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Unknown(u) => {
                assert_eq!(u.seq, 4);
                assert_eq!(u.msg_type, "dance");
            }
            other => panic!("Expected Unknown message, got {:?}", other),
        }
    }

    #[test]
    fn test_premature_replenish_error_carries_remaining() {
        let err = create_game_error(3, &GameError::PrematureReplenish { remaining: 2 });
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "premature_replenish");
        assert_eq!(v["remaining"], 2);
        assert!(v.get("current").is_none());
    }

    #[test]
    fn test_empty_record_serializes_null() {
        let msg = create_record(5, None);
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "record");
        assert!(v["record"].is_null());
    }
}
