//! Adapter module - block puzzle sessions over a TCP socket with JSON protocol
//!
//! This module exposes the game engine in `block_puzzle_core` to remote
//! clients. The client only renders and picks moves; every rule is enforced
//! here and every response carries the authoritative state.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Init**: Client sends `init`, server responds with `state` and a session id
//! 3. **Play**: Client sends `place` for each piece, server responds with `placed`
//! 4. **Replenish**: Once all three pieces are placed, client sends `request_pieces`
//! 5. **Game over**: Flagged by `is_game_over`; the client may then submit a record
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **init**: Start a game, optionally under a caller-chosen `session_id`
//! - **place**: Place a held piece (matched by shape) at `row`/`col`
//! - **request_pieces**: Deal the next round of three pieces
//! - **get_state**: Fetch the full session state
//! - **get_top_record** / **save_top_record**: Read or beat the global high score
//!
//! ## Server → Client
//!
//! - **state**: Board, score, held pieces and game-over flag
//! - **placed**: Result of a placement, including cleared rows and columns
//! - **pieces**: A freshly dealt round
//! - **record**: The top record, or `null`
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `BLOCK_PUZZLE_HOST`: Bind address (default: "127.0.0.1")
//! - `BLOCK_PUZZLE_PORT`: Port number (default: 7878)
//! - `BLOCK_PUZZLE_RECORD_PATH`: JSON file holding the top record
//! - `BLOCK_PUZZLE_SEED`: Master seed for reproducible dealing
//! - `BLOCK_PUZZLE_LOG_PATH`: Append every wire line to this file
//! - `BLOCK_PUZZLE_MAX_SESSIONS`: Session cap before LRU eviction (default: 1024)
//! - `BLOCK_PUZZLE_MAX_LINE_BYTES`: Longest accepted request line (default: 65536)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"init","seq":1,"ts":1234567890}
//! Server -> Client: {"type":"state","seq":1,"ts":1234567890,"session_id":"5f0c...","board":[[0,0,...],...],"score":0,"pieces":[{"id":17,"color":"teal","shape":[[1,1,1,1]]},...],"is_game_over":false}
//! Client -> Server: {"type":"place","seq":2,"ts":1234567891,"session_id":"5f0c...","piece":{"shape":[[1,1,1,1]]},"row":0,"col":0}
//! Server -> Client: {"type":"placed","seq":2,"ts":1234567891,"board":[[1,1,1,1,0,0,0,0],...],"score":4,"pieces":[null,...],"line_cleared":{"rows":[],"cols":[]},"is_game_over":false,"needs_new_pieces":false}
//! ```

pub mod protocol;
pub mod record_file;
pub mod server;
pub mod service;

pub use block_puzzle_core as core;
pub use block_puzzle_types as types;

pub use server::{check_tcp_listen_available, handle_line, run_server, ServerConfig};
pub use service::{ServiceOptions, SessionService};
