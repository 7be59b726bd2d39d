//! Block puzzle (workspace facade crate).
//!
//! Exposes `block_puzzle::{types,core,adapter}` while the implementation lives in
//! dedicated crates under `crates/`.

pub use block_puzzle_adapter as adapter;
pub use block_puzzle_core as core;
pub use block_puzzle_types as types;
