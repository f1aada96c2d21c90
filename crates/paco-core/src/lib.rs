//! Paco - the client core of a Paco Ŝako board
//!
//! Paco Ŝako is a chess variant without captures: a piece moving onto an
//! opponent piece forms a union with it, unions move together, and taking
//! over a union sets off a chain. This crate provides:
//! - The rule engine deciding what lift, place and promote actions do
//! - The gesture state machine turning pointer events into those actions
//! - An undo/redo history of committed positions
//! - Reconciliation of a locally predicted action history with an
//!   authoritative one
//!
//! # Architecture
//!
//! The core is platform-agnostic and synchronous. It can be compiled to:
//! - Native Rust, e.g. to replay and check recorded games
//! - WebAssembly for the browser (feature `wasm`)
//!
//! # Modules
//!
//! - [`tile`]: Board coordinates
//! - [`piece`]: Colors, piece kinds and identities
//! - [`position`]: Board positions and editor helpers
//! - [`engine`]: The rule engine
//! - [`gesture`]: The Smart Tool gesture state machine
//! - [`history`]: Undo/redo of committed positions
//! - [`reconcile`]: Action history reconciliation
//! - [`session`]: Synchronization with a remote game
//! - [`client`]: Controller wiring the above together

pub mod actions;
pub mod client;
pub mod draw;
pub mod engine;
pub mod gesture;
pub mod history;
mod movement;
pub mod options;
pub mod piece;
pub mod position;
pub mod random;
pub mod reconcile;
pub mod session;
pub mod threats;
pub mod tile;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{Action, BoardEvent, IndexedAction};
pub use client::PlayClient;
pub use engine::{
    apply, apply_with_events, find_last_checkpoint, legal_actions, place_targets, replay,
    IllegalAction, ReplayError,
};
pub use gesture::{
    Commit, HighlightKind, PointerEvent, PointerKind, ScreenPoint, SmartTool, ToolEvent,
    ToolOutput,
};
pub use history::History;
pub use options::SetupOptions;
pub use piece::{Color, Piece, PieceId, PieceKind};
pub use position::{
    Castling, DrawReason, MoveStatus, Position, PositionError, RequiredAction, VictoryReason,
    VictoryState,
};
pub use random::random_position;
pub use session::{SyncError, SyncOutcome, SyncSession};
pub use tile::{Tile, TileSet};
