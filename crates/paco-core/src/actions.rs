//! Player actions and the events they produce.
//!
//! A move is a sequence of actions: it starts with `Lift`, continues with one
//! `Place` per piece in hand, and may need a trailing `Promote`.

use crate::piece::{Color, PieceId, PieceKind};
use crate::position::VictoryState;
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single step of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Pick up the piece (or union) on a tile
    Lift(Tile),
    /// Put the piece(s) in hand down on a tile
    Place(Tile),
    /// Turn the pending pawn into another kind
    Promote(PieceKind),
}

impl Action {
    /// The tile the action refers to, if any
    pub fn tile(&self) -> Option<Tile> {
        match self {
            Action::Lift(tile) | Action::Place(tile) => Some(*tile),
            Action::Promote(_) => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Lift(tile) => write!(f, "lift {}", tile),
            Action::Place(tile) => write!(f, "place {}", tile),
            Action::Promote(kind) => write!(f, "promote {:?}", kind),
        }
    }
}

/// An action tagged with its index in the game's action history, as sent
/// to a remote peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAction {
    pub index: usize,
    pub action: Action,
}

/// Events that result from applying an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardEvent {
    /// Piece(s) picked up; a union lifts both members
    Lifted { pieces: Vec<PieceId>, from: Tile },
    /// Piece(s) put down
    Placed { pieces: Vec<PieceId>, to: Tile },
    /// The mover's piece joined an opponent piece
    UnionFormed {
        tile: Tile,
        mover: PieceId,
        partner: PieceId,
    },
    /// A piece was displaced from a union and is now in hand
    ChainContinued { tile: Tile, lifted: PieceId },
    /// The double-stepped piece(s) moved back onto the skipped tile
    EnPassant { from: Tile, to: Tile },
    /// The rook jumped over the king
    Castled { rook: PieceId, from: Tile, to: Tile },
    /// A pawn changed kind
    Promoted {
        piece: PieceId,
        tile: Tile,
        kind: PieceKind,
    },
    /// The other side is to move
    TurnPassed { next: Color },
    /// The game ended
    GameEnded { state: VictoryState },
}
