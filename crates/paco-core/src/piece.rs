//! Pieces and their owners.
//!
//! This module contains:
//! - `Color` of the two sides, with the rank geometry that depends on it
//! - `PieceKind` for the six conventional chess pieces
//! - `PieceId`, the stable identity a renderer uses to animate a piece
//! - `Piece`, a piece standing on (or lifted from) a tile

use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Both colors, White first
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// The opponent
    pub fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank delta of a pawn step
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank of this side's back row
    pub fn home_rank(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank this side's pawns start on
    pub fn pawn_rank(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank on which this side's pawns promote
    pub fn promotion_rank(self) -> i8 {
        self.other().home_rank()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// Kind of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may promote to
    pub const PROMOTION_OPTIONS: [PieceKind; 4] = [
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
    ];

    /// Whether a pawn may promote to this kind
    pub fn is_promotion_option(self) -> bool {
        !matches!(self, PieceKind::Pawn | PieceKind::King)
    }

    /// Back rank layout of the standard setup, a-file first
    pub const BACK_RANK: [PieceKind; 8] = [
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
    ];
}

/// Stable identity of a piece.
///
/// Assigned once when the piece is created and never reused within a
/// position's lineage. Promotion keeps the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// A piece. For a lifted piece `tile` is the tile it was lifted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub kind: PieceKind,
    pub tile: Tile,
}

impl Piece {
    pub fn new(id: PieceId, color: Color, kind: PieceKind, tile: Tile) -> Self {
        Self {
            id,
            color,
            kind,
            tile,
        }
    }
}
