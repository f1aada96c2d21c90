//! Board coordinates.
//!
//! This module provides the coordinate type for the 8x8 board:
//! - `Tile`: one square, addressed by file (`x`) and rank (`y`)
//! - Step tables for the conventional piece geometries
//!
//! `x = 0` is the a-file and `y = 0` is White's back rank, so `Tile::new(4, 0)`
//! is e1. A `Tile` can hold coordinates off the board (deserialized input,
//! intermediate offsets); the rule engine rejects those before touching the board.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width and height of the board.
pub const BOARD_SIZE: i8 = 8;

/// Orthogonal sliding directions (rook).
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Diagonal sliding directions (bishop).
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// All eight directions. Queens slide along them, kings step once.
pub const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Knight jumps.
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// A square on the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    /// File, 0 (a) to 7 (h)
    pub x: i8,
    /// Rank, 0 (White's back rank) to 7 (Black's back rank)
    pub y: i8,
}

impl Tile {
    /// Create a tile without range checking
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Create a tile, returning `None` for coordinates off the board
    pub fn checked(x: i8, y: i8) -> Option<Self> {
        let tile = Self::new(x, y);
        tile.in_bounds().then_some(tile)
    }

    /// Whether both coordinates lie in `0..8`
    pub const fn in_bounds(&self) -> bool {
        self.x >= 0 && self.x < BOARD_SIZE && self.y >= 0 && self.y < BOARD_SIZE
    }

    /// The tile reached by stepping `(dx, dy)`, if it is still on the board
    pub fn offset(&self, (dx, dy): (i8, i8)) -> Option<Self> {
        Self::checked(self.x + dx, self.y + dy)
    }

    /// Row-major index in `0..64`. Only meaningful for in-bounds tiles.
    pub const fn index(&self) -> usize {
        (self.y as usize) * 8 + self.x as usize
    }

    /// Inverse of [`Tile::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        if index < 64 {
            Some(Self::new((index % 8) as i8, (index / 8) as i8))
        } else {
            None
        }
    }

    /// All 64 tiles, a1 first, h8 last
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..64).filter_map(Tile::from_index)
    }
}

/// Debug output uses algebraic notation, which is far easier to read in
/// assertion failures than `Tile { x: 4, y: 3 }`.
impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_bounds() {
            let file = (b'a' + self.x as u8) as char;
            write!(f, "{}{}", file, self.y + 1)
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}

/// A set of on-board tiles, one bit per tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileSet(u64);

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile. Off-board tiles are ignored.
    pub fn insert(&mut self, tile: Tile) {
        if tile.in_bounds() {
            self.0 |= 1 << tile.index();
        }
    }

    pub fn insert_all(&mut self, other: TileSet) {
        self.0 |= other.0;
    }

    pub fn contains(&self, tile: Tile) -> bool {
        tile.in_bounds() && self.0 & (1 << tile.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Tiles in index order
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        Tile::all().filter(move |tile| self.contains(*tile))
    }
}

impl FromIterator<Tile> for TileSet {
    fn from_iter<I: IntoIterator<Item = Tile>>(iter: I) -> Self {
        let mut set = TileSet::new();
        for tile in iter {
            set.insert(tile);
        }
        set
    }
}

/// Failure to read a tile in algebraic notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected a tile like 'd5' or 'f2', got '{0}'")]
pub struct TileParseError(pub String);

impl FromStr for Tile {
    type Err = TileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(TileParseError(s.to_string()));
        }

        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file >= 8 || rank >= 8 {
            return Err(TileParseError(s.to_string()));
        }

        Ok(Tile::new(file as i8, rank as i8))
    }
}
