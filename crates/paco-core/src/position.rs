//! Board position representation.
//!
//! This module contains:
//! - `Position`: every piece on the board plus the piece(s) currently in hand
//! - `VictoryState`, `RequiredAction` and `Castling`, the bookkeeping a
//!   position carries between actions
//! - Editor helpers that build or modify positions outside the rule engine
//!
//! A tile holds at most one piece of each color. Two pieces of opposite
//! color on one tile form a union.

use crate::draw::DrawState;
use crate::options::SetupOptions;
use crate::piece::{Color, Piece, PieceId, PieceKind};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a game was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VictoryReason {
    /// A union with the opponent's king was formed
    PacoUnion,
    /// The opponent ran out of time
    Timeout,
}

/// Why a game was drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    /// Too many half-moves without a union or promotion
    NoProgress,
    /// The same settled position was seen too often
    Repetition,
}

/// Whether the game is still going
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VictoryState {
    #[default]
    Running,
    Victory(Color, VictoryReason),
    Draw(DrawReason),
}

impl VictoryState {
    /// Whether the game has ended
    pub fn is_over(&self) -> bool {
        !matches!(self, VictoryState::Running)
    }

    /// The winning color, if any
    pub fn winner(&self) -> Option<Color> {
        match self {
            VictoryState::Victory(color, _) => Some(*color),
            _ => None,
        }
    }
}

/// The kind of action the position expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequiredAction {
    /// Start a move
    #[default]
    Lift,
    /// Put the piece(s) in hand down
    Place,
    /// The opponent carried one of our pawns to its last rank; promote it,
    /// then start our move
    PromoteThenLift,
    /// Promote, then keep placing the piece displaced by the chain
    PromoteThenPlace,
    /// Promote, then the move is over
    PromoteThenFinish,
}

impl RequiredAction {
    pub fn is_promote(self) -> bool {
        matches!(
            self,
            RequiredAction::PromoteThenLift
                | RequiredAction::PromoteThenPlace
                | RequiredAction::PromoteThenFinish
        )
    }
}

/// Where a position stands within a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Nothing in hand, no promotion pending
    Settled,
    /// A piece is in hand and must still be placed
    EndsWithLift,
    /// The board is settled but a pawn waits to be promoted
    AwaitingPromotion,
}

/// The two castling directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    Queen,
    King,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::Queen, CastleSide::King];

    /// File of the rook that castles on this side
    pub fn rook_file(self) -> i8 {
        match self {
            CastleSide::Queen => 0,
            CastleSide::King => 7,
        }
    }

    /// File the king lands on
    pub fn king_target_file(self) -> i8 {
        match self {
            CastleSide::Queen => 2,
            CastleSide::King => 6,
        }
    }

    /// File the rook lands on
    pub fn rook_target_file(self) -> i8 {
        match self {
            CastleSide::Queen => 3,
            CastleSide::King => 5,
        }
    }

    /// Files between king and rook that must be empty
    pub fn empty_files(self) -> &'static [i8] {
        match self {
            CastleSide::Queen => &[1, 2, 3],
            CastleSide::King => &[5, 6],
        }
    }

    /// Files the king starts on, crosses or lands on; none may be threatened
    pub fn safe_files(self) -> &'static [i8] {
        match self {
            CastleSide::Queen => &[2, 3, 4],
            CastleSide::King => &[4, 5, 6],
        }
    }
}

/// File every king starts on
pub const KING_START_FILE: i8 = 4;

/// Remaining castling rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Castling {
    pub white_queen_side: bool,
    pub white_king_side: bool,
    pub black_queen_side: bool,
    pub black_king_side: bool,
}

impl Castling {
    pub fn all() -> Self {
        Self {
            white_queen_side: true,
            white_king_side: true,
            black_queen_side: true,
            black_king_side: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_queen_side: false,
            white_king_side: false,
            black_queen_side: false,
            black_king_side: false,
        }
    }

    pub fn get(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Queen) => self.white_queen_side,
            (Color::White, CastleSide::King) => self.white_king_side,
            (Color::Black, CastleSide::Queen) => self.black_queen_side,
            (Color::Black, CastleSide::King) => self.black_king_side,
        }
    }

    pub fn set(&mut self, color: Color, side: CastleSide, allowed: bool) {
        let right = match (color, side) {
            (Color::White, CastleSide::Queen) => &mut self.white_queen_side,
            (Color::White, CastleSide::King) => &mut self.white_king_side,
            (Color::Black, CastleSide::Queen) => &mut self.black_queen_side,
            (Color::Black, CastleSide::King) => &mut self.black_king_side,
        };
        *right = allowed;
    }

    /// Drop both rights of one side
    pub fn revoke(&mut self, color: Color) {
        for side in CastleSide::ALL {
            self.set(color, side, false);
        }
    }

    /// Drop the right tied to a rook leaving `tile`, if `tile` is one of
    /// that color's rook corners
    pub fn revoke_corner(&mut self, color: Color, tile: Tile) {
        for side in CastleSide::ALL {
            if tile == Tile::new(side.rook_file(), color.home_rank()) {
                self.set(color, side, false);
            }
        }
    }
}

impl Default for Castling {
    fn default() -> Self {
        Self::all()
    }
}

/// A position that breaks one of the board invariants
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PositionError {
    #[error("Tile {0} is off the board")]
    OffBoard(Tile),

    #[error("Two {color} pieces on {tile}")]
    Stacked { tile: Tile, color: Color },

    #[error("Piece id {0:?} is used twice")]
    DuplicateId(PieceId),

    #[error("{0} pieces in hand, at most two allowed")]
    TooManyLifted(usize),

    #[error("Lifted pieces of the same color")]
    LiftedSameColor,

    #[error("King in a union on {0} in a running game")]
    KingInUnion(Tile),

    #[error("Id counter {next} would reuse an existing id")]
    StaleIdCounter { next: u32 },
}

/// A snapshot of the game.
///
/// Positions are values: the rule engine clones and returns a new one for
/// every action, and equality compares every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Pieces on the board, ordered by id
    pub(crate) pieces: Vec<Piece>,
    /// Pieces in hand. The first one belongs to the mover, the second one is
    /// its union partner when a whole union was lifted.
    pub(crate) lifted: Vec<Piece>,
    pub(crate) turn: Color,
    pub(crate) required: RequiredAction,
    pub(crate) victory: VictoryState,
    /// Tile of a pawn waiting to be promoted
    pub(crate) promotion: Option<Tile>,
    /// Tile skipped by the last double pawn step
    pub(crate) en_passant: Option<Tile>,
    pub(crate) castling: Castling,
    pub(crate) draw: DrawState,
    /// Next fresh piece id
    pub(crate) next_id: u32,
}

impl Position {
    // ==================== Construction ====================

    /// An empty board with White to move
    pub fn empty() -> Self {
        Self::empty_with(SetupOptions::default())
    }

    pub fn empty_with(options: SetupOptions) -> Self {
        Self {
            pieces: Vec::new(),
            lifted: Vec::new(),
            turn: Color::White,
            required: RequiredAction::Lift,
            victory: VictoryState::Running,
            promotion: None,
            en_passant: None,
            castling: Castling::none(),
            draw: DrawState::new(options),
            next_id: 0,
        }
    }

    /// The standard starting position with White to move
    pub fn initial() -> Self {
        Self::initial_with(SetupOptions::default())
    }

    pub fn initial_with(options: SetupOptions) -> Self {
        let mut position = Self::empty_with(options);
        for color in Color::ALL {
            for (x, kind) in PieceKind::BACK_RANK.iter().enumerate() {
                position.spawn(color, *kind, Tile::new(x as i8, color.home_rank()));
            }
            for x in 0..8 {
                position.spawn(color, PieceKind::Pawn, Tile::new(x, color.pawn_rank()));
            }
        }
        position.castling = Castling::all();
        position
    }

    /// Build a settled position from piece placements.
    ///
    /// Ids are handed out in iteration order. Castling rights are granted
    /// wherever king and rook stand on their start tiles.
    pub fn from_pieces<I>(
        turn: Color,
        placements: I,
        options: SetupOptions,
    ) -> Result<Self, PositionError>
    where
        I: IntoIterator<Item = (Color, PieceKind, Tile)>,
    {
        let mut position = Self::empty_with(options);
        position.turn = turn;
        for (color, kind, tile) in placements {
            if !tile.in_bounds() {
                return Err(PositionError::OffBoard(tile));
            }
            if position.has_piece(tile, color) {
                return Err(PositionError::Stacked { tile, color });
            }
            position.spawn(color, kind, tile);
        }
        position.castling = Castling::all();
        position.refresh_castling();
        position.validate()?;
        Ok(position)
    }

    pub(crate) fn spawn(&mut self, color: Color, kind: PieceKind, tile: Tile) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.put(Piece::new(id, color, kind, tile));
        id
    }

    // ==================== Queries ====================

    /// Pieces on the board, ordered by id
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Pieces in hand
    pub fn lifted(&self) -> &[Piece] {
        &self.lifted
    }

    /// The color whose action is expected
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn required(&self) -> RequiredAction {
        self.required
    }

    pub fn victory(&self) -> VictoryState {
        self.victory
    }

    pub fn promotion(&self) -> Option<Tile> {
        self.promotion
    }

    pub fn en_passant(&self) -> Option<Tile> {
        self.en_passant
    }

    pub fn castling(&self) -> Castling {
        self.castling
    }

    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    /// Whether nothing is in hand
    pub fn is_settled(&self) -> bool {
        self.lifted.is_empty()
    }

    pub fn move_status(&self) -> MoveStatus {
        if !self.lifted.is_empty() {
            MoveStatus::EndsWithLift
        } else if self.required.is_promote() {
            MoveStatus::AwaitingPromotion
        } else {
            MoveStatus::Settled
        }
    }

    /// The piece of `color` on `tile`
    pub fn piece_at(&self, tile: Tile, color: Color) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|piece| piece.tile == tile && piece.color == color)
    }

    /// Every piece on `tile`; zero, one or two
    pub fn pieces_at(&self, tile: Tile) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces.iter().filter(move |piece| piece.tile == tile)
    }

    pub fn has_piece(&self, tile: Tile, color: Color) -> bool {
        self.piece_at(tile, color).is_some()
    }

    pub fn is_occupied(&self, tile: Tile) -> bool {
        self.pieces_at(tile).next().is_some()
    }

    /// Whether `tile` holds a White and a Black piece
    pub fn is_union(&self, tile: Tile) -> bool {
        self.has_piece(tile, Color::White) && self.has_piece(tile, Color::Black)
    }

    /// A piece on the board or in hand, by id
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces
            .iter()
            .chain(self.lifted.iter())
            .find(|piece| piece.id == id)
    }

    /// The king of `color` if it stands on the board
    pub fn king(&self, color: Color) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|piece| piece.color == color && piece.kind == PieceKind::King)
    }

    // ==================== Board mutation ====================

    /// Remove the piece of `color` on `tile` from the board
    pub(crate) fn take_piece(&mut self, tile: Tile, color: Color) -> Option<Piece> {
        let index = self
            .pieces
            .iter()
            .position(|piece| piece.tile == tile && piece.color == color)?;
        Some(self.pieces.remove(index))
    }

    /// Put a piece on the board at its own tile, keeping id order
    pub(crate) fn put(&mut self, piece: Piece) {
        let index = self.pieces.partition_point(|other| other.id < piece.id);
        self.pieces.insert(index, piece);
    }

    /// Exchange the contents of two tiles
    pub(crate) fn swap_tiles(&mut self, a: Tile, b: Tile) {
        for piece in &mut self.pieces {
            if piece.tile == a {
                piece.tile = b;
            } else if piece.tile == b {
                piece.tile = a;
            }
        }
    }

    /// Keep only the castling rights whose king and rook still stand on
    /// their start tiles
    pub(crate) fn refresh_castling(&mut self) {
        for color in Color::ALL {
            let rank = color.home_rank();
            let king_home = self
                .piece_at(Tile::new(KING_START_FILE, rank), color)
                .is_some_and(|piece| piece.kind == PieceKind::King);
            for side in CastleSide::ALL {
                let rook_home = self
                    .piece_at(Tile::new(side.rook_file(), rank), color)
                    .is_some_and(|piece| piece.kind == PieceKind::Rook);
                let allowed = self.castling.get(color, side) && king_home && rook_home;
                self.castling.set(color, side, allowed);
            }
        }
    }

    // ==================== Editor operations ====================

    /// Replace any piece of `color` on `tile` with a new piece of `kind`.
    ///
    /// The new piece gets a fresh id; ids are never reused.
    pub fn put_piece(
        &mut self,
        color: Color,
        kind: PieceKind,
        tile: Tile,
    ) -> Result<PieceId, PositionError> {
        if !tile.in_bounds() {
            return Err(PositionError::OffBoard(tile));
        }
        self.take_piece(tile, color);
        let id = self.spawn(color, kind, tile);
        self.refresh_castling();
        Ok(id)
    }

    /// Remove every piece on `tile` that matches `filter`. Returns how many
    /// were removed.
    pub fn remove_matching<F>(&mut self, tile: Tile, filter: F) -> usize
    where
        F: Fn(&Piece) -> bool,
    {
        let before = self.pieces.len();
        self.pieces
            .retain(|piece| !(piece.tile == tile && filter(piece)));
        let removed = before - self.pieces.len();
        if removed > 0 {
            self.refresh_castling();
        }
        removed
    }

    /// End the game because `loser` ran out of time. Returns false if the
    /// game was already over.
    pub fn declare_timeout(&mut self, loser: Color) -> bool {
        if self.victory.is_over() {
            return false;
        }
        self.victory = VictoryState::Victory(loser.other(), VictoryReason::Timeout);
        true
    }

    /// Check the board invariants
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.lifted.len() > 2 {
            return Err(PositionError::TooManyLifted(self.lifted.len()));
        }
        if let [first, second] = self.lifted.as_slice() {
            if first.color == second.color {
                return Err(PositionError::LiftedSameColor);
            }
        }

        let all: Vec<&Piece> = self.pieces.iter().chain(self.lifted.iter()).collect();
        for (i, piece) in all.iter().enumerate() {
            if !piece.tile.in_bounds() {
                return Err(PositionError::OffBoard(piece.tile));
            }
            if piece.id.0 >= self.next_id {
                return Err(PositionError::StaleIdCounter { next: self.next_id });
            }
            if all[..i].iter().any(|other| other.id == piece.id) {
                return Err(PositionError::DuplicateId(piece.id));
            }
        }

        for (i, piece) in self.pieces.iter().enumerate() {
            let clash = self.pieces[..i]
                .iter()
                .find(|other| other.tile == piece.tile);
            if let Some(other) = clash {
                if other.color == piece.color {
                    return Err(PositionError::Stacked {
                        tile: piece.tile,
                        color: piece.color,
                    });
                }
                let king_inside =
                    piece.kind == PieceKind::King || other.kind == PieceKind::King;
                if king_inside && !self.victory.is_over() {
                    return Err(PositionError::KingInUnion(piece.tile));
                }
            }
        }

        Ok(())
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}
