//! The rule engine.
//!
//! `apply` takes one action and a position and returns a new position, or
//! the rule the action breaks. It never mutates its input, so a rejected
//! action leaves the caller's position untouched.
//!
//! A move starts with a lift, places the piece(s) in hand, keeps placing as
//! long as take-overs of unions put new pieces in hand, and may end with a
//! promotion.

use crate::actions::{Action, BoardEvent};
use crate::draw;
use crate::movement;
use crate::piece::{Piece, PieceKind};
use crate::position::{
    CastleSide, Position, RequiredAction, VictoryReason, VictoryState, KING_START_FILE,
};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Why an action was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IllegalAction {
    #[error("Game is over")]
    GameOver,

    #[error("Tile {0} is off the board")]
    OffBoard(Tile),

    #[error("Cannot lift now, expected {0:?}")]
    LiftWhenNotAllowed(RequiredAction),

    #[error("Cannot place now, expected {0:?}")]
    PlaceWhenNotAllowed(RequiredAction),

    #[error("Cannot promote now, expected {0:?}")]
    PromoteWhenNotAllowed(RequiredAction),

    #[error("Already holding a piece")]
    HandFull,

    #[error("Nothing in hand")]
    HandEmpty,

    #[error("No piece on {0}")]
    EmptyTile(Tile),

    #[error("No piece of the side to move on {0}")]
    NotYourPiece(Tile),

    #[error("Piece on {0} has nowhere to go")]
    NoPlaceTarget(Tile),

    #[error("Cannot place on {0}")]
    Unreachable(Tile),

    #[error("No pawn waiting for promotion")]
    PromoteWithoutCandidate,

    #[error("Cannot promote to {0:?}")]
    InvalidPromotion(PieceKind),
}

/// An action history that can't be replayed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Action {index} cannot be applied: {source}")]
pub struct ReplayError {
    /// Index of the first action that failed
    pub index: usize,
    pub source: IllegalAction,
}

/// How much checking an action gets before it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Validation {
    /// Every movement rule is checked
    Full,
    /// The caller already knows the action is reachable
    Trusted,
}

// ==================== Public API ====================

/// Apply one action to a position
pub fn apply(action: Action, position: &Position) -> Result<Position, IllegalAction> {
    apply_with_events(action, position).map(|(next, _)| next)
}

/// Apply one action and also report what happened on the board
pub fn apply_with_events(
    action: Action,
    position: &Position,
) -> Result<(Position, Vec<BoardEvent>), IllegalAction> {
    let mut next = position.clone();
    let mut events = Vec::new();
    if let Err(err) = next.execute(action, Validation::Full, &mut events) {
        debug!(%action, %err, "Rejected action");
        return Err(err);
    }
    if next.turn != position.turn && next.required == RequiredAction::Lift {
        info!(mover = %position.turn, %action, "Move completed");
    }
    Ok((next, events))
}

/// Apply a whole action history
pub fn replay(initial: &Position, actions: &[Action]) -> Result<Position, ReplayError> {
    let mut position = initial.clone();
    for (index, action) in actions.iter().enumerate() {
        position = apply(*action, &position).map_err(|source| ReplayError { index, source })?;
    }
    Ok(position)
}

/// Tiles the piece(s) in hand may be placed on, in index order
pub fn place_targets(position: &Position) -> Vec<Tile> {
    movement::place_targets(position).iter().collect()
}

/// Every action the position accepts next
pub fn legal_actions(position: &Position) -> Vec<Action> {
    if position.victory.is_over() {
        return Vec::new();
    }

    match position.required {
        RequiredAction::Lift => position
            .pieces
            .iter()
            .filter(|piece| piece.color == position.turn)
            .map(|piece| piece.tile)
            .filter(|tile| {
                let mut lifted = position.clone();
                lifted
                    .execute(Action::Lift(*tile), Validation::Trusted, &mut Vec::new())
                    .is_ok()
                    && !movement::place_targets(&lifted).is_empty()
            })
            .map(Action::Lift)
            .collect(),
        RequiredAction::Place => movement::place_targets(position)
            .iter()
            .map(Action::Place)
            .collect(),
        _ => PieceKind::PROMOTION_OPTIONS
            .iter()
            .map(|kind| Action::Promote(*kind))
            .collect(),
    }
}

/// Index just past the last action that handed the turn to the other side.
///
/// Everything after it belongs to a move still in progress. A finished game
/// has no move in progress, so its full length is returned.
pub fn find_last_checkpoint(initial: &Position, actions: &[Action]) -> Result<usize, ReplayError> {
    let mut position = initial.clone();
    let mut checkpoint = 0;
    for (index, action) in actions.iter().enumerate() {
        let before = position.turn;
        position = apply(*action, &position).map_err(|source| ReplayError { index, source })?;
        if position.turn != before {
            checkpoint = index + 1;
        }
    }

    if position.victory.is_over() {
        Ok(actions.len())
    } else {
        Ok(checkpoint)
    }
}

// ==================== Action execution ====================

impl Position {
    pub(crate) fn execute(
        &mut self,
        action: Action,
        validation: Validation,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        if self.victory.is_over() {
            return Err(IllegalAction::GameOver);
        }
        match action {
            Action::Lift(tile) => self.lift(tile, validation, events),
            Action::Place(tile) => self.place(tile, validation, events),
            Action::Promote(kind) => self.promote(kind, events),
        }
    }

    fn lift(
        &mut self,
        tile: Tile,
        validation: Validation,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        if !tile.in_bounds() {
            return Err(IllegalAction::OffBoard(tile));
        }
        if self.required != RequiredAction::Lift {
            return Err(IllegalAction::LiftWhenNotAllowed(self.required));
        }
        if !self.lifted.is_empty() {
            return Err(IllegalAction::HandFull);
        }

        let mover = self.turn;
        let own = match self.take_piece(tile, mover) {
            Some(piece) => piece,
            None if self.is_occupied(tile) => return Err(IllegalAction::NotYourPiece(tile)),
            None => return Err(IllegalAction::EmptyTile(tile)),
        };
        let partner = self.take_piece(tile, mover.other());

        // A rook leaving its corner, in a union or not, loses its castling right
        if own.kind == PieceKind::Rook {
            self.castling.revoke_corner(mover, tile);
        }
        if let Some(partner) = partner.filter(|piece| piece.kind == PieceKind::Rook) {
            self.castling.revoke_corner(partner.color, tile);
        }

        self.draw.half_move_without_progress();
        self.lifted.push(own);
        self.lifted.extend(partner);
        self.required = RequiredAction::Place;
        events.push(BoardEvent::Lifted {
            pieces: self.lifted.iter().map(|piece| piece.id).collect(),
            from: tile,
        });

        if validation == Validation::Full && movement::place_targets(self).is_empty() {
            return Err(IllegalAction::NoPlaceTarget(tile));
        }
        Ok(())
    }

    fn place(
        &mut self,
        target: Tile,
        validation: Validation,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        if !target.in_bounds() {
            return Err(IllegalAction::OffBoard(target));
        }
        if self.required != RequiredAction::Place {
            return Err(IllegalAction::PlaceWhenNotAllowed(self.required));
        }
        if self.lifted.is_empty() {
            return Err(IllegalAction::HandEmpty);
        }
        if validation == Validation::Full && !movement::place_targets(self).contains(target) {
            return Err(IllegalAction::Unreachable(target));
        }

        let hand = std::mem::take(&mut self.lifted);
        match hand[..] {
            [piece] => self.place_single(piece, target, events),
            [piece, partner] => self.place_pair(piece, partner, target, events),
            _ => Err(IllegalAction::HandFull),
        }
    }

    fn place_single(
        &mut self,
        piece: Piece,
        target: Tile,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        let mover = piece.color;
        let origin = piece.tile;

        if piece.kind == PieceKind::King {
            return self.place_king(piece, target, events);
        }

        // En passant: whatever stands on the double-stepped tile moves back
        // onto the skipped tile before the pawn lands
        if piece.kind == PieceKind::Pawn && self.en_passant == Some(target) && origin.x != target.x
        {
            if let Some(passed) = target.offset((0, mover.other().forward())) {
                self.swap_tiles(target, passed);
                events.push(BoardEvent::EnPassant {
                    from: passed,
                    to: target,
                });
            }
        }

        if piece.kind == PieceKind::Pawn && target.y == mover.promotion_rank() {
            self.promotion = Some(target);
        }

        let displaced = self.take_piece(target, mover);
        self.put(Piece {
            tile: target,
            ..piece
        });
        events.push(BoardEvent::Placed {
            pieces: vec![piece.id],
            to: target,
        });

        if let Some(displaced) = displaced {
            // Take-over: the piece we displaced is now in hand
            self.lifted.push(Piece {
                tile: target,
                ..displaced
            });
            self.required = if self.promotion.is_some() {
                RequiredAction::PromoteThenPlace
            } else {
                RequiredAction::Place
            };
            events.push(BoardEvent::ChainContinued {
                tile: target,
                lifted: displaced.id,
            });
            return Ok(());
        }

        self.en_passant = None;
        if let Some(partner) = self.piece_at(target, mover.other()).copied() {
            self.draw.reset_progress();
            events.push(BoardEvent::UnionFormed {
                tile: target,
                mover: piece.id,
                partner: partner.id,
            });
            if partner.kind == PieceKind::King {
                self.required = RequiredAction::Lift;
                self.promotion = None;
                self.victory = VictoryState::Victory(mover, VictoryReason::PacoUnion);
                info!(winner = %mover, tile = %target, "Union with the king");
                events.push(BoardEvent::GameEnded {
                    state: self.victory,
                });
                return Ok(());
            }
        }

        self.mark_en_passant(&piece, target);
        if self.promotion.is_some() {
            self.required = RequiredAction::PromoteThenFinish;
        } else {
            self.finish_turn(events);
        }
        Ok(())
    }

    fn place_pair(
        &mut self,
        piece: Piece,
        partner: Piece,
        target: Tile,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        if self.is_occupied(target) {
            return Err(IllegalAction::Unreachable(target));
        }
        let mover = piece.color;

        self.put(Piece {
            tile: target,
            ..piece
        });
        self.put(Piece {
            tile: target,
            ..partner
        });
        events.push(BoardEvent::Placed {
            pieces: vec![piece.id, partner.id],
            to: target,
        });

        self.en_passant = None;
        self.mark_en_passant(&piece, target);

        if piece.kind == PieceKind::Pawn && target.y == mover.promotion_rank() {
            self.promotion = Some(target);
            self.required = RequiredAction::PromoteThenFinish;
        } else if partner.kind == PieceKind::Pawn && target.y == partner.color.promotion_rank() {
            // The opponent's pawn arrived; they promote it before their move
            self.promotion = Some(target);
            self.required = RequiredAction::PromoteThenLift;
            self.turn = partner.color;
            events.push(BoardEvent::TurnPassed {
                next: partner.color,
            });
        } else {
            self.finish_turn(events);
        }
        Ok(())
    }

    fn place_king(
        &mut self,
        king: Piece,
        target: Tile,
        events: &mut Vec<BoardEvent>,
    ) -> Result<(), IllegalAction> {
        let mover = king.color;
        let rank = mover.home_rank();
        let castles = king.tile == Tile::new(KING_START_FILE, rank)
            && target.y == rank
            && (target.x - king.tile.x).abs() == 2;

        if castles {
            let side = if target.x < king.tile.x {
                CastleSide::Queen
            } else {
                CastleSide::King
            };
            let rook_from = Tile::new(side.rook_file(), rank);
            let rook_to = Tile::new(side.rook_target_file(), rank);
            if let Some(rook) = self.piece_at(rook_from, mover).copied() {
                self.swap_tiles(rook_from, rook_to);
                events.push(BoardEvent::Castled {
                    rook: rook.id,
                    from: rook_from,
                    to: rook_to,
                });
            }
        }

        self.put(Piece {
            tile: target,
            ..king
        });
        events.push(BoardEvent::Placed {
            pieces: vec![king.id],
            to: target,
        });
        self.castling.revoke(mover);
        self.en_passant = None;
        self.finish_turn(events);
        Ok(())
    }

    fn promote(&mut self, kind: PieceKind, events: &mut Vec<BoardEvent>) -> Result<(), IllegalAction> {
        if !self.required.is_promote() {
            return Err(IllegalAction::PromoteWhenNotAllowed(self.required));
        }
        if !kind.is_promotion_option() {
            return Err(IllegalAction::InvalidPromotion(kind));
        }
        let tile = self.promotion.ok_or(IllegalAction::PromoteWithoutCandidate)?;
        let turn = self.turn;
        let pawn = self
            .pieces
            .iter_mut()
            .find(|piece| piece.tile == tile && piece.color == turn && piece.kind == PieceKind::Pawn)
            .ok_or(IllegalAction::PromoteWithoutCandidate)?;
        pawn.kind = kind;
        let id = pawn.id;

        self.promotion = None;
        self.draw.reset_progress();
        events.push(BoardEvent::Promoted {
            piece: id,
            tile,
            kind,
        });

        match self.required {
            RequiredAction::PromoteThenLift => {
                self.required = RequiredAction::Lift;
                self.record_settled(events);
            }
            RequiredAction::PromoteThenPlace => {
                self.required = RequiredAction::Place;
            }
            _ => {
                self.en_passant = None;
                self.finish_turn(events);
            }
        }
        Ok(())
    }

    /// A double step from the pawn's starting rank leaves the skipped tile
    /// open for en passant
    fn mark_en_passant(&mut self, piece: &Piece, target: Tile) {
        let origin = piece.tile;
        if piece.kind == PieceKind::Pawn
            && origin.y == piece.color.pawn_rank()
            && origin.x == target.x
            && (target.y - origin.y).abs() == 2
        {
            self.en_passant = Some(Tile::new(origin.x, (origin.y + target.y) / 2));
        }
    }

    fn finish_turn(&mut self, events: &mut Vec<BoardEvent>) {
        self.required = RequiredAction::Lift;
        self.turn = self.turn.other();
        events.push(BoardEvent::TurnPassed { next: self.turn });
        self.record_settled(events);
    }

    fn record_settled(&mut self, events: &mut Vec<BoardEvent>) {
        draw::record_settled(self);
        if self.victory.is_over() {
            events.push(BoardEvent::GameEnded {
                state: self.victory,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SetupOptions;
    use crate::piece::Color;
    use crate::position::DrawReason;

    fn tile(name: &str) -> Tile {
        name.parse().unwrap()
    }

    fn position(turn: Color, pieces: &[(Color, PieceKind, &str)]) -> Position {
        Position::from_pieces(
            turn,
            pieces.iter().map(|(color, kind, name)| (*color, *kind, tile(name))),
            SetupOptions::default(),
        )
        .unwrap()
    }

    fn run(position: &Position, actions: &[Action]) -> Position {
        replay(position, actions).unwrap()
    }

    fn lift(name: &str) -> Action {
        Action::Lift(tile(name))
    }

    fn place(name: &str) -> Action {
        Action::Place(tile(name))
    }

    #[test]
    fn test_initial_legal_lifts() {
        let actions = legal_actions(&Position::initial());
        // Eight pawns and two knights can move
        assert_eq!(actions.len(), 10);
        assert!(actions.contains(&lift("b1")));
        assert!(!actions.contains(&lift("a1")));
    }

    #[test]
    fn test_lift_errors() {
        let start = Position::initial();
        assert_eq!(apply(lift("e4"), &start), Err(IllegalAction::EmptyTile(tile("e4"))));
        assert_eq!(apply(lift("e7"), &start), Err(IllegalAction::NotYourPiece(tile("e7"))));
        assert_eq!(apply(lift("a1"), &start), Err(IllegalAction::NoPlaceTarget(tile("a1"))));
        assert_eq!(
            apply(Action::Lift(Tile::new(8, 0)), &start),
            Err(IllegalAction::OffBoard(Tile::new(8, 0)))
        );
        assert_eq!(
            apply(place("e4"), &start),
            Err(IllegalAction::PlaceWhenNotAllowed(RequiredAction::Lift))
        );

        let lifted = run(&start, &[lift("e2")]);
        assert_eq!(
            apply(lift("d2"), &lifted),
            Err(IllegalAction::LiftWhenNotAllowed(RequiredAction::Place))
        );
        assert_eq!(apply(place("e5"), &lifted), Err(IllegalAction::Unreachable(tile("e5"))));
    }

    #[test]
    fn test_events_for_simple_move() {
        let start = Position::initial();
        let (lifted, events) = apply_with_events(lift("g1"), &start).unwrap();
        let knight = start.piece_at(tile("g1"), Color::White).unwrap().id;
        assert_eq!(
            events,
            vec![BoardEvent::Lifted {
                pieces: vec![knight],
                from: tile("g1")
            }]
        );

        let (_, events) = apply_with_events(place("f3"), &lifted).unwrap();
        assert_eq!(
            events,
            vec![
                BoardEvent::Placed {
                    pieces: vec![knight],
                    to: tile("f3")
                },
                BoardEvent::TurnPassed { next: Color::Black },
            ]
        );
    }

    #[test]
    fn test_union_moves_together() {
        let start = position(
            Color::Black,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Knight, "d4"),
                (Color::Black, PieceKind::Rook, "d4"),
                (Color::White, PieceKind::Pawn, "d2"),
            ],
        );
        let lifted = run(&start, &[lift("d4")]);
        assert_eq!(lifted.lifted().len(), 2);
        assert_eq!(lifted.lifted()[0].color, Color::Black);

        // The rook leads; a union can't land on occupied tiles
        assert_eq!(apply(place("d2"), &lifted), Err(IllegalAction::Unreachable(tile("d2"))));
        let moved = run(&lifted, &[place("d6")]);
        assert!(moved.is_union(tile("d6")));
        assert!(moved.is_settled());
        assert_eq!(moved.turn(), Color::White);
    }

    #[test]
    fn test_en_passant_forms_union() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Pawn, "e5"),
                (Color::Black, PieceKind::Pawn, "d7"),
            ],
        );
        let after = run(&start, &[lift("e1"), place("f1"), lift("d7"), place("d5")]);
        assert_eq!(after.en_passant(), Some(tile("d6")));

        let (after, events) = apply_with_events(place("d6"), &run(&after, &[lift("e5")])).unwrap();
        assert!(after.is_union(tile("d6")));
        assert!(!after.is_occupied(tile("d5")));
        assert!(events.contains(&BoardEvent::EnPassant {
            from: tile("d5"),
            to: tile("d6")
        }));
        assert_eq!(after.en_passant(), None);
    }

    #[test]
    fn test_promotion_ends_move() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Pawn, "a7"),
            ],
        );
        let after = run(&start, &[lift("a7"), place("a8")]);
        assert_eq!(after.required(), RequiredAction::PromoteThenFinish);
        assert_eq!(after.turn(), Color::White);
        assert_eq!(
            legal_actions(&after),
            PieceKind::PROMOTION_OPTIONS
                .iter()
                .map(|kind| Action::Promote(*kind))
                .collect::<Vec<_>>()
        );
        assert_eq!(
            apply(Action::Promote(PieceKind::King), &after),
            Err(IllegalAction::InvalidPromotion(PieceKind::King))
        );

        let promoted = run(&after, &[Action::Promote(PieceKind::Queen)]);
        assert_eq!(
            promoted.piece_at(tile("a8"), Color::White).unwrap().kind,
            PieceKind::Queen
        );
        assert_eq!(promoted.turn(), Color::Black);
        assert_eq!(promoted.required(), RequiredAction::Lift);
    }

    #[test]
    fn test_promotion_for_the_opponent() {
        // White carries a union with a black pawn onto White's home row
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Rook, "a4"),
                (Color::Black, PieceKind::Pawn, "a4"),
            ],
        );
        let after = run(&start, &[lift("a4"), place("a1")]);
        assert_eq!(after.required(), RequiredAction::PromoteThenLift);
        assert_eq!(after.turn(), Color::Black);

        let promoted = run(&after, &[Action::Promote(PieceKind::Knight)]);
        assert_eq!(promoted.required(), RequiredAction::Lift);
        assert_eq!(promoted.turn(), Color::Black);
        assert_eq!(
            promoted.piece_at(tile("a1"), Color::Black).unwrap().kind,
            PieceKind::Knight
        );
    }

    #[test]
    fn test_castling() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Rook, "h1"),
                (Color::White, PieceKind::Rook, "a1"),
                (Color::Black, PieceKind::King, "e8"),
            ],
        );
        let lifted = run(&start, &[lift("e1")]);
        let targets = place_targets(&lifted);
        assert!(targets.contains(&tile("g1")));
        assert!(targets.contains(&tile("c1")));

        let (after, events) = apply_with_events(place("g1"), &lifted).unwrap();
        assert_eq!(after.piece_at(tile("f1"), Color::White).unwrap().kind, PieceKind::Rook);
        assert!(!after.is_occupied(tile("h1")));
        assert!(!after.castling().white_queen_side);
        assert!(!after.castling().white_king_side);
        assert!(events
            .iter()
            .any(|event| matches!(event, BoardEvent::Castled { .. })));
    }

    #[test]
    fn test_castling_blocked_by_threat() {
        // The black rook on f8 threatens f1
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Rook, "h1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::Black, PieceKind::Rook, "f8"),
            ],
        );
        let lifted = run(&start, &[lift("e1")]);
        assert!(!place_targets(&lifted).contains(&tile("g1")));
    }

    #[test]
    fn test_rook_lift_drops_castling_right() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Rook, "h1"),
                (Color::White, PieceKind::Rook, "a1"),
                (Color::Black, PieceKind::King, "e8"),
            ],
        );
        let after = run(&start, &[lift("h1"), place("h2")]);
        assert!(!after.castling().white_king_side);
        assert!(after.castling().white_queen_side);
    }

    #[test]
    fn test_repetition_draw() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Knight, "b1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::Black, PieceKind::Knight, "b8"),
            ],
        );
        let shuffle = [
            lift("b1"),
            place("c3"),
            lift("b8"),
            place("c6"),
            lift("c3"),
            place("b1"),
            lift("c6"),
            place("b8"),
        ];
        let twice = run(&run(&start, &shuffle), &shuffle);
        assert_eq!(twice.victory(), VictoryState::Running);

        // Third time the knight lands on c3
        let drawn = run(&twice, &shuffle[..2]);
        assert_eq!(drawn.victory(), VictoryState::Draw(DrawReason::Repetition));
        assert_eq!(apply(lift("e8"), &drawn), Err(IllegalAction::GameOver));
    }

    #[test]
    fn test_last_checkpoint() {
        let start = Position::initial();
        let actions = [lift("e2"), place("e4"), lift("d7")];
        assert_eq!(find_last_checkpoint(&start, &actions), Ok(2));
        assert_eq!(find_last_checkpoint(&start, &actions[..1]), Ok(0));

        let broken = [lift("e2"), place("e6")];
        assert_eq!(
            find_last_checkpoint(&start, &broken),
            Err(ReplayError {
                index: 1,
                source: IllegalAction::Unreachable(tile("e6"))
            })
        );
    }

    #[test]
    fn test_double_step_from_back_rank_leaves_no_en_passant() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Pawn, "a1"),
                (Color::Black, PieceKind::Pawn, "b3"),
            ],
        );
        let after = run(&start, &[lift("a1"), place("a3")]);
        assert_eq!(after.en_passant(), None);

        let lifted = run(&after, &[lift("b3")]);
        assert_eq!(place_targets(&lifted), vec![tile("b2")]);
        assert_eq!(apply(place("a2"), &lifted), Err(IllegalAction::Unreachable(tile("a2"))));
    }

    #[test]
    fn test_promotion_inside_chain() {
        // The pawn takes over a8 and must promote before placing the knight
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::White, PieceKind::Pawn, "b7"),
                (Color::White, PieceKind::Knight, "a8"),
                (Color::Black, PieceKind::Rook, "a8"),
            ],
        );
        let taken = run(&start, &[lift("b7"), place("a8")]);
        assert_eq!(taken.required(), RequiredAction::PromoteThenPlace);
        assert_eq!(taken.lifted()[0].kind, PieceKind::Knight);
        assert_eq!(
            apply(place("c7"), &taken),
            Err(IllegalAction::PlaceWhenNotAllowed(RequiredAction::PromoteThenPlace))
        );

        let promoted = run(&taken, &[Action::Promote(PieceKind::Queen)]);
        assert_eq!(promoted.required(), RequiredAction::Place);
        assert_eq!(promoted.turn(), Color::White);
        assert_eq!(
            promoted.piece_at(tile("a8"), Color::White).unwrap().kind,
            PieceKind::Queen
        );

        let settled = run(&promoted, &[place("c7")]);
        assert!(settled.is_settled());
        assert_eq!(settled.turn(), Color::Black);
        assert_eq!(
            settled.piece_at(tile("c7"), Color::White).unwrap().kind,
            PieceKind::Knight
        );
    }

    #[test]
    fn test_no_progress_counter() {
        let start = position(
            Color::White,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Knight, "b1"),
                (Color::White, PieceKind::Pawn, "a7"),
                (Color::Black, PieceKind::King, "e8"),
                (Color::Black, PieceKind::Knight, "b8"),
            ],
        );
        let after = run(&start, &[lift("b1"), place("c3"), lift("b8"), place("c6")]);
        assert_eq!(after.draw_state().no_progress_half_moves(), 2);

        let pending = run(&after, &[lift("a7"), place("a8")]);
        assert_eq!(pending.draw_state().no_progress_half_moves(), 3);

        let promoted = run(&pending, &[Action::Promote(PieceKind::Rook)]);
        assert_eq!(promoted.draw_state().no_progress_half_moves(), 0);
    }

    #[test]
    fn test_displaced_pawn_takes_en_passant() {
        let start = position(
            Color::Black,
            &[
                (Color::White, PieceKind::King, "g1"),
                (Color::Black, PieceKind::King, "g8"),
                (Color::White, PieceKind::Rook, "e2"),
                (Color::White, PieceKind::Pawn, "e5"),
                (Color::Black, PieceKind::Knight, "e5"),
                (Color::Black, PieceKind::Pawn, "d7"),
            ],
        );
        let after = run(&start, &[lift("d7"), place("d5")]);
        assert_eq!(after.en_passant(), Some(tile("d6")));

        // The rook takes over e5 and the white pawn in it is lifted
        let chained = run(&after, &[lift("e2"), place("e5")]);
        assert_eq!(chained.lifted()[0].kind, PieceKind::Pawn);
        assert!(place_targets(&chained).contains(&tile("d6")));

        let (settled, events) = apply_with_events(place("d6"), &chained).unwrap();
        assert!(settled.is_union(tile("d6")));
        assert!(!settled.is_occupied(tile("d5")));
        assert!(events.contains(&BoardEvent::EnPassant {
            from: tile("d5"),
            to: tile("d6")
        }));
        assert_eq!(settled.piece_at(tile("e5"), Color::White).unwrap().kind, PieceKind::Rook);
        assert_eq!(settled.turn(), Color::Black);
    }

    #[test]
    fn test_lifting_union_with_opponent_rook_drops_its_castling_right() {
        let start = position(
            Color::Black,
            &[
                (Color::White, PieceKind::King, "e1"),
                (Color::White, PieceKind::Rook, "h1"),
                (Color::Black, PieceKind::Knight, "h1"),
                (Color::Black, PieceKind::King, "e8"),
            ],
        );
        assert!(start.castling().white_king_side);

        let after = run(&start, &[lift("h1"), place("g3")]);
        assert!(after.is_union(tile("g3")));
        assert!(!after.castling().white_king_side);
    }
}
