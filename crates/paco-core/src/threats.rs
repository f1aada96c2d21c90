//! Threat analysis.
//!
//! A tile is threatened by a color if that color, moving next, could put a
//! single piece onto it within one move. Chains are followed: taking over a
//! union lifts another piece, whose threats count too, and so on, including
//! pawns promoted mid-chain. Castling uses this to keep the king off
//! threatened tiles.

use crate::actions::Action;
use crate::draw::DrawState;
use crate::engine::Validation;
use crate::movement;
use crate::options::SetupOptions;
use crate::piece::{Color, PieceKind};
use crate::position::{Position, RequiredAction, VictoryState};
use crate::tile::TileSet;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Tiles `attacker` threatens in `position`.
///
/// Pieces in hand are ignored: the tile they were lifted from counts as
/// empty.
pub fn threatened_tiles(position: &Position, attacker: Color) -> TileSet {
    let mut base = position.clone();
    base.lifted.clear();
    base.turn = attacker;
    base.required = RequiredAction::Lift;
    base.promotion = None;
    base.victory = VictoryState::Running;
    // Hypothetical moves never count towards draws
    base.draw = DrawState::new(SetupOptions {
        draw_after_n_repetitions: 0,
        no_progress_limit: 0,
    });

    let mut queue = VecDeque::new();
    for piece in &base.pieces {
        // Unions only move to empty tiles, kings can't form unions
        if piece.color != attacker
            || piece.kind == PieceKind::King
            || base.is_union(piece.tile)
        {
            continue;
        }
        let mut lifted = base.clone();
        if let Some(piece) = lifted.take_piece(piece.tile, attacker) {
            lifted.lifted.push(piece);
            lifted.required = RequiredAction::Place;
            queue.push_back(lifted);
        }
    }

    let mut threats = TileSet::new();
    let mut seen = FxHashSet::default();
    while let Some(state) = queue.pop_front() {
        let Some(piece) = state.lifted.first().copied() else {
            continue;
        };
        threats.insert_all(movement::threat_targets(
            &state, attacker, piece.tile, piece.kind,
        ));

        let targets = movement::targets(&state, attacker, piece.tile, piece.kind, false);
        for target in targets.iter() {
            let en_passant =
                piece.kind == PieceKind::Pawn && state.en_passant == Some(target);
            if !state.is_union(target) && !en_passant {
                continue;
            }

            let mut next = state.clone();
            if next
                .execute(Action::Place(target), Validation::Trusted, &mut Vec::new())
                .is_err()
            {
                continue;
            }

            let followups = if next.required == RequiredAction::PromoteThenPlace {
                PieceKind::PROMOTION_OPTIONS
                    .iter()
                    .filter_map(|kind| {
                        let mut promoted = next.clone();
                        promoted
                            .execute(Action::Promote(*kind), Validation::Trusted, &mut Vec::new())
                            .ok()
                            .map(|_| promoted)
                    })
                    .collect()
            } else {
                vec![next]
            };

            for followup in followups {
                if !followup.is_settled() && seen.insert(followup.clone()) {
                    queue.push_back(followup);
                }
            }
        }
    }

    threats
}
