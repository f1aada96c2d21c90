//! Draw detection.
//!
//! Two rules end a game in a draw:
//! - no union formed and no pawn promoted for `no_progress_limit` half-moves
//! - the same settled position seen `draw_after_n_repetitions` times
//!
//! A settled position is identified by its arrangement of colors and kinds,
//! the side to move, the en passant tile and the castling rights. Piece ids
//! do not take part.

use crate::options::SetupOptions;
use crate::position::{DrawReason, Position, VictoryState};
use serde::{Deserialize, Serialize};
use rustc_hash::FxHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use tracing::info;

/// Counters behind the draw rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawState {
    no_progress_half_moves: u8,
    no_progress_limit: u8,
    draw_after_n_repetitions: u8,
    /// Occurrences of each settled position, by hash
    seen: BTreeMap<u64, u8>,
}

impl DrawState {
    pub fn new(options: SetupOptions) -> Self {
        Self {
            no_progress_half_moves: 0,
            no_progress_limit: options.no_progress_limit,
            draw_after_n_repetitions: options.draw_after_n_repetitions,
            seen: BTreeMap::new(),
        }
    }

    /// Half-moves since the last union or promotion
    pub fn no_progress_half_moves(&self) -> u8 {
        self.no_progress_half_moves
    }

    /// How often the settled form of `position` has been recorded
    pub fn repetitions(&self, position: &Position) -> u8 {
        self.seen
            .get(&arrangement_hash(position))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn half_move_without_progress(&mut self) {
        self.no_progress_half_moves = self.no_progress_half_moves.saturating_add(1);
    }

    /// Also forgets every position seen so far
    pub(crate) fn reset_progress(&mut self) {
        self.no_progress_half_moves = 0;
        self.seen.clear();
    }
}

fn arrangement_hash(position: &Position) -> u64 {
    let mut arrangement: Vec<_> = position
        .pieces()
        .iter()
        .map(|piece| (piece.tile, piece.color, piece.kind))
        .collect();
    arrangement.sort();

    let mut hasher = FxHasher::default();
    arrangement.hash(&mut hasher);
    position.turn().hash(&mut hasher);
    position.en_passant().hash(&mut hasher);
    position.castling().hash(&mut hasher);
    hasher.finish()
}

/// Count a position that just became settled and end the game if a draw
/// rule fires.
pub(crate) fn record_settled(position: &mut Position) {
    if position.victory.is_over() {
        return;
    }

    let limit = position.draw.no_progress_limit;
    if limit > 0 && position.draw.no_progress_half_moves >= limit {
        info!(half_moves = limit, "Drawn by lack of progress");
        position.victory = VictoryState::Draw(DrawReason::NoProgress);
        return;
    }

    let needed = position.draw.draw_after_n_repetitions;
    if needed == 0 {
        return;
    }
    let hash = arrangement_hash(position);
    let count = position.draw.seen.entry(hash).or_insert(0);
    *count = count.saturating_add(1);
    if *count >= needed {
        info!(repetitions = *count, "Drawn by repetition");
        position.victory = VictoryState::Draw(DrawReason::Repetition);
    }
}
