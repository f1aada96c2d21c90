//! Piece movement.
//!
//! Computes the tiles the piece(s) in hand may be placed on, and the tiles a
//! piece threatens. A single piece may land on an empty tile, on a lone
//! opponent piece (forming a union) or on a union (taking it over). A lifted
//! union only moves onto empty tiles. Kings only step onto empty tiles.

use crate::piece::{Color, PieceKind};
use crate::position::{CastleSide, Position, KING_START_FILE};
use crate::threats;
use crate::tile::{
    Tile, TileSet, ALL_DIRECTIONS, BISHOP_DIRECTIONS, KNIGHT_JUMPS, ROOK_DIRECTIONS,
};

/// Tiles the piece(s) in hand may be placed on
pub fn place_targets(position: &Position) -> TileSet {
    match position.lifted.first() {
        Some(piece) => targets(
            position,
            piece.color,
            piece.tile,
            piece.kind,
            position.lifted.len() == 2,
        ),
        None => TileSet::new(),
    }
}

/// Whether a single piece of `mover` may land on `tile`
fn single_may_land(position: &Position, mover: Color, tile: Tile) -> bool {
    position.has_piece(tile, mover.other()) || !position.has_piece(tile, mover)
}

/// Place targets of a piece of `kind` lifted from `origin`
pub(crate) fn targets(
    position: &Position,
    mover: Color,
    origin: Tile,
    kind: PieceKind,
    is_pair: bool,
) -> TileSet {
    match kind {
        PieceKind::Pawn => pawn_targets(position, mover, origin, is_pair),
        PieceKind::Rook => slide(position, mover, origin, &ROOK_DIRECTIONS, is_pair),
        PieceKind::Bishop => slide(position, mover, origin, &BISHOP_DIRECTIONS, is_pair),
        PieceKind::Queen => slide(position, mover, origin, &ALL_DIRECTIONS, is_pair),
        PieceKind::Knight => knight_targets(position, mover, origin, is_pair),
        PieceKind::King => {
            let mut set = king_steps(position, origin);
            set.insert_all(castling_targets(position, mover, origin));
            set
        }
    }
}

/// Tiles a single piece of `kind` on `origin` could land on if a piece of
/// the opponent stood there.
///
/// Kings never threaten since they can't form unions.
pub(crate) fn threat_targets(
    position: &Position,
    mover: Color,
    origin: Tile,
    kind: PieceKind,
) -> TileSet {
    match kind {
        PieceKind::Pawn => [-1, 1]
            .into_iter()
            .filter_map(|dx| origin.offset((dx, mover.forward())))
            .collect(),
        PieceKind::Rook => slide_threats(position, origin, &ROOK_DIRECTIONS),
        PieceKind::Bishop => slide_threats(position, origin, &BISHOP_DIRECTIONS),
        PieceKind::Queen => slide_threats(position, origin, &ALL_DIRECTIONS),
        PieceKind::Knight => KNIGHT_JUMPS
            .into_iter()
            .filter_map(|jump| origin.offset(jump))
            .collect(),
        PieceKind::King => TileSet::new(),
    }
}

fn pawn_targets(position: &Position, mover: Color, origin: Tile, is_pair: bool) -> TileSet {
    let mut set = TileSet::new();
    let forward = mover.forward();

    if let Some(one) = origin.offset((0, forward)) {
        if !position.is_occupied(one) {
            set.insert(one);
            let double_step = match mover {
                Color::White => origin.y <= 1,
                Color::Black => origin.y >= 6,
            };
            if double_step {
                if let Some(two) = one.offset((0, forward)) {
                    if !position.is_occupied(two) {
                        set.insert(two);
                    }
                }
            }
        }
    }

    if !is_pair {
        for dx in [-1, 1] {
            if let Some(diagonal) = origin.offset((dx, forward)) {
                if position.has_piece(diagonal, mover.other())
                    || position.en_passant == Some(diagonal)
                {
                    set.insert(diagonal);
                }
            }
        }
    }

    set
}

fn slide(
    position: &Position,
    mover: Color,
    origin: Tile,
    directions: &[(i8, i8)],
    is_pair: bool,
) -> TileSet {
    let mut set = TileSet::new();
    for &direction in directions {
        let mut current = origin;
        while let Some(next) = current.offset(direction) {
            current = next;
            if !position.is_occupied(next) {
                set.insert(next);
                continue;
            }
            if !is_pair && single_may_land(position, mover, next) {
                set.insert(next);
            }
            break;
        }
    }
    set
}

/// Sliding threats include the first occupied tile whatever stands on it
fn slide_threats(position: &Position, origin: Tile, directions: &[(i8, i8)]) -> TileSet {
    let mut set = TileSet::new();
    for &direction in directions {
        let mut current = origin;
        while let Some(next) = current.offset(direction) {
            current = next;
            set.insert(next);
            if position.is_occupied(next) {
                break;
            }
        }
    }
    set
}

fn knight_targets(position: &Position, mover: Color, origin: Tile, is_pair: bool) -> TileSet {
    KNIGHT_JUMPS
        .into_iter()
        .filter_map(|jump| origin.offset(jump))
        .filter(|tile| {
            if is_pair {
                !position.is_occupied(*tile)
            } else {
                single_may_land(position, mover, *tile)
            }
        })
        .collect()
}

fn king_steps(position: &Position, origin: Tile) -> TileSet {
    ALL_DIRECTIONS
        .into_iter()
        .filter_map(|step| origin.offset(step))
        .filter(|tile| !position.is_occupied(*tile))
        .collect()
}

fn castling_targets(position: &Position, mover: Color, origin: Tile) -> TileSet {
    let mut set = TileSet::new();
    let rank = mover.home_rank();
    if origin != Tile::new(KING_START_FILE, rank) {
        return set;
    }

    let mut threatened: Option<TileSet> = None;
    for side in CastleSide::ALL {
        if !position.castling.get(mover, side) {
            continue;
        }
        let rook_home = position
            .piece_at(Tile::new(side.rook_file(), rank), mover)
            .is_some_and(|piece| piece.kind == PieceKind::Rook);
        if !rook_home {
            continue;
        }
        let path_clear = side
            .empty_files()
            .iter()
            .all(|&x| !position.is_occupied(Tile::new(x, rank)));
        if !path_clear {
            continue;
        }

        let threatened =
            threatened.get_or_insert_with(|| threats::threatened_tiles(position, mover.other()));
        let safe = side
            .safe_files()
            .iter()
            .all(|&x| !threatened.contains(Tile::new(x, rank)));
        if safe {
            set.insert(Tile::new(side.king_target_file(), rank));
        }
    }
    set
}
