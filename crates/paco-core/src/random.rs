//! Random starting positions.
//!
//! Both full armies are scattered over the board. Pawns stay off the back
//! ranks and the kings never share a tile with an opponent piece, so the
//! result is a running game. Unions of other pieces are allowed.

use crate::options::SetupOptions;
use crate::piece::{Color, PieceKind};
use crate::position::{Castling, Position};
use crate::tile::Tile;
use rand::seq::SliceRandom;
use rand::Rng;

/// A random settled position with a random side to move
pub fn random_position<R: Rng + ?Sized>(rng: &mut R, options: SetupOptions) -> Position {
    let mut position = Position::empty_with(options);

    // Kings first, on distinct tiles
    let mut tiles: Vec<Tile> = Tile::all().collect();
    tiles.shuffle(rng);
    for (color, tile) in Color::ALL.into_iter().zip(tiles) {
        position.spawn(color, PieceKind::King, tile);
    }

    for color in Color::ALL {
        let army = PieceKind::BACK_RANK
            .iter()
            .copied()
            .filter(|kind| *kind != PieceKind::King)
            .chain(std::iter::repeat(PieceKind::Pawn).take(8));
        for kind in army {
            let candidates: Vec<Tile> = Tile::all()
                .filter(|tile| !position.has_piece(*tile, color))
                .filter(|tile| {
                    position
                        .piece_at(*tile, color.other())
                        .map_or(true, |piece| piece.kind != PieceKind::King)
                })
                .filter(|tile| kind != PieceKind::Pawn || (1..=6).contains(&tile.y))
                .collect();
            if let Some(tile) = candidates.choose(rng) {
                position.spawn(color, kind, *tile);
            }
        }
    }

    position.turn = if rng.gen_bool(0.5) {
        Color::White
    } else {
        Color::Black
    };
    position.castling = Castling::all();
    position.refresh_castling();
    position
}
