//! Reconciliation of action histories.
//!
//! The remote side owns the authoritative, totally ordered action history.
//! Locally predicted actions are provisional: when the received history
//! extends what we know, we replay the new suffix; when the two disagree,
//! the local board is thrown away and rebuilt from the received history.
//! Histories are never merged.

/// Actions to replay on top of `known` to reach `received`.
///
/// Returns `None` if `known` is not a prefix of `received`.
pub fn diff<T: PartialEq + Clone>(known: &[T], received: &[T]) -> Option<Vec<T>> {
    if known.len() > received.len() {
        return None;
    }
    let shared_prefix = known
        .iter()
        .zip(received)
        .take_while(|(a, b)| a == b)
        .count();
    if shared_prefix < known.len() {
        return None;
    }
    Some(received[known.len()..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::tile::Tile;

    fn actions(tiles: &[(i8, i8)]) -> Vec<Action> {
        tiles
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                if i % 2 == 0 {
                    Action::Lift(Tile::new(*x, *y))
                } else {
                    Action::Place(Tile::new(*x, *y))
                }
            })
            .collect()
    }

    #[test]
    fn test_extension_yields_suffix() {
        let known = actions(&[(4, 1), (4, 3)]);
        let received = actions(&[(4, 1), (4, 3), (4, 6), (4, 4)]);
        assert_eq!(diff(&known, &received), Some(received[2..].to_vec()));
    }

    #[test]
    fn test_equal_histories() {
        let history = actions(&[(4, 1), (4, 3)]);
        assert_eq!(diff(&history, &history), Some(vec![]));
        assert_eq!(diff::<Action>(&[], &[]), Some(vec![]));
    }

    #[test]
    fn test_divergence() {
        let known = actions(&[(4, 1), (4, 3)]);
        let received = actions(&[(4, 1), (4, 2), (4, 6)]);
        assert_eq!(diff(&known, &received), None);
    }

    #[test]
    fn test_known_longer_than_received() {
        let known = actions(&[(4, 1), (4, 3), (3, 6)]);
        let received = actions(&[(4, 1), (4, 3)]);
        assert_eq!(diff(&known, &received), None);
    }
}
