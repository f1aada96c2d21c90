//! Integration tests for the Paco core.
//!
//! These tests play complete moves and games through the public API: rule
//! scenarios, invariants under seeded random play, history and
//! reconciliation laws, and two clients kept in sync through a shared
//! action history.

use paco_core::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn tile(name: &str) -> Tile {
    name.parse().unwrap()
}

fn lift(name: &str) -> Action {
    Action::Lift(tile(name))
}

fn place(name: &str) -> Action {
    Action::Place(tile(name))
}

fn play(position: &Position, actions: &[Action]) -> Position {
    replay(position, actions).unwrap()
}

/// Every position the engine hands out must satisfy the board invariants
fn check_invariants(position: &Position) {
    assert!(
        position.validate().is_ok(),
        "invalid position: {:?}",
        position.validate()
    );
    for piece in position.pieces() {
        let same_color = position
            .pieces_at(piece.tile)
            .filter(|other| other.color == piece.color)
            .count();
        assert_eq!(same_color, 1, "stacked pieces on {}", piece.tile);
    }
    assert!(position.lifted().len() <= 2);
}

/// Play one complete move picked at random, backtracking out of chains that
/// run into a dead end. Returns the position after the move and the actions
/// that make it up.
fn random_move(
    position: &Position,
    mover: Color,
    rng: &mut StdRng,
    depth: usize,
) -> Option<(Position, Vec<Action>)> {
    if depth > 24 {
        return None;
    }
    let mut actions = legal_actions(position);
    actions.shuffle(rng);
    for action in actions {
        let next = apply(action, position).unwrap();
        check_invariants(&next);

        let move_over = next.victory().is_over() || (next.is_settled() && next.turn() != mover);
        if move_over {
            return Some((next, vec![action]));
        }
        if let Some((done, mut rest)) = random_move(&next, mover, rng, depth + 1) {
            rest.insert(0, action);
            return Some((done, rest));
        }
    }
    None
}

/// Play up to `moves` random moves, returning every action played
fn random_game(start: &Position, moves: usize, rng: &mut StdRng) -> (Position, Vec<Action>) {
    let mut position = start.clone();
    let mut history = Vec::new();
    for _ in 0..moves {
        if position.victory().is_over() {
            break;
        }
        let Some((next, actions)) = random_move(&position, position.turn(), rng, 0) else {
            break;
        };
        // A finished move never leaves anything in hand
        assert!(next.lifted().is_empty());
        history.extend(actions);
        position = next;
    }
    (position, history)
}

// ==================== Scenarios ====================

#[test]
fn test_simple_move() {
    let start = Position::initial();
    let after = play(&start, &[Action::Lift(Tile::new(1, 1)), Action::Place(Tile::new(1, 3))]);

    assert!(after.lifted().is_empty());
    let pawn = after.piece_at(Tile::new(1, 3), Color::White).unwrap();
    assert_eq!(pawn.kind, PieceKind::Pawn);
    assert_eq!(pawn.id, start.piece_at(Tile::new(1, 1), Color::White).unwrap().id);
    assert_eq!(after.turn(), Color::Black);
    assert_eq!(after.en_passant(), Some(Tile::new(1, 2)));
}

#[test]
fn test_union_formation() {
    let start = Position::initial();
    let after = play(
        &start,
        &[lift("e2"), place("e4"), lift("d7"), place("d5"), lift("e4"), place("d5")],
    );

    assert!(after.lifted().is_empty());
    assert!(after.is_union(tile("d5")));
    // No capture: both armies are complete
    assert_eq!(after.pieces().len(), 32);
    assert_eq!(after.draw_state().no_progress_half_moves(), 0);
}

#[test]
fn test_chain() {
    let start = Position::initial();
    let united = play(
        &start,
        &[lift("e2"), place("e4"), lift("d7"), place("d5"), lift("e4"), place("d5")],
    );

    // The black queen takes over the union and the black pawn in it is lifted
    let (taken, events) = apply_with_events(place("d5"), &play(&united, &[lift("d8")])).unwrap();
    assert_eq!(taken.lifted().len(), 1);
    assert_eq!(taken.lifted()[0].kind, PieceKind::Pawn);
    assert_eq!(taken.lifted()[0].tile, tile("d5"));
    assert_eq!(taken.move_status(), MoveStatus::EndsWithLift);
    assert_eq!(taken.turn(), Color::Black);
    assert_eq!(taken.victory(), VictoryState::Running);
    assert!(events
        .iter()
        .any(|event| matches!(event, BoardEvent::ChainContinued { .. })));

    // A lift is not allowed until the pawn is placed
    assert_eq!(
        apply(lift("a7"), &taken),
        Err(IllegalAction::LiftWhenNotAllowed(RequiredAction::Place))
    );

    let settled = play(&taken, &[place("d4")]);
    assert!(settled.is_settled());
    assert_eq!(settled.turn(), Color::White);
    assert_eq!(
        settled.piece_at(tile("d5"), Color::Black).unwrap().kind,
        PieceKind::Queen
    );
    assert!(settled.has_piece(tile("d5"), Color::White));
    assert!(settled.has_piece(tile("d4"), Color::Black));
}

#[test]
fn test_blocked_slide_is_illegal() {
    let start = Position::initial();
    let lifted = play(&start, &[lift("e2"), place("e4"), lift("e7"), place("e5"), lift("f1")]);
    let before = lifted.clone();

    // The g2 pawn stands between f1 and h3
    assert_eq!(
        apply(place("h3"), &lifted),
        Err(IllegalAction::Unreachable(tile("h3")))
    );
    assert_eq!(lifted, before);

    // The diagonal through the vacated e2 is open
    assert!(apply(place("a6"), &lifted).is_ok());
}

#[test]
fn test_victory() {
    let start = Position::from_pieces(
        Color::White,
        [
            (Color::White, PieceKind::King, tile("e1")),
            (Color::White, PieceKind::Rook, tile("a1")),
            (Color::Black, PieceKind::King, tile("a8")),
        ],
        SetupOptions::default(),
    )
    .unwrap();

    let actions = [lift("a1"), place("a8")];
    let won = play(&start, &actions);
    assert_eq!(
        won.victory(),
        VictoryState::Victory(Color::White, VictoryReason::PacoUnion)
    );
    assert!(won.is_union(tile("a8")));
    assert!(legal_actions(&won).is_empty());
    assert_eq!(apply(lift("a8"), &won), Err(IllegalAction::GameOver));
    assert_eq!(apply(lift("e1"), &won), Err(IllegalAction::GameOver));
    assert_eq!(find_last_checkpoint(&start, &actions), Ok(2));
}

// ==================== Properties ====================

#[test]
fn test_random_play_keeps_invariants() {
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (end, history) = random_game(&Position::initial(), 40, &mut rng);
        check_invariants(&end);
        assert!(!history.is_empty(), "game {} should have started", seed);
        assert_eq!(replay(&Position::initial(), &history), Ok(end));
    }
}

#[test]
fn test_random_positions_play_out() {
    for seed in 10..14 {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = random_position(&mut rng, SetupOptions::default());
        check_invariants(&start);
        let (end, _) = random_game(&start, 30, &mut rng);
        check_invariants(&end);
        assert!(end.lifted().is_empty());
    }
}

#[test]
fn test_history_laws() {
    let mut rng = StdRng::seed_from_u64(3);
    let start = Position::initial();
    let mut history = History::new(start.clone());

    let (p1, _) = random_move(&start, Color::White, &mut rng, 0).unwrap();
    let (p2, _) = random_move(&p1, Color::Black, &mut rng, 0).unwrap();
    assert!(history.push_commit(p1.clone()));
    assert!(history.push_commit(p2.clone()));

    // Committing the head again is a no-op
    assert!(!history.push_commit(p2.clone()));
    assert_eq!(history.len(), 3);
    assert_eq!(history.head(), &p2);

    assert!(history.undo());
    assert_eq!(history.head(), &p1);
    assert!(history.redo());
    assert_eq!(history.head(), &p2);
    assert!(!history.redo());
    assert_eq!(history.head(), &p2);
}

#[test]
fn test_reconciliation_laws() {
    let mut rng = StdRng::seed_from_u64(5);
    let (_, actions) = random_game(&Position::initial(), 12, &mut rng);
    assert!(actions.len() >= 4);

    for split in 0..=actions.len() {
        assert_eq!(
            reconcile::diff(&actions[..split], &actions),
            Some(actions[split..].to_vec())
        );
    }
    assert_eq!(reconcile::diff(&actions, &actions), Some(vec![]));

    let mut diverged = actions.clone();
    diverged[1] = Action::Promote(PieceKind::Queen);
    assert_eq!(reconcile::diff(&diverged[..3], &actions), None);
}

// ==================== Synchronized clients ====================

fn pointer(kind: PointerKind, name: &str) -> ToolEvent {
    ToolEvent::Pointer(PointerEvent {
        kind,
        tile: Some(tile(name)),
        screen: ScreenPoint::default(),
    })
}

fn click_move(client: &mut PlayClient, from: &str, to: &str) -> Vec<IndexedAction> {
    let mut sent = Vec::new();
    for name in [from, to] {
        sent.extend(client.handle(pointer(PointerKind::Down, name)));
        sent.extend(client.handle(pointer(PointerKind::Up, name)));
    }
    sent
}

#[test]
fn test_two_clients_stay_in_sync() {
    let mut white = PlayClient::synchronized(Position::initial());
    let mut black = PlayClient::synchronized(Position::initial());
    let mut server: Vec<Action> = Vec::new();

    let sent = click_move(&mut white, "e2", "e4");
    assert_eq!(sent.len(), 2);
    server.extend(sent.iter().map(|sent| sent.action));

    assert_eq!(
        black.receive(&server),
        Ok(SyncOutcome::FastForward { applied: 2 })
    );
    let sent = click_move(&mut black, "d7", "d5");
    assert_eq!(sent[0].index, 2);
    server.extend(sent.iter().map(|sent| sent.action));

    assert_eq!(
        white.receive(&server),
        Ok(SyncOutcome::FastForward { applied: 2 })
    );
    assert_eq!(white.head(), black.head());
    assert_eq!(white.receive(&server), Ok(SyncOutcome::UpToDate));
}

#[test]
fn test_rejected_prediction_is_replaced() {
    let mut client = PlayClient::synchronized(Position::initial());
    click_move(&mut client, "e2", "e4");

    // The authoritative side saw a different opening move
    let server = [lift("c2"), place("c4")];
    assert_eq!(
        client.receive(&server),
        Ok(SyncOutcome::Resynchronized { replayed: 2 })
    );
    assert!(client.head().has_piece(tile("c4"), Color::White));
    assert!(client.head().has_piece(tile("e2"), Color::White));

    // A history that can't be replayed keeps the last good board
    let good = client.head().clone();
    let broken = [lift("c2"), place("c4"), lift("c7"), place("c3")];
    assert!(matches!(
        client.receive(&broken),
        Err(SyncError::MalformedHistory { index: 3, .. })
    ));
    assert_eq!(client.head(), &good);
    assert!(client.session().unwrap().is_desynchronized());

    client.reset(Position::initial(), &server).unwrap();
    assert!(!client.session().unwrap().is_desynchronized());
}
