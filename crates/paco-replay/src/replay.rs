//! Replaying recorded matches through a sync session.
//!
//! Each record is fed to a fresh [`SyncSession`] the way a client sees it
//! live: one broadcast of the growing history per action.

use paco_core::{engine, Color, Position, SyncError, SyncSession, VictoryState};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::MatchRecord;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Match {key}: {source}")]
    Malformed { key: String, source: SyncError },
}

/// What a replayed match ended in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub key: String,
    pub actions: usize,
    /// Number of actions up to the end of the last completed move
    pub last_checkpoint: usize,
    pub victory: VictoryState,
    pub turn: Color,
}

/// Replay one record from the initial position of its setup
pub fn replay_record(record: &MatchRecord) -> Result<ReplaySummary, RecordError> {
    let malformed = |source| RecordError::Malformed {
        key: record.key.clone(),
        source,
    };

    let initial = Position::initial_with(record.setup);
    let mut session = SyncSession::new(initial.clone());
    for end in 1..=record.actions.len() {
        let outcome = session.receive(&record.actions[..end]).map_err(malformed)?;
        debug!(key = %record.key, end, ?outcome, "Received");
    }

    // The session accepted every action, so this replay can't fail
    let last_checkpoint = engine::find_last_checkpoint(&initial, &record.actions).map_err(|err| {
        malformed(SyncError::MalformedHistory {
            index: err.index,
            source: err.source,
        })
    })?;

    let board = session.board();
    let summary = ReplaySummary {
        key: record.key.clone(),
        actions: record.actions.len(),
        last_checkpoint,
        victory: board.victory(),
        turn: board.turn(),
    };
    info!(
        key = %summary.key,
        actions = summary.actions,
        last_checkpoint = summary.last_checkpoint,
        victory = ?summary.victory,
        "Match replayed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paco_core::{Action, DrawReason, IllegalAction, SetupOptions, Tile, VictoryReason};
    use pretty_assertions::assert_eq;

    fn tile(name: &str) -> Tile {
        name.parse().unwrap()
    }

    fn record(actions: &[(&str, &str)]) -> MatchRecord {
        MatchRecord {
            key: "test".to_string(),
            actions: actions
                .iter()
                .flat_map(|(from, to)| [Action::Lift(tile(from)), Action::Place(tile(to))])
                .collect(),
            setup: SetupOptions::default(),
        }
    }

    #[test]
    fn test_replay_running_match() {
        let mut record = record(&[("e2", "e4"), ("d7", "d5")]);
        record.actions.push(Action::Lift(tile("e4")));

        let summary = replay_record(&record).unwrap();
        assert_eq!(summary.actions, 5);
        assert_eq!(summary.last_checkpoint, 4);
        assert_eq!(summary.victory, VictoryState::Running);
        assert_eq!(summary.turn, Color::White);
    }

    #[test]
    fn test_replay_repetition_draw() {
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        let mut moves = shuffle.to_vec();
        moves.extend(shuffle);
        moves.extend(&shuffle[..2]);
        let summary = replay_record(&record(&moves)).unwrap();

        assert_eq!(summary.victory, VictoryState::Draw(DrawReason::Repetition));
        assert_eq!(summary.last_checkpoint, summary.actions);
    }

    #[test]
    fn test_replay_victory() {
        // Fool's mate shape: the queen reaches the king along the open diagonal
        let record = record(&[
            ("f2", "f3"),
            ("e7", "e5"),
            ("g2", "g4"),
            ("d8", "h4"),
            ("a2", "a3"),
            ("h4", "e1"),
        ]);
        let summary = replay_record(&record).unwrap();

        assert_eq!(
            summary.victory,
            VictoryState::Victory(Color::Black, VictoryReason::PacoUnion)
        );
        assert_eq!(summary.last_checkpoint, 12);
    }

    #[test]
    fn test_malformed_record() {
        let record = record(&[("e2", "e5")]);
        let err = replay_record(&record).unwrap_err();

        let RecordError::Malformed { key, source } = err;
        assert_eq!(key, "test");
        assert_eq!(
            source,
            SyncError::MalformedHistory {
                index: 1,
                source: IllegalAction::Unreachable(tile("e5")),
            }
        );
    }
}
