//! Synchronization with an authoritative action history.
//!
//! `SyncSession` keeps the local view of a remote game: the starting
//! position, the action log (authoritative actions followed by optimistic
//! local ones) and the board that log produces. Local actions are applied
//! right away. When a full history arrives from the remote side it is
//! reconciled against the log:
//! - an extension is replayed on top of the local board
//! - a disagreement throws the local board away and replays everything
//! - a history that can't be replayed leaves the last good board in place
//!   and marks the session desynchronized until `reset`

use crate::actions::{Action, IndexedAction};
use crate::engine::{self, IllegalAction, ReplayError};
use crate::position::{Position, PositionError};
use crate::reconcile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors of a sync session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SyncError {
    #[error("Received history breaks at action {index}: {source}")]
    MalformedHistory { index: usize, source: IllegalAction },

    #[error("Session is desynchronized, waiting for a full state")]
    Desynchronized,

    #[error("Local action rejected: {0}")]
    Rejected(IllegalAction),

    #[error("Invalid starting position: {0}")]
    InvalidPosition(PositionError),
}

/// What receiving a history did to the local board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Nothing new
    UpToDate,
    /// New actions were replayed on the local board
    FastForward { applied: usize },
    /// The local log disagreed; the board was rebuilt from scratch
    Resynchronized { replayed: usize },
}

/// Local view of a remote game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSession {
    initial: Position,
    actions: Vec<Action>,
    board: Position,
    desynchronized: bool,
}

impl SyncSession {
    pub fn new(initial: Position) -> Self {
        Self {
            board: initial.clone(),
            initial,
            actions: Vec::new(),
            desynchronized: false,
        }
    }

    pub fn initial(&self) -> &Position {
        &self.initial
    }

    /// The action log, authoritative and optimistic alike
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Board after the whole action log, or the last good board when
    /// desynchronized
    pub fn board(&self) -> &Position {
        &self.board
    }

    pub fn is_desynchronized(&self) -> bool {
        self.desynchronized
    }

    /// Apply actions made locally and tag them with their index in the log,
    /// ready to be sent.
    ///
    /// Nothing is recorded if any of them is rejected.
    pub fn record_local(&mut self, actions: &[Action]) -> Result<Vec<IndexedAction>, SyncError> {
        if self.desynchronized {
            return Err(SyncError::Desynchronized);
        }
        let board = engine::replay(&self.board, actions)
            .map_err(|ReplayError { source, .. }| SyncError::Rejected(source))?;

        let first = self.actions.len();
        self.actions.extend_from_slice(actions);
        self.board = board;
        Ok(actions
            .iter()
            .enumerate()
            .map(|(offset, action)| IndexedAction {
                index: first + offset,
                action: *action,
            })
            .collect())
    }

    /// Reconcile the log with a full history from the remote side
    pub fn receive(&mut self, received: &[Action]) -> Result<SyncOutcome, SyncError> {
        let suffix = if self.desynchronized {
            None
        } else {
            reconcile::diff(&self.actions, received)
        };

        match suffix {
            Some(suffix) if suffix.is_empty() => Ok(SyncOutcome::UpToDate),
            Some(suffix) => match engine::replay(&self.board, &suffix) {
                Ok(board) => {
                    info!(applied = suffix.len(), "Fast-forwarded");
                    self.board = board;
                    self.actions = received.to_vec();
                    Ok(SyncOutcome::FastForward {
                        applied: suffix.len(),
                    })
                }
                Err(err) => Err(self.malformed(ReplayError {
                    index: self.actions.len() + err.index,
                    source: err.source,
                })),
            },
            None => {
                if !self.desynchronized {
                    warn!(
                        known = self.actions.len(),
                        received = received.len(),
                        "DesyncDetected, replaying full history"
                    );
                }
                self.resynchronize(received)
            }
        }
    }

    /// Replace the session with a fresh full state
    pub fn reset(&mut self, initial: Position, actions: &[Action]) -> Result<(), SyncError> {
        initial.validate().map_err(SyncError::InvalidPosition)?;
        let board = engine::replay(&initial, actions).map_err(|err| self.malformed(err))?;
        info!(actions = actions.len(), "Session reset");
        self.initial = initial;
        self.actions = actions.to_vec();
        self.board = board;
        self.desynchronized = false;
        Ok(())
    }

    fn resynchronize(&mut self, received: &[Action]) -> Result<SyncOutcome, SyncError> {
        let board = engine::replay(&self.initial, received).map_err(|err| self.malformed(err))?;
        info!(replayed = received.len(), "Resynchronized");
        self.board = board;
        self.actions = received.to_vec();
        self.desynchronized = false;
        Ok(SyncOutcome::Resynchronized {
            replayed: received.len(),
        })
    }

    fn malformed(&mut self, err: ReplayError) -> SyncError {
        error!(index = err.index, error = %err.source, "MalformedHistory");
        self.desynchronized = true;
        SyncError::MalformedHistory {
            index: err.index,
            source: err.source,
        }
    }
}
