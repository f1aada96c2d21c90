//! Client controller.
//!
//! `PlayClient` connects the pieces a board UI needs: pointer and tool events
//! go to the `SmartTool`, commits land in the `History`, and when the game is
//! played against a remote side the committed actions go through a
//! `SyncSession` and come back out as indexed actions to send.
//!
//! Without a session the client is a free editor: every commit is kept,
//! undo and redo walk the history. With a session the action log is the
//! source of truth, so edits the rule engine can't express are rolled back
//! and undo/redo are disabled.

use crate::actions::{Action, IndexedAction};
use crate::gesture::{Commit, SmartTool, ToolEvent, ToolOutput};
use crate::history::History;
use crate::position::Position;
use crate::session::{SyncError, SyncOutcome, SyncSession};
use tracing::debug;

/// A board UI's state
#[derive(Debug, Clone)]
pub struct PlayClient {
    tool: SmartTool,
    history: History<Position>,
    preview: Option<Position>,
    session: Option<SyncSession>,
}

impl PlayClient {
    /// A local board, e.g. for analysis or editing
    pub fn local(initial: Position) -> Self {
        Self {
            tool: SmartTool::new(),
            history: History::new(initial),
            preview: None,
            session: None,
        }
    }

    /// A board synchronized with a remote game
    pub fn synchronized(initial: Position) -> Self {
        Self {
            session: Some(SyncSession::new(initial.clone())),
            ..Self::local(initial)
        }
    }

    /// Position to draw: the drag preview if any, else the history head
    pub fn displayed(&self) -> &Position {
        self.preview.as_ref().unwrap_or_else(|| self.history.head())
    }

    /// Last committed position
    pub fn head(&self) -> &Position {
        self.history.head()
    }

    pub fn tool(&self) -> &SmartTool {
        &self.tool
    }

    pub fn history(&self) -> &History<Position> {
        &self.history
    }

    pub fn session(&self) -> Option<&SyncSession> {
        self.session.as_ref()
    }

    /// Handle one event. Returns the actions to send to the remote side.
    pub fn handle(&mut self, event: ToolEvent) -> Vec<IndexedAction> {
        let head = self.history.head().clone();
        match self.tool.handle(event, &head) {
            ToolOutput::NoOp => Vec::new(),
            ToolOutput::Preview(position) => {
                self.preview = Some(position);
                Vec::new()
            }
            ToolOutput::Rollback => {
                self.preview = None;
                Vec::new()
            }
            ToolOutput::Commit(commit) => {
                self.preview = None;
                self.commit(commit)
            }
        }
    }

    fn commit(&mut self, commit: Commit) -> Vec<IndexedAction> {
        let Some(session) = self.session.as_mut() else {
            self.history.push_commit(commit.position);
            return Vec::new();
        };

        let Some(actions) = commit.actions else {
            debug!("Edit without game actions ignored in a synchronized game");
            self.tool.reset();
            return Vec::new();
        };
        match session.record_local(&actions) {
            Ok(sent) => {
                self.history.push_commit(session.board().clone());
                sent
            }
            Err(err) => {
                debug!(%err, "Local move not recorded");
                self.tool.reset();
                Vec::new()
            }
        }
    }

    /// Step back in a local game
    pub fn undo(&mut self) -> bool {
        if self.session.is_some() {
            debug!("Undo is disabled in a synchronized game");
            return false;
        }
        self.preview = None;
        self.history.undo()
    }

    /// Step forward in a local game
    pub fn redo(&mut self) -> bool {
        if self.session.is_some() {
            debug!("Redo is disabled in a synchronized game");
            return false;
        }
        self.preview = None;
        self.history.redo()
    }

    /// Take in the full action history from the remote side
    pub fn receive(&mut self, history: &[Action]) -> Result<SyncOutcome, SyncError> {
        let Some(session) = self.session.as_mut() else {
            return Err(SyncError::Desynchronized);
        };
        let outcome = session.receive(history)?;
        if outcome != SyncOutcome::UpToDate {
            self.preview = None;
            self.tool.reset();
            self.history.push_commit(session.board().clone());
        }
        Ok(outcome)
    }

    /// Replace the synchronized game with a fresh full state
    pub fn reset(&mut self, initial: Position, history: &[Action]) -> Result<(), SyncError> {
        let session = self
            .session
            .get_or_insert_with(|| SyncSession::new(initial.clone()));
        session.reset(initial, history)?;
        self.preview = None;
        self.tool.reset();
        self.history.push_commit(session.board().clone());
        Ok(())
    }
}
