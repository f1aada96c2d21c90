//! Undo/redo history of committed positions.
//!
//! `History` is a list of positions with a cursor pointing at the head, the
//! position currently shown. Undo and redo move the cursor. A new commit
//! drops everything after the cursor, then appends.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Committed positions with a cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
}

impl<T: PartialEq> History<T> {
    /// A history holding only the starting entry
    pub fn new(initial: T) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    /// The current entry
    pub fn head(&self) -> &T {
        &self.entries[self.cursor]
    }

    /// Commit a new head.
    ///
    /// Entries after the cursor are discarded. Committing the current head
    /// again changes nothing. Returns whether the history changed.
    pub fn push_commit(&mut self, entry: T) -> bool {
        if *self.head() == entry {
            debug!("Commit equals head, ignored");
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor += 1;
        true
    }

    /// Step back one entry. Returns false at the start.
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            debug!("Nothing to undo");
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward one entry. Returns false at the tip.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            debug!("Nothing to redo");
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of entries, including the ones after the cursor
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least its starting entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries from the start up to and including the head, for animating
    /// the game so far
    pub fn past(&self) -> &[T] {
        &self.entries[..=self.cursor]
    }

    /// Entries after the head that redo would visit
    pub fn future(&self) -> &[T] {
        &self.entries[self.cursor + 1..]
    }
}
