//! Setup options for a game.
//!
//! Every field has a default so that a partial JSON object (or none at all)
//! deserializes into a usable configuration.

use serde::{Deserialize, Serialize};

/// Rules a game is set up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupOptions {
    /// How often a settled position must be seen before the game is drawn.
    /// `0` disables the repetition draw.
    pub draw_after_n_repetitions: u8,
    /// Half-moves without a union or promotion before the game is drawn.
    /// `0` disables the no-progress draw.
    pub no_progress_limit: u8,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            draw_after_n_repetitions: 3,
            no_progress_limit: 100,
        }
    }
}
