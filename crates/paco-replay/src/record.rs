//! Recorded matches as stored by the game server.

use paco_core::{Action, SetupOptions};
use serde::{Deserialize, Serialize};

/// One finished or running match: its key and the full action history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub key: String,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub setup: SetupOptions,
}

/// Parse a JSON array of match records
pub fn parse_records(json: &str) -> Result<Vec<MatchRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paco_core::Tile;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_records() {
        let json = r#"[
            {"key": "abc", "actions": [{"Lift": {"x": 4, "y": 1}}, {"Place": {"x": 4, "y": 3}}]},
            {"key": "def", "actions": [], "setup": {"draw_after_n_repetitions": 5}}
        ]"#;
        let records = parse_records(json).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].actions,
            vec![Action::Lift(Tile::new(4, 1)), Action::Place(Tile::new(4, 3))]
        );
        assert_eq!(records[0].setup, SetupOptions::default());
        assert_eq!(records[1].setup.draw_after_n_repetitions, 5);
        assert_eq!(records[1].setup.no_progress_limit, 100);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(parse_records(r#"[{"actions": []}]"#).is_err());
    }
}
