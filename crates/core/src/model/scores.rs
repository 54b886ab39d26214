use serde::{Deserialize, Serialize};

/// Number of sessions kept in the history.
pub const HISTORY_LEN: usize = 3;

/// Scores of the most recent completed sessions, newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreHistory([i32; HISTORY_LEN]);

impl ScoreHistory {
    #[must_use]
    pub fn from_scores(scores: [i32; HISTORY_LEN]) -> Self {
        Self(scores)
    }

    #[must_use]
    pub fn scores(&self) -> &[i32; HISTORY_LEN] {
        &self.0
    }

    #[must_use]
    pub fn latest(&self) -> i32 {
        self.0[0]
    }

    /// Pushes `score` to the front and drops the oldest entry.
    pub fn record(&mut self, score: i32) {
        self.0.rotate_right(1);
        self.0[0] = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_shifts_right() {
        let mut history = ScoreHistory::from_scores([1, 2, 3]);
        history.record(7);
        assert_eq!(history.scores(), &[7, 1, 2]);
        assert_eq!(history.latest(), 7);
    }

    #[test]
    fn default_is_zeroed() {
        assert_eq!(ScoreHistory::default().scores(), &[0, 0, 0]);
    }

    #[test]
    fn keeps_negative_scores() {
        let mut history = ScoreHistory::default();
        history.record(-4);
        assert_eq!(history.scores(), &[-4, 0, 0]);
    }

    #[test]
    fn json_shape_is_integer_array() {
        let history = ScoreHistory::from_scores([9, -1, 0]);
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, "[9,-1,0]");
        assert_eq!(serde_json::from_str::<ScoreHistory>(&json).unwrap(), history);
        assert!(serde_json::from_str::<ScoreHistory>("[1,2]").is_err());
    }
}
