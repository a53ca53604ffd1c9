use serde::{Deserialize, Serialize};

/// Track state enumeration for the association lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Matched in the most recently processed frame
    #[default]
    Tracked,
    /// Unmatched, but still within the track timeout and eligible for matching
    Lost,
    /// Aged out; kept only as history for classification
    Retired,
}
