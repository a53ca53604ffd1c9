//! Single object track accumulated across frames.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::tracker::detection::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Identifier handed out by [`TrackRegistry`](crate::tracker::TrackRegistry).
pub type TrackId = u64;

/// One timestamped sample within a track's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub center: Point2<f32>,
    pub bbox: Rect,
    pub confidence: f32,
    pub frame_number: u64,
    pub timestamp: f64,
}

impl From<&Detection> for Position {
    fn from(det: &Detection) -> Self {
        Self {
            center: det.center,
            bbox: det.bbox,
            confidence: det.confidence,
            frame_number: det.frame_number,
            timestamp: det.timestamp,
        }
    }
}

/// Single object track.
///
/// Positions are append-only and strictly ordered by frame number; a track is
/// never empty and never changes class.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    id: TrackId,
    #[serde(rename = "class")]
    class_name: String,
    positions: Vec<Position>,
    state: TrackState,
    /// Processing sequence number of the frame that last matched this track
    last_matched: u64,
}

impl Track {
    pub(crate) fn new(id: TrackId, det: &Detection, sequence: u64) -> Self {
        Self {
            id,
            class_name: det.class_name.clone(),
            positions: vec![Position::from(det)],
            state: TrackState::Tracked,
            last_matched: sequence,
        }
    }

    /// Registry-assigned id, unique within a run.
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Class every position of this track shares.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Observed positions in frame order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of observed positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Registry frame sequence at which the track last took a detection.
    pub fn last_matched(&self) -> u64 {
        self.last_matched
    }

    /// Most recent position.
    pub fn last_position(&self) -> &Position {
        // Non-empty from construction onwards.
        &self.positions[self.positions.len() - 1]
    }

    /// Timestamp of the first position, in seconds.
    pub fn first_seen(&self) -> f64 {
        self.positions[0].timestamp
    }

    /// Timestamp of the most recent position, in seconds.
    pub fn last_seen(&self) -> f64 {
        self.last_position().timestamp
    }

    /// Seconds between the first and the last position.
    pub fn duration(&self) -> f64 {
        self.last_seen() - self.first_seen()
    }

    /// Distance from the most recent position's center to `det`'s center.
    pub fn distance_to(&self, det: &Detection) -> f32 {
        det.distance_to(&self.last_position().center)
    }

    /// Check that `det` could extend this track without changing it.
    pub(crate) fn check_append(&self, det: &Detection) -> Result<(), TrackError> {
        if det.class_name != self.class_name {
            return Err(TrackError::ClassMismatch {
                track_id: self.id,
                expected: self.class_name.clone(),
                found: det.class_name.clone(),
            });
        }
        let last = self.last_position().frame_number;
        if det.frame_number <= last {
            return Err(TrackError::OutOfOrder {
                track_id: self.id,
                last,
                frame: det.frame_number,
            });
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, det: &Detection, sequence: u64) -> Result<(), TrackError> {
        self.check_append(det)?;
        self.positions.push(Position::from(det));
        self.state = TrackState::Tracked;
        self.last_matched = sequence;
        Ok(())
    }

    pub(crate) fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub(crate) fn mark_retired(&mut self) {
        self.state = TrackState::Retired;
    }
}
