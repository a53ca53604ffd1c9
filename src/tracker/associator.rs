//! Per-frame association of detections to tracks.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::TrackError;
use crate::tracker::detection::Detection;
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::registry::TrackRegistry;
use crate::tracker::track::{Track, TrackId};

/// How gated detection/track pairs are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    /// Each detection, in emission order, takes its nearest unclaimed track.
    #[default]
    Greedy,
    /// Minimum total distance over the whole frame.
    Optimal,
}

/// Configuration for the [`Associator`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatorConfig {
    /// Maximum center-to-center distance, in pixels, to continue a track
    pub proximity_threshold: f32,
    /// Processed frames a track may go unmatched and still be matched
    pub track_timeout: u64,
    pub strategy: MatchingStrategy,
}

impl Default for AssociatorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 50.0,
            track_timeout: 0,
            strategy: MatchingStrategy::Greedy,
        }
    }
}

/// Outcome of associating one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAssociation {
    /// `(track, detection index)` for every detection that continued a track
    pub matched: Vec<(TrackId, usize)>,
    /// Tracks spawned this frame, in detection order
    pub created: Vec<TrackId>,
}

/// Matches each frame's detections to registry tracks by center distance.
pub struct Associator {
    config: AssociatorConfig,
}

impl Associator {
    /// Associator applying `config` to every frame.
    pub fn new(config: AssociatorConfig) -> Self {
        Self { config }
    }

    /// Gating, timeout and strategy in use.
    pub fn config(&self) -> &AssociatorConfig {
        &self.config
    }

    /// Associate one processed frame's detections with the tracks in `registry`.
    ///
    /// Only tracks of the same class, whose last center lies strictly closer
    /// than the proximity threshold, are candidates. A track takes at most one
    /// detection per frame, and tracks spawned in this frame are not
    /// candidates for the rest of it. Unmatched detections spawn new tracks.
    ///
    /// On error the registry is left exactly as it was.
    pub fn associate(
        &self,
        registry: &mut TrackRegistry,
        detections: &[Detection],
    ) -> Result<FrameAssociation, TrackError> {
        let candidates = registry.eligible_tracks();
        let tracks: Vec<&Track> = candidates.iter().filter_map(|&id| registry.get(id)).collect();
        let dists = matching::gated_distance(&tracks, detections, self.config.proximity_threshold);

        let AssignmentResult { matches, .. } = match self.config.strategy {
            MatchingStrategy::Greedy => matching::greedy_assignment(&dists),
            MatchingStrategy::Optimal => {
                matching::linear_assignment(&dists, self.config.proximity_threshold)
            }
        };

        let mut track_for_detection: Vec<Option<TrackId>> = vec![None; detections.len()];
        for (row, col) in matches {
            registry.check_append(candidates[row], &detections[col])?;
            track_for_detection[col] = Some(candidates[row]);
        }

        registry.begin_frame();
        let mut association = FrameAssociation::default();
        for (idx, det) in detections.iter().enumerate() {
            match track_for_detection[idx] {
                Some(track_id) => {
                    registry.append(track_id, det)?;
                    trace!(track_id, frame = det.frame_number, "continued track");
                    association.matched.push((track_id, idx));
                }
                None => association.created.push(registry.create_track(det)),
            }
        }

        registry.end_frame(self.config.track_timeout);
        Ok(association)
    }
}
