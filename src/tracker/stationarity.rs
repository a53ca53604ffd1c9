//! Classification of tracks into stationary (lost-object candidates) and
//! transient ones.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;
use crate::tracker::track::{Position, Track, TrackId};

/// Configuration for the [`StationarityClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum seconds between first and last sighting
    pub stationary_threshold: f64,
    /// Tracks with fewer positions are never candidates
    pub min_positions: usize,
    /// Average movement per step, in pixels, must stay below this
    pub movement_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stationary_threshold: 300.0,
            min_positions: 3,
            movement_threshold: 30.0,
        }
    }
}

/// A track that stayed put long enough to be a plausible abandoned item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostObjectCandidate {
    /// `lost_{track_id}_{whole seconds of first_seen}`
    pub id: String,
    pub track_id: TrackId,
    #[serde(rename = "class")]
    pub class_name: String,
    /// Mean confidence over all positions
    pub confidence: f32,
    /// Bounding box of the most confident position
    pub bbox: Rect,
    pub center: Point2<f32>,
    pub first_seen: f64,
    pub last_seen: f64,
    /// Seconds
    pub duration: f64,
    pub stationary_duration_minutes: f64,
    pub total_detections: usize,
    /// Mean center displacement between consecutive positions, in pixels
    pub average_movement: f32,
    pub best_frame: u64,
    pub capture_timestamp: f64,
}

/// Movement statistics of a single track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementSummary {
    pub total_movement: f32,
    pub average_movement: f32,
    pub duration: f64,
}

impl MovementSummary {
    pub fn of(track: &Track) -> Self {
        let positions = track.positions();
        let total_movement: f32 = positions
            .windows(2)
            .map(|w| nalgebra::distance(&w[0].center, &w[1].center))
            .sum();
        let average_movement = if positions.len() > 1 {
            total_movement / (positions.len() - 1) as f32
        } else {
            0.0
        };

        Self {
            total_movement,
            average_movement,
            duration: track.duration(),
        }
    }
}

/// Point-in-time classifier over a full track history.
///
/// Stateless between calls: classifying the same tracks twice yields the same
/// candidates, ids included.
pub struct StationarityClassifier {
    config: ClassifierConfig,
}

impl StationarityClassifier {
    /// Classifier applying `config` to every track.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify `tracks`, returning candidates in input order.
    pub fn classify<'a, I>(&self, tracks: I) -> Vec<LostObjectCandidate>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        tracks
            .into_iter()
            .filter_map(|track| self.classify_track(track))
            .collect()
    }

    /// Classify one track; `None` when it is transient or too short.
    pub fn classify_track(&self, track: &Track) -> Option<LostObjectCandidate> {
        if track.len() < self.config.min_positions {
            return None;
        }

        let summary = MovementSummary::of(track);
        if summary.average_movement >= self.config.movement_threshold
            || summary.duration < self.config.stationary_threshold
        {
            return None;
        }

        let positions = track.positions();
        let best = most_confident(positions)?;
        let mean_confidence =
            positions.iter().map(|p| p.confidence).sum::<f32>() / positions.len() as f32;

        Some(LostObjectCandidate {
            id: format!("lost_{}_{}", track.id(), track.first_seen() as i64),
            track_id: track.id(),
            class_name: track.class_name().to_string(),
            confidence: mean_confidence,
            bbox: best.bbox,
            center: best.center,
            first_seen: track.first_seen(),
            last_seen: track.last_seen(),
            duration: summary.duration,
            stationary_duration_minutes: summary.duration / 60.0,
            total_detections: positions.len(),
            average_movement: summary.average_movement,
            best_frame: best.frame_number,
            capture_timestamp: best.timestamp,
        })
    }
}

/// Position with the highest confidence; the earliest one wins ties.
fn most_confident(positions: &[Position]) -> Option<&Position> {
    positions.iter().fold(None, |best, p| match best {
        Some(b) if b.confidence >= p.confidence => Some(b),
        _ => Some(p),
    })
}
