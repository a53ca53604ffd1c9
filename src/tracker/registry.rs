//! Ownership of every track created during one processing run.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::TrackError;
use crate::tracker::detection::Detection;
use crate::tracker::track::{Track, TrackId};
use crate::tracker::track_state::TrackState;

/// Owns all tracks of a single run, keyed by id.
///
/// Ids come from a counter owned by the registry, so they are never reused and
/// two registries never share state. Tracks that stop matching are retired but
/// kept, so classification sees the whole history.
#[derive(Debug)]
pub struct TrackRegistry {
    tracks: BTreeMap<TrackId, Track>,
    next_id: TrackId,
    sequence: u64,
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackRegistry {
    /// Empty registry; the first track gets id 0.
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            sequence: 0,
        }
    }

    /// Number of frames processed so far; the current frame once `begin_frame`
    /// has been called.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Start a new processed frame.
    pub fn begin_frame(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Allocate a new track seeded with `det`.
    pub fn create_track(&mut self, det: &Detection) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks.insert(id, Track::new(id, det, self.sequence));
        debug!(track_id = id, class = %det.class_name, frame = det.frame_number, "created track");
        id
    }

    /// Fail with the error `append(id, det)` would return, without appending.
    pub fn check_append(&self, id: TrackId, det: &Detection) -> Result<(), TrackError> {
        let track = self.tracks.get(&id).ok_or(TrackError::UnknownTrack(id))?;
        if track.state() == TrackState::Retired {
            return Err(TrackError::Retired(id));
        }
        track.check_append(det)
    }

    /// Append `det` as the newest position of track `id`.
    pub fn append(&mut self, id: TrackId, det: &Detection) -> Result<(), TrackError> {
        self.check_append(id, det)?;
        let sequence = self.sequence;
        let track = self
            .tracks
            .get_mut(&id)
            .ok_or(TrackError::UnknownTrack(id))?;
        track.append(det, sequence)
    }

    /// Settle track states after the current frame has been associated.
    ///
    /// Tracks unmatched for more than `track_timeout` processed frames are
    /// retired and never matched again.
    pub fn end_frame(&mut self, track_timeout: u64) {
        let sequence = self.sequence;
        for track in self.tracks.values_mut() {
            if track.state() == TrackState::Retired || track.last_matched() == sequence {
                continue;
            }
            if sequence - track.last_matched() > track_timeout {
                track.mark_retired();
            } else {
                track.mark_lost();
            }
        }
    }

    /// Tracks matched (or created) in the most recently processed frame.
    pub fn active_tracks(&self) -> Vec<TrackId> {
        self.tracks
            .values()
            .filter(|t| t.state() == TrackState::Tracked && t.last_matched() == self.sequence)
            .map(Track::id)
            .collect()
    }

    /// Tracks that may still be matched, in ascending id order.
    pub fn eligible_tracks(&self) -> Vec<TrackId> {
        self.tracks
            .values()
            .filter(|t| t.state() != TrackState::Retired)
            .map(Track::id)
            .collect()
    }

    /// Track with the given id, if it exists.
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Every track of the run, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Number of tracks created since the last `clear`.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True before the first track is created.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop every track and restart ids and frame numbering.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
