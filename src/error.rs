//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::tracker::TrackId;

/// Violations of track invariants.
#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("unknown track id {0}")]
    UnknownTrack(TrackId),
    #[error("track {0} is retired and can no longer be extended")]
    Retired(TrackId),
    #[error("track {track_id} holds class `{expected}`, detection is `{found}`")]
    ClassMismatch {
        track_id: TrackId,
        expected: String,
        found: String,
    },
    #[error("track {track_id} already reached frame {last}, cannot append frame {frame}")]
    OutOfOrder { track_id: TrackId, last: u64, frame: u64 },
}

/// Failures while loading or validating [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fatal errors that abort a processing run.
///
/// Per-frame detector failures are not represented here: they are logged and
/// the frame contributes no detections.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("video not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("cannot open video {path}: {reason}")]
    VideoUnavailable { path: PathBuf, reason: String },
    #[error("failed to read frame {frame_number}: {reason}")]
    FrameRead { frame_number: u64, reason: String },
    #[error("processing cancelled after {frames_processed} processed frames")]
    Cancelled { frames_processed: u64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
}
