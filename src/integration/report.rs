//! Output record of a processing run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::tracker::{Detection, LostObjectCandidate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub path: PathBuf,
    /// Seconds
    pub duration: f64,
    pub fps: f64,
    pub total_frames: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Frames handed to the detector
    pub frames_processed: u64,
    pub objects_detected: u64,
    /// Tracks allocated over the whole run
    pub tracks_created: usize,
    /// Tracks matched in the last processed frame
    pub active_tracks: usize,
    /// Frames whose detection failed and contributed nothing
    pub detection_failures: u64,
    pub lost_objects_found: usize,
}

/// Everything a run produces; serializes to the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub video_info: VideoInfo,
    pub settings: Settings,
    pub detected_objects: Vec<Detection>,
    pub lost_objects: Vec<LostObjectCandidate>,
    pub processing_stats: ProcessingStats,
}

impl ProcessingResult {
    pub fn new(video_info: VideoInfo, settings: Settings) -> Self {
        Self {
            video_info,
            settings,
            detected_objects: Vec::new(),
            lost_objects: Vec::new(),
            processing_stats: ProcessingStats::default(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
