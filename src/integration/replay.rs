//! Replays recorded detector output in place of a live decoder and model.
//!
//! A recording is a JSON document:
//!
//! ```json
//! {
//!   "fps": 30.0,
//!   "frame_count": 9000,
//!   "frames": [
//!     { "frame_number": 0, "detections": [
//!       { "class": "backpack", "confidence": 0.9, "bbox": [100, 200, 50, 60] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Frames absent from `frames` have no detections. Entries repeating a
//! `frame_number` are merged in document order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DetectionBuilder, DetectionSource, FrameInfo, FrameSource, IntoDetections, VideoOpener};
use crate::tracker::{Detection, Rect};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recording: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("recording has invalid frame rate {0}")]
    InvalidFrameRate(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    /// TLWH
    pub bbox: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub frame_number: u64,
    #[serde(default)]
    pub detections: Vec<RecordedDetection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub fps: f64,
    pub frame_count: u64,
    #[serde(default)]
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Split into the frame opener and the detector replaying this recording.
    pub fn into_parts(self) -> (ReplayOpener, ReplayDetector) {
        let opener = ReplayOpener {
            fps: self.fps,
            frame_count: self.frame_count,
        };
        let mut detections: HashMap<u64, Vec<RecordedDetection>> = HashMap::new();
        for frame in self.frames {
            detections
                .entry(frame.frame_number)
                .or_default()
                .extend(frame.detections);
        }
        (opener, ReplayDetector { detections })
    }
}

impl IntoDetections for Vec<RecordedDetection> {
    fn into_detections(self, info: FrameInfo) -> Vec<Detection> {
        self.into_iter()
            .map(|d| {
                DetectionBuilder::new(d.class_name)
                    .tlwh(d.bbox.x, d.bbox.y, d.bbox.width, d.bbox.height)
                    .confidence(d.confidence)
                    .frame(info)
                    .build()
            })
            .collect()
    }
}

/// Frame handed out by [`ReplaySource`]; carries no pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayFrame {
    pub frame_number: u64,
}

#[derive(Debug, Clone)]
pub struct ReplayOpener {
    fps: f64,
    frame_count: u64,
}

impl VideoOpener for ReplayOpener {
    type Source = ReplaySource;
    type Error = ReplayError;

    fn open(&self, _path: &Path) -> Result<ReplaySource, ReplayError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ReplayError::InvalidFrameRate(self.fps));
        }
        Ok(ReplaySource {
            fps: self.fps,
            frame_count: self.frame_count,
            next: 0,
        })
    }
}

#[derive(Debug)]
pub struct ReplaySource {
    fps: f64,
    frame_count: u64,
    next: u64,
}

impl FrameSource for ReplaySource {
    type Frame = ReplayFrame;
    type Error = std::convert::Infallible;

    fn read(&mut self) -> Result<Option<ReplayFrame>, Self::Error> {
        if self.next >= self.frame_count {
            return Ok(None);
        }
        let frame = ReplayFrame {
            frame_number: self.next,
        };
        self.next += 1;
        Ok(Some(frame))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn release(&mut self) {
        self.next = self.frame_count;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    detections: HashMap<u64, Vec<RecordedDetection>>,
}

impl DetectionSource for ReplayDetector {
    type Frame = ReplayFrame;
    type Error = std::convert::Infallible;

    fn detect(
        &mut self,
        frame: &ReplayFrame,
        info: FrameInfo,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let recorded = self
            .detections
            .get(&frame.frame_number)
            .map(|dets| {
                dets.iter()
                    .filter(|d| d.confidence >= confidence_threshold)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(recorded.into_detections(info))
    }
}
