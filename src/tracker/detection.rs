//! Per-frame detection input for the tracker.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// A single object observed by the detector in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label reported by the detector (e.g. `"backpack"`)
    #[serde(rename = "class")]
    pub class_name: String,
    /// Detection confidence score in `0..=1`
    pub confidence: f32,
    /// Bounding box in TLWH format
    pub bbox: Rect,
    /// Center of `bbox`
    pub center: Point2<f32>,
    /// Index of the frame in the video stream
    pub frame_number: u64,
    /// Seconds from the start of the video
    pub timestamp: f64,
}

impl Detection {
    pub fn new(
        class_name: impl Into<String>,
        confidence: f32,
        bbox: Rect,
        frame_number: u64,
        timestamp: f64,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            center: bbox.center(),
            bbox,
            frame_number,
            timestamp,
        }
    }

    /// Euclidean distance between this detection's center and `point`.
    #[inline]
    pub fn distance_to(&self, point: &Point2<f32>) -> f32 {
        nalgebra::distance(&self.center, point)
    }
}
