//! Trait for object detection backends.

use std::fmt::Display;

use crate::tracker::Detection;

/// Position of a processed frame within the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Index of the frame among all decoded frames, starting at 0
    pub frame_number: u64,
    /// Seconds from the start of the video
    pub timestamp: f64,
}

impl FrameInfo {
    /// Whether `det` carries this frame's number and timestamp.
    pub fn stamps(&self, det: &Detection) -> bool {
        det.frame_number == self.frame_number && (det.timestamp - self.timestamp).abs() < 1e-6
    }
}

/// Trait for object detection backends.
///
/// Implement this trait to connect any detection model to the lost-object
/// pipeline. Implementations must be deterministic for identical pixels and
/// threshold, and should only report detections whose confidence reaches
/// `confidence_threshold`.
///
/// # Example
///
/// ```ignore
/// use lost_object_tracker::{Detection, DetectionSource, FrameInfo};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Frame = Vec<u8>;
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         frame: &Vec<u8>,
///         info: FrameInfo,
///         confidence_threshold: f32,
///     ) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Decoded frame type handed over by the frame source.
    type Frame;

    /// Error type for detection failures.
    type Error: Display;

    /// Run inference on one frame.
    ///
    /// Returned detections must carry `info.frame_number` and
    /// `info.timestamp`; the pipeline discards a frame whose detections
    /// do not.
    fn detect(
        &mut self,
        frame: &Self::Frame,
        info: FrameInfo,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `Detection`.
///
/// Implement this for your model's output format to enable easy conversion.
pub trait IntoDetections {
    /// Convert the output into detections stamped with `info`.
    fn into_detections(self, info: FrameInfo) -> Vec<Detection>;
}
