//! Integration module for connecting detection and video backends with the
//! lost-object tracker.
//!
//! This module provides the traits a detector and a video decoder implement,
//! the pipeline driving them, and a replay backend for recorded detections.

mod builder;
mod detector;
mod frame_source;
mod pipeline;
mod replay;
mod report;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, FrameInfo, IntoDetections};
pub use frame_source::{FrameSource, VideoOpener};
pub use pipeline::LostObjectPipeline;
pub use replay::{
    RecordedDetection, RecordedFrame, Recording, ReplayDetector, ReplayError, ReplayFrame,
    ReplayOpener, ReplaySource,
};
pub use report::{ProcessingResult, ProcessingStats, VideoInfo};
