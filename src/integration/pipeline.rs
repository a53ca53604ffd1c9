//! LostObjectPipeline for combining detection, tracking and classification.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::tracker::{Associator, Detection, StationarityClassifier, TrackRegistry};

use super::frame_source::FrameSourceGuard;
use super::report::{ProcessingResult, VideoInfo};
use super::{DetectionSource, FrameInfo, FrameSource, VideoOpener};

const PROGRESS_EVERY: u64 = 100;

/// Runs a detector over a video, tracks what it sees and reports stationary
/// objects.
///
/// Processing is strictly sequential: each frame is read, detected and
/// associated before the next one is read. Every run starts from an empty
/// [`TrackRegistry`].
pub struct LostObjectPipeline<D: DetectionSource> {
    detector: D,
    registry: TrackRegistry,
    cancel: Option<Arc<AtomicBool>>,
}

impl<D: DetectionSource> LostObjectPipeline<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            registry: TrackRegistry::new(),
            cancel: None,
        }
    }

    /// Abort runs once `flag` is set. Checked before every frame.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Open the video at `path` and process it.
    ///
    /// Fails with [`PipelineError::VideoNotFound`] before opening anything if
    /// the opener reports the path missing, and with
    /// [`PipelineError::VideoUnavailable`] if it cannot be opened.
    pub fn process_video<O>(
        &mut self,
        opener: &O,
        path: &Path,
        settings: &Settings,
    ) -> Result<ProcessingResult, PipelineError>
    where
        O: VideoOpener,
        O::Source: FrameSource<Frame = D::Frame>,
    {
        if !opener.exists(path) {
            return Err(PipelineError::VideoNotFound(path.to_path_buf()));
        }
        let source = opener
            .open(path)
            .map_err(|e| PipelineError::VideoUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.process_frames(source, path, settings)
    }

    /// Process an already opened frame source. The source is released before
    /// this returns, on success and on error.
    pub fn process_frames<S>(
        &mut self,
        source: S,
        path: &Path,
        settings: &Settings,
    ) -> Result<ProcessingResult, PipelineError>
    where
        S: FrameSource<Frame = D::Frame>,
    {
        let mut source = FrameSourceGuard::new(source);
        settings.validate()?;

        let fps = source.fps();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(PipelineError::VideoUnavailable {
                path: path.to_path_buf(),
                reason: format!("invalid frame rate {fps}"),
            });
        }
        let total_frames = source.frame_count();
        let duration = total_frames as f64 / fps;

        info!("Processing video: {}", path.display());
        info!(
            "Duration: {:.1}s, FPS: {:.2}, Frames: {}",
            duration, fps, total_frames
        );

        self.registry.clear();
        let associator = Associator::new(settings.associator_config());
        let mut result = ProcessingResult::new(
            VideoInfo {
                path: path.to_path_buf(),
                duration,
                fps,
                total_frames,
            },
            settings.clone(),
        );

        let mut frame_number: u64 = 0;
        loop {
            if self.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    frames_processed: result.processing_stats.frames_processed,
                });
            }

            let frame = match source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    return Err(PipelineError::FrameRead {
                        frame_number,
                        reason: e.to_string(),
                    });
                }
            };

            if frame_number % settings.frame_skip != 0 {
                frame_number += 1;
                continue;
            }

            let info = FrameInfo {
                frame_number,
                timestamp: frame_number as f64 / fps,
            };
            let detections = self.detect(&frame, info, settings, &mut result);
            associator.associate(&mut self.registry, &detections)?;

            let stats = &mut result.processing_stats;
            stats.objects_detected += detections.len() as u64;
            stats.frames_processed += 1;
            result.detected_objects.extend(detections);

            frame_number += 1;

            if stats.frames_processed % PROGRESS_EVERY == 0 {
                let progress = if total_frames > 0 {
                    frame_number as f64 / total_frames as f64 * 100.0
                } else {
                    0.0
                };
                info!(
                    "Progress: {:.1}% ({} frames processed)",
                    progress, stats.frames_processed
                );
            }
        }

        source.release();

        let classifier = StationarityClassifier::new(settings.classifier_config());
        result.lost_objects = classifier.classify(self.registry.iter());

        let stats = &mut result.processing_stats;
        stats.tracks_created = self.registry.len();
        stats.active_tracks = self.registry.active_tracks().len();
        stats.lost_objects_found = result.lost_objects.len();

        info!(
            "Processing complete. Found {} potential lost objects",
            stats.lost_objects_found
        );

        Ok(result)
    }

    /// Run the detector on one frame, keeping monitored classes only.
    ///
    /// A failing detector, or one returning detections stamped for another
    /// frame, is logged and yields no detections for the frame.
    fn detect(
        &mut self,
        frame: &D::Frame,
        info: FrameInfo,
        settings: &Settings,
        result: &mut ProcessingResult,
    ) -> Vec<Detection> {
        match self.detector.detect(frame, info, settings.confidence_threshold) {
            Ok(detections) => {
                if let Some(stray) = detections.iter().find(|d| !info.stamps(d)) {
                    warn!(
                        "Error detecting objects in frame {}: detection stamped for frame {} at {}s",
                        info.frame_number, stray.frame_number, stray.timestamp
                    );
                    result.processing_stats.detection_failures += 1;
                    return Vec::new();
                }
                let total = detections.len();
                let kept: Vec<Detection> = detections
                    .into_iter()
                    .filter(|d| settings.is_monitored(&d.class_name))
                    .collect();
                if kept.len() < total {
                    debug!(
                        frame = info.frame_number,
                        dropped = total - kept.len(),
                        "ignored unmonitored classes"
                    );
                }
                kept
            }
            Err(e) => {
                warn!(
                    "Error detecting objects in frame {}: {}",
                    info.frame_number, e
                );
                result.processing_stats.detection_failures += 1;
                Vec::new()
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Tracks of the most recent run.
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}
