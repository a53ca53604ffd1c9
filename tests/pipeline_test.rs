use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lost_object_tracker::integration::Recording;
use lost_object_tracker::{
    Detection, DetectionBuilder, DetectionSource, FrameInfo, FrameSource, LostObjectPipeline,
    PipelineError, Settings, VideoOpener,
};

// =============================================================================
// Synthetic video
// =============================================================================

struct SyntheticVideo {
    fps: f64,
    frame_count: u64,
    next: u64,
    fail_at: Option<u64>,
    released: Rc<Cell<u32>>,
}

impl SyntheticVideo {
    fn new(seconds: u64, fps: u64) -> Self {
        Self {
            fps: fps as f64,
            frame_count: seconds * fps,
            next: 0,
            fail_at: None,
            released: Rc::new(Cell::new(0)),
        }
    }
}

impl FrameSource for SyntheticVideo {
    type Frame = u64;
    type Error = String;

    fn read(&mut self) -> Result<Option<u64>, String> {
        if Some(self.next) == self.fail_at {
            return Err("corrupt packet".to_string());
        }
        if self.next >= self.frame_count {
            return Ok(None);
        }
        self.next += 1;
        Ok(Some(self.next - 1))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn release(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

struct SyntheticOpener {
    exists: bool,
    openable: bool,
    opened: Cell<bool>,
}

impl VideoOpener for SyntheticOpener {
    type Source = SyntheticVideo;
    type Error = String;

    fn exists(&self, _path: &Path) -> bool {
        self.exists
    }

    fn open(&self, _path: &Path) -> Result<SyntheticVideo, String> {
        self.opened.set(true);
        if self.openable {
            Ok(SyntheticVideo::new(300, 30))
        } else {
            Err("unsupported codec".to_string())
        }
    }
}

/// Reports one backpack per frame; its center moves `step` pixels per processed frame.
struct BackpackDetector {
    step: f32,
    processed: u32,
    fail_on: Vec<u64>,
    /// Frames whose detections are built without the frame stamp
    unstamped_on: Vec<u64>,
    cancel_after: Option<(u32, Arc<AtomicBool>)>,
}

impl BackpackDetector {
    fn moving(step: f32) -> Self {
        Self {
            step,
            processed: 0,
            fail_on: vec![],
            unstamped_on: vec![],
            cancel_after: None,
        }
    }
}

impl DetectionSource for BackpackDetector {
    type Frame = u64;
    type Error = String;

    fn detect(
        &mut self,
        frame: &u64,
        info: FrameInfo,
        _confidence_threshold: f32,
    ) -> Result<Vec<Detection>, String> {
        assert_eq!(*frame, info.frame_number);
        let index = self.processed;
        self.processed += 1;
        if let Some((after, flag)) = &self.cancel_after {
            if self.processed >= *after {
                flag.store(true, Ordering::Relaxed);
            }
        }
        if self.fail_on.contains(&info.frame_number) {
            return Err("inference backend crashed".to_string());
        }

        let cx = 100.0 + self.step * index as f32;
        let builder = DetectionBuilder::new("backpack")
            .xywh(cx, 240.0, 60.0, 80.0)
            .confidence(0.9);
        let builder = if self.unstamped_on.contains(&info.frame_number) {
            builder
        } else {
            builder.frame(info)
        };
        Ok(vec![builder.build()])
    }
}

fn settings(frame_skip: u64, stationary_minutes: f64) -> Settings {
    Settings {
        frame_skip,
        stationary_threshold: stationary_minutes,
        ..Settings::default()
    }
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_stationary_backpack_is_reported() {
    // 300 s at 30 fps sampled every 30 s: ten samples at t = 0, 30, ..., 270.
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));
    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings(900, 4.5))
        .unwrap();

    let stats = &result.processing_stats;
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.objects_detected, 10);
    assert_eq!(stats.tracks_created, 1);
    assert_eq!(stats.lost_objects_found, 1);
    assert_eq!(result.video_info.duration, 300.0);
    assert_eq!(result.video_info.total_frames, 9000);

    let lost = &result.lost_objects[0];
    assert_eq!(lost.id, "lost_0_0");
    assert_eq!(lost.class_name, "backpack");
    assert_eq!(lost.average_movement, 0.0);
    assert_eq!(lost.duration, 270.0);
    assert_eq!(lost.stationary_duration_minutes, 4.5);
    assert_eq!(lost.total_detections, 10);
    assert_eq!(lost.best_frame, 0);
    assert!((lost.confidence - 0.9).abs() < 1e-6);
}

#[test]
fn test_stationary_backpack_below_threshold_is_not_reported() {
    // Sampled every second the track spans 299 s, one short of five minutes.
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));
    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings(30, 5.0))
        .unwrap();

    assert_eq!(result.processing_stats.frames_processed, 300);
    assert_eq!(result.processing_stats.tracks_created, 1);
    assert_eq!(pipeline.registry().get(0).unwrap().duration(), 299.0);
    assert!(result.lost_objects.is_empty());
}

#[test]
fn test_moving_backpack_is_not_reported() {
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(200.0));
    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings(900, 4.5))
        .unwrap();

    assert_eq!(result.processing_stats.tracks_created, 10);
    assert_eq!(result.processing_stats.active_tracks, 1);
    assert!(result.lost_objects.is_empty());
}

#[test]
fn test_runs_do_not_share_tracks() {
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));
    let first = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("a.mp4"), &settings(900, 4.5))
        .unwrap();
    let second = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("b.mp4"), &settings(900, 4.5))
        .unwrap();

    assert_eq!(first.processing_stats.tracks_created, 1);
    assert_eq!(second.processing_stats.tracks_created, 1);
    assert_eq!(first.lost_objects[0].id, second.lost_objects[0].id);
}

// =============================================================================
// Error handling
// =============================================================================

#[test]
fn test_detection_failure_skips_frame() {
    let mut detector = BackpackDetector::moving(0.0);
    detector.fail_on = vec![1800];
    let mut pipeline = LostObjectPipeline::new(detector);

    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings(900, 1.0))
        .unwrap();

    let stats = &result.processing_stats;
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.detection_failures, 1);
    assert_eq!(stats.objects_detected, 9);
    // The missed sample breaks the track in two without a timeout.
    assert_eq!(stats.tracks_created, 2);
}

#[test]
fn test_unstamped_detections_count_as_failed_frame() {
    // Frame 1800 reports its backpack at frame 0, before the track's last sample.
    let mut detector = BackpackDetector::moving(0.0);
    detector.unstamped_on = vec![1800];
    let mut pipeline = LostObjectPipeline::new(detector);

    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings(900, 1.0))
        .unwrap();

    let stats = &result.processing_stats;
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.detection_failures, 1);
    assert_eq!(stats.objects_detected, 9);
    assert_eq!(stats.tracks_created, 2);
    for track in pipeline.registry().iter() {
        for pair in track.positions().windows(2) {
            assert!(pair[0].frame_number < pair[1].frame_number);
        }
    }
}

#[test]
fn test_track_timeout_bridges_failed_frame() {
    let mut detector = BackpackDetector::moving(0.0);
    detector.fail_on = vec![1800];
    let mut pipeline = LostObjectPipeline::new(detector);
    let settings = Settings {
        track_timeout: 1,
        ..settings(900, 1.0)
    };

    let result = pipeline
        .process_frames(SyntheticVideo::new(300, 30), Path::new("lobby.mp4"), &settings)
        .unwrap();

    assert_eq!(result.processing_stats.tracks_created, 1);
    assert_eq!(result.lost_objects.len(), 1);
    assert_eq!(result.lost_objects[0].total_detections, 9);
}

#[test]
fn test_missing_video_is_not_opened() {
    let opener = SyntheticOpener {
        exists: false,
        openable: true,
        opened: Cell::new(false),
    };
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    let err = pipeline
        .process_video(&opener, Path::new("missing.mp4"), &Settings::default())
        .unwrap_err();
    assert!(matches!(err, PipelineError::VideoNotFound(_)));
    assert!(!opener.opened.get());
}

#[test]
fn test_unopenable_video_is_unavailable() {
    let opener = SyntheticOpener {
        exists: true,
        openable: false,
        opened: Cell::new(false),
    };
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    let err = pipeline
        .process_video(&opener, Path::new("broken.mp4"), &Settings::default())
        .unwrap_err();
    match err {
        PipelineError::VideoUnavailable { reason, .. } => assert_eq!(reason, "unsupported codec"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_process_video_through_opener() {
    let opener = SyntheticOpener {
        exists: true,
        openable: true,
        opened: Cell::new(false),
    };
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    let result = pipeline
        .process_video(&opener, Path::new("lobby.mp4"), &settings(900, 4.5))
        .unwrap();
    assert_eq!(result.lost_objects.len(), 1);
}

#[test]
fn test_source_released_on_read_error() {
    let mut video = SyntheticVideo::new(300, 30);
    video.fail_at = Some(1000);
    let released = video.released.clone();
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    let err = pipeline
        .process_frames(video, Path::new("lobby.mp4"), &settings(900, 4.5))
        .unwrap_err();
    assert!(matches!(err, PipelineError::FrameRead { frame_number: 1000, .. }));
    assert_eq!(released.get(), 1);
}

#[test]
fn test_source_released_on_success() {
    let video = SyntheticVideo::new(10, 30);
    let released = video.released.clone();
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    pipeline
        .process_frames(video, Path::new("lobby.mp4"), &Settings::default())
        .unwrap();
    assert_eq!(released.get(), 1);
}

#[test]
fn test_invalid_settings_are_rejected() {
    let video = SyntheticVideo::new(10, 30);
    let released = video.released.clone();
    let mut pipeline = LostObjectPipeline::new(BackpackDetector::moving(0.0));

    let err = pipeline
        .process_frames(video, Path::new("lobby.mp4"), &settings(0, 5.0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(released.get(), 1);
}

#[test]
fn test_cancellation_checked_per_frame() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut detector = BackpackDetector::moving(0.0);
    detector.cancel_after = Some((3, flag.clone()));

    let video = SyntheticVideo::new(300, 30);
    let released = video.released.clone();
    let mut pipeline = LostObjectPipeline::new(detector).with_cancel_flag(flag);

    let err = pipeline
        .process_frames(video, Path::new("lobby.mp4"), &settings(900, 4.5))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled { frames_processed: 3 }));
    assert_eq!(released.get(), 1);
}

// =============================================================================
// Replay backend
// =============================================================================

#[test]
fn test_replay_recording_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("platform.mp4");
    std::fs::write(&video_path, b"not decoded").unwrap();

    let frames: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            serde_json::json!({
                "frame_number": i * 300,
                "detections": [
                    { "class": "suitcase", "confidence": 0.85, "bbox": [400, 300, 120, 90] },
                    { "class": "person", "confidence": 0.95, "bbox": [10 + i * 80, 50, 60, 180] }
                ]
            })
        })
        .collect();
    let recording_path = dir.path().join("recording.json");
    std::fs::write(
        &recording_path,
        serde_json::json!({ "fps": 10.0, "frame_count": 3000, "frames": frames }).to_string(),
    )
    .unwrap();

    let (opener, detector) = Recording::load(&recording_path).unwrap().into_parts();
    let mut pipeline = LostObjectPipeline::new(detector);
    let settings = Settings {
        frame_skip: 300,
        stationary_threshold: 4.0,
        ..Settings::default()
    };

    let result = pipeline.process_video(&opener, &video_path, &settings).unwrap();
    assert_eq!(result.processing_stats.frames_processed, 10);
    assert_eq!(result.processing_stats.objects_detected, 10);
    assert_eq!(result.lost_objects.len(), 1);
    assert_eq!(result.lost_objects[0].class_name, "suitcase");
    assert_eq!(result.lost_objects[0].duration, 270.0);

    let json: serde_json::Value = serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["lost_objects"][0]["class"], "suitcase");
    assert_eq!(json["processing_stats"]["lost_objects_found"], 1);
    assert_eq!(json["settings"]["frame_skip"], 300);
    assert_eq!(json["video_info"]["total_frames"], 3000);

    let missing = pipeline.process_video(&opener, &dir.path().join("nope.mp4"), &settings);
    assert!(matches!(missing, Err(PipelineError::VideoNotFound(_))));
}
