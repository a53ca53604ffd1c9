//! Tracks objects reported by an external detector across video frames and
//! flags the ones that stay put long enough to be lost-item candidates.

pub mod config;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::Settings;
pub use error::{ConfigError, PipelineError, TrackError};
pub use integration::{
    DetectionBuilder, DetectionSource, FrameInfo, FrameSource, LostObjectPipeline,
    ProcessingResult, VideoOpener,
};
pub use tracker::{
    Associator, AssociatorConfig, ClassifierConfig, Detection, LostObjectCandidate,
    MatchingStrategy, Rect, StationarityClassifier, Track, TrackId, TrackRegistry,
};
