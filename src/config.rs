use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tracker::{AssociatorConfig, ClassifierConfig, MatchingStrategy};

/// Object classes worth reporting as lost items.
pub const DEFAULT_MONITORED_CLASSES: [&str; 10] = [
    "backpack",
    "handbag",
    "suitcase",
    "laptop",
    "cell phone",
    "book",
    "umbrella",
    "bottle",
    "keys",
    "wallet",
];

/// Processing settings, as read from a JSON settings file.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Only every `frame_skip`-th frame is passed to the detector.
    pub frame_skip: u64,
    /// Minimum time, in minutes, a track must span to be flagged stationary.
    pub stationary_threshold: f64,
    /// Minimum detector confidence, passed through to the detection source.
    pub confidence_threshold: f32,
    /// Maximum center distance in pixels to continue a track.
    pub proximity_threshold: f32,
    /// Maximum average movement per step in pixels for a stationary track.
    pub movement_threshold: f32,
    /// Minimum number of positions before a track can be classified.
    pub min_positions: usize,
    /// Processed frames a track may be missed and still continue.
    pub track_timeout: u64,
    /// Association strategy.
    pub matching: MatchingStrategy,
    /// Classes kept from the detector output. Empty keeps every class.
    pub monitored_classes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_skip: 30,
            stationary_threshold: 5.0,
            confidence_threshold: 0.7,
            proximity_threshold: 50.0,
            movement_threshold: 30.0,
            min_positions: 3,
            track_timeout: 0,
            matching: MatchingStrategy::Greedy,
            monitored_classes: DEFAULT_MONITORED_CLASSES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse settings from JSON text and validate them.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(invalid("frame_skip", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold", "must lie within [0, 1]"));
        }
        if self.stationary_threshold.is_nan() || self.stationary_threshold < 0.0 {
            return Err(invalid("stationary_threshold", "must not be negative"));
        }
        if self.proximity_threshold.is_nan() || self.proximity_threshold <= 0.0 {
            return Err(invalid("proximity_threshold", "must be positive"));
        }
        if self.movement_threshold.is_nan() || self.movement_threshold <= 0.0 {
            return Err(invalid("movement_threshold", "must be positive"));
        }
        if self.min_positions < 2 {
            return Err(invalid("min_positions", "must be at least 2"));
        }
        Ok(())
    }

    /// `stationary_threshold` converted to seconds.
    pub fn stationary_threshold_secs(&self) -> f64 {
        self.stationary_threshold * 60.0
    }

    /// Whether detections of `class_name` are kept.
    pub fn is_monitored(&self, class_name: &str) -> bool {
        self.monitored_classes.is_empty() || self.monitored_classes.iter().any(|c| c == class_name)
    }

    /// Association parameters derived from these settings.
    pub fn associator_config(&self) -> AssociatorConfig {
        AssociatorConfig {
            proximity_threshold: self.proximity_threshold,
            track_timeout: self.track_timeout,
            strategy: self.matching,
        }
    }

    /// Classification parameters, with the stationary threshold in seconds.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            stationary_threshold: self.stationary_threshold_secs(),
            min_positions: self.min_positions,
            movement_threshold: self.movement_threshold,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
