mod associator;
mod detection;
mod matching;
mod rect;
mod registry;
mod stationarity;
mod track;
mod track_state;

pub use associator::{Associator, AssociatorConfig, FrameAssociation, MatchingStrategy};
pub use detection::Detection;
pub use rect::Rect;
pub use registry::TrackRegistry;
pub use stationarity::{ClassifierConfig, LostObjectCandidate, MovementSummary, StationarityClassifier};
pub use track::{Position, Track, TrackId};
pub use track_state::TrackState;
