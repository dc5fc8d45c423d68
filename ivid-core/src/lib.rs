//! IVID Core Library
//!
//! This library provides the authored data structures for IVID interactive
//! videos: timed interactions, adaptivity rules, progress and persisted state.

pub mod adaptivity;
pub mod interaction;
pub mod state;
pub mod timeline;
pub mod video;

pub use adaptivity::{AdaptivityBranch, AdaptivityRule};
pub use interaction::{ContentAction, DisplayMode, InteractionParams};
pub use state::{ContentState, PreviousState, Progress, ScoreRecord};
pub use timeline::{Position, TimeWindow};
pub use video::{Bookmark, InteractiveVideoParams, PlaybackSettings};

/// Result type for ivid-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ivid-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Interaction {index} has no duration")]
    MissingDuration { index: usize },

    #[error("Interaction {index} has no action")]
    MissingAction { index: usize },

    #[error("Interaction {index} has an invalid duration: {from}s to {to}s")]
    InvalidDuration { index: usize, from: f64, to: f64 },

    #[error("Interaction {index} has an invalid position")]
    InvalidPosition { index: usize },
}
