//! IVID Engine Library
//!
//! This library drives interactive video playback: it decides which timed
//! interactions are visible as playback advances, tracks the player state and
//! branches playback based on how interactions are answered.

pub mod adaptivity;
pub mod collaborators;
pub mod content;
pub mod endscreen;
pub mod events;
pub mod interaction;
pub mod modal;
pub mod playback;
pub mod player;
pub mod scheduler;
pub mod timeline;

#[cfg(test)]
mod test_support;

pub use adaptivity::{AdaptivityDecision, ContinueAffordance};
pub use collaborators::{
    Announcement, Announcer, Dialog, DialogContent, VideoEvent, VideoSource, VideoState,
};
pub use content::{ContentError, ContentEvent, ContentFactory, ContentInstance, Score, Verb};
pub use endscreen::EndscreenSummary;
pub use events::{EventEmitter, SubscriptionToken};
pub use interaction::{
    AnswerOutcome, Interaction, InteractionEvent, InteractionEventKind, RenderHandle,
};
pub use modal::ModalSlot;
pub use playback::{PlaybackState, PlaybackStateMachine};
pub use player::{Collaborators, InteractiveVideo, PlayerEvent, PlayerEventKind};
pub use scheduler::TaskQueue;
pub use timeline::{TickOutcome, TimelineEngine};

/// Result type for ivid-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ivid-engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ivid_core::Error),

    #[error("Interaction not found: {0}")]
    InteractionNotFound(usize),

    #[error("No continue affordance is pending")]
    NoPendingContinue,

    #[error("Dialog is held by interaction {holder}")]
    DialogBusy { holder: usize },

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(usize),
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between time-update polls while playing, in milliseconds
    pub tick_interval_ms: u64,
    /// Forward nudge applied when a branch seeks to its own interaction start
    pub seek_nudge: f64,
    /// Announcement used when more than one interaction appears in a tick
    pub multiple_interactions_message: String,
    /// Warning shown when the learner tries to bypass a required interaction
    pub blocked_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 40,
            seek_nudge: 0.2,
            multiple_interactions_message: "Multiple interactions appeared.".to_string(),
            blocked_message: "You must complete the required interaction before continuing."
                .to_string(),
        }
    }
}
