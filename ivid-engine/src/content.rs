//! Content instances wrapped by interactions
//!
//! A content instance only has to support being attached. Scoring, resetting,
//! state export and pausing are optional capabilities, exposed through the
//! `as_*` accessors so the engine can check for them without knowing the
//! concrete content type.

use crate::RenderHandle;
use ivid_core::{ContentAction, ContentState, Progress};

/// Failure reported by a content instance
#[derive(Debug, thiserror::Error)]
#[error("{library}: {message}")]
pub struct ContentError {
    pub library: String,
    pub message: String,
}

impl ContentError {
    pub fn new(library: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            message: message.into(),
        }
    }
}

/// Content that reports a score
pub trait Scoreable {
    fn score(&self) -> u32;
    fn max_score(&self) -> u32;
}

/// Content whose task can be reset in place
pub trait Resettable {
    fn reset_task(&mut self);
}

/// Content that can export its sub-state for a later attempt
pub trait Stateful {
    fn current_state(&self) -> Option<ContentState>;
}

/// Content that plays media of its own and can be paused
pub trait Pausable {
    fn pause(&mut self) -> Result<(), ContentError>;
}

/// A piece of content shown by an interaction
pub trait ContentInstance {
    /// Attaches the content to the rendering created for its interaction
    fn attach(&mut self, target: &RenderHandle) -> Result<(), ContentError>;

    fn as_scoreable(&self) -> Option<&dyn Scoreable> {
        None
    }

    fn as_resettable(&mut self) -> Option<&mut dyn Resettable> {
        None
    }

    fn as_stateful(&self) -> Option<&dyn Stateful> {
        None
    }

    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        None
    }
}

/// Builds content instances for interactions
pub trait ContentFactory {
    fn create(
        &mut self,
        interaction: usize,
        action: &ContentAction,
        previous: Option<&ContentState>,
    ) -> Result<Box<dyn ContentInstance>, ContentError>;
}

/// Statement verb carried by a content event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Interacted,
    Answered,
    Completed,
    Other(String),
}

impl Verb {
    /// Parses a verb from its short name or full IRI
    pub fn parse(verb: &str) -> Self {
        let name = verb.rsplit('/').next().unwrap_or(verb);
        match name.to_ascii_lowercase().as_str() {
            "interacted" => Verb::Interacted,
            "answered" => Verb::Answered,
            "completed" => Verb::Completed,
            _ => Verb::Other(name.to_string()),
        }
    }

    /// Progress this verb signals, if any
    pub fn progress(&self) -> Option<Progress> {
        match self {
            Verb::Interacted => Some(Progress::Interacted),
            Verb::Answered | Verb::Completed => Some(Progress::Answered),
            Verb::Other(_) => None,
        }
    }
}

/// Raw and maximum score carried by an answer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub raw: u32,
    pub max: u32,
}

/// Outcome event emitted by a content instance
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEvent {
    pub verb: Verb,
    pub score: Option<Score>,
}

impl ContentEvent {
    pub fn interacted() -> Self {
        Self {
            verb: Verb::Interacted,
            score: None,
        }
    }

    pub fn answered(raw: u32, max: u32) -> Self {
        Self {
            verb: Verb::Answered,
            score: Some(Score { raw, max }),
        }
    }

    pub fn completed(score: Option<Score>) -> Self {
        Self {
            verb: Verb::Completed,
            score,
        }
    }
}
