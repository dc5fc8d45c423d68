//! Answer progress and persisted player state

/// Coarse answer state of an interaction.
///
/// Ordered so that progress only ever moves forward with [`Progress::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Progress {
    #[default]
    None,
    Interacted,
    Answered,
}

impl Progress {
    /// Moves forward to `next`, never backwards. Returns true if it changed.
    pub fn advance(&mut self, next: Progress) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Score of an interaction as last reported by its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScoreRecord {
    pub score: u32,
    pub max_score: u32,
}

impl ScoreRecord {
    pub fn new(score: u32, max_score: u32) -> Self {
        Self { score, max_score }
    }
}

/// Opaque sub-state of a content instance, as serialized by the content itself
pub type ContentState = String;

/// State of a previous attempt, consumed at construction and produced on demand
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PreviousState {
    /// Playback position in seconds
    #[cfg_attr(feature = "serde", serde(default))]
    pub progress: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interactions_progress: Vec<Progress>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub answers: Vec<Option<ContentState>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scores: Vec<Option<ScoreRecord>>,
}

impl PreviousState {
    pub fn progress_of(&self, index: usize) -> Progress {
        self.interactions_progress.get(index).copied().unwrap_or_default()
    }

    pub fn answer_of(&self, index: usize) -> Option<&ContentState> {
        self.answers.get(index).and_then(Option::as_ref)
    }

    pub fn score_of(&self, index: usize) -> Option<ScoreRecord> {
        self.scores.get(index).copied().flatten()
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
