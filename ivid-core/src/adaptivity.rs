//! Score-driven branching rules attached to interactions

/// One branch of an adaptivity rule
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AdaptivityBranch {
    /// Timecode to jump to, in seconds
    #[cfg_attr(feature = "serde", serde(default))]
    pub seek_to: Option<f64>,
    /// Lets the learner dismiss the branch without the blocking overlay
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_opt_out: bool,
    /// Feedback shown next to the continue affordance
    #[cfg_attr(feature = "serde", serde(default))]
    pub message: String,
    /// Label of the continue affordance
    #[cfg_attr(feature = "serde", serde(default))]
    pub seek_label: Option<String>,
}

impl AdaptivityBranch {
    /// Creates a branch that seeks to the given timecode
    pub fn seek(seek_to: f64, message: impl Into<String>) -> Self {
        Self {
            seek_to: Some(seek_to),
            allow_opt_out: false,
            message: message.into(),
            seek_label: None,
        }
    }

    /// Allows the learner to opt out of the blocking overlay
    pub fn with_opt_out(mut self) -> Self {
        self.allow_opt_out = true;
        self
    }
}

/// Branching rule chosen by whether the answer reached full score
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AdaptivityRule {
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_correct: Option<AdaptivityBranch>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_wrong: Option<AdaptivityBranch>,
}

impl AdaptivityRule {
    /// Returns the branch that applies to the given outcome
    pub fn branch(&self, full_score: bool) -> Option<&AdaptivityBranch> {
        if full_score {
            self.on_correct.as_ref()
        } else {
            self.on_wrong.as_ref()
        }
    }
}
