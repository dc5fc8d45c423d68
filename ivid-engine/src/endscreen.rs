//! Summary shown when the video ends

use crate::interaction::Interaction;
use ivid_core::Progress;

/// One answered interaction on the endscreen
#[derive(Debug, Clone, PartialEq)]
pub struct EndscreenEntry {
    pub interaction: usize,
    /// Authored start, used to jump back to the interaction
    pub time: f64,
    pub title: String,
    pub score: Option<u32>,
    pub max_score: Option<u32>,
}

/// Answered interactions and their scores
#[derive(Debug, Clone, PartialEq)]
pub struct EndscreenSummary {
    pub entries: Vec<EndscreenEntry>,
    pub total_score: u32,
    pub total_max_score: u32,
}

impl EndscreenSummary {
    /// Builds the summary, or `None` when nothing was answered
    pub fn from_interactions(interactions: &[Interaction]) -> Option<Self> {
        let entries: Vec<EndscreenEntry> = interactions
            .iter()
            .filter(|i| !i.is_label() && i.progress() == Progress::Answered)
            .map(|i| EndscreenEntry {
                interaction: i.index(),
                time: i.duration().from,
                title: i.title(),
                score: i.score(),
                max_score: i.max_score(),
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        let total_score = entries.iter().filter_map(|e| e.score).sum();
        let total_max_score = entries.iter().filter_map(|e| e.max_score).sum();
        Some(Self {
            entries,
            total_score,
            total_max_score,
        })
    }

    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }
}
