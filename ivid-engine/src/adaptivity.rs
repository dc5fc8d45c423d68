//! Branching decisions taken when an interaction is answered

use crate::interaction::Interaction;
use ivid_core::{AdaptivityBranch, DisplayMode};

/// What to do after an interaction was answered
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptivityDecision {
    /// Offer the generic continue affordance. `hold` keeps it hidden and the
    /// video paused because a required interaction is not at full score yet.
    Continue { hold: bool },
    /// Pause and offer a single branch-specific continue that seeks
    Branch {
        seek_to: f64,
        /// Block everything else with the overlay until the learner continues
        block: bool,
        message: String,
        label: Option<String>,
        /// The answer was wrong, so the task is reset on continue
        wrong: bool,
    },
}

/// Continue affordance currently offered to the learner
#[derive(Debug, Clone, PartialEq)]
pub enum ContinueAffordance {
    Generic {
        interaction: usize,
    },
    Branch {
        interaction: usize,
        seek_to: f64,
        blocking: bool,
        wrong: bool,
        message: String,
        label: Option<String>,
    },
}

impl ContinueAffordance {
    pub fn interaction(&self) -> usize {
        match self {
            ContinueAffordance::Generic { interaction }
            | ContinueAffordance::Branch { interaction, .. } => *interaction,
        }
    }
}

/// Chooses the branch for an answered interaction
pub fn decide(interaction: &Interaction) -> AdaptivityDecision {
    let full_score = interaction.has_full_score();
    let branch = interaction
        .params()
        .adaptivity
        .as_ref()
        .and_then(|rule| rule.branch(full_score));

    match branch {
        Some(AdaptivityBranch {
            seek_to: Some(seek_to),
            allow_opt_out,
            message,
            seek_label,
            ..
        }) => AdaptivityDecision::Branch {
            seek_to: *seek_to,
            block: !allow_opt_out,
            message: message.clone(),
            label: seek_label.clone(),
            wrong: !full_score,
        },
        _ => AdaptivityDecision::Continue {
            hold: interaction.is_gated(),
        },
    }
}

/// Seek target of a branch, nudged forward when it would land on the
/// interaction's own start
pub fn branch_target(seek_to: f64, interaction_from: f64, nudge: f64) -> f64 {
    if (seek_to - interaction_from).abs() < f64::EPSILON {
        seek_to + nudge
    } else {
        seek_to
    }
}

/// First visible interaction that must still be completed before playback
/// may resume. Posters are preferred over buttons since they cover the video.
pub fn find_gate(
    interactions: &[Interaction],
    visible: impl IntoIterator<Item = usize>,
    exclude: Option<usize>,
) -> Option<usize> {
    let mut button = None;
    for index in visible {
        if Some(index) == exclude {
            continue;
        }
        let interaction = &interactions[index];
        if !interaction.is_gated() {
            continue;
        }
        match interaction.display_mode() {
            DisplayMode::Poster => return Some(index),
            _ => {
                button.get_or_insert(index);
            }
        }
    }
    button
}
