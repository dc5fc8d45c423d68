//! Interactive video parameter document

use crate::{InteractionParams, Result, TimeWindow};
#[cfg(feature = "serde")]
use std::io::{Read, Write};

/// Authored playback settings
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PlaybackSettings {
    /// Restart from `start_at` when the video ends
    #[cfg_attr(feature = "serde", serde(default))]
    pub loop_video: bool,
    /// Start position in seconds
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_at: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub autoplay: bool,
    /// Forbid seeking forward past the furthest watched time
    #[cfg_attr(feature = "serde", serde(default))]
    pub prevent_skipping: bool,
}

/// Named position on the seek bar
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bookmark {
    /// Position in seconds
    pub time: f64,
    pub label: String,
}

impl Bookmark {
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// Complete authored interactive video
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct InteractiveVideoParams {
    /// Title of the video
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    /// Video duration in seconds, if known up front
    #[cfg_attr(feature = "serde", serde(default))]
    pub video_duration: Option<f64>,
    /// Interactions in authoring order
    #[cfg_attr(feature = "serde", serde(default))]
    pub interactions: Vec<InteractionParams>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bookmarks: Vec<Bookmark>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub settings: PlaybackSettings,
}

impl InteractiveVideoParams {
    /// Creates a parameter document from a list of interactions
    pub fn new(interactions: Vec<InteractionParams>) -> Self {
        Self {
            interactions,
            ..Self::default()
        }
    }

    pub fn with_bookmarks(mut self, mut bookmarks: Vec<Bookmark>) -> Self {
        bookmarks.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Reads a parameter document from a JSON reader
    #[cfg(feature = "serde")]
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let mut params: Self = serde_json::from_reader(reader)?;
        params.bookmarks.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(params)
    }

    /// Writes the parameter document as pretty JSON
    #[cfg(feature = "serde")]
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Validates every interaction, returning their windows in authoring order
    pub fn validate(&self) -> Result<Vec<TimeWindow>> {
        self.interactions
            .iter()
            .enumerate()
            .map(|(index, params)| params.validate(index))
            .collect()
    }

    /// Gets the indices of all interactions visible at a given time, in authoring order
    pub fn visible_at(&self, time: f64) -> Vec<usize> {
        self.interactions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.duration.is_some_and(|d| d.visible_at(time)))
            .map(|(index, _)| index)
            .collect()
    }
}
