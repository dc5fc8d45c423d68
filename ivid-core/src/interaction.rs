//! Authored parameters of a single timed interaction

use crate::{AdaptivityRule, Error, Position, Result, TimeWindow};

/// How an interaction is rendered over the video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DisplayMode {
    /// A button that opens the content in a dialog
    #[default]
    Button,
    /// The content rendered inline over the video
    Poster,
    /// A text label; never pauses and never scores
    Label,
}

/// Reference to the content an interaction wraps
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ContentAction {
    /// Content library name, e.g. `"MultiChoice 1.16"`
    pub library: String,
    /// Title used for announcements and summaries
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
}

impl ContentAction {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Library name without its version suffix
    pub fn machine_name(&self) -> &str {
        self.library.split_whitespace().next().unwrap_or("")
    }
}

/// Authored parameters of one interaction, as read from the parameter document.
///
/// `duration` and `action` are optional here so that a malformed document can
/// be reported with the offending index by [`InteractionParams::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct InteractionParams {
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<TimeWindow>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Position,
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_mode: DisplayMode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: Option<ContentAction>,
    /// Pause the video when the interaction appears
    #[cfg_attr(feature = "serde", serde(default))]
    pub pause: bool,
    /// Keep the interaction blocking until it reaches full score
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_completion: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub adaptivity: Option<AdaptivityRule>,
    /// Timecode to jump to when the interaction is activated
    #[cfg_attr(feature = "serde", serde(default))]
    pub goto: Option<f64>,
    /// Text shown by label interactions and used as a fallback title
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
}

impl InteractionParams {
    /// Creates parameters for an interaction shown during `[from, to]`
    pub fn new(from: f64, to: f64, display_mode: DisplayMode, action: ContentAction) -> Self {
        Self {
            duration: Some(TimeWindow::new(from, to)),
            display_mode,
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn with_pause(mut self) -> Self {
        self.pause = true;
        self
    }

    pub fn with_required_completion(mut self) -> Self {
        self.requires_completion = true;
        self
    }

    pub fn with_adaptivity(mut self, rule: AdaptivityRule) -> Self {
        self.adaptivity = Some(rule);
        self
    }

    pub fn with_goto(mut self, time: f64) -> Self {
        self.goto = Some(time);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Validates the parameters of the interaction at `index`, returning its window
    pub fn validate(&self, index: usize) -> Result<TimeWindow> {
        let window = self.duration.ok_or(Error::MissingDuration { index })?;
        if !window.is_valid() {
            return Err(Error::InvalidDuration {
                index,
                from: window.from,
                to: window.to,
            });
        }
        if self.action.is_none() {
            return Err(Error::MissingAction { index });
        }
        if !self.position.is_valid() {
            return Err(Error::InvalidPosition { index });
        }
        Ok(window)
    }

    /// Title used when naming this interaction to the learner
    pub fn title(&self) -> String {
        self.action
            .as_ref()
            .and_then(|a| a.title.clone())
            .or_else(|| self.label.clone())
            .or_else(|| self.action.as_ref().map(|a| a.machine_name().to_string()))
            .unwrap_or_default()
    }

    pub fn is_label(&self) -> bool {
        self.display_mode == DisplayMode::Label
    }
}
