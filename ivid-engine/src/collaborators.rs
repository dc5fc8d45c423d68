//! Contracts of the services the engine drives but does not implement

use ivid_core::Position;

/// Native playback states reported by a video source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    Ended,
    Playing,
    Paused,
    Buffering,
}

/// Events emitted by a video source
#[derive(Debug, Clone, PartialEq)]
pub enum VideoEvent {
    Loaded,
    StateChange(VideoState),
    QualityChange(String),
    PlaybackRateChange(f64),
    Captions(Vec<String>),
    Error(String),
}

/// The video being played
pub trait VideoSource {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;
    /// Total duration in seconds, once known
    fn duration(&self) -> Option<f64>;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, time: f64);
}

/// What a dialog is asked to display
#[derive(Debug, Clone, PartialEq)]
pub struct DialogContent {
    /// Index of the interaction whose content is shown
    pub interaction: usize,
    pub title: String,
    pub library: String,
}

/// The single modal dialog and the overlay mask behind it
pub trait Dialog {
    fn open(&mut self, content: &DialogContent);
    fn close(&mut self);
    /// Positions the dialog next to an anchor, optionally with a fixed size
    fn position(&mut self, anchor: Position, size: Option<(f64, f64)>);
    /// Masks the player so nothing but the dialog is interactable
    fn open_overlay(&mut self);
    fn close_overlay(&mut self);
    /// Disables or enables the overlay's own dismissal
    fn set_overlay_disabled(&mut self, disabled: bool);
    fn hide_close_button(&mut self);
    /// Shows the warning mask with a message
    fn show_warning(&mut self, message: &str);
}

/// What the accessibility announcer reads out after a tick
#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    Single { interaction: usize, title: String },
    Multiple { interactions: Vec<usize>, message: String },
}

/// Screen-reader announcer
pub trait Announcer {
    fn announce(&mut self, announcement: &Announcement);
}
