//! Time windows and placement for timed interactions

/// Authored time window of an interaction, in seconds.
///
/// Both ends are inclusive of their full second: an interaction authored as
/// `[10, 15]` is visible for every `t` with `10 <= t < 16`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    /// Start time in seconds
    pub from: f64,
    /// Authored end time in seconds (the last visible second)
    pub to: f64,
}

impl TimeWindow {
    /// Creates a new time window
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// Checks if this window is visible at the given time
    pub fn visible_at(&self, time: f64) -> bool {
        time >= self.from && time < self.hide_at()
    }

    /// First time at which the window is no longer visible
    pub fn hide_at(&self) -> f64 {
        self.to + 1.0
    }

    /// Returns the authored length of this window in seconds
    pub fn length(&self) -> f64 {
        (self.to - self.from).max(0.0)
    }

    /// Checks that both ends are finite, non-negative and ordered
    pub fn is_valid(&self) -> bool {
        self.from.is_finite() && self.to.is_finite() && self.from >= 0.0 && self.to >= self.from
    }
}

/// Placement of an interaction over the video, as percentages of the video area
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<f64>,
}

impl Position {
    /// Creates a position without an explicit size
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
        }
    }

    /// Sets an explicit size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn is_valid(&self) -> bool {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        in_range(self.x)
            && in_range(self.y)
            && self.width.map_or(true, |w| w.is_finite() && w >= 0.0)
            && self.height.map_or(true, |h| h.is_finite() && h >= 0.0)
    }
}
