//! Playback state machine.

use crate::collaborators::VideoState;
use tracing::{debug, info};

/// Player state: the video source's native states plus seeking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Ended,
    Playing,
    Paused,
    Buffering,
    /// The user is scrubbing or a branch is jumping
    Seeking,
}

impl From<VideoState> for PlaybackState {
    fn from(state: VideoState) -> Self {
        match state {
            VideoState::Ended => PlaybackState::Ended,
            VideoState::Playing => PlaybackState::Playing,
            VideoState::Paused => PlaybackState::Paused,
            VideoState::Buffering => PlaybackState::Buffering,
        }
    }
}

/// What the player has to do after a video state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEffect {
    None,
    Changed(PlaybackState),
    /// The video ended and is not looping
    Ended,
    /// The video ended and must restart at the given time
    Loop(f64),
}

/// Tracks the player state between video events and user seeks
#[derive(Debug, Clone)]
pub struct PlaybackStateMachine {
    state: PlaybackState,
    /// State to restore when a seek stops
    last_state: PlaybackState,
    loaded: bool,
    has_played: bool,
    scrub_time: Option<f64>,
    seek_origin: Option<f64>,
    loop_start: Option<f64>,
}

impl PlaybackStateMachine {
    /// Creates a paused state machine; `loop_start` enables looping
    pub fn new(loop_start: Option<f64>) -> Self {
        Self {
            state: PlaybackState::Paused,
            last_state: PlaybackState::Paused,
            loaded: false,
            has_played: false,
            scrub_time: None,
            seek_origin: None,
            loop_start,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn last_state(&self) -> PlaybackState {
        self.last_state
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_seeking(&self) -> bool {
        self.state == PlaybackState::Seeking
    }

    /// Time shown by the scrub preview while seeking
    pub fn scrub_time(&self) -> Option<f64> {
        self.scrub_time
    }

    /// Position the current seek started from
    pub fn seek_origin(&self) -> Option<f64> {
        self.seek_origin
    }

    /// Whether timeline ticks may run
    pub fn accepts_ticks(&self) -> bool {
        !self.is_seeking()
    }

    /// Whether the periodic time poll should keep running
    pub fn should_poll(&self) -> bool {
        match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Buffering => self.has_played,
            _ => false,
        }
    }

    pub fn on_loaded(&mut self) {
        self.loaded = true;
    }

    /// Applies a state reported by the video source
    pub fn on_video_state(&mut self, state: VideoState) -> PlaybackEffect {
        if self.is_seeking() {
            // Remember where to return to, but stay in SEEKING until the user lets go
            if matches!(state, VideoState::Playing | VideoState::Paused) {
                self.last_state = state.into();
            }
            return PlaybackEffect::None;
        }

        match state {
            VideoState::Playing => {
                if !self.loaded {
                    debug!("video reported playing before loaded, assuming loaded");
                    self.loaded = true;
                }
                self.has_played = true;
            }
            VideoState::Ended => {
                if let Some(start) = self.loop_start {
                    info!(start, "video ended, looping");
                    self.state = PlaybackState::Playing;
                    return PlaybackEffect::Loop(start);
                }
                info!("video ended");
                self.state = PlaybackState::Ended;
                return PlaybackEffect::Ended;
            }
            VideoState::Paused | VideoState::Buffering => {}
        }

        let next = PlaybackState::from(state);
        if next == self.state {
            return PlaybackEffect::None;
        }
        debug!(from = ?self.state, to = ?next, "playback state changed");
        self.state = next;
        PlaybackEffect::Changed(next)
    }

    /// Enters SEEKING, remembering whether playback should resume afterwards
    pub fn seek_start(&mut self, from: f64) {
        if !self.is_seeking() {
            self.last_state = match self.state {
                PlaybackState::Playing => PlaybackState::Playing,
                PlaybackState::Buffering if self.has_played => PlaybackState::Playing,
                _ => PlaybackState::Paused,
            };
            self.seek_origin = Some(from);
        }
        self.state = PlaybackState::Seeking;
        self.scrub_time = Some(from);
    }

    /// Updates the scrub preview. Returns false when not seeking.
    pub fn scrub(&mut self, time: f64) -> bool {
        if !self.is_seeking() {
            return false;
        }
        self.scrub_time = Some(time);
        true
    }

    /// Leaves SEEKING and returns the restored state
    pub fn seek_stop(&mut self) -> PlaybackState {
        if self.is_seeking() {
            self.state = self.last_state;
        }
        self.scrub_time = None;
        self.seek_origin = None;
        self.state
    }

    /// Records a play or pause requested by the player itself
    pub fn set_state(&mut self, state: PlaybackState) {
        if self.is_seeking() {
            self.last_state = state;
        } else {
            if state == PlaybackState::Playing {
                self.has_played = true;
            }
            self.state = state;
        }
    }
}

impl Default for PlaybackStateMachine {
    fn default() -> Self {
        Self::new(None)
    }
}
