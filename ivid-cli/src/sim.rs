//! Headless collaborators used to simulate a playback session

use ivid_core::{ContentAction, ContentState, Position};
use ivid_engine::content::{Pausable, Stateful};
use ivid_engine::{
    Announcement, Announcer, ContentError, ContentFactory, ContentInstance, Dialog, DialogContent,
    RenderHandle, VideoSource, VideoState,
};
use tracing::{debug, info, warn};

/// Video that advances only when the simulation clock does
#[derive(Debug)]
pub struct SimulatedVideo {
    time: f64,
    duration: f64,
    playing: bool,
    reported: Vec<VideoState>,
}

impl SimulatedVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            time: 0.0,
            duration,
            playing: false,
            reported: Vec::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Moves the playhead while playing; reports ENDED once the end is reached
    pub fn advance(&mut self, seconds: f64) {
        if !self.playing {
            return;
        }
        self.time = (self.time + seconds).min(self.duration);
        if self.time >= self.duration {
            self.playing = false;
            self.reported.push(VideoState::Ended);
        }
    }

    /// State changes not yet delivered to the player
    pub fn take_reported(&mut self) -> Vec<VideoState> {
        std::mem::take(&mut self.reported)
    }
}

impl VideoSource for SimulatedVideo {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.reported.push(VideoState::Playing);
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.reported.push(VideoState::Paused);
        }
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.duration);
    }
}

/// Dialog that only logs what it would display
#[derive(Debug, Default)]
pub struct LoggingDialog {
    open: Option<usize>,
}

impl Dialog for LoggingDialog {
    fn open(&mut self, content: &DialogContent) {
        info!(interaction = content.interaction, title = %content.title, "dialog opened");
        self.open = Some(content.interaction);
    }

    fn close(&mut self) {
        if let Some(interaction) = self.open.take() {
            info!(interaction, "dialog closed");
        }
    }

    fn position(&mut self, anchor: Position, size: Option<(f64, f64)>) {
        debug!(x = anchor.x, y = anchor.y, ?size, "dialog positioned");
    }

    fn open_overlay(&mut self) {
        debug!("overlay shown");
    }

    fn close_overlay(&mut self) {
        debug!("overlay hidden");
    }

    fn set_overlay_disabled(&mut self, disabled: bool) {
        debug!(disabled, "overlay dismissal");
    }

    fn hide_close_button(&mut self) {
        debug!("dialog close button hidden");
    }

    fn show_warning(&mut self, message: &str) {
        warn!(%message, "warning shown");
    }
}

#[derive(Debug, Default)]
pub struct LoggingAnnouncer;

impl Announcer for LoggingAnnouncer {
    fn announce(&mut self, announcement: &Announcement) {
        match announcement {
            Announcement::Single { interaction, title } => info!(interaction, %title, "announced"),
            Announcement::Multiple { interactions, message } => {
                info!(?interactions, %message, "announced")
            }
        }
    }
}

/// Factory building stand-in content for any library
#[derive(Debug, Default)]
pub struct SimulatedContentFactory {
    pub created: usize,
}

impl ContentFactory for SimulatedContentFactory {
    fn create(
        &mut self,
        interaction: usize,
        action: &ContentAction,
        previous: Option<&ContentState>,
    ) -> Result<Box<dyn ContentInstance>, ContentError> {
        debug!(
            interaction,
            library = action.machine_name(),
            restored = previous.is_some(),
            "creating content"
        );
        self.created += 1;
        Ok(Box::new(SimulatedContent {
            library: action.library.clone(),
            state: previous.cloned(),
        }))
    }
}

#[derive(Debug)]
struct SimulatedContent {
    library: String,
    state: Option<ContentState>,
}

impl ContentInstance for SimulatedContent {
    fn attach(&mut self, target: &RenderHandle) -> Result<(), ContentError> {
        debug!(
            interaction = target.interaction,
            library = %self.library,
            mode = ?target.mode,
            "content attached"
        );
        Ok(())
    }

    fn as_stateful(&self) -> Option<&dyn Stateful> {
        Some(self)
    }

    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        Some(self)
    }
}

impl Stateful for SimulatedContent {
    fn current_state(&self) -> Option<ContentState> {
        self.state.clone()
    }
}

impl Pausable for SimulatedContent {
    fn pause(&mut self) -> Result<(), ContentError> {
        debug!(library = %self.library, "content paused");
        Ok(())
    }
}
