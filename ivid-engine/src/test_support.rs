//! Recording collaborators shared by the unit tests

use crate::collaborators::{Announcement, Announcer, Dialog, DialogContent, VideoSource};
use crate::content::{
    ContentError, ContentFactory, ContentInstance, Resettable, Scoreable, Stateful,
};
use crate::interaction::RenderHandle;
use ivid_core::{ContentAction, ContentState, DisplayMode, InteractionParams, Position};
use std::collections::{HashMap, HashSet};

pub fn button(from: f64, to: f64) -> InteractionParams {
    InteractionParams::new(from, to, DisplayMode::Button, ContentAction::new("MultiChoice 1.16"))
}

pub fn poster(from: f64, to: f64) -> InteractionParams {
    InteractionParams::new(from, to, DisplayMode::Poster, ContentAction::new("Blanks 1.14"))
}

pub fn label(from: f64, to: f64) -> InteractionParams {
    InteractionParams::new(from, to, DisplayMode::Label, ContentAction::new("Text 1.1"))
        .with_label("Note")
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoCall {
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug, Default)]
pub struct RecordingVideo {
    pub time: f64,
    pub duration: Option<f64>,
    pub playing: bool,
    pub calls: Vec<VideoCall>,
}

impl RecordingVideo {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                VideoCall::Seek(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl VideoSource for RecordingVideo {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn play(&mut self) {
        self.playing = true;
        self.calls.push(VideoCall::Play);
    }

    fn pause(&mut self) {
        self.playing = false;
        self.calls.push(VideoCall::Pause);
    }

    fn seek(&mut self, time: f64) {
        self.time = time;
        self.calls.push(VideoCall::Seek(time));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogCall {
    Open(usize),
    Close,
    Position,
    OpenOverlay,
    CloseOverlay,
    OverlayDisabled(bool),
    HideCloseButton,
    Warning(String),
}

#[derive(Debug, Default)]
pub struct RecordingDialog {
    pub calls: Vec<DialogCall>,
    pub overlay_open: bool,
}

impl RecordingDialog {
    pub fn opened(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DialogCall::Open(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DialogCall::Warning(_)))
            .count()
    }
}

impl Dialog for RecordingDialog {
    fn open(&mut self, content: &DialogContent) {
        self.calls.push(DialogCall::Open(content.interaction));
    }

    fn close(&mut self) {
        self.calls.push(DialogCall::Close);
    }

    fn position(&mut self, _anchor: Position, _size: Option<(f64, f64)>) {
        self.calls.push(DialogCall::Position);
    }

    fn open_overlay(&mut self) {
        self.overlay_open = true;
        self.calls.push(DialogCall::OpenOverlay);
    }

    fn close_overlay(&mut self) {
        self.overlay_open = false;
        self.calls.push(DialogCall::CloseOverlay);
    }

    fn set_overlay_disabled(&mut self, disabled: bool) {
        self.calls.push(DialogCall::OverlayDisabled(disabled));
    }

    fn hide_close_button(&mut self) {
        self.calls.push(DialogCall::HideCloseButton);
    }

    fn show_warning(&mut self, message: &str) {
        self.calls.push(DialogCall::Warning(message.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    pub announcements: Vec<Announcement>,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&mut self, announcement: &Announcement) {
        self.announcements.push(announcement.clone());
    }
}

/// Factory whose content behaviour is scripted per interaction index
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    pub created: Vec<usize>,
    scores: HashMap<usize, (u32, u32)>,
    failing_attach: HashSet<usize>,
    failing_create: HashSet<usize>,
}

impl ScriptedFactory {
    pub fn with_score(mut self, index: usize, score: u32, max_score: u32) -> Self {
        self.scores.insert(index, (score, max_score));
        self
    }

    pub fn failing_attach(mut self, index: usize) -> Self {
        self.failing_attach.insert(index);
        self
    }

    pub fn failing_create(mut self, index: usize) -> Self {
        self.failing_create.insert(index);
        self
    }
}

impl ContentFactory for ScriptedFactory {
    fn create(
        &mut self,
        interaction: usize,
        action: &ContentAction,
        previous: Option<&ContentState>,
    ) -> Result<Box<dyn ContentInstance>, ContentError> {
        if self.failing_create.contains(&interaction) {
            return Err(ContentError::new(&action.library, "missing library"));
        }
        self.created.push(interaction);
        Ok(Box::new(ScriptedContent {
            library: action.library.clone(),
            score: self.scores.get(&interaction).copied(),
            fail_attach: self.failing_attach.contains(&interaction),
            state: previous.cloned(),
        }))
    }
}

#[derive(Debug)]
pub struct ScriptedContent {
    library: String,
    score: Option<(u32, u32)>,
    fail_attach: bool,
    state: Option<ContentState>,
}

impl ContentInstance for ScriptedContent {
    fn attach(&mut self, _target: &RenderHandle) -> Result<(), ContentError> {
        if self.fail_attach {
            Err(ContentError::new(&self.library, "attach failed"))
        } else {
            Ok(())
        }
    }

    fn as_scoreable(&self) -> Option<&dyn Scoreable> {
        if self.score.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_resettable(&mut self) -> Option<&mut dyn Resettable> {
        Some(self)
    }

    fn as_stateful(&self) -> Option<&dyn Stateful> {
        Some(self)
    }
}

impl Scoreable for ScriptedContent {
    fn score(&self) -> u32 {
        self.score.map_or(0, |s| s.0)
    }

    fn max_score(&self) -> u32 {
        self.score.map_or(0, |s| s.1)
    }
}

impl Resettable for ScriptedContent {
    fn reset_task(&mut self) {
        self.state = None;
    }
}

impl Stateful for ScriptedContent {
    fn current_state(&self) -> Option<ContentState> {
        self.state.clone()
    }
}
