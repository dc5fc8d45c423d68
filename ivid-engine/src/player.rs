//! Interactive video player
//!
//! Closes the loop between the video source and the interactions: time
//! updates feed the timeline, answers feed the adaptivity decision, and the
//! decision seeks, pauses or resumes the video.

use crate::adaptivity::{self, AdaptivityDecision, ContinueAffordance};
use crate::collaborators::{Announcer, Dialog, VideoEvent, VideoSource, VideoState};
use crate::content::{ContentEvent, ContentFactory};
use crate::endscreen::EndscreenSummary;
use crate::events::{Event, EventEmitter, SubscriptionToken};
use crate::interaction::Interaction;
use crate::modal::ModalSlot;
use crate::playback::{PlaybackEffect, PlaybackState, PlaybackStateMachine};
use crate::scheduler::TaskQueue;
use crate::timeline::{TickOutcome, TimelineEngine};
use crate::{EngineConfig, Error, Result};
use ivid_core::{
    Bookmark, DisplayMode, InteractiveVideoParams, PlaybackSettings, PreviousState, Progress,
    ScoreRecord,
};
use std::fmt;
use tracing::{debug, info, warn};

const TIME_UPDATE: &str = "time-update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerTask {
    TimeUpdate,
}

/// Services the player drives
pub struct Collaborators<V, D, A> {
    pub video: V,
    pub dialog: D,
    pub announcer: A,
    pub factory: Box<dyn ContentFactory>,
}

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Shown(usize),
    Hidden(usize),
    Answered {
        interaction: usize,
        score: ScoreRecord,
        full_score: bool,
    },
    /// An adaptivity branch is waiting for the learner to continue
    Branch(ContinueAffordance),
    /// Playback is held by a required interaction
    GateBlocked { interaction: usize },
    SeekBlocked { requested: f64, landed: f64 },
    Endscreen(EndscreenSummary),
    Looped { start: f64 },
    /// Quality, rate or caption change reported by the video source
    Media(VideoEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEventKind {
    Shown,
    Hidden,
    Answered,
    Branch,
    GateBlocked,
    SeekBlocked,
    Endscreen,
    Looped,
    Media,
}

impl Event for PlayerEvent {
    type Kind = PlayerEventKind;

    fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::Shown(_) => PlayerEventKind::Shown,
            PlayerEvent::Hidden(_) => PlayerEventKind::Hidden,
            PlayerEvent::Answered { .. } => PlayerEventKind::Answered,
            PlayerEvent::Branch(_) => PlayerEventKind::Branch,
            PlayerEvent::GateBlocked { .. } => PlayerEventKind::GateBlocked,
            PlayerEvent::SeekBlocked { .. } => PlayerEventKind::SeekBlocked,
            PlayerEvent::Endscreen(_) => PlayerEventKind::Endscreen,
            PlayerEvent::Looped { .. } => PlayerEventKind::Looped,
            PlayerEvent::Media(_) => PlayerEventKind::Media,
        }
    }
}

/// A video with timed interactions
pub struct InteractiveVideo<V: VideoSource, D: Dialog, A: Announcer> {
    id: String,
    config: EngineConfig,
    settings: PlaybackSettings,
    bookmarks: Vec<Bookmark>,
    start_at: f64,
    video: V,
    modal: ModalSlot<D>,
    announcer: A,
    factory: Box<dyn ContentFactory>,
    interactions: Vec<Interaction>,
    timeline: TimelineEngine,
    playback: PlaybackStateMachine,
    tasks: TaskQueue<PlayerTask>,
    pending_continue: Option<ContinueAffordance>,
    gate: Option<usize>,
    resume_after_dialog: bool,
    furthest_watched: f64,
    events: EventEmitter<PlayerEvent>,
}

impl<V: VideoSource, D: Dialog, A: Announcer> InteractiveVideo<V, D, A> {
    /// Creates a player, failing on the first malformed interaction.
    ///
    /// `id` identifies this player instance; interaction ids are derived from it.
    pub fn new(
        id: impl Into<String>,
        params: InteractiveVideoParams,
        collaborators: Collaborators<V, D, A>,
        previous: Option<&PreviousState>,
    ) -> Result<Self> {
        let id = id.into();
        let interactions = params
            .interactions
            .into_iter()
            .enumerate()
            .map(|(index, p)| Interaction::new(index, format!("{id}-{index}"), p, previous))
            .collect::<ivid_core::Result<Vec<_>>>()?;

        let settings = params.settings;
        let start_at = previous.and_then(|p| p.progress).unwrap_or(settings.start_at);
        let loop_start = settings.loop_video.then_some(settings.start_at);

        info!(id = %id, interactions = interactions.len(), start_at, "created interactive video");

        Ok(Self {
            id,
            config: EngineConfig::default(),
            settings,
            bookmarks: params.bookmarks,
            start_at,
            video: collaborators.video,
            modal: ModalSlot::new(collaborators.dialog),
            announcer: collaborators.announcer,
            factory: collaborators.factory,
            interactions,
            timeline: TimelineEngine::new(),
            playback: PlaybackStateMachine::new(loop_start),
            tasks: TaskQueue::new(),
            pending_continue: None,
            gate: None,
            resume_after_dialog: false,
            furthest_watched: start_at,
            events: EventEmitter::new(),
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Positions the video at its start and renders what is visible there
    pub fn start(&mut self) {
        if self.start_at > 0.0 {
            self.video.seek(self.start_at);
        }
        self.timeline.invalidate();
        self.update(self.start_at);
        if self.settings.autoplay {
            self.play();
        }
    }

    /// Runs one timeline tick at `time`. Ignored while seeking.
    pub fn update(&mut self, time: f64) -> TickOutcome {
        if !self.playback.accepts_ticks() {
            return TickOutcome::default();
        }

        let outcome = self
            .timeline
            .update(time, &mut self.interactions, self.factory.as_mut(), &mut self.modal);

        for &index in &outcome.hidden {
            if self.gate == Some(index) {
                self.gate = None;
            }
            self.events.emit(&PlayerEvent::Hidden(index));
        }
        for &index in &outcome.shown {
            self.events.emit(&PlayerEvent::Shown(index));
            self.on_shown(index);
        }
        let multiple_message = &self.config.multiple_interactions_message;
        if let Some(announcement) = outcome.announcement(&self.interactions, multiple_message) {
            self.announcer.announce(&announcement);
        }
        for &index in &outcome.pinned {
            self.on_pinned(index);
        }
        outcome
    }

    /// Advances the host clock, running the time poll when it is due
    pub fn advance_clock(&mut self, now_ms: u64) {
        for task in self.tasks.advance(now_ms) {
            match task {
                PlayerTask::TimeUpdate => {
                    if !self.playback.should_poll() {
                        continue;
                    }
                    let time = self.video.current_time();
                    self.furthest_watched = self.furthest_watched.max(time);
                    self.update(time);
                    if self.playback.should_poll() {
                        self.schedule_tick();
                    }
                }
            }
        }
    }

    fn schedule_tick(&mut self) {
        self.tasks
            .schedule(TIME_UPDATE, self.config.tick_interval_ms, PlayerTask::TimeUpdate);
    }

    fn on_shown(&mut self, index: usize) {
        let interaction = &self.interactions[index];
        if !interaction.pauses_video() {
            return;
        }
        debug!(interaction = index, "pausing for interaction");
        if interaction.is_gated() {
            self.gate = Some(index);
        }
        self.pause();
    }

    fn on_pinned(&mut self, index: usize) {
        warn!(interaction = index, "required interaction not completed, holding playback");
        self.gate = Some(index);
        self.pause();
        self.jump(self.interactions[index].duration().to);
        self.force_open(index);
        self.modal.warn(&self.config.blocked_message);
        self.events.emit(&PlayerEvent::GateBlocked { interaction: index });
    }

    /// Makes a required interaction impossible to miss
    fn force_open(&mut self, index: usize) {
        let interaction = &mut self.interactions[index];
        match interaction.display_mode() {
            DisplayMode::Poster => self.modal.request_overlay(index),
            DisplayMode::Button => {
                let content = interaction.dialog_content();
                self.modal.force_open(&content, interaction.params().position);
                interaction.attach_to_current();
                self.modal.request_overlay(index);
            }
            DisplayMode::Label => {}
        }
    }

    /// Handles an event from the video source
    pub fn on_video_event(&mut self, event: VideoEvent) {
        match event {
            VideoEvent::Loaded => {
                debug!("video loaded");
                self.playback.on_loaded();
            }
            VideoEvent::StateChange(state) => self.on_state_change(state),
            VideoEvent::Error(message) => warn!(%message, "video error"),
            other => {
                debug!(event = ?other, "media change");
                self.events.emit(&PlayerEvent::Media(other));
            }
        }
    }

    fn on_state_change(&mut self, state: VideoState) {
        match self.playback.on_video_state(state) {
            PlaybackEffect::Changed(PlaybackState::Playing) => {
                if let Some(gate) = self.gate {
                    info!(interaction = gate, "video started while gated, pausing");
                    self.pause();
                } else {
                    self.schedule_tick();
                }
            }
            PlaybackEffect::Changed(_) => {
                if !self.playback.should_poll() {
                    self.tasks.cancel(TIME_UPDATE);
                }
            }
            PlaybackEffect::Ended => {
                self.tasks.cancel(TIME_UPDATE);
                if let Some(summary) = EndscreenSummary::from_interactions(&self.interactions) {
                    info!(answered = summary.answered_count(), "showing endscreen");
                    self.events.emit(&PlayerEvent::Endscreen(summary));
                }
            }
            PlaybackEffect::Loop(start) => {
                self.seek_unchecked(start);
                self.video.play();
                self.playback.set_state(PlaybackState::Playing);
                self.schedule_tick();
                self.events.emit(&PlayerEvent::Looped { start });
            }
            PlaybackEffect::None => {}
        }
    }

    /// Plays the video unless a required interaction holds it
    pub fn play(&mut self) -> bool {
        self.continue_with_video(None)
    }

    pub fn pause(&mut self) {
        self.video.pause();
        self.playback.set_state(PlaybackState::Paused);
        self.tasks.cancel(TIME_UPDATE);
    }

    /// Resumes playback once no visible required interaction is pending.
    ///
    /// `exclude` skips the interaction that was just answered. Returns false
    /// and force-opens the blocking interaction when playback stays held.
    pub fn continue_with_video(&mut self, exclude: Option<usize>) -> bool {
        let visible: Vec<usize> = self.timeline.visible().collect();
        if let Some(gate) = adaptivity::find_gate(&self.interactions, visible, exclude) {
            warn!(interaction = gate, "required interaction pending, not resuming");
            self.gate = Some(gate);
            self.pause();
            self.force_open(gate);
            self.events.emit(&PlayerEvent::GateBlocked { interaction: gate });
            return false;
        }

        self.gate = None;
        if self.playback.state() != PlaybackState::Playing {
            self.video.play();
            self.playback.set_state(PlaybackState::Playing);
        }
        self.schedule_tick();
        true
    }

    /// Feeds an outcome event from the content of an interaction
    pub fn handle_content_event(&mut self, index: usize, event: ContentEvent) -> Result<()> {
        let interaction = self
            .interactions
            .get_mut(index)
            .ok_or(Error::InteractionNotFound(index))?;
        let Some(outcome) = interaction.record_event(&event) else {
            return Ok(());
        };

        info!(
            interaction = index,
            score = outcome.score.score,
            max_score = outcome.score.max_score,
            "interaction answered"
        );
        self.events.emit(&PlayerEvent::Answered {
            interaction: index,
            score: outcome.score,
            full_score: outcome.full_score,
        });
        self.on_answered(index);
        Ok(())
    }

    fn on_answered(&mut self, index: usize) {
        if !self.interactions[index].is_gated() {
            self.timeline.release(index);
            self.modal.release_overlay(index);
            if self.gate == Some(index) {
                self.gate = None;
            }
        }

        match adaptivity::decide(&self.interactions[index]) {
            AdaptivityDecision::Continue { hold: true } => {
                debug!(interaction = index, "continue held until full score");
                self.pending_continue = None;
            }
            AdaptivityDecision::Continue { hold: false } => {
                self.pending_continue = Some(ContinueAffordance::Generic { interaction: index });
                self.continue_with_video(Some(index));
            }
            AdaptivityDecision::Branch {
                seek_to,
                block,
                message,
                label,
                wrong,
            } => {
                info!(interaction = index, seek_to, wrong, "adaptivity branch");
                self.pause();
                if block {
                    self.modal.request_overlay(index);
                }
                let affordance = ContinueAffordance::Branch {
                    interaction: index,
                    seek_to,
                    blocking: block,
                    wrong,
                    message,
                    label,
                };
                self.events.emit(&PlayerEvent::Branch(affordance.clone()));
                self.pending_continue = Some(affordance);
            }
        }
    }

    /// Activates the pending continue affordance
    pub fn activate_continue(&mut self) -> Result<()> {
        let affordance = self.pending_continue.take().ok_or(Error::NoPendingContinue)?;
        match affordance {
            ContinueAffordance::Generic { interaction } => {
                self.modal.close(interaction);
                self.continue_with_video(Some(interaction));
            }
            ContinueAffordance::Branch {
                interaction,
                seek_to,
                wrong,
                ..
            } => {
                self.modal.close_any();
                if wrong {
                    self.interactions[interaction]
                        .reset_task(self.factory.as_mut(), &mut self.modal);
                }
                self.interactions[interaction].remove(&mut self.modal);
                self.timeline.forget(interaction);
                self.modal.release_overlay(interaction);

                let from = self.interactions[interaction].duration().from;
                let target = adaptivity::branch_target(seek_to, from, self.config.seek_nudge);
                info!(interaction, target, "following adaptivity branch");
                self.seek_unchecked(target);
                self.continue_with_video(None);
            }
        }
        Ok(())
    }

    /// Handles the learner clicking an interaction
    pub fn activate(&mut self, index: usize) -> Result<()> {
        let interaction = self.interactions.get(index).ok_or(Error::InteractionNotFound(index))?;
        if !interaction.is_rendered() {
            return Ok(());
        }
        if let Some(target) = interaction.params().goto {
            info!(interaction = index, target, "goto interaction");
            self.seek_to(target);
            return Ok(());
        }
        if interaction.display_mode() != DisplayMode::Button {
            return Ok(());
        }

        let content = interaction.dialog_content();
        let anchor = interaction.params().position;
        self.modal.open(&content, anchor)?;
        self.interactions[index].attach_to_current();
        self.resume_after_dialog = self.playback.state() == PlaybackState::Playing;
        self.pause();
        Ok(())
    }

    /// Closes the open dialog. Refused while it holds the required interaction gating playback.
    pub fn close_dialog(&mut self) -> bool {
        let Some(holder) = self.modal.holder() else {
            return false;
        };
        if self.gate == Some(holder) && self.interactions[holder].is_gated() {
            self.modal.warn(&self.config.blocked_message);
            return false;
        }

        self.modal.close(holder);
        self.interactions[holder].pause_content();
        if std::mem::take(&mut self.resume_after_dialog) {
            self.continue_with_video(Some(holder));
        }
        true
    }

    /// Starts a seek gesture: timeline ticks stop until [`Self::seek_stop`]
    pub fn seek_start(&mut self) {
        let from = self.video.current_time();
        self.playback.seek_start(from);
        self.tasks.cancel(TIME_UPDATE);
        self.timeline.invalidate();
    }

    /// Updates the scrub preview while seeking
    pub fn scrub(&mut self, time: f64) -> bool {
        self.playback.scrub(time)
    }

    /// Ends a seek gesture at `target`, returning where playback actually landed.
    ///
    /// Forward seeks are clamped by the prevent-skipping setting and refused
    /// past any required interaction that has not been completed.
    pub fn seek_stop(&mut self, target: f64) -> f64 {
        let origin = self.playback.seek_origin().unwrap_or_else(|| self.video.current_time());
        let mut landed = target;

        if self.settings.prevent_skipping && landed > self.furthest_watched {
            debug!(target, furthest = self.furthest_watched, "clamping skip");
            landed = self.furthest_watched;
        }

        let blocker = self.seek_blocker(origin, landed);
        if let Some((_, at)) = blocker {
            warn!(target, landed = at, "seek past required interaction refused");
            landed = at;
        }

        self.playback.seek_stop();
        self.jump(landed);

        if let Some((index, _)) = blocker {
            self.modal.warn(&self.config.blocked_message);
            self.events.emit(&PlayerEvent::SeekBlocked {
                requested: target,
                landed,
            });
            self.gate = Some(index);
            self.pause();
            self.force_open(index);
        } else if self.playback.should_poll() {
            self.schedule_tick();
        }
        landed
    }

    /// Seeks in one step, as if the learner dragged to `target`
    pub fn seek_to(&mut self, target: f64) -> f64 {
        self.seek_start();
        self.seek_stop(target)
    }

    /// Seeks without skip checks, for branches and loops
    fn seek_unchecked(&mut self, target: f64) {
        self.seek_start();
        self.playback.seek_stop();
        self.jump(target);
        if self.playback.should_poll() {
            self.schedule_tick();
        }
    }

    /// Moves the video and recomputes the timeline from scratch at `time`
    fn jump(&mut self, time: f64) {
        self.video.seek(time);
        self.timeline.invalidate();
        self.update(time);
    }

    /// Earliest required, incomplete interaction a forward seek would skip entirely
    fn seek_blocker(&self, origin: f64, target: f64) -> Option<(usize, f64)> {
        if target <= origin {
            return None;
        }
        self.interactions
            .iter()
            .filter(|i| i.is_gated() && i.hide_at() > origin && i.hide_at() <= target)
            .min_by(|a, b| a.duration().from.total_cmp(&b.duration().from))
            .map(|i| (i.index(), i.duration().from.max(origin)))
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// First bookmark after `time`
    pub fn next_bookmark(&self, time: f64) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.time > time)
    }

    /// Last bookmark before `time`
    pub fn previous_bookmark(&self, time: f64) -> Option<&Bookmark> {
        self.bookmarks.iter().rev().find(|b| b.time < time)
    }

    pub fn goto_bookmark(&mut self, index: usize) -> Result<f64> {
        let time = self.bookmarks.get(index).ok_or(Error::BookmarkNotFound(index))?.time;
        Ok(self.seek_to(time))
    }

    /// Total score over all scoring interactions
    pub fn score(&self) -> u32 {
        self.interactions
            .iter()
            .filter(|i| !i.is_label())
            .filter_map(Interaction::score)
            .sum()
    }

    pub fn max_score(&self) -> u32 {
        self.interactions
            .iter()
            .filter(|i| !i.is_label())
            .filter_map(Interaction::max_score)
            .sum()
    }

    pub fn answered_count(&self) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.progress() == Progress::Answered)
            .count()
    }

    /// State to restore this attempt later
    pub fn current_state(&self) -> PreviousState {
        PreviousState {
            progress: Some(self.video.current_time()),
            interactions_progress: self.interactions.iter().map(Interaction::progress).collect(),
            answers: self.interactions.iter().map(Interaction::current_state).collect(),
            scores: self.interactions.iter().map(Interaction::score_record).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn interaction(&self, index: usize) -> Result<&Interaction> {
        self.interactions.get(index).ok_or(Error::InteractionNotFound(index))
    }

    pub fn interaction_mut(&mut self, index: usize) -> Result<&mut Interaction> {
        self.interactions
            .get_mut(index)
            .ok_or(Error::InteractionNotFound(index))
    }

    /// Indices of the interactions currently rendered
    pub fn visible_interactions(&self) -> Vec<usize> {
        self.timeline.visible().collect()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn scrub_time(&self) -> Option<f64> {
        self.playback.scrub_time()
    }

    pub fn pending_continue(&self) -> Option<&ContinueAffordance> {
        self.pending_continue.as_ref()
    }

    /// Required interaction currently holding playback
    pub fn gate(&self) -> Option<usize> {
        self.gate
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn dialog(&self) -> &D {
        self.modal.dialog()
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    pub fn subscribe(
        &mut self,
        kind: PlayerEventKind,
        handler: impl FnMut(&PlayerEvent) + 'static,
    ) -> SubscriptionToken {
        self.events.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }
}

impl<V: VideoSource, D: Dialog, A: Announcer> fmt::Debug for InteractiveVideo<V, D, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveVideo")
            .field("id", &self.id)
            .field("state", &self.playback.state())
            .field("interactions", &self.interactions.len())
            .field("visible", &self.visible_interactions())
            .field("gate", &self.gate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Announcement;
    use crate::test_support::{
        button, label, poster, DialogCall, RecordingAnnouncer, RecordingDialog, RecordingVideo,
        ScriptedFactory, VideoCall,
    };
    use ivid_core::{AdaptivityBranch, AdaptivityRule, InteractionParams};
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestPlayer = InteractiveVideo<RecordingVideo, RecordingDialog, RecordingAnnouncer>;

    fn player(params: InteractiveVideoParams) -> TestPlayer {
        player_with(params, ScriptedFactory::default(), None)
    }

    fn player_with(
        params: InteractiveVideoParams,
        factory: ScriptedFactory,
        previous: Option<&PreviousState>,
    ) -> TestPlayer {
        let collaborators = Collaborators {
            video: RecordingVideo::with_duration(100.0),
            dialog: RecordingDialog::default(),
            announcer: RecordingAnnouncer::default(),
            factory: Box::new(factory),
        };
        let mut player = InteractiveVideo::new("video", params, collaborators, previous).unwrap();
        player.start();
        player
    }

    fn record(player: &mut TestPlayer, kind: PlayerEventKind) -> Rc<RefCell<Vec<PlayerEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        player.subscribe(kind, move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    /// Plays the recording video forward, polling the way the host clock would
    fn play_until(player: &mut TestPlayer, until: f64) {
        let mut now_ms = player.tasks.now();
        while player.video().time < until && player.playback_state() == PlaybackState::Playing {
            now_ms += 40;
            player.video_mut().time += 0.04;
            player.advance_clock(now_ms);
        }
    }

    fn plays(player: &TestPlayer) -> usize {
        player.video().calls.iter().filter(|c| **c == VideoCall::Play).count()
    }

    #[test]
    fn test_malformed_interaction_fails_construction() {
        let mut params = InteractiveVideoParams::new(vec![button(1.0, 2.0), button(3.0, 4.0)]);
        params.interactions[1].duration = None;
        let collaborators = Collaborators {
            video: RecordingVideo::default(),
            dialog: RecordingDialog::default(),
            announcer: RecordingAnnouncer::default(),
            factory: Box::new(ScriptedFactory::default()),
        };

        let result = InteractiveVideo::new("video", params, collaborators, None);
        assert!(matches!(
            result,
            Err(Error::Configuration(ivid_core::Error::MissingDuration { index: 1 }))
        ));
    }

    #[test]
    fn test_interaction_ids_derive_from_instance() {
        let player = player(InteractiveVideoParams::new(vec![button(1.0, 2.0), label(3.0, 4.0)]));
        assert_eq!(player.interaction(1).unwrap().id(), "video-1");
    }

    #[test]
    fn test_scenario_required_poster_holds_playback() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(10.0, 15.0),
            poster(15.0, 20.0).with_required_completion(),
        ]));
        let shown = record(&mut player, PlayerEventKind::Shown);
        let hidden = record(&mut player, PlayerEventKind::Hidden);
        assert!(player.play());

        let mut first_shown = [None, None];
        let mut first_hidden = None;
        for second in 0..=30 {
            let time = f64::from(second);
            player.update(time);
            for event in shown.borrow_mut().drain(..) {
                if let PlayerEvent::Shown(i) = event {
                    first_shown[i].get_or_insert(second);
                }
            }
            for event in hidden.borrow_mut().drain(..) {
                if event == PlayerEvent::Hidden(0) {
                    first_hidden.get_or_insert(second);
                }
            }
            if second >= 15 {
                assert!(player.interaction(1).unwrap().is_rendered(), "at {second}");
                assert!(!player.video().playing, "resumed at {second}");
            }
        }

        assert_eq!(first_shown[0], Some(10));
        assert_eq!(first_hidden, Some(16));
        // The poster's window starts at 15, so it is already masking playback by 16
        assert_eq!(first_shown[1], Some(15));
        assert_eq!(player.gate(), Some(1));
        assert!(player.dialog().overlay_open);
        assert_eq!(plays(&player), 1);

        player.handle_content_event(1, ContentEvent::answered(2, 2)).unwrap();
        assert_eq!(player.gate(), None);
        assert!(player.video().playing);
        assert_eq!(plays(&player), 2);
    }

    #[test]
    fn test_visible_interactions_follow_playback() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(1.0, 2.0),
            label(1.5, 4.0),
            poster(3.0, 3.0),
        ]));
        player.play();

        play_until(&mut player, 1.6);
        assert_eq!(player.visible_interactions(), vec![0, 1]);

        play_until(&mut player, 3.5);
        assert_eq!(player.visible_interactions(), vec![1, 2]);

        play_until(&mut player, 6.0);
        assert!(player.visible_interactions().is_empty());
    }

    #[test]
    fn test_pause_on_display() {
        let mut player = player(InteractiveVideoParams::new(vec![button(1.0, 3.0).with_pause()]));
        player.play();

        play_until(&mut player, 5.0);

        assert_eq!(player.playback_state(), PlaybackState::Paused);
        assert!(player.video().time < 1.1);
        assert_eq!(player.visible_interactions(), vec![0]);
        assert!(!player.tasks.is_scheduled(TIME_UPDATE));
    }

    #[test]
    fn test_label_never_pauses() {
        let mut player = player(InteractiveVideoParams::new(vec![label(1.0, 3.0).with_pause()]));
        player.play();

        play_until(&mut player, 2.0);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_announces_batches() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(2.0, 3.0),
            button(2.0, 3.0),
            poster(5.0, 6.0),
        ]));

        player.update(2.0);
        player.update(5.0);

        let announcements = &player.announcer().announcements;
        assert_eq!(announcements.len(), 2);
        assert!(matches!(announcements[0], Announcement::Multiple { .. }));
        assert!(matches!(announcements[1], Announcement::Single { interaction: 2, .. }));
    }

    #[test]
    fn test_gate_enforced_on_continue() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(0.0, 10.0).with_required_completion(),
            poster(0.0, 10.0),
        ]));
        player.update(1.0);
        player.video_mut().clear();

        assert!(!player.continue_with_video(None));
        assert!(!player.video().playing);
        assert!(!player.video().calls.contains(&VideoCall::Play));
        assert_eq!(player.gate(), Some(0));
        assert_eq!(player.dialog().opened(), vec![0]);
        assert!(player.dialog().overlay_open);

        // The just-answered interaction is not considered
        assert!(player.continue_with_video(Some(0)));
    }

    #[test]
    fn test_gate_prefers_poster() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(0.0, 10.0).with_required_completion(),
            poster(0.0, 10.0).with_required_completion(),
        ]));
        player.update(1.0);

        assert!(!player.continue_with_video(None));
        assert_eq!(player.gate(), Some(1));
        assert!(player.dialog().opened().is_empty());
    }

    #[test]
    fn test_video_playing_while_gated_is_paused() {
        let mut player = player(InteractiveVideoParams::new(vec![
            poster(0.0, 10.0).with_required_completion(),
        ]));
        player.update(0.0);
        player.video_mut().clear();

        player.on_video_event(VideoEvent::StateChange(VideoState::Playing));

        assert_eq!(player.video().calls, vec![VideoCall::Pause]);
        assert_eq!(player.playback_state(), PlaybackState::Paused);
    }

    #[test]
    fn test_buffering_keeps_gate() {
        let mut player = player(InteractiveVideoParams::new(vec![
            poster(0.0, 10.0).with_required_completion(),
        ]));
        player.update(0.0);

        player.on_video_event(VideoEvent::StateChange(VideoState::Buffering));
        assert_eq!(player.gate(), Some(0));
        assert!(!player.play());
    }

    #[test]
    fn test_elapsed_required_button_is_pinned() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(1.0, 2.0).with_required_completion(),
        ]));
        let blocked = record(&mut player, PlayerEventKind::GateBlocked);
        player.play();

        play_until(&mut player, 3.5);

        assert_eq!(player.gate(), Some(0));
        assert_eq!(player.playback_state(), PlaybackState::Paused);
        assert_eq!(player.video().time, 2.0);
        assert_eq!(player.dialog().opened(), vec![0]);
        assert_eq!(player.dialog().warnings(), 1);
        assert_eq!(*blocked.borrow(), vec![PlayerEvent::GateBlocked { interaction: 0 }]);
        assert!(!player.close_dialog());

        player.handle_content_event(0, ContentEvent::answered(1, 1)).unwrap();
        assert_eq!(player.gate(), None);
        assert_eq!(player.playback_state(), PlaybackState::Playing);

        player.activate_continue().unwrap();
        assert_eq!(player.dialog().calls.last(), Some(&DialogCall::Close));
        play_until(&mut player, 3.5);
        assert!(player.visible_interactions().is_empty());
    }

    #[test]
    fn test_answer_without_rule_resumes() {
        let mut player = player(InteractiveVideoParams::new(vec![button(1.0, 5.0).with_pause()]));
        player.play();
        play_until(&mut player, 2.0);
        assert_eq!(player.playback_state(), PlaybackState::Paused);

        player.handle_content_event(0, ContentEvent::answered(0, 1)).unwrap();

        assert_eq!(player.playback_state(), PlaybackState::Playing);
        assert_eq!(
            player.pending_continue(),
            Some(&ContinueAffordance::Generic { interaction: 0 })
        );
    }

    #[test]
    fn test_required_partial_answer_holds_continue() {
        let mut player = player(InteractiveVideoParams::new(vec![
            poster(1.0, 5.0).with_required_completion(),
        ]));
        player.update(1.0);

        player.handle_content_event(0, ContentEvent::answered(1, 3)).unwrap();

        assert!(player.pending_continue().is_none());
        assert_eq!(player.gate(), Some(0));
        assert!(!player.video().playing);
    }

    fn branching(rule: AdaptivityRule) -> InteractiveVideoParams {
        InteractiveVideoParams::new(vec![
            button(10.0, 14.0).with_pause().with_adaptivity(rule),
            poster(2.0, 4.0),
        ])
    }

    #[test]
    fn test_wrong_answer_branch_seeks_and_resets() {
        let rule = AdaptivityRule {
            on_correct: None,
            on_wrong: Some(AdaptivityBranch::seek(2.0, "Watch again")),
        };
        let mut player = player(branching(rule));
        let branches = record(&mut player, PlayerEventKind::Branch);
        player.update(10.0);
        player.activate(0).unwrap();

        player.handle_content_event(0, ContentEvent::answered(0, 1)).unwrap();
        assert_eq!(branches.borrow().len(), 1);
        assert!(player.dialog().overlay_open);
        assert!(!player.video().playing);

        player.activate_continue().unwrap();

        assert_eq!(player.video().seeks().last(), Some(&2.0));
        assert_eq!(player.interaction(0).unwrap().progress(), Progress::None);
        assert_eq!(player.interaction(0).unwrap().score(), None);
        assert_eq!(player.visible_interactions(), vec![1]);
        assert!(!player.dialog().overlay_open);
        assert!(player.modal.holder().is_none());
        assert!(player.video().playing);
        assert!(matches!(player.activate_continue(), Err(Error::NoPendingContinue)));
    }

    #[test]
    fn test_branch_to_own_start_is_nudged() {
        let rule = AdaptivityRule {
            on_correct: Some(AdaptivityBranch::seek(10.0, "Again, for practice")),
            on_wrong: None,
        };
        let mut player = player(branching(rule));
        player.update(11.0);

        player.handle_content_event(0, ContentEvent::answered(1, 1)).unwrap();
        player.activate_continue().unwrap();

        assert_eq!(player.video().seeks().last(), Some(&10.2));
        // Detached interactions come back once the seek lands inside their window
        assert_eq!(player.visible_interactions(), vec![0]);
        assert_eq!(player.interaction(0).unwrap().progress(), Progress::Answered);
    }

    #[test]
    fn test_opt_out_branch_does_not_mask() {
        let rule = AdaptivityRule {
            on_correct: Some(AdaptivityBranch::seek(40.0, "Skip ahead").with_opt_out()),
            on_wrong: None,
        };
        let mut player = player(branching(rule));
        player.update(11.0);

        player.handle_content_event(0, ContentEvent::answered(1, 1)).unwrap();

        assert!(!player.dialog().overlay_open);
        assert!(matches!(
            player.pending_continue(),
            Some(ContinueAffordance::Branch { blocking: false, .. })
        ));
    }

    #[test]
    fn test_seek_suspends_ticks_and_recomputes_once() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(5.0, 6.0),
            poster(20.0, 25.0),
        ]));
        player.play();
        play_until(&mut player, 5.5);
        assert_eq!(player.visible_interactions(), vec![0]);

        player.seek_start();
        assert!(!player.tasks.is_scheduled(TIME_UPDATE));
        assert!(player.scrub(22.0));
        assert_eq!(player.scrub_time(), Some(22.0));
        assert!(player.update(22.0).is_empty());

        assert_eq!(player.seek_stop(22.0), 22.0);
        assert_eq!(player.visible_interactions(), vec![1]);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        assert!(player.tasks.is_scheduled(TIME_UPDATE));

        player.seek_to(1.0);
        assert!(player.visible_interactions().is_empty());
    }

    #[test]
    fn test_seek_past_required_is_refused() {
        let mut player = player(InteractiveVideoParams::new(vec![
            poster(10.0, 12.0).with_required_completion(),
        ]));
        let blocked = record(&mut player, PlayerEventKind::SeekBlocked);
        player.update(0.0);

        let landed = player.seek_to(50.0);

        assert_eq!(landed, 10.0);
        assert_eq!(
            *blocked.borrow(),
            vec![PlayerEvent::SeekBlocked {
                requested: 50.0,
                landed: 10.0
            }]
        );
        assert_eq!(player.visible_interactions(), vec![0]);
        assert_eq!(player.gate(), Some(0));
        assert_eq!(player.dialog().warnings(), 1);
    }

    #[test]
    fn test_seek_before_pinned_window_releases_gate() {
        let mut player = player(InteractiveVideoParams::new(vec![
            poster(5.0, 6.0).with_required_completion(),
        ]));
        let hidden = record(&mut player, PlayerEventKind::Hidden);
        player.update(5.0);
        player.update(7.5);
        assert_eq!(player.gate(), Some(0));
        assert_eq!(player.video().time, 6.0);

        assert_eq!(player.seek_to(1.0), 1.0);

        assert!(!player.interaction(0).unwrap().is_rendered());
        assert!(player.visible_interactions().is_empty());
        assert_eq!(*hidden.borrow(), vec![PlayerEvent::Hidden(0)]);
        assert_eq!(player.gate(), None);
        assert!(!player.dialog().overlay_open);
        assert!(player.play());
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_prevent_skipping_clamps_forward_seeks() {
        let params = InteractiveVideoParams::new(vec![button(1.0, 2.0)]).with_settings(
            PlaybackSettings {
                prevent_skipping: true,
                ..PlaybackSettings::default()
            },
        );
        let mut player = player(params);
        player.play();
        play_until(&mut player, 3.0);

        let landed = player.seek_to(60.0);
        assert!((landed - 3.0).abs() < 0.05);
        assert_eq!(player.seek_to(0.5), 0.5);
    }

    #[test]
    fn test_goto_interaction_seeks() {
        let params = InteractiveVideoParams::new(vec![button(1.0, 2.0).with_goto(30.0)]);
        let mut player = player(params);
        player.update(1.0);

        player.activate(0).unwrap();

        assert_eq!(player.video().seeks().last(), Some(&30.0));
        assert!(player.visible_interactions().is_empty());
    }

    #[test]
    fn test_dialog_is_exclusive() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(1.0, 5.0),
            button(1.0, 5.0),
        ]));
        player.play();
        player.update(1.0);

        player.activate(0).unwrap();
        assert!(matches!(player.activate(1), Err(Error::DialogBusy { holder: 0 })));
        assert_eq!(player.playback_state(), PlaybackState::Paused);

        assert!(player.close_dialog());
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        player.activate(1).unwrap();
        assert_eq!(player.dialog().opened(), vec![0, 1]);
    }

    #[test]
    fn test_content_failure_does_not_break_timeline() {
        let factory = ScriptedFactory::default().failing_create(0).failing_attach(1);
        let params = InteractiveVideoParams::new(vec![
            poster(1.0, 2.0),
            poster(1.0, 2.0),
            button(1.0, 2.0),
        ]);
        let mut player = player_with(params, factory, None);

        player.update(1.0);
        assert_eq!(player.visible_interactions(), vec![0, 1, 2]);

        player.handle_content_event(1, ContentEvent::answered(1, 1)).unwrap();
        assert_eq!(player.score(), 0);

        player.update(3.0);
        assert!(player.visible_interactions().is_empty());
    }

    #[test]
    fn test_endscreen_only_after_answers() {
        let mut player = player(InteractiveVideoParams::new(vec![
            button(1.0, 2.0),
            button(3.0, 4.0),
        ]));
        let endscreens = record(&mut player, PlayerEventKind::Endscreen);
        player.on_video_event(VideoEvent::StateChange(VideoState::Playing));

        player.on_video_event(VideoEvent::StateChange(VideoState::Ended));
        assert!(endscreens.borrow().is_empty());

        player.handle_content_event(1, ContentEvent::answered(2, 3)).unwrap();
        player.on_video_event(VideoEvent::StateChange(VideoState::Playing));
        player.on_video_event(VideoEvent::StateChange(VideoState::Ended));

        let events = endscreens.borrow();
        assert_eq!(events.len(), 1);
        let PlayerEvent::Endscreen(summary) = &events[0] else {
            panic!("expected endscreen");
        };
        assert_eq!(summary.total_score, 2);
        assert_eq!(summary.entries[0].interaction, 1);
    }

    #[test]
    fn test_loop_restarts_at_start() {
        let params = InteractiveVideoParams::new(vec![button(0.0, 1.0)]).with_settings(
            PlaybackSettings {
                loop_video: true,
                start_at: 4.0,
                ..PlaybackSettings::default()
            },
        );
        let mut player = player(params);
        let loops = record(&mut player, PlayerEventKind::Looped);
        player.on_video_event(VideoEvent::StateChange(VideoState::Playing));
        player.video_mut().clear();

        player.on_video_event(VideoEvent::StateChange(VideoState::Ended));

        assert_eq!(player.video().calls, vec![VideoCall::Seek(4.0), VideoCall::Play]);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        assert_eq!(*loops.borrow(), vec![PlayerEvent::Looped { start: 4.0 }]);
    }

    #[test]
    fn test_media_events_are_forwarded() {
        let mut player = player(InteractiveVideoParams::default());
        let media = record(&mut player, PlayerEventKind::Media);

        player.on_video_event(VideoEvent::PlaybackRateChange(1.5));
        player.on_video_event(VideoEvent::Error("decode".to_string()));

        assert_eq!(*media.borrow(), vec![PlayerEvent::Media(VideoEvent::PlaybackRateChange(1.5))]);
    }

    #[test]
    fn test_bookmarks() {
        let params = InteractiveVideoParams::new(vec![button(1.0, 2.0)])
            .with_bookmarks(vec![Bookmark::new(20.0, "Part two"), Bookmark::new(5.0, "Part one")]);
        let mut player = player(params);

        assert_eq!(player.next_bookmark(0.0).map(|b| b.label.as_str()), Some("Part one"));
        assert_eq!(player.next_bookmark(5.0).map(|b| b.label.as_str()), Some("Part two"));
        assert_eq!(player.previous_bookmark(20.0).map(|b| b.time), Some(5.0));
        assert!(player.previous_bookmark(5.0).is_none());

        assert_eq!(player.goto_bookmark(1).unwrap(), 20.0);
        assert!(matches!(player.goto_bookmark(7), Err(Error::BookmarkNotFound(7))));
    }

    #[test]
    fn test_state_roundtrip() {
        let params = InteractiveVideoParams::new(vec![
            button(1.0, 2.0),
            poster(3.0, 4.0),
            button(5.0, 6.0),
            label(7.0, 8.0),
        ]);
        let mut player = player(params.clone());
        player.update(3.0);
        player.handle_content_event(0, ContentEvent::answered(1, 2)).unwrap();
        player.handle_content_event(1, ContentEvent::interacted()).unwrap();
        player.handle_content_event(2, ContentEvent::answered(4, 4)).unwrap();
        player.video_mut().time = 42.0;

        let state = player.current_state();
        let restored = player_with(params, ScriptedFactory::default(), Some(&state));

        for (before, after) in player.interactions().iter().zip(restored.interactions()) {
            assert_eq!(before.progress(), after.progress());
            assert_eq!(before.score(), after.score());
            assert_eq!(before.max_score(), after.max_score());
        }
        assert_eq!(restored.video().seeks(), vec![42.0]);
        assert_eq!(restored.score(), 5);
        assert_eq!(restored.max_score(), 6);
        assert_eq!(restored.answered_count(), 2);
    }

    #[test]
    fn test_seek_recreates_after_remove() {
        let params: Vec<InteractionParams> = vec![poster(1.0, 9.0)];
        let mut player = player(InteractiveVideoParams::new(params));
        player.update(2.0);

        let modal = &mut player.modal;
        player.interactions[0].remove(modal);
        player.timeline.forget(0);
        player.update(2.5);
        assert!(player.visible_interactions().is_empty());

        player.seek_to(3.0);
        assert_eq!(player.visible_interactions(), vec![0]);
    }
}
